// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! # Tessera Lanes
//!
//! The per-frame hot path: a [`Renderer`] turns its committed bindings into a
//! [`RenderJob`], the [`TileScheduler`] renders the job's tiles on a bounded
//! worker pool, and a [`Compositor`] merges the partial frames of every rank.

#![warn(missing_docs)]

mod composite;
mod error;
mod job;
mod renderer;
mod scheduler;

pub use composite::{Compositor, DepthCompositor, PartialFrame};
pub use error::RenderError;
pub use job::RenderJob;
pub use renderer::Renderer;
pub use scheduler::{CancelToken, RenderStats, TileScheduler};
