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


//! # Tessera Core
//!
//! Foundational crate containing the scene-object model, the type registry
//! and the boundaries the engine consumes: the compute kernel, the collective
//! group of ranks and the presenter.

#![warn(missing_docs)]

pub mod collective;
pub mod config;
pub mod context;
pub mod error;
pub mod framebuffer;
pub mod kernel;
pub mod math;
pub mod object;
pub mod param;
pub mod platform;
pub mod registry;

#[cfg(test)]
mod testing;

#[doc(hidden)]
pub use inventory;

pub use context::RenderContext;
pub use object::{ObjectCategory, ObjectRef, SceneObject};
pub use registry::TypeRegistry;
