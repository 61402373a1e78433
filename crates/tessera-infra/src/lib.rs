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


//! # Tessera Infra
//!
//! Concrete implementations of the boundaries declared in `tessera-core`:
//! - [`kernel::CpuKernel`], a deterministic reference compute kernel;
//! - [`collective::LocalGroup`], ranks running as threads of one process, and
//!   [`collective::SingleRank`];
//! - [`platform::ImagePresenter`] and [`platform::HeadlessPresenter`].

#![warn(missing_docs)]

pub mod collective;
pub mod kernel;
pub mod platform;

pub use collective::{LocalCollective, LocalGroup, SingleRank};
pub use kernel::CpuKernel;
pub use platform::{HeadlessPresenter, ImagePresenter};
