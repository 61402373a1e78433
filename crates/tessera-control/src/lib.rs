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


//! # Tessera Control
//!
//! Coordinates ranks rendering one scene together: how the domain is split
//! into bricks, which data each rank owns, how shared parameters reach every
//! rank each frame, and the frame loop tying rendering and compositing
//! together.

#![warn(missing_docs)]

pub mod commit_queue;
pub mod coordinator;
pub mod decomposition;
pub mod error;
pub mod sync;
pub mod topology;

pub use commit_queue::CommitQueue;
pub use coordinator::{Coordinator, DisplayCallback, FrameStatus, UiCallback};
pub use decomposition::{
    generate_local_spheres, make_local_spheres, DomainDecomposition, LocalSpheres, SphereSettings,
};
pub use error::{DecompositionError, FrameError, SyncError, TopologyError};
pub use sync::{ParameterSync, SyncedParams, SyncedValue};
pub use topology::{brick_coord, brick_rank, compute_divisor, compute_grid, BrickCoord, Grid, RankTopology};
