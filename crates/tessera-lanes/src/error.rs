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


use tessera_core::error::{CommitError, KernelError, RegistryError};
use tessera_core::math::Extent2D;
use thiserror::Error;

/// Errors raised while creating or executing a render job.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer lacks an object binding a job cannot run without.
    #[error("renderer '{renderer}' has no '{binding}' binding")]
    MissingRequiredBinding {
        /// The renderer's type name.
        renderer: String,
        /// The absent binding, `"world"` or `"camera"`.
        binding: &'static str,
    },
    /// The object wrapped as a renderer is not one.
    #[error("'{object_type}' is not a renderer")]
    NotARenderer {
        /// The object's type name.
        object_type: String,
    },
    /// The frame buffer does not have the size the job was created for.
    #[error("frame buffer is {}x{} but the job renders {}x{}", found.width, found.height, expected.width, expected.height)]
    FrameSizeMismatch {
        /// The job's size.
        expected: Extent2D,
        /// The buffer's size.
        found: Extent2D,
    },
    /// The render was cancelled before every tile completed.
    #[error("render cancelled after {completed} of {total} tiles")]
    Cancelled {
        /// Tiles finished before cancellation was observed.
        completed: usize,
        /// Tiles in the job.
        total: usize,
    },
    /// A tile worker panicked.
    #[error("a tile worker panicked")]
    WorkerPanicked,
    /// A bound object has no usable compiled form.
    #[error(transparent)]
    Commit(#[from] CommitError),
    /// The compute kernel failed on a tile.
    #[error(transparent)]
    Kernel(#[from] KernelError),
    /// The renderer type is not registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
