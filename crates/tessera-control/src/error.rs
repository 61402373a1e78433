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


//! Errors raised while coordinating distributed frames.

use tessera_core::error::{CollectiveError, CommitError, ConfigError, PresentError, RegistryError};
use tessera_lanes::RenderError;
use thiserror::Error;

/// The group layout cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A group needs at least one rank.
    #[error("a rank group needs at least one rank")]
    EmptyGroup,
    /// The rank id does not belong to the group.
    #[error("rank {rank} is outside a group of {world_size}")]
    RankOutOfRange {
        /// The offending rank.
        rank: usize,
        /// Size of the group.
        world_size: usize,
    },
}

/// Rank-local data cannot be generated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecompositionError {
    /// Primitives of this radius do not fit inside the brick.
    #[error("spheres of radius {radius} do not fit in a brick of size {size:?}")]
    BrickTooSmall {
        /// The padding radius.
        radius: f32,
        /// Size of the brick on each axis.
        size: [f32; 3],
    },
    /// The radius must be positive and finite.
    #[error("invalid sphere radius {0}")]
    InvalidRadius(f32),
}

/// The per-frame parameter broadcast failed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The broadcast itself failed.
    #[error(transparent)]
    Collective(#[from] CollectiveError),
    /// The snapshot could not be encoded.
    #[error("failed to encode the parameter snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    /// The received bytes are not a snapshot.
    #[error("failed to decode the parameter snapshot: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    /// The controlling rank is on a different frame.
    #[error("controlling rank is on frame {received}, this rank on frame {expected}")]
    OutOfStep {
        /// This rank's frame.
        expected: u64,
        /// The frame in the snapshot.
        received: u64,
    },
}

/// A frame, or the rank-local scene it renders, could not be produced.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The group layout is invalid.
    #[error(transparent)]
    Topology(#[from] TopologyError),
    /// The engine configuration does not fit the group.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Rank-local data does not fit the brick.
    #[error(transparent)]
    Decomposition(#[from] DecompositionError),
    /// A scene object type is not registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Synchronizing parameters failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
    /// An object queued for commit failed to commit.
    #[error("commit of '{object_type}' failed: {source}")]
    Commit {
        /// Type name of the failing object.
        object_type: String,
        /// The underlying failure.
        #[source]
        source: CommitError,
    },
    /// Rendering or compositing failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Gathering partial frames failed.
    #[error(transparent)]
    Collective(#[from] CollectiveError),
    /// A rank sent a partial frame that does not decode.
    #[error("rank {rank} sent a malformed partial frame ({len} bytes)")]
    MalformedPartialFrame {
        /// The sending rank.
        rank: usize,
        /// Length of the payload.
        len: usize,
    },
    /// At least one rank abandoned its tiles; nothing was composited.
    #[error("frame {frame} was cancelled on rank(s) {ranks:?}")]
    Cancelled {
        /// The abandoned frame.
        frame: u64,
        /// Ranks that cancelled.
        ranks: Vec<usize>,
    },
    /// The presenter rejected the composited frame.
    #[error(transparent)]
    Present(#[from] PresentError),
}

impl FrameError {
    /// `true` when the group can no longer continue in step.
    ///
    /// Collective failures and malformed transfers desynchronize the ranks;
    /// the coordinator aborts the whole group when it sees one.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FrameError::Collective(_) | FrameError::Sync(_) | FrameError::MalformedPartialFrame { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collective_errors_are_fatal() {
        let err = FrameError::from(CollectiveError::Disconnected { rank: 2 });
        assert!(err.is_fatal());
        let err = FrameError::from(SyncError::OutOfStep {
            expected: 3,
            received: 4,
        });
        assert!(err.is_fatal());
    }

    #[test]
    fn test_cancellation_is_not_fatal() {
        let err = FrameError::Cancelled {
            frame: 1,
            ranks: vec![0],
        };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "frame 1 was cancelled on rank(s) [0]");
    }
}
