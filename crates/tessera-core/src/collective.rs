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


//! The collective communication boundary between ranks.
//!
//! Every operation is blocking and must be entered by every rank of the group
//! in the same order. A rank that fails to participate desynchronizes the
//! group; implementations report that as a [`CollectiveError`] and callers
//! treat it as fatal for the whole run.

use crate::error::CollectiveError;

/// A group of cooperating ranks.
pub trait Collective: Send + Sync {
    /// This rank's id in `0..world_size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn world_size(&self) -> usize;

    /// Delivers `root`'s payload to every rank. Non-root payloads are ignored.
    fn broadcast(&self, payload: &[u8], root: usize) -> Result<Vec<u8>, CollectiveError>;

    /// Collects every rank's payload on `root`, indexed by rank.
    ///
    /// Returns `Some` on the root and `None` elsewhere.
    fn gather(&self, payload: &[u8], root: usize) -> Result<Option<Vec<Vec<u8>>>, CollectiveError>;

    /// Blocks until every rank has entered the barrier.
    fn barrier(&self) -> Result<(), CollectiveError>;

    /// Tears the group down; pending and future operations on every rank fail
    /// with [`CollectiveError::Aborted`].
    fn abort(&self, reason: &str);

    /// `true` if this rank is `root`.
    fn is_root(&self, root: usize) -> bool {
        self.rank() == root
    }
}

/// Fails with `InvalidRoot` when `root` is outside a group of `world_size`.
pub fn check_root(root: usize, world_size: usize) -> Result<(), CollectiveError> {
    if root < world_size {
        Ok(())
    } else {
        Err(CollectiveError::InvalidRoot { root, world_size })
    }
}
