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


use std::sync::Mutex;
use tessera_core::collective::{check_root, Collective};
use tessera_core::error::CollectiveError;

/// The group of one: every collective completes immediately.
#[derive(Debug, Default)]
pub struct SingleRank {
    aborted: Mutex<Option<String>>,
}

impl SingleRank {
    /// Creates the group.
    pub fn new() -> Self {
        Self::default()
    }

    fn check_aborted(&self) -> Result<(), CollectiveError> {
        match self.aborted.lock().expect("abort lock poisoned").as_ref() {
            Some(reason) => Err(CollectiveError::Aborted {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Collective for SingleRank {
    fn rank(&self) -> usize {
        0
    }

    fn world_size(&self) -> usize {
        1
    }

    fn broadcast(&self, payload: &[u8], root: usize) -> Result<Vec<u8>, CollectiveError> {
        self.check_aborted()?;
        check_root(root, 1)?;
        Ok(payload.to_vec())
    }

    fn gather(&self, payload: &[u8], root: usize) -> Result<Option<Vec<Vec<u8>>>, CollectiveError> {
        self.check_aborted()?;
        check_root(root, 1)?;
        Ok(Some(vec![payload.to_vec()]))
    }

    fn barrier(&self) -> Result<(), CollectiveError> {
        self.check_aborted()
    }

    fn abort(&self, reason: &str) {
        log::error!("SingleRank: aborted: {reason}");
        *self.aborted.lock().expect("abort lock poisoned") = Some(reason.to_string());
    }
}
