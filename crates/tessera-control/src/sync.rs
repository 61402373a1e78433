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


//! Per-frame synchronization of shared rendering parameters.
//!
//! Interactive controls only exist on the controlling rank. They write into a
//! local staging area; once per frame the staged values travel to every rank
//! as a [`SyncedParams`] snapshot, and each rank applies the snapshot to its
//! authoritative values. Values that changed are written to the bound scene
//! objects, which must then be re-committed before the next render.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::collective::Collective;
use tessera_core::math::Vec3;
use tessera_core::object::ObjectRef;
use tessera_core::param::ParamValue;

/// A value that can be synchronized across ranks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SyncedValue {
    /// An integer, e.g. samples per pixel.
    Int(i32),
    /// A float.
    Float(f32),
    /// A vector or color.
    Vec3([f32; 3]),
}

impl From<SyncedValue> for ParamValue {
    fn from(value: SyncedValue) -> Self {
        match value {
            SyncedValue::Int(v) => ParamValue::Int(v),
            SyncedValue::Float(v) => ParamValue::Float(v),
            SyncedValue::Vec3(v) => ParamValue::Vec3(Vec3::from(v)),
        }
    }
}

impl From<i32> for SyncedValue {
    fn from(v: i32) -> Self {
        SyncedValue::Int(v)
    }
}

impl From<f32> for SyncedValue {
    fn from(v: f32) -> Self {
        SyncedValue::Float(v)
    }
}

impl From<Vec3> for SyncedValue {
    fn from(v: Vec3) -> Self {
        SyncedValue::Vec3(v.to_array())
    }
}

/// The message broadcast by the controlling rank each frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncedParams {
    /// Frame the snapshot belongs to.
    pub frame: u64,
    /// `false` once the controlling rank wants every rank to stop.
    pub running: bool,
    /// Staged values by key.
    pub values: BTreeMap<String, SyncedValue>,
}

impl SyncedParams {
    /// Encodes the snapshot with bincode.
    pub fn encode(&self) -> Result<Vec<u8>, SyncError> {
        Ok(bincode::serde::encode_to_vec(
            self,
            bincode::config::standard(),
        )?)
    }

    /// Decodes a snapshot produced by [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self, SyncError> {
        let (params, _): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(params)
    }
}

#[derive(Debug, Clone)]
struct Binding {
    object: ObjectRef,
    param: String,
}

/// Staged and applied values plus the object parameters they drive.
#[derive(Debug, Default)]
pub struct ParameterSync {
    staged: BTreeMap<String, SyncedValue>,
    applied: BTreeMap<String, SyncedValue>,
    bindings: BTreeMap<String, Vec<Binding>>,
    running: bool,
}

impl ParameterSync {
    /// An empty set of synchronized parameters.
    pub fn new() -> Self {
        Self {
            running: true,
            ..Self::default()
        }
    }

    /// Declares `key` with a value every rank already agrees on.
    ///
    /// The value counts as applied, so it triggers no re-commit until the
    /// controlling rank stages something else.
    pub fn declare(&mut self, key: impl Into<String>, initial: impl Into<SyncedValue>) {
        let key = key.into();
        let initial = initial.into();
        self.staged.insert(key.clone(), initial);
        self.applied.insert(key, initial);
    }

    /// Writes `key` into `param` of `object` whenever its value changes.
    pub fn bind(&mut self, key: impl Into<String>, object: ObjectRef, param: impl Into<String>) {
        self.bindings.entry(key.into()).or_default().push(Binding {
            object,
            param: param.into(),
        });
    }

    /// Stages a new value; it takes effect at the next synchronization.
    pub fn stage(&mut self, key: impl Into<String>, value: impl Into<SyncedValue>) {
        self.staged.insert(key.into(), value.into());
    }

    /// The locally staged value.
    pub fn staged(&self, key: &str) -> Option<SyncedValue> {
        self.staged.get(key).copied()
    }

    /// The value last applied from a snapshot.
    pub fn applied(&self, key: &str) -> Option<SyncedValue> {
        self.applied.get(key).copied()
    }

    /// Asks every rank to stop after the next synchronization.
    pub fn request_stop(&mut self) {
        self.running = false;
    }

    /// `false` once a stop was requested or received.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The staged values as a snapshot for `frame`.
    pub fn snapshot(&self, frame: u64) -> SyncedParams {
        SyncedParams {
            frame,
            running: self.running,
            values: self.staged.clone(),
        }
    }

    /// Applies `snapshot` and returns the bound objects whose parameters
    /// changed, each once, in binding order.
    pub fn apply(&mut self, snapshot: &SyncedParams) -> Vec<ObjectRef> {
        self.running = snapshot.running;
        let mut changed: Vec<ObjectRef> = Vec::new();
        for (key, value) in &snapshot.values {
            if self.applied.get(key) == Some(value) {
                continue;
            }
            log::debug!("ParameterSync: '{}' changed to {:?}", key, value);
            self.applied.insert(key.clone(), *value);
            for binding in self.bindings.get(key).into_iter().flatten() {
                binding.object.set(binding.param.clone(), ParamValue::from(*value));
                if !changed.iter().any(|o| Arc::ptr_eq(o, &binding.object)) {
                    changed.push(binding.object.clone());
                }
            }
        }
        changed
    }

    /// Broadcasts the controlling rank's staged values and applies them on
    /// every rank.
    ///
    /// Every rank of the group must call this once per frame with the same
    /// `frame` and `root`.
    pub fn synchronize(
        &mut self,
        collective: &dyn Collective,
        root: usize,
        frame: u64,
    ) -> Result<Vec<ObjectRef>, SyncError> {
        let payload = if collective.is_root(root) {
            self.snapshot(frame).encode()?
        } else {
            Vec::new()
        };
        let received = collective.broadcast(&payload, root)?;
        let snapshot = SyncedParams::decode(&received)?;
        if snapshot.frame != frame {
            return Err(SyncError::OutOfStep {
                expected: frame,
                received: snapshot.frame,
            });
        }
        Ok(self.apply(&snapshot))
    }
}
