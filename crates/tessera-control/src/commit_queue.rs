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


//! Objects waiting to be re-committed before the next render.

use crate::error::FrameError;
use std::sync::Arc;
use tessera_core::context::RenderContext;
use tessera_core::object::ObjectRef;

/// An insertion-ordered set of objects pending commit.
///
/// Queue dependencies before their dependents, e.g. a light before the
/// renderer listing it.
#[derive(Debug, Default)]
pub struct CommitQueue {
    pending: Vec<ObjectRef>,
}

impl CommitQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `object`; returns `false` if it was already queued.
    pub fn push(&mut self, object: ObjectRef) -> bool {
        if self.contains(&object) {
            return false;
        }
        self.pending.push(object);
        true
    }

    /// `true` if `object` is queued.
    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.pending.iter().any(|o| Arc::ptr_eq(o, object))
    }

    /// Number of queued objects.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Commits every queued object in insertion order and returns how many
    /// were committed.
    ///
    /// On failure the failing object and those after it stay queued.
    pub fn flush(&mut self, context: &RenderContext) -> Result<usize, FrameError> {
        let mut committed = 0;
        let outcome = self.pending.iter().try_for_each(|object| {
            object.commit(context).map_err(|source| FrameError::Commit {
                object_type: object.type_name().to_string(),
                source,
            })?;
            committed += 1;
            Ok(())
        });
        self.pending.drain(..committed);
        if committed > 0 {
            log::trace!("CommitQueue: committed {} objects", committed);
        }
        outcome.map(|()| committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::error::CommitError;
    use tessera_core::object::ObjectCategory;
    use tessera_core::registry::TypeRegistry;
    use tessera_infra::CpuKernel;

    fn context() -> RenderContext {
        let registry = Arc::new(TypeRegistry::new());
        tessera_plugins::install(&registry);
        RenderContext::new(registry, Arc::new(CpuKernel::new()))
    }

    #[test]
    fn test_push_deduplicates() {
        let ctx = context();
        let light = ctx.create(ObjectCategory::Light, "ambient").unwrap();
        let mut queue = CommitQueue::new();
        assert!(queue.push(light.clone()));
        assert!(!queue.push(light.clone()));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.flush(&ctx).unwrap(), 1);
        assert!(queue.is_empty());
        assert!(light.is_committed());
    }

    #[test]
    fn test_flush_in_insertion_order() {
        let ctx = context();
        let light = ctx.create(ObjectCategory::Light, "distant").unwrap();
        let renderer = ctx.create(ObjectCategory::Renderer, "scivis").unwrap();
        renderer.set("lights", vec![light.clone()]);

        let mut queue = CommitQueue::new();
        queue.push(light.clone());
        queue.push(renderer.clone());
        assert_eq!(queue.flush(&ctx).unwrap(), 2);
        assert!(!renderer.is_stale());
    }

    #[test]
    fn test_failed_commit_stays_queued() {
        let ctx = context();
        let ok = ctx.create(ObjectCategory::Light, "ambient").unwrap();
        let bad = ctx.create(ObjectCategory::Geometry, "spheres").unwrap();
        let mut queue = CommitQueue::new();
        queue.push(ok.clone());
        queue.push(bad.clone());

        match queue.flush(&ctx) {
            Err(FrameError::Commit {
                object_type,
                source: CommitError::MissingParameter { param, .. },
            }) => {
                assert_eq!(object_type, "spheres");
                assert_eq!(param, "spheres");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(queue.len(), 1);
        assert!(queue.contains(&bad));
        assert!(ok.is_committed());
    }
}
