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


//! The world: the committed scene a renderer draws.

use tessera_core::error::CommitError;
use tessera_core::kernel::{KernelObject, WorldDesc};
use tessera_core::math::Aabb;
use tessera_core::object::{CompileScope, CompiledForm, ObjectCategory, ObjectKind};

/// A collection of `geometry` and `volume` objects with an integer `id`
/// (typically the owning rank).
///
/// Every child must be committed before the world; the world's bounds are the
/// union of its children's bounds. A child committed again after the world
/// leaves the world stale until it is committed again too.
#[derive(Debug, Default)]
pub struct World;

impl ObjectKind for World {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::World
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        let id = scope.params().int_or("id", 0)?;
        let geometries = scope.dependency_list("geometry")?;
        let volumes = scope.dependency_list("volume")?;

        let bounds = geometries
            .iter()
            .chain(&volumes)
            .filter_map(|child| child.bounds())
            .fold(Aabb::INVALID, |acc, b| acc.union(&b));

        let desc = WorldDesc {
            id,
            geometries: geometries.iter().map(|g| g.handle().clone()).collect(),
            volumes: volumes.iter().map(|v| v.handle().clone()).collect(),
            bounds,
        };
        let KernelObject { handle, bounds } = scope
            .kernel()
            .compile_world(&desc)
            .map_err(|e| scope.kernel_error(e))?;

        log::debug!(
            "World {}: {} geometries, {} volumes",
            id,
            desc.geometries.len(),
            desc.volumes.len()
        );
        let form = CompiledForm::new(handle);
        Ok(if bounds.is_valid() {
            form.with_bounds(bounds)
        } else {
            form
        })
    }
}
