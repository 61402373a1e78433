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


//! # Tessera Plugins
//!
//! The object types shipped with the engine, and the table registering them.
//!
//! | category | names |
//! |---|---|
//! | renderer | `scivis`, `raycast`, `mpi_raycast`, `obj`, `OBJ` |
//! | material | `OBJMaterial`, `obj` |
//! | light | `ambient`, `distant`, `point`, `PointLight` |
//! | geometry | `spheres` |
//! | volume | `structured_regular`, `shared_structured_volume`, `vkl_structured_volume`, `unstructured`, `unstructured_volume`, `vkl_unstructured_volume` |
//! | camera | `perspective`, `orthographic` |
//! | world | `world` |

pub mod camera;
pub mod geometry;
pub mod light;
pub mod material;
pub mod renderer;
pub mod volume;
pub mod world;

use tessera_core::object::{ObjectCategory, ObjectKind};
use tessera_core::registry::{TypeRegistration, TypeRegistry};

fn make<K: ObjectKind + Default>() -> Box<dyn ObjectKind> {
    Box::new(K::default())
}

/// Every built-in type, primary name first.
pub const BUILTIN_TYPES: &[TypeRegistration] = &[
    TypeRegistration {
        category: ObjectCategory::Renderer,
        names: &["scivis", "raycast", "mpi_raycast"],
        factory: make::<renderer::SciVisRenderer>,
    },
    TypeRegistration {
        category: ObjectCategory::Renderer,
        names: &["obj", "OBJ"],
        factory: make::<renderer::ObjRenderer>,
    },
    TypeRegistration {
        category: ObjectCategory::Material,
        names: &["OBJMaterial", "obj"],
        factory: make::<material::ObjMaterial>,
    },
    TypeRegistration {
        category: ObjectCategory::Light,
        names: &["ambient"],
        factory: make::<light::AmbientLight>,
    },
    TypeRegistration {
        category: ObjectCategory::Light,
        names: &["distant"],
        factory: make::<light::DistantLight>,
    },
    TypeRegistration {
        category: ObjectCategory::Light,
        names: &["point", "PointLight"],
        factory: make::<light::PointLight>,
    },
    TypeRegistration {
        category: ObjectCategory::Geometry,
        names: &["spheres"],
        factory: make::<geometry::Spheres>,
    },
    TypeRegistration {
        category: ObjectCategory::Volume,
        names: &[
            "structured_regular",
            "shared_structured_volume",
            "vkl_structured_volume",
        ],
        factory: make::<volume::StructuredRegular>,
    },
    TypeRegistration {
        category: ObjectCategory::Volume,
        names: &["unstructured", "unstructured_volume", "vkl_unstructured_volume"],
        factory: make::<volume::Unstructured>,
    },
    TypeRegistration {
        category: ObjectCategory::Camera,
        names: &["perspective"],
        factory: make::<camera::PerspectiveCamera>,
    },
    TypeRegistration {
        category: ObjectCategory::Camera,
        names: &["orthographic"],
        factory: make::<camera::OrthographicCamera>,
    },
    TypeRegistration {
        category: ObjectCategory::World,
        names: &["world"],
        factory: make::<world::World>,
    },
];

/// Registers the built-in types, then every type submitted by linked plugin
/// units, so a submitted type overrides a built-in of the same name.
pub fn install(registry: &TypeRegistry) {
    registry.register_table(BUILTIN_TYPES);
    let submitted = registry.install_submitted();
    log::info!(
        "Plugins: {} types registered ({} submitted)",
        registry.len(),
        submitted
    );
}
