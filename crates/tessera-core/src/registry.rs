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

//! Type registry mapping `(category, name)` to object factories.
//!
//! Two registration surfaces feed the same registry:
//! - explicit tables of [`TypeRegistration`] entries passed to
//!   [`TypeRegistry::register_table`], in a known order;
//! - [`ObjectTypeSubmission`]s collected with `inventory` from independently
//!   compiled plugin units via [`submit_object_type!`](crate::submit_object_type),
//!   installed by [`TypeRegistry::install_submitted`].
//!
//! Registering a name twice replaces the earlier factory. Submissions carry no
//! link order, so they are installed sorted by `(priority, category, name)`.

use crate::error::RegistryError;
use crate::object::{ObjectCategory, ObjectKind, ObjectRef, SceneObject};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A factory producing a fresh kind for each created object.
pub type Factory = Arc<dyn Fn() -> Box<dyn ObjectKind> + Send + Sync>;

/// One row of an explicit registration table.
#[derive(Clone, Copy)]
pub struct TypeRegistration {
    /// The category the names are registered in.
    pub category: ObjectCategory,
    /// The primary name followed by its aliases.
    pub names: &'static [&'static str],
    /// Builds the kind.
    pub factory: fn() -> Box<dyn ObjectKind>,
}

/// A registration submitted from a plugin unit through `inventory`.
pub struct ObjectTypeSubmission {
    category: ObjectCategory,
    name: &'static str,
    priority: i32,
    factory: fn() -> Box<dyn ObjectKind>,
}

impl ObjectTypeSubmission {
    /// Builds a submission; used by [`submit_object_type!`](crate::submit_object_type).
    pub const fn new(
        category: ObjectCategory,
        name: &'static str,
        priority: i32,
        factory: fn() -> Box<dyn ObjectKind>,
    ) -> Self {
        Self {
            category,
            name,
            priority,
            factory,
        }
    }
}

inventory::collect!(ObjectTypeSubmission);

/// Submits an object type for discovery by [`TypeRegistry::install_submitted`].
///
/// ```ignore
/// tessera_core::submit_object_type!(ObjectCategory::Light, "spot", || Box::new(Spot));
/// tessera_core::submit_object_type!(ObjectCategory::Light, "spot", 10, || Box::new(BetterSpot));
/// ```
///
/// With duplicate names, the submission with the highest priority is
/// installed last and therefore wins.
#[macro_export]
macro_rules! submit_object_type {
    ($category:expr, $name:expr, $factory:expr) => {
        $crate::submit_object_type!($category, $name, 0, $factory);
    };
    ($category:expr, $name:expr, $priority:expr, $factory:expr) => {
        $crate::inventory::submit! {
            $crate::registry::ObjectTypeSubmission::new($category, $name, $priority, $factory)
        }
    };
}

/// Mapping from `(category, name)` to factory.
///
/// Shared behind an `Arc` through the [`RenderContext`](crate::context::RenderContext);
/// registration and lookup may happen from any thread.
#[derive(Default)]
pub struct TypeRegistry {
    factories: RwLock<HashMap<(ObjectCategory, String), Factory>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `(category, name)`, replacing any previous entry.
    pub fn register<F>(&self, category: ObjectCategory, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn ObjectKind> + Send + Sync + 'static,
    {
        self.insert(category, name, Arc::new(factory));
    }

    /// Registers one factory under several names.
    pub fn register_aliases<F>(&self, category: ObjectCategory, names: &[&str], factory: F)
    where
        F: Fn() -> Box<dyn ObjectKind> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(factory);
        for name in names {
            self.insert(category, name, factory.clone());
        }
    }

    /// Registers every row of `table`, in order.
    pub fn register_table(&self, table: &[TypeRegistration]) {
        for row in table {
            let factory: Factory = Arc::new(row.factory);
            for name in row.names {
                self.insert(row.category, name, factory.clone());
            }
        }
    }

    /// Installs every type submitted with [`submit_object_type!`](crate::submit_object_type).
    ///
    /// Returns the number of submissions applied.
    pub fn install_submitted(&self) -> usize {
        let mut submissions: Vec<&ObjectTypeSubmission> =
            inventory::iter::<ObjectTypeSubmission>.into_iter().collect();
        submissions.sort_by(|a, b| {
            (a.priority, a.category, a.name).cmp(&(b.priority, b.category, b.name))
        });
        for submission in &submissions {
            self.insert(
                submission.category,
                submission.name,
                Arc::new(submission.factory),
            );
        }
        log::debug!("TypeRegistry: installed {} submitted types", submissions.len());
        submissions.len()
    }

    /// Creates a fresh, uncommitted object of the named type.
    ///
    /// Fails with `UnknownType` on a lookup miss and with `CategoryMismatch`
    /// when the registered factory builds a kind of another category.
    pub fn create(&self, category: ObjectCategory, name: &str) -> Result<ObjectRef, RegistryError> {
        let factory = self
            .factories
            .read()
            .expect("registry lock poisoned")
            .get(&(category, name.to_string()))
            .cloned()
            .ok_or_else(|| RegistryError::UnknownType {
                category,
                name: name.to_string(),
            })?;

        let kind = factory();
        if kind.category() != category {
            log::warn!(
                "TypeRegistry: factory for {} '{}' built a {}",
                category,
                name,
                kind.category()
            );
            return Err(RegistryError::CategoryMismatch {
                requested: category,
                built: kind.category(),
                name: name.to_string(),
            });
        }
        Ok(Arc::new(SceneObject::new(name, kind)))
    }

    /// `true` if `(category, name)` resolves.
    pub fn contains(&self, category: ObjectCategory, name: &str) -> bool {
        self.factories
            .read()
            .expect("registry lock poisoned")
            .contains_key(&(category, name.to_string()))
    }

    /// Registered names in `category`, sorted.
    pub fn type_names(&self, category: ObjectCategory) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .expect("registry lock poisoned")
            .keys()
            .filter(|(c, _)| *c == category)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of registered `(category, name)` pairs.
    pub fn len(&self) -> usize {
        self.factories.read().expect("registry lock poisoned").len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, category: ObjectCategory, name: &str, factory: Factory) {
        let replaced = self
            .factories
            .write()
            .expect("registry lock poisoned")
            .insert((category, name.to_string()), factory)
            .is_some();
        if replaced {
            log::debug!("TypeRegistry: {} '{}' overridden", category, name);
        } else {
            log::trace!("TypeRegistry: registered {} '{}'", category, name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommitError;
    use crate::kernel::KernelHandle;
    use crate::object::{CompileScope, CompiledForm};
    use crate::testing::{context_with, NullKernel};

    struct Tagged(&'static str);

    impl ObjectKind for Tagged {
        fn category(&self) -> ObjectCategory {
            ObjectCategory::Light
        }

        fn compile(&self, _scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
            Ok(CompiledForm::new(KernelHandle::new(self.0)))
        }
    }

    fn tag_of(object: &ObjectRef) -> &'static str {
        let ctx = context_with(NullKernel);
        object.commit(&ctx).unwrap();
        *object
            .compiled()
            .unwrap()
            .handle()
            .downcast_ref::<&'static str>()
            .unwrap()
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = TypeRegistry::new();
        registry.register(ObjectCategory::Light, "spot", || Box::new(Tagged("first")));
        registry.register(ObjectCategory::Light, "spot", || Box::new(Tagged("second")));

        assert_eq!(registry.len(), 1);
        let light = registry.create(ObjectCategory::Light, "spot").unwrap();
        assert_eq!(tag_of(&light), "second");
    }

    #[test]
    fn test_unknown_type_is_recoverable() {
        let registry = TypeRegistry::new();
        registry.register(ObjectCategory::Light, "spot", || Box::new(Tagged("spot")));
        let err = registry.create(ObjectCategory::Material, "spot").unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownType {
                category: ObjectCategory::Material,
                name: "spot".to_string(),
            }
        );
    }

    #[test]
    fn test_factory_of_another_category_is_refused() {
        let registry = TypeRegistry::new();
        registry.register(ObjectCategory::Material, "glow", || Box::new(Tagged("light")));
        let err = registry.create(ObjectCategory::Material, "glow").unwrap_err();
        assert_eq!(
            err,
            RegistryError::CategoryMismatch {
                requested: ObjectCategory::Material,
                built: ObjectCategory::Light,
                name: "glow".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "material type 'glow' is registered with a light factory"
        );
    }

    #[test]
    fn test_aliases_share_a_factory_and_keep_their_name() {
        let registry = TypeRegistry::new();
        registry.register_aliases(ObjectCategory::Light, &["point", "PointLight"], || {
            Box::new(Tagged("point"))
        });
        let light = registry.create(ObjectCategory::Light, "PointLight").unwrap();
        assert_eq!(light.type_name(), "PointLight");
        assert_eq!(
            registry.type_names(ObjectCategory::Light),
            vec!["PointLight".to_string(), "point".to_string()]
        );
    }

    #[test]
    fn test_register_table_in_order() {
        fn a() -> Box<dyn ObjectKind> {
            Box::new(Tagged("a"))
        }
        fn b() -> Box<dyn ObjectKind> {
            Box::new(Tagged("b"))
        }
        let registry = TypeRegistry::new();
        registry.register_table(&[
            TypeRegistration {
                category: ObjectCategory::Light,
                names: &["ambient", "shared"],
                factory: a,
            },
            TypeRegistration {
                category: ObjectCategory::Light,
                names: &["shared"],
                factory: b,
            },
        ]);
        assert!(registry.contains(ObjectCategory::Light, "ambient"));
        let shared = registry.create(ObjectCategory::Light, "shared").unwrap();
        assert_eq!(tag_of(&shared), "b");
    }
}
