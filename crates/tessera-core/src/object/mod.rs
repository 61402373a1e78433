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

//! The scene-object lifecycle: untyped parameter assignment, then an explicit
//! commit that validates the parameters and publishes a compiled form.
//!
//! A [`SceneObject`] pairs a type-erased [`ObjectKind`] (what the object *is*,
//! produced by the [`TypeRegistry`](crate::registry::TypeRegistry)) with the
//! state shared by every kind: parameters, the published compiled form and a
//! commit epoch.

mod compiled;

pub use compiled::{CompileScope, CompiledForm, Dependency};

use crate::context::RenderContext;
use crate::error::CommitError;
use crate::param::{ParamSet, ParamValue};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

/// Shared ownership of a scene object; the form object references take.
pub type ObjectRef = Arc<SceneObject>;

/// The category a registered type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectCategory {
    /// Owns materials and lights; creates render jobs.
    Renderer,
    /// Surface appearance.
    Material,
    /// Light source.
    Light,
    /// Volumetric field.
    Volume,
    /// Surface geometry.
    Geometry,
    /// Viewpoint and projection.
    Camera,
    /// Collection of geometries and volumes.
    World,
}

impl ObjectCategory {
    /// Every category, in declaration order.
    pub const ALL: [ObjectCategory; 7] = [
        ObjectCategory::Renderer,
        ObjectCategory::Material,
        ObjectCategory::Light,
        ObjectCategory::Volume,
        ObjectCategory::Geometry,
        ObjectCategory::Camera,
        ObjectCategory::World,
    ];

    /// Lowercase name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectCategory::Renderer => "renderer",
            ObjectCategory::Material => "material",
            ObjectCategory::Light => "light",
            ObjectCategory::Volume => "volume",
            ObjectCategory::Geometry => "geometry",
            ObjectCategory::Camera => "camera",
            ObjectCategory::World => "world",
        }
    }
}

impl fmt::Display for ObjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The behavior behind a registered type name.
///
/// Kinds are stateless with respect to parameters: everything they need is
/// read from the [`CompileScope`] during [`compile`](ObjectKind::compile).
pub trait ObjectKind: Send + Sync + 'static {
    /// The category this kind belongs to.
    fn category(&self) -> ObjectCategory;

    /// Validates the parameter snapshot and compiles it through the kernel.
    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError>;

    /// Renderer-specific behavior, for kinds in the `Renderer` category.
    fn as_renderer(&self) -> Option<&dyn RendererKind> {
        None
    }
}

/// Extension implemented by renderer kinds.
///
/// Material and light creation is scoped to a renderer's implementation
/// family: the renderer maps a requested type name onto the registry name it
/// supports, or refuses it.
pub trait RendererKind: Send + Sync {
    /// The implementation family (e.g. `"scivis"`).
    fn family(&self) -> &'static str;

    /// Maps a requested material type onto a registered material type.
    fn resolve_material(&self, requested: &str) -> Option<String>;

    /// Maps a requested light type onto a registered light type.
    fn resolve_light(&self, requested: &str) -> Option<String>;
}

/// A parameterized, committable scene object.
pub struct SceneObject {
    id: Uuid,
    type_name: String,
    kind: Box<dyn ObjectKind>,
    params: RwLock<ParamSet>,
    revision: AtomicU64,
    compiled: RwLock<Option<Arc<CompiledForm>>>,
    epoch: AtomicU64,
    commit_lock: Mutex<()>,
}

impl SceneObject {
    /// Creates an uncommitted object of `kind`, registered as `type_name`.
    pub fn new(type_name: impl Into<String>, kind: Box<dyn ObjectKind>) -> Self {
        Self {
            id: Uuid::new_v4(),
            type_name: type_name.into(),
            kind,
            params: RwLock::new(ParamSet::new()),
            revision: AtomicU64::new(0),
            compiled: RwLock::new(None),
            epoch: AtomicU64::new(0),
            commit_lock: Mutex::new(()),
        }
    }

    /// Unique identity of this object.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The type name the object was created under.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The category of the object's kind.
    pub fn category(&self) -> ObjectCategory {
        self.kind.category()
    }

    /// The object's kind.
    pub fn kind(&self) -> &dyn ObjectKind {
        self.kind.as_ref()
    }

    /// Renderer behavior, if this object is a renderer.
    pub fn as_renderer(&self) -> Option<&dyn RendererKind> {
        self.kind.as_renderer()
    }

    /// Stores or overwrites a parameter. Never fails.
    pub fn set(&self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let mut params = self.params.write().expect("parameter lock poisoned");
        params.set(name, value);
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    /// Removes a parameter, returning its previous value.
    pub fn remove(&self, name: &str) -> Option<ParamValue> {
        let mut params = self.params.write().expect("parameter lock poisoned");
        let removed = params.remove(name);
        if removed.is_some() {
            self.revision.fetch_add(1, Ordering::AcqRel);
        }
        removed
    }

    /// Returns a copy of a parameter's current value.
    pub fn param(&self, name: &str) -> Option<ParamValue> {
        self.params
            .read()
            .expect("parameter lock poisoned")
            .get(name)
            .cloned()
    }

    /// Returns the object bound to `name`, if that parameter holds one.
    pub fn object_param(&self, name: &str) -> Option<ObjectRef> {
        match self.param(name) {
            Some(ParamValue::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Compiles the current parameters and publishes the result.
    ///
    /// On success the commit epoch advances and is returned. On failure the
    /// previously published compiled form, if any, stays in place.
    pub fn commit(&self, context: &RenderContext) -> Result<u64, CommitError> {
        let _serialized = self.commit_lock.lock().expect("commit lock poisoned");

        let (snapshot, revision) = {
            let params = self.params.read().expect("parameter lock poisoned");
            (params.clone(), self.revision.load(Ordering::Acquire))
        };

        let mut scope = CompileScope::new(&self.type_name, &snapshot, context);
        let form = match self.kind.compile(&mut scope) {
            Ok(form) => form.finish(scope.into_dependencies(), revision),
            Err(err) => {
                log::warn!("Commit of '{}' ({}) failed: {}", self.type_name, self.id, err);
                return Err(err);
            }
        };

        let mut published = self.compiled.write().expect("compiled form lock poisoned");
        *published = Some(Arc::new(form));
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        drop(published);

        log::debug!(
            "Committed '{}' ({}) at epoch {}",
            self.type_name,
            self.id,
            epoch
        );
        Ok(epoch)
    }

    /// A snapshot of the published compiled form, `None` before the first
    /// successful commit.
    pub fn compiled(&self) -> Option<Arc<CompiledForm>> {
        self.compiled
            .read()
            .expect("compiled form lock poisoned")
            .clone()
    }

    /// Like [`compiled`](Self::compiled), failing with `NotCommitted`.
    pub fn require_compiled(&self) -> Result<Arc<CompiledForm>, CommitError> {
        self.compiled().ok_or_else(|| CommitError::NotCommitted {
            object_type: self.type_name.clone(),
        })
    }

    /// Number of successful commits so far.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// `true` once a commit has succeeded.
    pub fn is_committed(&self) -> bool {
        self.epoch() > 0
    }

    /// `true` if the parameters changed since the published form was compiled.
    pub fn has_pending_changes(&self) -> bool {
        match self.compiled() {
            Some(form) => form.revision() != self.revision.load(Ordering::Acquire),
            None => true,
        }
    }

    /// `true` if an object this one was compiled against has been committed
    /// again since. Re-committing is the caller's decision.
    pub fn is_stale(&self) -> bool {
        self.compiled()
            .is_some_and(|form| form.dependencies().iter().any(Dependency::is_stale))
    }
}

impl fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneObject")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("category", &self.category())
            .field("epoch", &self.epoch())
            .finish()
    }
}
