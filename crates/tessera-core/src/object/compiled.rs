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

//! Compiled forms and the scope an object kind compiles in.

use super::{ObjectRef, SceneObject};
use crate::context::RenderContext;
use crate::error::{CommitError, KernelError};
use crate::kernel::{ComputeKernel, KernelHandle};
use crate::math::Aabb;
use crate::param::{ParamReader, ParamSet};
use std::sync::{Arc, Weak};

/// A committed object's dependency on another object's compiled form.
#[derive(Debug, Clone)]
pub struct Dependency {
    param: String,
    object: Weak<SceneObject>,
    epoch: u64,
}

impl Dependency {
    /// The parameter through which the dependency was reached.
    pub fn param(&self) -> &str {
        &self.param
    }

    /// The commit epoch of the dependency when it was consumed.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The dependency, if it is still alive.
    pub fn object(&self) -> Option<ObjectRef> {
        self.object.upgrade()
    }

    /// `true` if the dependency was dropped or committed again since.
    pub fn is_stale(&self) -> bool {
        self.object
            .upgrade()
            .map_or(true, |object| object.epoch() != self.epoch)
    }
}

/// The read-only result of a successful commit.
///
/// Published behind an `Arc`; readers keep their snapshot alive for as long
/// as they render with it, so a concurrent re-commit never invalidates an
/// in-flight tile.
#[derive(Debug)]
pub struct CompiledForm {
    handle: KernelHandle,
    bounds: Option<Aabb>,
    dependencies: Vec<Dependency>,
    revision: u64,
}

impl CompiledForm {
    /// Wraps a kernel handle without bounds.
    pub fn new(handle: KernelHandle) -> Self {
        Self {
            handle,
            bounds: None,
            dependencies: Vec::new(),
            revision: 0,
        }
    }

    /// Attaches spatial bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// The kernel-owned compiled state.
    pub fn handle(&self) -> &KernelHandle {
        &self.handle
    }

    /// The bounds reported by the kernel, for geometries, volumes and worlds.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// The objects whose compiled forms this form was built from.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// The parameter revision this form was compiled from.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn finish(mut self, dependencies: Vec<Dependency>, revision: u64) -> Self {
        self.dependencies = dependencies;
        self.revision = revision;
        self
    }
}

/// Everything an [`ObjectKind`](super::ObjectKind) may read while compiling.
pub struct CompileScope<'a> {
    type_name: &'a str,
    params: &'a ParamSet,
    context: &'a RenderContext,
    dependencies: Vec<Dependency>,
}

impl<'a> CompileScope<'a> {
    pub(crate) fn new(type_name: &'a str, params: &'a ParamSet, context: &'a RenderContext) -> Self {
        Self {
            type_name,
            params,
            context,
            dependencies: Vec::new(),
        }
    }

    /// The registered type name of the object being committed.
    pub fn type_name(&self) -> &'a str {
        self.type_name
    }

    /// Typed access to the parameter snapshot.
    pub fn params(&self) -> ParamReader<'a> {
        self.params.reader(self.type_name)
    }

    /// The context the commit runs in.
    pub fn context(&self) -> &'a RenderContext {
        self.context
    }

    /// The compute kernel compiled state is marshalled to.
    pub fn kernel(&self) -> &'a dyn ComputeKernel {
        self.context.kernel()
    }

    /// Wraps a kernel failure for this object.
    pub fn kernel_error(&self, source: KernelError) -> CommitError {
        CommitError::Kernel {
            object_type: self.type_name.to_string(),
            source,
        }
    }

    /// Consumes the compiled form of `object`, reached through `param`.
    ///
    /// Fails with `UncommittedDependency` if `object` was never committed.
    pub fn depend_on(
        &mut self,
        param: &str,
        object: &ObjectRef,
    ) -> Result<Arc<CompiledForm>, CommitError> {
        // Epoch first: a commit racing with us can only make the record stale.
        let epoch = object.epoch();
        let compiled = object
            .compiled()
            .ok_or_else(|| CommitError::UncommittedDependency {
                object_type: self.type_name.to_string(),
                param: param.to_string(),
                dependency: object.type_name().to_string(),
            })?;
        self.dependencies.push(Dependency {
            param: param.to_string(),
            object: Arc::downgrade(object),
            epoch,
        });
        Ok(compiled)
    }

    /// Reads an optional object parameter and consumes its compiled form.
    pub fn optional_dependency(
        &mut self,
        param: &str,
    ) -> Result<Option<Arc<CompiledForm>>, CommitError> {
        match self.params().object(param)? {
            Some(object) => self.depend_on(param, &object).map(Some),
            None => Ok(None),
        }
    }

    /// Reads an object-list parameter (empty when unset) and consumes every
    /// element's compiled form.
    pub fn dependency_list(&mut self, param: &str) -> Result<Vec<Arc<CompiledForm>>, CommitError> {
        let objects = self.params().objects_or(param, Vec::new())?;
        objects
            .iter()
            .map(|object| self.depend_on(param, object))
            .collect()
    }

    pub(crate) fn into_dependencies(self) -> Vec<Dependency> {
        self.dependencies
    }
}
