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


//! The explicit context passed to every create and commit call.

use crate::error::RegistryError;
use crate::kernel::ComputeKernel;
use crate::object::{ObjectCategory, ObjectRef};
use crate::registry::TypeRegistry;
use std::sync::Arc;

/// The registry and compute kernel a set of scene objects is built against.
///
/// There is no process-wide current device; every operation that needs one
/// receives a `RenderContext`. Cloning is cheap and shares both members.
#[derive(Clone)]
pub struct RenderContext {
    registry: Arc<TypeRegistry>,
    kernel: Arc<dyn ComputeKernel>,
}

impl RenderContext {
    /// Creates a context.
    pub fn new(registry: Arc<TypeRegistry>, kernel: Arc<dyn ComputeKernel>) -> Self {
        Self { registry, kernel }
    }

    /// The type registry.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// The compute kernel.
    pub fn kernel(&self) -> &dyn ComputeKernel {
        self.kernel.as_ref()
    }

    /// A shared handle on the compute kernel.
    pub fn kernel_arc(&self) -> Arc<dyn ComputeKernel> {
        self.kernel.clone()
    }

    /// Creates an object through the registry.
    pub fn create(&self, category: ObjectCategory, name: &str) -> Result<ObjectRef, RegistryError> {
        self.registry.create(category, name)
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("types", &self.registry.len())
            .field("kernel", &self.kernel.name())
            .finish()
    }
}
