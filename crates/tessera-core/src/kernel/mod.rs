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

//! The compute kernel boundary.
//!
//! Object kinds never intersect rays or sample fields themselves. They
//! marshal validated parameters into the descriptor types of [`desc`] and hand
//! them to a [`ComputeKernel`], storing the opaque [`KernelHandle`] it returns
//! in their compiled form.

pub mod desc;

pub use desc::*;

use crate::error::KernelError;
use crate::framebuffer::Tile;
use crate::math::Aabb;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque, shareable state owned by a compute kernel.
#[derive(Clone)]
pub struct KernelHandle(Arc<dyn Any + Send + Sync>);

impl KernelHandle {
    /// Wraps a kernel value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrows the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Borrows the wrapped value as a `T`, or reports which type was expected.
    pub fn expect_ref<T: Any>(&self) -> Result<&T, KernelError> {
        self.downcast_ref::<T>().ok_or(KernelError::HandleMismatch {
            expected: std::any::type_name::<T>(),
        })
    }

    /// `true` if both handles share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for KernelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KernelHandle").finish_non_exhaustive()
    }
}

/// A compiled handle together with the bounds the kernel computed for it.
#[derive(Debug, Clone)]
pub struct KernelObject {
    /// The compiled state.
    pub handle: KernelHandle,
    /// World-space bounds of the compiled primitive or field.
    pub bounds: Aabb,
}

/// The capability performing intersection, sampling and shading.
///
/// Implementations must allow `render_tile` to run concurrently on distinct
/// tiles; every handle they receive is read-only.
pub trait ComputeKernel: Send + Sync {
    /// A short name for diagnostics.
    fn name(&self) -> &str;

    /// Compiles a surface geometry.
    fn compile_geometry(&self, desc: &GeometryDesc) -> Result<KernelObject, KernelError>;

    /// Compiles a volumetric field and computes its bounds.
    fn compile_volume(&self, desc: &VolumeDesc) -> Result<KernelObject, KernelError>;

    /// Compiles a material.
    fn compile_material(&self, desc: &MaterialDesc) -> Result<KernelHandle, KernelError>;

    /// Compiles a light.
    fn compile_light(&self, desc: &LightDesc) -> Result<KernelHandle, KernelError>;

    /// Compiles a camera.
    fn compile_camera(&self, desc: &CameraDesc) -> Result<KernelHandle, KernelError>;

    /// Compiles a world from compiled children.
    fn compile_world(&self, desc: &WorldDesc) -> Result<KernelObject, KernelError>;

    /// Compiles renderer settings.
    fn compile_renderer(&self, desc: &RendererDesc) -> Result<KernelHandle, KernelError>;

    /// Renders the pixels of `tile`, writing color and depth into it.
    fn render_tile(
        &self,
        tile: &mut Tile,
        renderer: &KernelHandle,
        camera: &KernelHandle,
        world: &KernelHandle,
    ) -> Result<(), KernelError>;
}
