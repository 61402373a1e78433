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


//! Fixtures for unit tests in this crate.

use crate::context::RenderContext;
use crate::error::KernelError;
use crate::framebuffer::Tile;
use crate::kernel::*;
use crate::math::Aabb;
use crate::registry::TypeRegistry;
use std::sync::Arc;

/// A kernel that compiles everything to `()` and renders nothing.
pub(crate) struct NullKernel;

impl ComputeKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn compile_geometry(&self, _desc: &GeometryDesc) -> Result<KernelObject, KernelError> {
        Ok(KernelObject {
            handle: KernelHandle::new(()),
            bounds: Aabb::INVALID,
        })
    }

    fn compile_volume(&self, _desc: &VolumeDesc) -> Result<KernelObject, KernelError> {
        Ok(KernelObject {
            handle: KernelHandle::new(()),
            bounds: Aabb::INVALID,
        })
    }

    fn compile_material(&self, _desc: &MaterialDesc) -> Result<KernelHandle, KernelError> {
        Ok(KernelHandle::new(()))
    }

    fn compile_light(&self, _desc: &LightDesc) -> Result<KernelHandle, KernelError> {
        Ok(KernelHandle::new(()))
    }

    fn compile_camera(&self, _desc: &CameraDesc) -> Result<KernelHandle, KernelError> {
        Ok(KernelHandle::new(()))
    }

    fn compile_world(&self, desc: &WorldDesc) -> Result<KernelObject, KernelError> {
        Ok(KernelObject {
            handle: KernelHandle::new(()),
            bounds: desc.bounds,
        })
    }

    fn compile_renderer(&self, _desc: &RendererDesc) -> Result<KernelHandle, KernelError> {
        Ok(KernelHandle::new(()))
    }

    fn render_tile(
        &self,
        tile: &mut Tile,
        _renderer: &KernelHandle,
        _camera: &KernelHandle,
        _world: &KernelHandle,
    ) -> Result<(), KernelError> {
        tile.validate()
    }
}

pub(crate) fn context_with(kernel: impl ComputeKernel + 'static) -> RenderContext {
    RenderContext::new(Arc::new(TypeRegistry::new()), Arc::new(kernel))
}
