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


//! The public-facing Software Development Kit (SDK) for Tessera.
//!
//! A [`Device`] owns the [`RenderContext`] every scene object is created and
//! committed against. Object creation goes through the device so the caller
//! never touches the registry or the compute kernel directly.

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tessera_core::framebuffer::FrameBuffer;
use tessera_core::kernel::ComputeKernel;
use tessera_core::math::Extent2D;
use tessera_core::object::{ObjectCategory, ObjectRef};
use tessera_core::registry::TypeRegistry;
use tessera_core::RenderContext;
use tessera_infra::CpuKernel;
use tessera_lanes::Renderer;

pub mod prelude {
    //! The types most applications need, in one import.
    pub use crate::Device;
    pub use tessera_control::{
        make_local_spheres, Coordinator, DomainDecomposition, FrameError, FrameStatus,
        ParameterSync, RankTopology, SphereSettings, SyncedValue,
    };
    pub use tessera_core::collective::Collective;
    pub use tessera_core::config::EngineConfig;
    pub use tessera_core::framebuffer::FrameBuffer;
    pub use tessera_core::math::{Extent2D, LinearRgba, Vec3, Vec3i};
    pub use tessera_core::object::{ObjectCategory, ObjectRef};
    pub use tessera_core::param::DataBuffer;
    pub use tessera_core::platform::Presenter;
    pub use tessera_infra::{HeadlessPresenter, ImagePresenter, LocalGroup, SingleRank};
    pub use tessera_lanes::{CancelToken, Renderer};
    pub use tessera_telemetry::{init_logging, FrameStats, FrameTelemetry, TelemetrySummary};
}

/// The entry point for building scenes.
#[derive(Debug, Clone)]
pub struct Device {
    context: RenderContext,
}

impl Device {
    /// A device on the reference CPU kernel with every packaged type installed.
    pub fn new() -> Self {
        Self::with_kernel(Arc::new(CpuKernel::new()))
    }

    /// A device on `kernel` with every packaged type installed.
    pub fn with_kernel(kernel: Arc<dyn ComputeKernel>) -> Self {
        let registry = Arc::new(TypeRegistry::new());
        tessera_plugins::install(&registry);
        log::debug!(
            "Device: {} types registered on kernel '{}'",
            registry.len(),
            kernel.name()
        );
        Self {
            context: RenderContext::new(registry, kernel),
        }
    }

    /// The context objects are created and committed against.
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Creates a renderer.
    pub fn new_renderer(&self, type_name: &str) -> Result<Renderer> {
        Renderer::create(&self.context, type_name)
            .with_context(|| format!("creating renderer '{type_name}'"))
    }

    /// Creates a material resolved through `renderer`'s family.
    pub fn new_material(&self, renderer: &Renderer, type_name: &str) -> Result<ObjectRef> {
        renderer
            .create_material(&self.context, type_name)
            .ok_or_else(|| {
                anyhow!(
                    "renderer '{}' has no material '{type_name}'",
                    renderer.object().type_name()
                )
            })
    }

    /// Creates a light resolved through `renderer`'s family.
    pub fn new_light(&self, renderer: &Renderer, type_name: &str) -> Result<ObjectRef> {
        renderer
            .create_light(&self.context, type_name)
            .ok_or_else(|| {
                anyhow!(
                    "renderer '{}' has no light '{type_name}'",
                    renderer.object().type_name()
                )
            })
    }

    /// Creates a geometry.
    pub fn new_geometry(&self, type_name: &str) -> Result<ObjectRef> {
        self.create(ObjectCategory::Geometry, type_name)
    }

    /// Creates a volume.
    pub fn new_volume(&self, type_name: &str) -> Result<ObjectRef> {
        self.create(ObjectCategory::Volume, type_name)
    }

    /// Creates a camera.
    pub fn new_camera(&self, type_name: &str) -> Result<ObjectRef> {
        self.create(ObjectCategory::Camera, type_name)
    }

    /// Creates an empty world.
    pub fn new_world(&self) -> Result<ObjectRef> {
        self.create(ObjectCategory::World, "world")
    }

    /// Commits `object`, returning its new epoch.
    pub fn commit(&self, object: &ObjectRef) -> Result<u64> {
        object
            .commit(&self.context)
            .with_context(|| format!("committing {} '{}'", object.category(), object.type_name()))
    }

    /// A transparent frame buffer of `size`.
    pub fn frame_buffer(&self, size: Extent2D) -> FrameBuffer {
        FrameBuffer::new(size)
    }

    fn create(&self, category: ObjectCategory, type_name: &str) -> Result<ObjectRef> {
        self.context
            .create(category, type_name)
            .with_context(|| format!("creating {category} '{type_name}'"))
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}
