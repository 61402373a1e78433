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


//! The renderer handle.

use crate::error::RenderError;
use crate::job::RenderJob;
use tessera_core::context::RenderContext;
use tessera_core::framebuffer::FrameBuffer;
use tessera_core::object::{ObjectCategory, ObjectRef, RendererKind};

/// Names of the bindings a render job needs.
pub const WORLD_BINDING: &str = "world";
/// See [`WORLD_BINDING`].
pub const CAMERA_BINDING: &str = "camera";

/// A renderer-category scene object with the renderer operations on top.
#[derive(Debug, Clone)]
pub struct Renderer {
    object: ObjectRef,
}

impl Renderer {
    /// Wraps `object`, failing if its kind is not a renderer.
    pub fn new(object: ObjectRef) -> Result<Self, RenderError> {
        if object.as_renderer().is_none() {
            return Err(RenderError::NotARenderer {
                object_type: object.type_name().to_string(),
            });
        }
        Ok(Self { object })
    }

    /// Creates a renderer of `type_name` through the context's registry.
    pub fn create(context: &RenderContext, type_name: &str) -> Result<Self, RenderError> {
        Self::new(context.create(ObjectCategory::Renderer, type_name)?)
    }

    /// The underlying scene object.
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// The renderer's implementation family.
    pub fn family(&self) -> &'static str {
        self.kind().family()
    }

    /// Creates a material supported by this renderer's family.
    ///
    /// Returns `None` if the family does not support `type_name` or the
    /// resolved type is not registered; callers pick a fallback.
    pub fn create_material(&self, context: &RenderContext, type_name: &str) -> Option<ObjectRef> {
        let resolved = self.kind().resolve_material(type_name);
        self.create_scoped(context, ObjectCategory::Material, type_name, resolved)
    }

    /// Creates a light supported by this renderer's family.
    ///
    /// Same fallback contract as [`create_material`](Self::create_material).
    pub fn create_light(&self, context: &RenderContext, type_name: &str) -> Option<ObjectRef> {
        let resolved = self.kind().resolve_light(type_name);
        self.create_scoped(context, ObjectCategory::Light, type_name, resolved)
    }

    /// Snapshots the committed renderer, world and camera into a job for
    /// `frame_buffer`.
    ///
    /// Fails with [`RenderError::MissingRequiredBinding`] if `world` or
    /// `camera` is not bound, and with a commit error if the renderer or a
    /// binding has never been committed. The frame buffer is not touched.
    pub fn create_render_job(
        &self,
        frame_buffer: &FrameBuffer,
        tile_size: u32,
    ) -> Result<RenderJob, RenderError> {
        let world = self.binding(WORLD_BINDING)?;
        let camera = self.binding(CAMERA_BINDING)?;

        let renderer = self.object.require_compiled()?;
        let world = world.require_compiled()?;
        let camera = camera.require_compiled()?;
        if self.object.is_stale() {
            log::warn!(
                "Renderer '{}': a light was re-committed after the renderer",
                self.object.type_name()
            );
        }

        Ok(RenderJob::new(
            renderer,
            camera,
            world,
            frame_buffer.size(),
            tile_size,
        ))
    }

    fn binding(&self, binding: &'static str) -> Result<ObjectRef, RenderError> {
        self.object
            .object_param(binding)
            .ok_or_else(|| RenderError::MissingRequiredBinding {
                renderer: self.object.type_name().to_string(),
                binding,
            })
    }

    fn kind(&self) -> &dyn RendererKind {
        self.object
            .as_renderer()
            .expect("checked in Renderer::new")
    }

    fn create_scoped(
        &self,
        context: &RenderContext,
        category: ObjectCategory,
        requested: &str,
        resolved: Option<String>,
    ) -> Option<ObjectRef> {
        let Some(resolved) = resolved else {
            log::debug!(
                "Renderer '{}': {} type '{}' not supported by family '{}'",
                self.object.type_name(),
                category,
                requested,
                self.family()
            );
            return None;
        };
        match context.create(category, &resolved) {
            Ok(object) => Some(object),
            Err(err) => {
                log::warn!("Renderer '{}': {}", self.object.type_name(), err);
                None
            }
        }
    }
}
