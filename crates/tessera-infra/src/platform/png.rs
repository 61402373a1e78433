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


use std::path::{Path, PathBuf};
use tessera_core::error::PresentError;
use tessera_core::framebuffer::FrameBuffer;
use tessera_core::math::Extent2D;
use tessera_core::platform::Presenter;

/// Writes every presented frame as `frame_NNNN.png` into a directory.
#[derive(Debug)]
pub struct ImagePresenter {
    size: Extent2D,
    directory: PathBuf,
    written: u64,
    max_frames: Option<u64>,
}

impl ImagePresenter {
    /// Creates the output directory if needed.
    pub fn new(directory: impl Into<PathBuf>, size: Extent2D) -> Result<Self, PresentError> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory).map_err(|e| {
            PresentError::Backend(format!("cannot create '{}': {e}", directory.display()))
        })?;
        Ok(Self {
            size,
            directory,
            written: 0,
            max_frames: None,
        })
    }

    /// Asks the frame loop to stop after `frames` images.
    #[must_use]
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// The output directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the `index`-th image.
    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.directory.join(format!("frame_{index:04}.png"))
    }
}

impl Presenter for ImagePresenter {
    fn size(&self) -> Extent2D {
        self.size
    }

    fn present(&mut self, frame: &FrameBuffer) -> Result<(), PresentError> {
        self.check_size(frame)?;
        let image = image::RgbaImage::from_raw(self.size.width, self.size.height, frame.to_rgba8())
            .ok_or_else(|| PresentError::Backend("pixel buffer does not match frame size".into()))?;
        let path = self.frame_path(self.written);
        image
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| PresentError::Backend(format!("cannot write '{}': {e}", path.display())))?;
        log::debug!("ImagePresenter: wrote {}", path.display());
        self.written += 1;
        Ok(())
    }

    fn should_close(&self) -> bool {
        self.max_frames.is_some_and(|n| self.written >= n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::math::LinearRgba;

    #[test]
    fn test_writes_numbered_png() {
        let dir = std::env::temp_dir().join(format!("tessera-image-{}", std::process::id()));
        let size = Extent2D::new(4, 3);
        let mut presenter = ImagePresenter::new(&dir, size).unwrap().with_max_frames(1);
        let mut frame = FrameBuffer::new(size);
        frame.clear(LinearRgba::WHITE);
        presenter.present(&frame).unwrap();

        let written = image::open(presenter.frame_path(0)).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (4, 3));
        assert_eq!(written.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert!(presenter.should_close());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
