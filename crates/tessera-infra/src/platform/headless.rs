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


use tessera_core::error::PresentError;
use tessera_core::framebuffer::FrameBuffer;
use tessera_core::math::Extent2D;
use tessera_core::platform::Presenter;

/// Keeps the last presented frame in memory.
#[derive(Debug)]
pub struct HeadlessPresenter {
    size: Extent2D,
    last: Option<FrameBuffer>,
    presented: u64,
    close_after: Option<u64>,
}

impl HeadlessPresenter {
    /// A presenter that never asks to close.
    pub fn new(size: Extent2D) -> Self {
        Self {
            size,
            last: None,
            presented: 0,
            close_after: None,
        }
    }

    /// Asks the frame loop to stop once `frames` frames were presented.
    #[must_use]
    pub fn close_after(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }

    /// The most recently presented frame.
    pub fn last_frame(&self) -> Option<&FrameBuffer> {
        self.last.as_ref()
    }

    /// Number of frames presented.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Presenter for HeadlessPresenter {
    fn size(&self) -> Extent2D {
        self.size
    }

    fn present(&mut self, frame: &FrameBuffer) -> Result<(), PresentError> {
        self.check_size(frame)?;
        self.last = Some(frame.clone());
        self.presented += 1;
        Ok(())
    }

    fn should_close(&self) -> bool {
        self.close_after.is_some_and(|n| self.presented >= n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closes_after_limit() {
        let size = Extent2D::new(2, 2);
        let mut presenter = HeadlessPresenter::new(size).close_after(2);
        let frame = FrameBuffer::new(size);
        presenter.present(&frame).unwrap();
        assert!(!presenter.should_close());
        presenter.present(&frame).unwrap();
        assert!(presenter.should_close());
        assert_eq!(presenter.last_frame(), Some(&frame));
    }

    #[test]
    fn test_rejects_wrong_size() {
        let mut presenter = HeadlessPresenter::new(Extent2D::new(2, 2));
        let err = presenter
            .present(&FrameBuffer::new(Extent2D::new(3, 2)))
            .unwrap_err();
        assert!(matches!(err, PresentError::SizeMismatch { .. }));
        assert_eq!(presenter.presented(), 0);
    }
}
