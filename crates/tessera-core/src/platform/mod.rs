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


//! The presentation boundary: whatever displays or stores composited frames.

use crate::error::PresentError;
use crate::framebuffer::FrameBuffer;
use crate::math::Extent2D;

/// A display collaborator fed with one composited frame per frame.
pub trait Presenter: Send {
    /// The pixel size frames must have.
    fn size(&self) -> Extent2D;

    /// Displays (or stores) a composited frame.
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), PresentError>;

    /// `true` once the presenter wants the frame loop to stop.
    fn should_close(&self) -> bool {
        false
    }

    /// Fails with `SizeMismatch` if `frame` does not match [`size`](Self::size).
    fn check_size(&self, frame: &FrameBuffer) -> Result<(), PresentError> {
        let expected = self.size();
        let found = frame.size();
        if expected == found {
            Ok(())
        } else {
            Err(PresentError::SizeMismatch {
                expected: (expected.width, expected.height),
                found: (found.width, found.height),
            })
        }
    }
}
