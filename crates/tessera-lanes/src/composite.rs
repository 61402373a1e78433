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


//! Merging the partial frames rendered by every rank into one image.

use crate::error::RenderError;
use tessera_core::framebuffer::FrameBuffer;

/// The frame one rank rendered against its local data.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialFrame {
    /// The rank that rendered the frame.
    pub rank: usize,
    /// Its color and depth.
    pub frame: FrameBuffer,
}

/// Combines partial frames into a target frame buffer.
pub trait Compositor: Send + Sync {
    /// Writes the composite of `partials` into `target`.
    ///
    /// `target` is left untouched on error.
    fn composite(&self, partials: &[PartialFrame], target: &mut FrameBuffer) -> Result<(), RenderError>;
}

/// Sort-last depth compositing: per pixel, the nearest depth wins.
///
/// Equal depths resolve to the lower rank, so pixels no rank hit show the
/// lowest rank's background.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthCompositor;

impl Compositor for DepthCompositor {
    fn composite(&self, partials: &[PartialFrame], target: &mut FrameBuffer) -> Result<(), RenderError> {
        let size = target.size();
        if let Some(bad) = partials.iter().find(|p| p.frame.size() != size) {
            return Err(RenderError::FrameSizeMismatch {
                expected: size,
                found: bad.frame.size(),
            });
        }

        let mut ordered: Vec<&PartialFrame> = partials.iter().collect();
        ordered.sort_by_key(|p| p.rank);
        let Some((first, rest)) = ordered.split_first() else {
            return Ok(());
        };

        let mut color = first.frame.color().to_vec();
        let mut depth = first.frame.depth().to_vec();
        for partial in rest {
            let pixels = partial.frame.color().iter().zip(partial.frame.depth());
            for (i, (c, d)) in pixels.enumerate() {
                if *d < depth[i] {
                    color[i] = *c;
                    depth[i] = *d;
                }
            }
        }

        if let Some(composited) = FrameBuffer::from_parts(size, color, depth) {
            *target = composited;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::framebuffer::{Tile, TileRect};
    use tessera_core::math::{Extent2D, LinearRgba};

    fn frame(size: Extent2D, hits: &[(u32, u32, LinearRgba, f32)], bg: LinearRgba) -> FrameBuffer {
        let mut fb = FrameBuffer::new(size);
        fb.clear(bg);
        let mut tile = Tile::new(TileRect::new(0, 0, size.width, size.height), size);
        for y in 0..size.height {
            for x in 0..size.width {
                let (color, depth) = hits
                    .iter()
                    .find(|h| h.0 == x && h.1 == y)
                    .map_or((bg, f32::INFINITY), |h| (h.2, h.3));
                tile.write(x, y, color, depth);
            }
        }
        fb.write_tile(&tile);
        fb
    }

    #[test]
    fn test_nearest_depth_wins() {
        let size = Extent2D::new(2, 1);
        let red = LinearRgba::rgb(1.0, 0.0, 0.0);
        let blue = LinearRgba::rgb(0.0, 0.0, 1.0);
        let partials = [
            PartialFrame {
                rank: 0,
                frame: frame(size, &[(0, 0, red, 2.0)], LinearRgba::BLACK),
            },
            PartialFrame {
                rank: 1,
                frame: frame(size, &[(0, 0, blue, 1.0), (1, 0, blue, 5.0)], LinearRgba::BLACK),
            },
        ];
        let mut target = FrameBuffer::new(size);
        DepthCompositor.composite(&partials, &mut target).unwrap();
        assert_eq!(target.pixel(0, 0), Some(blue));
        assert_eq!(target.pixel(1, 0), Some(blue));
        assert_eq!(target.depth_at(0, 0), Some(1.0));
    }

    #[test]
    fn test_ties_go_to_lower_rank_regardless_of_order() {
        let size = Extent2D::new(1, 1);
        let a = LinearRgba::rgb(0.1, 0.2, 0.3);
        let b = LinearRgba::rgb(0.9, 0.8, 0.7);
        let partials = [
            PartialFrame {
                rank: 3,
                frame: frame(size, &[], b),
            },
            PartialFrame {
                rank: 1,
                frame: frame(size, &[], a),
            },
        ];
        let mut target = FrameBuffer::new(size);
        DepthCompositor.composite(&partials, &mut target).unwrap();
        assert_eq!(target.pixel(0, 0), Some(a));
    }

    #[test]
    fn test_size_mismatch_leaves_target() {
        let mut target = FrameBuffer::new(Extent2D::new(2, 2));
        target.clear(LinearRgba::WHITE);
        let before = target.clone();
        let partials = [PartialFrame {
            rank: 0,
            frame: FrameBuffer::new(Extent2D::new(1, 1)),
        }];
        assert!(matches!(
            DepthCompositor.composite(&partials, &mut target),
            Err(RenderError::FrameSizeMismatch { .. })
        ));
        assert_eq!(target, before);
    }
}
