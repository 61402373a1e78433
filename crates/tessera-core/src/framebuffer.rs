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

//! Frame buffers and the tiles they are rendered in.

use crate::error::KernelError;
use crate::math::{Extent2D, LinearRgba};

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 64;

/// A pixel rectangle inside a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TileRect {
    /// Creates a rectangle.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered.
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// `true` if the pixel lies inside the rectangle.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Number of tile columns and rows needed to cover `size`.
pub fn tile_counts(size: Extent2D, tile_size: u32) -> (u32, u32) {
    let edge = tile_size.max(1);
    (size.width.div_ceil(edge), size.height.div_ceil(edge))
}

/// Partitions `size` into row-major tiles of edge `tile_size`.
///
/// The last column and row are clipped to the buffer, never padded, so the
/// tiles never overlap and cover every pixel exactly once.
pub fn tile_grid(size: Extent2D, tile_size: u32) -> Vec<TileRect> {
    let edge = tile_size.max(1);
    let (columns, rows) = tile_counts(size, edge);
    let mut tiles = Vec::with_capacity(columns as usize * rows as usize);
    for row in 0..rows {
        for column in 0..columns {
            let x = column * edge;
            let y = row * edge;
            tiles.push(TileRect::new(
                x,
                y,
                edge.min(size.width - x),
                edge.min(size.height - y),
            ));
        }
    }
    tiles
}

/// Color and depth for the pixels of one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    rect: TileRect,
    frame_size: Extent2D,
    color: Vec<LinearRgba>,
    depth: Vec<f32>,
}

impl Tile {
    /// A transparent tile at infinite depth.
    pub fn new(rect: TileRect, frame_size: Extent2D) -> Self {
        Self {
            rect,
            frame_size,
            color: vec![LinearRgba::TRANSPARENT; rect.area()],
            depth: vec![f32::INFINITY; rect.area()],
        }
    }

    /// The pixel rectangle.
    pub fn rect(&self) -> TileRect {
        self.rect
    }

    /// Size of the frame buffer the tile belongs to.
    pub fn frame_size(&self) -> Extent2D {
        self.frame_size
    }

    /// Row-major colors.
    pub fn color(&self) -> &[LinearRgba] {
        &self.color
    }

    /// Row-major depths (ray distance, infinity when nothing was hit).
    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    /// Writes one pixel, addressed in frame coordinates.
    pub fn write(&mut self, x: u32, y: u32, color: LinearRgba, depth: f32) {
        if !self.rect.contains(x, y) {
            return;
        }
        let i = ((y - self.rect.y) * self.rect.width + (x - self.rect.x)) as usize;
        self.color[i] = color;
        self.depth[i] = depth;
    }

    /// Fails if the channels do not match the rectangle.
    pub fn validate(&self) -> Result<(), KernelError> {
        let expected = self.rect.area();
        for found in [self.color.len(), self.depth.len()] {
            if found != expected {
                return Err(KernelError::TileShape { expected, found });
            }
        }
        Ok(())
    }
}

/// A two-dimensional color + depth pixel grid of immutable size.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    size: Extent2D,
    color: Vec<LinearRgba>,
    depth: Vec<f32>,
}

impl FrameBuffer {
    /// A transparent buffer at infinite depth.
    pub fn new(size: Extent2D) -> Self {
        Self {
            size,
            color: vec![LinearRgba::TRANSPARENT; size.area()],
            depth: vec![f32::INFINITY; size.area()],
        }
    }

    /// Builds a buffer from existing channels, `None` if their length is wrong.
    pub fn from_parts(size: Extent2D, color: Vec<LinearRgba>, depth: Vec<f32>) -> Option<Self> {
        (color.len() == size.area() && depth.len() == size.area()).then_some(Self {
            size,
            color,
            depth,
        })
    }

    /// The buffer's size.
    pub fn size(&self) -> Extent2D {
        self.size
    }

    /// Row-major colors.
    pub fn color(&self) -> &[LinearRgba] {
        &self.color
    }

    /// Row-major depths.
    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    /// Resets every pixel to `color` at infinite depth.
    pub fn clear(&mut self, color: LinearRgba) {
        self.color.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    /// Color at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<LinearRgba> {
        self.index(x, y).map(|i| self.color[i])
    }

    /// Depth at `(x, y)`.
    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i])
    }

    /// Copies a rendered tile into the buffer.
    ///
    /// Rows or columns of the tile that fall outside the buffer are skipped.
    pub fn write_tile(&mut self, tile: &Tile) {
        let rect = tile.rect();
        let width = rect.width.min(self.size.width.saturating_sub(rect.x)) as usize;
        let rows = rect.height.min(self.size.height.saturating_sub(rect.y));
        for row in 0..rows {
            let src = (row * rect.width) as usize;
            let dst = ((rect.y + row) * self.size.width + rect.x) as usize;
            self.color[dst..dst + width].copy_from_slice(&tile.color[src..src + width]);
            self.depth[dst..dst + width].copy_from_slice(&tile.depth[src..src + width]);
        }
    }

    /// 8-bit sRGB pixels, row-major RGBA.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.color.iter().flat_map(|c| c.to_srgba8()).collect()
    }

    /// Raw bytes for transfer: every color, then every depth.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size.area() * 20);
        bytes.extend_from_slice(bytemuck::cast_slice(&self.color));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.depth));
        bytes
    }

    /// Inverse of [`to_bytes`](Self::to_bytes), `None` on a length mismatch.
    pub fn from_bytes(size: Extent2D, bytes: &[u8]) -> Option<Self> {
        let color_len = size.area() * std::mem::size_of::<LinearRgba>();
        if bytes.len() != color_len + size.area() * std::mem::size_of::<f32>() {
            return None;
        }
        let (color, depth) = bytes.split_at(color_len);
        let color = color
            .chunks_exact(std::mem::size_of::<LinearRgba>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        let depth = depth
            .chunks_exact(std::mem::size_of::<f32>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        Self::from_parts(size, color, depth)
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.size.width && y < self.size.height)
            .then(|| (y * self.size.width + x) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tile_grid_clips_last_row_and_column() {
        let tiles = tile_grid(Extent2D::new(130, 70), 64);
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles[2], TileRect::new(128, 0, 2, 64));
        assert_eq!(tiles[5], TileRect::new(128, 64, 2, 6));
    }

    #[test]
    fn test_tile_grid_covers_each_pixel_once() {
        let size = Extent2D::new(100, 37);
        let tiles = tile_grid(size, 16);
        let mut seen = HashSet::new();
        for rect in &tiles {
            for y in rect.y..rect.y + rect.height {
                for x in rect.x..rect.x + rect.width {
                    assert!(seen.insert((x, y)), "pixel ({x}, {y}) covered twice");
                }
            }
        }
        assert_eq!(seen.len(), size.area());
    }

    #[test]
    fn test_empty_buffer_has_no_tiles() {
        assert!(tile_grid(Extent2D::new(0, 10), 64).is_empty());
    }

    #[test]
    fn test_write_tile_places_pixels() {
        let size = Extent2D::new(4, 4);
        let mut fb = FrameBuffer::new(size);
        let mut tile = Tile::new(TileRect::new(2, 2, 2, 2), size);
        tile.write(3, 3, LinearRgba::WHITE, 1.5);
        tile.write(0, 0, LinearRgba::WHITE, 1.0);
        fb.write_tile(&tile);

        assert_eq!(fb.pixel(3, 3), Some(LinearRgba::WHITE));
        assert_eq!(fb.depth_at(3, 3), Some(1.5));
        assert_eq!(fb.pixel(0, 0), Some(LinearRgba::TRANSPARENT));
        assert_eq!(fb.pixel(4, 0), None);
    }

    #[test]
    fn test_bytes_transfer() {
        let size = Extent2D::new(3, 2);
        let mut fb = FrameBuffer::new(size);
        fb.clear(LinearRgba::rgb(0.25, 0.5, 0.75));
        let decoded = FrameBuffer::from_bytes(size, &fb.to_bytes()).unwrap();
        assert_eq!(decoded, fb);
        assert!(FrameBuffer::from_bytes(Extent2D::new(2, 2), &fb.to_bytes()).is_none());
    }

    #[test]
    fn test_tile_validate() {
        let tile = Tile::new(TileRect::new(0, 0, 8, 8), Extent2D::new(8, 8));
        assert!(tile.validate().is_ok());
    }
}
