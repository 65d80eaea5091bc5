//! Frame partitioning and the RGBA pixel buffer
//!
//! A frame is split into a grid of equally sized tiles. When the window size
//! is not a multiple of the tile size the leftover right/bottom strips belong
//! to no tile and keep whatever the buffer held before.

use crate::BYTES_PER_PIXEL;

/// Rectangular block of pixels rendered by a single worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Position in row-major dispatch order
    pub index: usize,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Tile {
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// Tile layout for a frame of a given size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    block_width: usize,
    block_height: usize,
    cols: usize,
    rows: usize,
}

impl TileGrid {
    /// Derive the grid from the frame size and worker count.
    ///
    /// Each block side is the frame side divided by `sqrt(workers)`,
    /// truncated, so roughly one tile per worker fits on screen.
    pub fn new(width: usize, height: usize, workers: usize) -> Self {
        let side = (workers.max(1) as f64).sqrt();
        let block_width = ((width as f64 / side) as usize).max(1);
        let block_height = ((height as f64 / side) as usize).max(1);

        Self {
            width,
            height,
            block_width,
            block_height,
            cols: width / block_width,
            rows: height / block_height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn block_size(&self) -> (usize, usize) {
        (self.block_width, self.block_height)
    }

    /// Tiles across and down
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn tile_count(&self) -> usize {
        self.cols * self.rows
    }

    /// True when the tiles cover every pixel of the frame
    pub fn is_exact(&self) -> bool {
        self.cols * self.block_width == self.width && self.rows * self.block_height == self.height
    }

    /// Pixels that belong to no tile
    pub fn uncovered_pixels(&self) -> usize {
        self.width * self.height - self.tile_count() * self.block_width * self.block_height
    }

    /// Tiles in dispatch order: left to right, top to bottom
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.tile_count()).map(move |index| Tile {
            index,
            x: (index % self.cols) * self.block_width,
            y: (index / self.cols) * self.block_height,
            width: self.block_width,
            height: self.block_height,
        })
    }
}

/// Row-major RGBA8 frame, origin top-left
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Create a buffer of opaque black pixels
    pub fn new(width: usize, height: usize) -> Self {
        let mut pixels = vec![0; width * height * BYTES_PER_PIXEL];
        for px in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            px[3] = 255;
        }
        Self { width, height, pixels }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA bytes of one pixel
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * BYTES_PER_PIXEL;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    #[cfg(test)]
    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = (y * self.width + x) * BYTES_PER_PIXEL;
        self.pixels[i..i + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    /// Split the buffer into one disjoint mutable view per tile, in the
    /// grid's dispatch order.
    ///
    /// # Panics
    /// If `grid` was built for a different frame size.
    pub fn tile_views<'a>(&'a mut self, grid: &TileGrid) -> Vec<TileView<'a>> {
        assert_eq!(
            (self.width, self.height),
            (grid.width, grid.height),
            "tile grid does not match the pixel buffer"
        );

        let mut views: Vec<TileView<'a>> = grid
            .tiles()
            .map(|tile| TileView { tile, rows: Vec::with_capacity(tile.height) })
            .collect();
        if views.is_empty() {
            return views;
        }

        let stride = self.width * BYTES_PER_PIXEL;
        let segment = grid.block_width * BYTES_PER_PIXEL;
        let covered_rows = grid.rows * grid.block_height;

        for (y, row) in self.pixels.chunks_exact_mut(stride).take(covered_rows).enumerate() {
            let first = (y / grid.block_height) * grid.cols;
            for (col, part) in row.chunks_exact_mut(segment).take(grid.cols).enumerate() {
                views[first + col].rows.push(part);
            }
        }

        views
    }
}

/// Exclusive access to the pixels of one tile
#[derive(Debug)]
pub struct TileView<'a> {
    tile: Tile,
    rows: Vec<&'a mut [u8]>,
}

impl TileView<'_> {
    pub fn tile(&self) -> &Tile {
        &self.tile
    }

    /// Write a pixel at tile-local coordinates
    pub fn put(&mut self, local_x: usize, local_y: usize, rgba: [u8; 4]) {
        let i = local_x * BYTES_PER_PIXEL;
        self.rows[local_y][i..i + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(view: &mut TileView<'_>, rgba: [u8; 4]) {
        for row in &mut view.rows {
            for px in row.chunks_exact_mut(BYTES_PER_PIXEL) {
                px.copy_from_slice(&rgba);
            }
        }
    }

    fn coverage(grid: &TileGrid) -> Vec<u32> {
        let mut counts = vec![0u32; grid.width() * grid.height()];
        for tile in grid.tiles() {
            assert!(tile.x + tile.width <= grid.width());
            assert!(tile.y + tile.height <= grid.height());
            for y in tile.y..tile.y + tile.height {
                for x in tile.x..tile.x + tile.width {
                    counts[y * grid.width() + x] += 1;
                }
            }
        }
        counts
    }

    #[test]
    fn test_block_size_from_workers() {
        let grid = TileGrid::new(512, 512, 16);
        assert_eq!(grid.block_size(), (128, 128));
        assert_eq!(grid.dimensions(), (4, 4));
        assert!(grid.is_exact());
    }

    #[test]
    fn test_zero_workers_treated_as_one() {
        let grid = TileGrid::new(64, 48, 0);
        assert_eq!(grid.block_size(), (64, 48));
        assert_eq!(grid.tile_count(), 1);
    }

    #[test]
    fn test_exact_grids_cover_every_pixel_once() {
        let mut exact_cases = 0;
        for &(w, h) in &[(64, 64), (128, 96), (240, 160), (512, 512), (300, 200), (81, 27)] {
            for workers in 1..=16 {
                let grid = TileGrid::new(w, h, workers);
                let counts = coverage(&grid);
                assert!(counts.iter().all(|&c| c <= 1), "overlap for {}x{} / {}", w, h, workers);
                if grid.is_exact() {
                    exact_cases += 1;
                    assert!(counts.iter().all(|&c| c == 1), "gap for {}x{} / {}", w, h, workers);
                    assert_eq!(grid.uncovered_pixels(), 0);
                } else {
                    let gaps = counts.iter().filter(|&&c| c == 0).count();
                    assert_eq!(gaps, grid.uncovered_pixels());
                }
            }
        }
        assert!(exact_cases > 10);
    }

    #[test]
    fn test_inexact_grid_leaves_remainder() {
        // 512 / sqrt(12) = 147.8 -> 147 wide blocks, 3 across, 71 columns left
        let grid = TileGrid::new(512, 512, 12);
        assert!(!grid.is_exact());
        assert_eq!(grid.block_size(), (147, 147));
        assert_eq!(grid.uncovered_pixels(), 512 * 512 - 9 * 147 * 147);
    }

    #[test]
    fn test_tiles_are_row_major() {
        let grid = TileGrid::new(100, 100, 4);
        let origins: Vec<(usize, usize)> = grid.tiles().map(|t| (t.x, t.y)).collect();
        assert_eq!(origins, vec![(0, 0), (50, 0), (0, 50), (50, 50)]);
    }

    #[test]
    fn test_tile_views_write_disjoint_regions() {
        let grid = TileGrid::new(30, 20, 4);
        let mut buffer = PixelBuffer::new(30, 20);
        for mut view in buffer.tile_views(&grid) {
            let id = view.tile().index as u8 + 1;
            let (w, h) = (view.tile().width, view.tile().height);
            for y in 0..h {
                for x in 0..w {
                    view.put(x, y, [id, 0, 0, 255]);
                }
            }
        }

        for tile in grid.tiles() {
            for y in tile.y..tile.y + tile.height {
                for x in tile.x..tile.x + tile.width {
                    assert_eq!(buffer.pixel(x, y)[0], tile.index as u8 + 1);
                }
            }
        }
    }

    #[test]
    fn test_tile_views_leave_remainder_untouched() {
        // 3 workers: blocks of 17x11 on a 30x20 frame
        let grid = TileGrid::new(30, 20, 3);
        let mut buffer = PixelBuffer::new(30, 20);
        buffer.set_pixel(29, 19, [9, 9, 9, 255]);
        for mut view in buffer.tile_views(&grid) {
            fill(&mut view, [255, 255, 255, 255]);
        }
        assert_eq!(buffer.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(buffer.pixel(29, 19), [9, 9, 9, 255]);
    }

    #[test]
    fn test_new_buffer_is_opaque() {
        let buffer = PixelBuffer::new(4, 2);
        assert_eq!(buffer.as_bytes().len(), 4 * 2 * 4);
        assert_eq!(buffer.pixel(3, 1), [0, 0, 0, 255]);
    }
}
