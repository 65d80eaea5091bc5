//! Tile scheduler
//!
//! A persistent rayon pool renders the tiles of each frame. Tiles are queued
//! FIFO in row-major order and the call blocks until every tile has finished,
//! so the buffer is complete when `render_frame` returns.

use crate::scene::{Camera, Scene};
use crate::shading::{RenderContext, TileCounters};
use crate::tiles::{PixelBuffer, TileGrid, TileView};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to build render worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Number of hardware threads, or 1 if it cannot be determined
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Counters for one frame, gathered after all of its tiles have joined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub tiles: u64,
    pub pixels: u64,
    pub hits: u64,
    pub elapsed: Duration,
}

/// Totals across every frame rendered by a scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderTotals {
    pub frames: u64,
    pub tiles: u64,
    pub pixels: u64,
    pub hits: u64,
}

#[derive(Debug, Default)]
struct Counters {
    frames: AtomicU64,
    tiles: AtomicU64,
    pixels: AtomicU64,
    hits: AtomicU64,
}

impl Counters {
    fn record_tile(&self, counters: TileCounters) {
        self.tiles.fetch_add(1, Ordering::Relaxed);
        self.pixels.fetch_add(counters.pixels, Ordering::Relaxed);
        self.hits.fetch_add(counters.hits, Ordering::Relaxed);
    }
}

/// Bounded worker pool that renders frames tile by tile
pub struct TileScheduler {
    pool: ThreadPool,
    workers: usize,
    totals: Counters,
}

impl TileScheduler {
    /// Create a scheduler with `workers` threads; 0 is treated as 1
    pub fn new(workers: usize) -> Result<Self, RenderError> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("render-worker-{}", i))
            .build()?;

        log::debug!("Render pool started with {} workers", workers);

        Ok(Self {
            pool,
            workers,
            totals: Counters::default(),
        })
    }

    /// Create a scheduler sized to the machine's hardware concurrency
    pub fn with_available_parallelism() -> Result<Self, RenderError> {
        Self::new(available_workers())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Tile layout this scheduler uses for a frame of the given size
    pub fn grid_for(&self, width: usize, height: usize) -> TileGrid {
        TileGrid::new(width, height, self.workers)
    }

    /// Render one frame of `scene` seen from `camera` into `buffer`.
    ///
    /// The camera is taken by value so the whole frame uses one pose.
    pub fn render_frame(&self, scene: &Scene, camera: Camera, buffer: &mut PixelBuffer) -> FrameStats {
        let grid = self.grid_for(buffer.width(), buffer.height());
        let ctx = RenderContext::new(scene, camera, buffer.width(), buffer.height());
        self.for_each_tile(&grid, buffer, |view| ctx.shade_tile(view))
    }

    /// Run `render` once per tile of `grid` on the pool and wait for all of
    /// them. Tiles are queued in row-major order.
    pub fn for_each_tile<F>(&self, grid: &TileGrid, buffer: &mut PixelBuffer, render: F) -> FrameStats
    where
        F: Fn(&mut TileView<'_>) -> TileCounters + Sync,
    {
        let start = Instant::now();
        let frame = Counters::default();
        let views = buffer.tile_views(grid);

        self.pool.scope_fifo(|scope| {
            for mut view in views {
                let render = &render;
                let frame = &frame;
                scope.spawn_fifo(move |_| {
                    frame.record_tile(render(&mut view));
                });
            }
        });

        let stats = FrameStats {
            tiles: frame.tiles.load(Ordering::Relaxed),
            pixels: frame.pixels.load(Ordering::Relaxed),
            hits: frame.hits.load(Ordering::Relaxed),
            elapsed: start.elapsed(),
        };

        self.totals.frames.fetch_add(1, Ordering::Relaxed);
        self.totals.tiles.fetch_add(stats.tiles, Ordering::Relaxed);
        self.totals.pixels.fetch_add(stats.pixels, Ordering::Relaxed);
        self.totals.hits.fetch_add(stats.hits, Ordering::Relaxed);

        stats
    }

    pub fn totals(&self) -> RenderTotals {
        RenderTotals {
            frames: self.totals.frames.load(Ordering::Relaxed),
            tiles: self.totals.tiles.load(Ordering::Relaxed),
            pixels: self.totals.pixels.load(Ordering::Relaxed),
            hits: self.totals.hits.load(Ordering::Relaxed),
        }
    }
}
