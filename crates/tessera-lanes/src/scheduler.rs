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


//! The tile worker pool.

use crate::error::RenderError;
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tessera_core::error::KernelError;
use tessera_core::framebuffer::TileRect;

/// A shared flag abandoning the remaining tiles of an in-flight render.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Tiles already being rendered finish; the rest
    /// are skipped.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// `true` once [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clears the flag for the next frame.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Statistics of one scheduled render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Tiles rendered.
    pub tiles: usize,
    /// Workers used.
    pub workers: usize,
    /// Wall time from the first dispatch to the last completion.
    pub elapsed: Duration,
}

/// A bounded pool of workers pulling tiles from a shared queue.
///
/// The pool lives for one job only: each [`run`](Self::run) spawns at most
/// [`workers`](Self::workers) scoped threads, feeds them from a
/// `crossbeam-channel` queue and joins them before returning. No thread
/// outlives the job, so the render closure may borrow the job's snapshots.
/// Tile order is unspecified.
#[derive(Debug, Clone)]
pub struct TileScheduler {
    workers: usize,
}

impl TileScheduler {
    /// A pool of `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Maximum number of workers per run.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Renders every tile with `render`, returning the results in completion
    /// order.
    ///
    /// The first tile error stops the remaining tiles and is returned. A
    /// cancellation observed before all tiles completed returns
    /// [`RenderError::Cancelled`]; results of finished tiles are dropped.
    pub fn run<T, F>(
        &self,
        tiles: &[TileRect],
        cancel: &CancelToken,
        render: F,
    ) -> Result<(Vec<T>, RenderStats), RenderError>
    where
        T: Send,
        F: Fn(TileRect) -> Result<T, KernelError> + Sync,
    {
        let start = Instant::now();
        let workers = self.workers.min(tiles.len()).max(1);

        let (queue_tx, queue_rx) = crossbeam_channel::bounded(tiles.len().max(1));
        for rect in tiles {
            if queue_tx.send(*rect).is_err() {
                break;
            }
        }
        drop(queue_tx);

        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let failed = AtomicBool::new(false);

        let panicked = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let queue = queue_rx.clone();
                    let results = result_tx.clone();
                    let (render, failed) = (&render, &failed);
                    scope.spawn(move || drain(queue, results, render, cancel, failed))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join())
                .filter(Result::is_err)
                .count()
        });
        drop(result_tx);

        if panicked > 0 {
            log::error!("TileScheduler: {panicked} worker(s) panicked");
            return Err(RenderError::WorkerPanicked);
        }

        let mut outputs = Vec::with_capacity(tiles.len());
        for result in result_rx.try_iter() {
            outputs.push(result?);
        }
        if outputs.len() < tiles.len() {
            log::debug!(
                "TileScheduler: cancelled with {}/{} tiles done",
                outputs.len(),
                tiles.len()
            );
            return Err(RenderError::Cancelled {
                completed: outputs.len(),
                total: tiles.len(),
            });
        }

        let stats = RenderStats {
            tiles: outputs.len(),
            workers,
            elapsed: start.elapsed(),
        };
        log::trace!("TileScheduler: {stats:?}");
        Ok((outputs, stats))
    }
}

fn drain<T, F>(
    queue: Receiver<TileRect>,
    results: Sender<Result<T, KernelError>>,
    render: &F,
    cancel: &CancelToken,
    failed: &AtomicBool,
) where
    F: Fn(TileRect) -> Result<T, KernelError>,
{
    while let Ok(rect) = queue.recv() {
        if cancel.is_cancelled() || failed.load(Ordering::Acquire) {
            break;
        }
        let result = render(rect);
        if result.is_err() {
            failed.store(true, Ordering::Release);
        }
        if results.send(result).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tessera_core::framebuffer::tile_grid;
    use tessera_core::math::Extent2D;

    #[test]
    fn test_every_tile_rendered_once() {
        let tiles = tile_grid(Extent2D::new(200, 130), 32);
        let seen = Mutex::new(HashSet::new());
        let scheduler = TileScheduler::new(4);
        let (out, stats) = scheduler
            .run(&tiles, &CancelToken::new(), |rect| {
                assert!(seen.lock().unwrap().insert((rect.x, rect.y)));
                Ok(rect)
            })
            .unwrap();
        assert_eq!(out.len(), tiles.len());
        assert_eq!(stats.tiles, tiles.len());
        assert_eq!(stats.workers, 4);
    }

    #[test]
    fn test_concurrency_never_exceeds_the_pool() {
        let tiles = tile_grid(Extent2D::new(256, 256), 16);
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        TileScheduler::new(3)
            .run(&tiles, &CancelToken::new(), |rect| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_micros(200));
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(rect)
            })
            .unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_workers_capped_by_tile_count() {
        let tiles = tile_grid(Extent2D::new(64, 64), 64);
        let (_, stats) = TileScheduler::new(8)
            .run(&tiles, &CancelToken::new(), Ok)
            .unwrap();
        assert_eq!(stats.workers, 1);
    }

    #[test]
    fn test_first_error_stops_the_job() {
        let tiles = tile_grid(Extent2D::new(256, 256), 16);
        let calls = AtomicUsize::new(0);
        let result = TileScheduler::new(1).run(&tiles, &CancelToken::new(), |rect| {
            calls.fetch_add(1, Ordering::SeqCst);
            if rect.x == 0 && rect.y == 0 {
                Err(KernelError::InvalidInput("bad tile".into()))
            } else {
                Ok(rect)
            }
        });
        assert!(matches!(result, Err(RenderError::Kernel(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_abandons_remaining_tiles() {
        let tiles = tile_grid(Extent2D::new(256, 256), 16);
        let cancel = CancelToken::new();
        let result = TileScheduler::new(1).run(&tiles, &cancel, |rect| {
            cancel.cancel();
            Ok(rect)
        });
        match result {
            Err(RenderError::Cancelled { completed, total }) => {
                assert_eq!(completed, 1);
                assert_eq!(total, tiles.len());
            }
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let tiles = tile_grid(Extent2D::new(64, 64), 32);
        let result: Result<(Vec<()>, _), _> =
            TileScheduler::new(2).run(&tiles, &CancelToken::new(), |_| panic!("boom"));
        assert!(matches!(result, Err(RenderError::WorkerPanicked)));
    }
}
