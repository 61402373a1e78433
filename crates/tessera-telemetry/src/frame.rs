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


//! Per-frame statistics and a rolling window over them.

use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

/// What one rank spent on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    /// Frame index, starting at 0.
    pub frame: u64,
    /// The rank that recorded the stats.
    pub rank: usize,
    /// Samples per pixel applied for the frame.
    pub spp: i32,
    /// Objects re-committed before rendering.
    pub recommitted: usize,
    /// Tiles rendered.
    pub tiles: usize,
    /// Tile workers used.
    pub workers: usize,
    /// Time in the parameter broadcast.
    pub sync: Duration,
    /// Time rendering local tiles.
    pub render: Duration,
    /// Time gathering and compositing.
    pub composite: Duration,
    /// Whole frame.
    pub total: Duration,
}

/// Averages over a [`FrameTelemetry`] window, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TelemetrySummary {
    /// Frames recorded since creation.
    pub frames: u64,
    /// Frames in the window.
    pub window: usize,
    /// Average broadcast time.
    pub sync_ms: f64,
    /// Average render time.
    pub render_ms: f64,
    /// Average compositing time.
    pub composite_ms: f64,
    /// Average frame time.
    pub total_ms: f64,
    /// Frames per second implied by `total_ms`.
    pub fps: f64,
}

/// A rolling window of frame statistics with a periodic log summary.
#[derive(Debug)]
pub struct FrameTelemetry {
    window: VecDeque<FrameStats>,
    capacity: usize,
    log_every: u64,
    frames: u64,
}

impl FrameTelemetry {
    /// Keeps the last `capacity` frames and logs a summary every `log_every`
    /// frames (`0` disables logging).
    pub fn new(capacity: usize, log_every: u64) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            log_every,
            frames: 0,
        }
    }

    /// Records a frame.
    pub fn record(&mut self, stats: FrameStats) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(stats);
        self.frames += 1;
        if self.log_every > 0 && self.frames % self.log_every == 0 {
            let summary = self.summary();
            log::info!(
                "Telemetry: rank {} frame {}: {:.2} ms/frame ({:.1} fps), render {:.2} ms, sync {:.2} ms, composite {:.2} ms",
                stats.rank,
                stats.frame,
                summary.total_ms,
                summary.fps,
                summary.render_ms,
                summary.sync_ms,
                summary.composite_ms
            );
        }
    }

    /// The most recent frame.
    pub fn last(&self) -> Option<&FrameStats> {
        self.window.back()
    }

    /// Frames recorded since creation.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Averages over the window.
    pub fn summary(&self) -> TelemetrySummary {
        let n = self.window.len();
        if n == 0 {
            return TelemetrySummary::default();
        }
        let mean = |f: fn(&FrameStats) -> Duration| {
            self.window.iter().map(|s| f(s).as_secs_f64()).sum::<f64>() * 1000.0 / n as f64
        };
        let total_ms = mean(|s| s.total);
        TelemetrySummary {
            frames: self.frames,
            window: n,
            sync_ms: mean(|s| s.sync),
            render_ms: mean(|s| s.render),
            composite_ms: mean(|s| s.composite),
            total_ms,
            fps: if total_ms > 0.0 { 1000.0 / total_ms } else { 0.0 },
        }
    }

    /// The summary as a JSON document.
    pub fn summary_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.summary())
    }
}

impl Default for FrameTelemetry {
    fn default() -> Self {
        Self::new(120, 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(i: u64, total_ms: u64) -> FrameStats {
        FrameStats {
            frame: i,
            total: Duration::from_millis(total_ms),
            render: Duration::from_millis(total_ms / 2),
            ..FrameStats::default()
        }
    }

    #[test]
    fn test_window_rolls_over() {
        let mut telemetry = FrameTelemetry::new(2, 0);
        telemetry.record(frame(0, 100));
        telemetry.record(frame(1, 10));
        telemetry.record(frame(2, 30));
        let summary = telemetry.summary();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.window, 2);
        assert!((summary.total_ms - 20.0).abs() < 1e-9);
        assert!((summary.fps - 50.0).abs() < 1e-9);
        assert_eq!(telemetry.last().map(|s| s.frame), Some(2));
    }

    #[test]
    fn test_empty_summary() {
        let telemetry = FrameTelemetry::default();
        assert_eq!(telemetry.summary(), TelemetrySummary::default());
        let json = telemetry.summary_json().unwrap();
        assert!(json.contains("\"frames\":0"));
    }
}
