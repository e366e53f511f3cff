//! # Frame Loop
//!
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. BEGIN FRAME                                                      │
//! │    └─ Measure real elapsed time, clamp to frame.max_delta           │
//! │                                                                     │
//! │ 2. SCENE TICK                                                       │
//! │    ├─ Ordered systems over the world                                │
//! │    ├─ Water runners                                                 │
//! │    └─ Flush queued entity changes                                   │
//! │                                                                     │
//! │ 3. END FRAME                                                        │
//! │    └─ Record timing, warn on slow frames                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exactly one tick runs per frame. A long stall produces one clamped step,
//! never a burst of catch-up steps.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::assets::SpriteProvider;
use crate::config::FrameConfig;
use crate::scene::Scene;

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Timing of one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Scene tick time in microseconds.
    pub sim_us: u64,
    /// Timestep handed to the scene, in seconds.
    pub delta_time: f32,
    /// Frame number.
    pub frame: u64,
    /// Live entities after the flush.
    pub entities: usize,
}

/// Drives a [`Scene`] one tick per frame.
#[derive(Debug)]
pub struct FrameLoop {
    config: FrameConfig,
    /// Frame counter.
    frame_count: u64,
    /// Last frame start time.
    last_frame_time: Instant,
    /// Accumulated frame statistics.
    stats_accumulator: FrameStatsAccumulator,
}

impl FrameLoop {
    /// Creates a frame loop with the given timing.
    #[must_use]
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            last_frame_time: Instant::now(),
            stats_accumulator: FrameStatsAccumulator::new(),
        }
    }

    /// Starts a frame and returns the clamped timestep.
    pub fn begin_frame(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time);
        self.last_frame_time = now;

        // Clamp so a stall cannot blow up the integration
        delta.as_secs_f32().min(self.config.max_delta)
    }

    /// Runs one frame with the real elapsed time.
    pub fn run_frame<P: SpriteProvider>(&mut self, scene: &mut Scene<P>) -> FrameStats {
        let dt = self.begin_frame();
        self.step(scene, dt)
    }

    /// Runs one frame with the configured fixed timestep.
    pub fn run_fixed<P: SpriteProvider>(&mut self, scene: &mut Scene<P>) -> FrameStats {
        self.last_frame_time = Instant::now();
        let dt = self.config.fixed_dt;
        self.step(scene, dt)
    }

    fn step<P: SpriteProvider>(&mut self, scene: &mut Scene<P>, dt: f32) -> FrameStats {
        let frame_start = self.last_frame_time;
        let sim_start = Instant::now();
        scene.tick(dt);
        let sim_us = sim_start.elapsed().as_micros() as u64;

        let stats = FrameStats {
            total_us: frame_start.elapsed().as_micros() as u64,
            sim_us,
            delta_time: dt,
            frame: self.frame_count,
            entities: scene.world.manager.entity_count(),
        };
        self.end_frame(stats);
        stats
    }

    /// Ends the current frame.
    ///
    /// Records timing and prepares for next frame.
    pub fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        self.stats_accumulator.record(stats);

        let slow_us = (f64::from(self.config.slow_frame_ms) * 1000.0) as u64;
        if stats.total_us > slow_us {
            warn!(
                frame = self.frame_count,
                frame_ms = stats.total_us as f64 / 1000.0,
                sim_ms = stats.sim_us as f64 / 1000.0,
                budget_ms = TARGET_FRAME_TIME.as_micros() as f64 / 1000.0,
                "Frame exceeded budget"
            );
        }
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of scene tick times.
    pub sim_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            sim_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.sim_us_sum += stats.sim_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);

        if stats.total_us > TARGET_FRAME_TIME.as_micros() as u64 {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average scene tick time in milliseconds.
    #[must_use]
    pub fn avg_sim_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.sim_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the percentage of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a summary of the statistics.
    pub fn log_summary(&self) {
        let min_ms = if self.frames_recorded == 0 {
            0.0
        } else {
            self.min_frame_us as f64 / 1000.0
        };
        info!(
            frames = self.frames_recorded,
            avg_frame_ms = self.avg_frame_ms(),
            avg_sim_ms = self.avg_sim_ms(),
            avg_fps = self.avg_fps(),
            min_frame_ms = min_ms,
            max_frame_ms = self.max_frame_us as f64 / 1000.0,
            over_budget = self.frames_over_budget,
            over_budget_pct = self.over_budget_ratio() * 100.0,
            "Frame statistics"
        );
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetRegistry;
    use crate::config::SimConfig;

    #[test]
    fn test_frame_loop_creation() {
        let frame_loop = FrameLoop::new(FrameConfig::default());
        assert_eq!(frame_loop.frame_count(), 0);
        assert_eq!(frame_loop.stats().frames_recorded, 0);
    }

    #[test]
    fn test_delta_is_clamped() {
        let config = FrameConfig {
            max_delta: 0.0,
            ..FrameConfig::default()
        };
        let mut frame_loop = FrameLoop::new(config);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(frame_loop.begin_frame(), 0.0);
    }

    #[test]
    fn test_frame_cycle() {
        let mut scene = Scene::new(SimConfig::default(), AssetRegistry::default()).unwrap();
        let mut frame_loop = FrameLoop::new(scene.world.config.frame);

        let stats = frame_loop.run_fixed(&mut scene);
        assert_eq!(stats.frame, 0);
        assert!((stats.delta_time - scene.world.config.frame.fixed_dt).abs() < f32::EPSILON);

        let stats = frame_loop.run_frame(&mut scene);
        assert_eq!(stats.frame, 1);
        assert!(stats.delta_time <= scene.world.config.frame.max_delta);
        assert_eq!(frame_loop.frame_count(), 2);
        assert_eq!(scene.frame(), 2);
    }

    #[test]
    fn test_stats_accumulator() {
        let mut acc = FrameStatsAccumulator::new();

        for i in 0..100 {
            acc.record(FrameStats {
                total_us: 10_000 + (i * 100),
                sim_us: 5000,
                delta_time: 0.017,
                frame: i,
                entities: 10,
            });
        }

        assert_eq!(acc.frames_recorded, 100);
        assert!(acc.avg_fps() > 50.0);
        assert!(acc.avg_fps() < 100.0);
        assert!((acc.avg_sim_ms() - 5.0).abs() < 1e-9);
        assert_eq!(acc.min_frame_us, 10_000);
    }
}
