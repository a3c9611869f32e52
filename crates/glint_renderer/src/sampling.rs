//! Per-pixel anti-aliasing.
//!
//! Pixels are sampled on an N x N sub-pixel grid, optionally jittered. The
//! adaptive mode visits the grid in random order and stops as soon as the
//! luma of the samples drawn so far has settled.

use glint_core::{luma, Color};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::TraceConfig;

/// Luma standard deviation below which adaptive sampling stops.
pub const ADAPTIVE_THRESHOLD: f32 = 0.001;

/// How a pixel is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// One ray through the pixel center.
    Single,
    /// Every cell of a `grid` x `grid` sub-pixel grid.
    Uniform { grid: u32, jitter: bool },
    /// Grid cells in shuffled order until the luma settles.
    Adaptive { grid: u32, jitter: bool },
}

impl SamplingMode {
    pub fn from_config(config: &TraceConfig) -> Self {
        let grid = config.samples;
        let jitter = config.jitter;
        match (grid, config.adaptive) {
            (0 | 1, _) => SamplingMode::Single,
            (_, false) => SamplingMode::Uniform { grid, jitter },
            (_, true) => SamplingMode::Adaptive { grid, jitter },
        }
    }
}

/// Result of sampling one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    /// Average of the samples taken
    pub color: Color,
    /// Number of rays traced
    pub samples: u32,
}

/// Running mean and variance (Welford).
#[derive(Debug, Default)]
struct RunningStats {
    count: u32,
    mean: f32,
    m2: f32,
}

impl RunningStats {
    fn push(&mut self, value: f32) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f32;
        self.m2 += delta * (value - self.mean);
    }

    fn std_dev(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        (self.m2 / self.count as f32).max(0.0).sqrt()
    }
}

/// Turns a pixel into one or more normalized image positions and averages
/// what the tracer returns for them.
#[derive(Debug)]
pub struct PixelSampler {
    mode: SamplingMode,
    rng: StdRng,
}

impl PixelSampler {
    pub fn new(mode: SamplingMode, seed: u64) -> Self {
        Self {
            mode,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &TraceConfig) -> Self {
        Self::new(SamplingMode::from_config(config), config.seed)
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    /// Sample pixel (`i`, `j`) of a `width` x `height` image.
    ///
    /// `trace` maps normalized image coordinates to a color.
    pub fn sample<F>(&mut self, i: u32, j: u32, width: u32, height: u32, mut trace: F) -> PixelSample
    where
        F: FnMut(f32, f32) -> Color,
    {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let (px, py) = (i as f32, j as f32);

        match self.mode {
            SamplingMode::Single => PixelSample {
                color: trace((px + 0.5) / w, (py + 0.5) / h),
                samples: 1,
            },
            SamplingMode::Uniform { grid, jitter } => {
                let mut sum = Color::ZERO;
                for ky in 0..grid {
                    for kx in 0..grid {
                        let (x, y) = self.grid_position(px, py, kx, ky, grid, jitter);
                        sum += trace(x / w, y / h);
                    }
                }
                let samples = grid * grid;
                PixelSample {
                    color: sum / samples as f32,
                    samples,
                }
            }
            SamplingMode::Adaptive { grid, jitter } => {
                let mut cells: Vec<(u32, u32)> = (0..grid)
                    .flat_map(|ky| (0..grid).map(move |kx| (kx, ky)))
                    .collect();
                cells.shuffle(&mut self.rng);

                let mut sum = Color::ZERO;
                let mut stats = RunningStats::default();
                for (kx, ky) in cells {
                    let (x, y) = self.grid_position(px, py, kx, ky, grid, jitter);
                    let color = trace(x / w, y / h);
                    sum += color;
                    stats.push(luma(color));
                    if stats.count >= 2 && stats.std_dev() < ADAPTIVE_THRESHOLD {
                        break;
                    }
                }
                PixelSample {
                    color: sum / stats.count.max(1) as f32,
                    samples: stats.count,
                }
            }
        }
    }

    /// Pixel-space position of grid cell (`kx`, `ky`).
    fn grid_position(&mut self, px: f32, py: f32, kx: u32, ky: u32, grid: u32, jitter: bool) -> (f32, f32) {
        let cell = 1.0 / grid as f32;
        let mut x = px + (kx as f32 + 0.5) * cell;
        let mut y = py + (ky as f32 + 0.5) * cell;
        if jitter {
            let half = 0.5 * cell;
            x += self.rng.gen_range(-half..half);
            y += self.rng.gen_range(-half..half);
        }
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_config() {
        let config = TraceConfig::default();
        assert_eq!(SamplingMode::from_config(&config), SamplingMode::Single);

        let config = config.with_samples(3).with_jitter(true);
        assert_eq!(
            SamplingMode::from_config(&config),
            SamplingMode::Uniform { grid: 3, jitter: true }
        );

        let config = config.with_adaptive(true);
        assert!(matches!(SamplingMode::from_config(&config), SamplingMode::Adaptive { grid: 3, .. }));
    }

    #[test]
    fn test_single_sample_at_pixel_center() {
        let mut sampler = PixelSampler::new(SamplingMode::Single, 0);
        let mut seen = Vec::new();
        let result = sampler.sample(1, 2, 4, 4, |x, y| {
            seen.push((x, y));
            Color::ONE
        });
        assert_eq!(result.samples, 1);
        assert_eq!(seen, vec![(1.5 / 4.0, 2.5 / 4.0)]);
    }

    #[test]
    fn test_uniform_grid_positions_stay_in_pixel() {
        let mut sampler = PixelSampler::new(SamplingMode::Uniform { grid: 4, jitter: true }, 7);
        let mut count = 0;
        let result = sampler.sample(3, 5, 10, 10, |x, y| {
            count += 1;
            assert!((0.3..=0.4).contains(&x), "x = {x}");
            assert!((0.5..=0.6).contains(&y), "y = {y}");
            Color::splat(x)
        });
        assert_eq!(count, 16);
        assert_eq!(result.samples, 16);
    }

    #[test]
    fn test_uniform_averages_samples() {
        let mut sampler = PixelSampler::new(SamplingMode::Uniform { grid: 2, jitter: false }, 0);
        // Left half black, right half white
        let result = sampler.sample(0, 0, 1, 1, |x, _| if x < 0.5 { Color::ZERO } else { Color::ONE });
        assert!((result.color - Color::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn test_adaptive_stops_early_on_flat_region() {
        let mut sampler = PixelSampler::new(SamplingMode::Adaptive { grid: 4, jitter: false }, 1);
        let result = sampler.sample(0, 0, 8, 8, |_, _| Color::new(0.2, 0.4, 0.6));
        assert_eq!(result.samples, 2);
        assert!((result.color - Color::new(0.2, 0.4, 0.6)).length() < 1e-6);
    }

    #[test]
    fn test_adaptive_uses_whole_grid_on_noisy_region() {
        let mut sampler = PixelSampler::new(SamplingMode::Adaptive { grid: 3, jitter: false }, 2);
        let mut flip = false;
        let result = sampler.sample(0, 0, 1, 1, |_, _| {
            flip = !flip;
            if flip { Color::ONE } else { Color::ZERO }
        });
        assert_eq!(result.samples, 9);
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.push(v);
        }
        assert!((stats.mean - 5.0).abs() < 1e-5);
        assert!((stats.std_dev() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_same_seed_same_jitter() {
        let positions = |seed| {
            let mut sampler = PixelSampler::new(SamplingMode::Uniform { grid: 2, jitter: true }, seed);
            let mut seen = Vec::new();
            sampler.sample(0, 0, 1, 1, |x, y| {
                seen.push((x, y));
                Color::ZERO
            });
            seen
        };
        assert_eq!(positions(11), positions(11));
        assert_ne!(positions(11), positions(12));
    }
}
