use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use glint_renderer::{SplitHeuristic, TraceConfig};
use log::LevelFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// KD-tree split strategy as spelled on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Heuristic {
    Sah,
    Median,
}

impl From<Heuristic> for SplitHeuristic {
    fn from(heuristic: Heuristic) -> Self {
        match heuristic {
            Heuristic::Sah => SplitHeuristic::SurfaceArea,
            Heuristic::Median => SplitHeuristic::Median,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "glint")]
#[command(about = "Whitted-style recursive ray tracer")]
pub struct Args {
    /// Image width in pixels
    #[arg(long, default_value = "640")]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value = "360")]
    pub height: u32,

    /// Trace configuration as JSON; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Reflection/refraction recursion depth
    #[arg(short, long)]
    pub depth: Option<i32>,

    /// Sub-pixel grid size (N gives N x N samples)
    #[arg(short, long)]
    pub samples: Option<u32>,

    /// Jitter samples within their grid cell
    #[arg(long)]
    pub jitter: bool,

    /// Stop sampling a pixel once it settles
    #[arg(long)]
    pub adaptive: bool,

    /// Disable KD-tree acceleration
    #[arg(long)]
    pub no_accel: bool,

    #[arg(long, value_enum)]
    pub heuristic: Option<Heuristic>,

    /// Cool-to-warm shading instead of Phong
    #[arg(long)]
    pub stylized: bool,

    /// Image used for every face of the environment cube map
    #[arg(long)]
    pub sky: Option<PathBuf>,

    /// Spread rows over all cores instead of tracing them in order
    #[arg(long)]
    pub parallel: bool,

    /// Stop rendering after this many seconds and save what is done
    #[arg(long)]
    pub time_limit: Option<f32>,

    #[arg(short, long, default_value = "glint.png")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    /// Apply command line overrides on top of `config`.
    pub fn apply(&self, mut config: TraceConfig) -> TraceConfig {
        if let Some(depth) = self.depth {
            config = config.with_max_depth(depth);
        }
        if let Some(samples) = self.samples {
            config = config.with_samples(samples);
        }
        if let Some(heuristic) = self.heuristic {
            config = config.with_heuristic(heuristic.into());
        }
        if self.jitter {
            config = config.with_jitter(true);
        }
        if self.adaptive {
            config = config.with_adaptive(true);
        }
        if self.no_accel {
            config = config.with_acceleration(false);
        }
        if self.stylized {
            config = config.with_stylized(true);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "glint",
            "--depth",
            "5",
            "-s",
            "3",
            "--adaptive",
            "--no-accel",
            "--heuristic",
            "median",
        ]);
        let config = args.apply(TraceConfig::default().with_jitter(true));

        assert_eq!(config.max_depth, 5);
        assert_eq!(config.samples, 3);
        assert!(config.adaptive);
        assert!(config.jitter);
        assert!(!config.acceleration);
        assert_eq!(config.heuristic, SplitHeuristic::Median);
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let args = Args::parse_from(["glint"]);
        let base = TraceConfig::default().with_samples(2);
        assert_eq!(args.apply(base.clone()), base);
        assert_eq!(args.output, PathBuf::from("glint.png"));
    }
}
