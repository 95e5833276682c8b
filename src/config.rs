//! Command-line arguments and validated runtime configuration.

use crate::audio::AnalyserOptions;
use crate::player::DEFAULT_VOLUME;
use crate::visual::DENSITY;
use clap::Parser;

/// Samples buffered between the capture stream and the audio graph.
pub const ELEMENT_CAPACITY: usize = 8192;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "particle-visualizer")]
#[command(about = "Audio-reactive particle field", long_about = None)]
pub struct Args {
    /// Input device feeding the visualizer (default input if omitted)
    #[arg(long, value_name = "NAME")]
    pub input_device: Option<String>,

    /// Output device the signal is routed to (default output if omitted)
    #[arg(long, value_name = "NAME")]
    pub output_device: Option<String>,

    /// Gain applied to the audible output (0 mutes the monitor)
    #[arg(long, value_name = "GAIN", default_value_t = 1.0)]
    pub monitor_gain: f32,

    /// Initial playback volume; scales what the analyser sees
    #[arg(long, value_name = "LEVEL", default_value_t = DEFAULT_VOLUME)]
    pub volume: f32,

    /// Analyser FFT size (power of two, 32..=32768)
    #[arg(long, value_name = "N", default_value_t = 512)]
    pub fft_size: usize,

    /// Analyser smoothing time constant
    #[arg(long, value_name = "TAU", default_value_t = 0.8)]
    pub smoothing: f32,

    #[arg(long, value_name = "DB", default_value_t = -100.0, allow_hyphen_values = true)]
    pub min_decibels: f32,

    #[arg(long, value_name = "DB", default_value_t = -30.0, allow_hyphen_values = true)]
    pub max_decibels: f32,

    /// Canvas area in pixels per particle
    #[arg(long, value_name = "PIXELS", default_value_t = DENSITY)]
    pub density: u32,

    /// Respawn the particle field whenever the window is resized
    #[arg(long)]
    pub regenerate_on_resize: bool,

    #[arg(long, value_name = "PIXELS", default_value_t = 1200)]
    pub width: u32,

    #[arg(long, value_name = "PIXELS", default_value_t = 800)]
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualizerConfig {
    pub input_device: Option<String>,
    pub output_device: Option<String>,
    pub monitor_gain: f32,
    pub volume: f32,
    pub analyser: AnalyserOptions,
    pub density: u32,
    pub regenerate_on_resize: bool,
    pub window_size: (u32, u32),
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            output_device: None,
            monitor_gain: 1.0,
            volume: DEFAULT_VOLUME,
            analyser: AnalyserOptions::default(),
            density: DENSITY,
            regenerate_on_resize: false,
            window_size: (1200, 800),
        }
    }
}

impl From<Args> for VisualizerConfig {
    fn from(args: Args) -> Self {
        Self {
            input_device: args.input_device,
            output_device: args.output_device,
            monitor_gain: args.monitor_gain,
            volume: args.volume,
            analyser: AnalyserOptions {
                fft_size: args.fft_size,
                min_decibels: args.min_decibels,
                max_decibels: args.max_decibels,
                smoothing_time_constant: args.smoothing,
            },
            density: args.density,
            regenerate_on_resize: args.regenerate_on_resize,
            window_size: (args.width, args.height),
        }
    }
}

impl VisualizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let a = &self.analyser;

        if !a.fft_size.is_power_of_two() || !(32..=32768).contains(&a.fft_size) {
            return invalid(format!(
                "fft size {} must be a power of two in 32..=32768",
                a.fft_size
            ));
        }
        if a.min_decibels >= a.max_decibels {
            return invalid(format!(
                "min decibels ({}) must be below max decibels ({})",
                a.min_decibels, a.max_decibels
            ));
        }
        if !(0.0..=1.0).contains(&a.smoothing_time_constant) {
            return invalid(format!(
                "smoothing {} must be within [0, 1]",
                a.smoothing_time_constant
            ));
        }
        if self.density == 0 {
            return invalid("density must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.monitor_gain) {
            return invalid(format!(
                "monitor gain {} must be within [0, 1]",
                self.monitor_gain
            ));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return invalid(format!("volume {} must be within [0, 1]", self.volume));
        }
        if self.window_size.0 == 0 || self.window_size.1 == 0 {
            return invalid("window size must be non-zero".into());
        }
        Ok(())
    }
}
