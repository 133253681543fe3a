// CLI surface - clap derive argument parsing, translated into an AppConfig.
//
// Mirrors the original AudioId flag set (the hand-rolled `argv` loop this
// replaces) for option names and fatal/non-fatal behavior, using `clap`
// instead of hand-rolled parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{AppConfig, VisualizeMode};

/// Offline/online audio event recognizer.
#[derive(Debug, Parser)]
#[command(name = "audioid", version, about)]
pub struct Cli {
    /// Input audio file (WAV). Omit to capture from the default input device.
    pub input: Option<PathBuf>,

    /// Ground-truth label intervals (tab-separated start/end/label).
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Load learned templates and gating parameters from a state file.
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Load event-config (afterevent/withininterval/minduration) from a
    /// state file, before `--state` so afterevent references resolve.
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Save learned templates to a state file on exit.
    #[arg(long)]
    pub write_state: Option<PathBuf>,

    /// Learn mode: accumulate templates from `--labels` intervals instead
    /// of recognizing.
    #[arg(long)]
    pub learn: bool,

    /// Visualize every window.
    #[arg(long)]
    pub visualize: bool,

    /// Visualize only labelled regions / once per cycle.
    #[arg(long = "visualize-reduced")]
    pub visualize_reduced: bool,

    #[arg(long, default_value_t = 16_000)]
    pub sample_rate: u32,

    #[arg(long, default_value_t = 2048)]
    pub window_size: usize,

    #[arg(long, default_value_t = 128)]
    pub bucket_count: usize,

    #[arg(long, default_value_t = 8)]
    pub cycle_count: usize,

    #[arg(long, default_value_t = 2)]
    pub overlap: usize,
}

impl Cli {
    pub fn into_config(self) -> AppConfig {
        let visualize = match (self.visualize, self.visualize_reduced) {
            (_, true) => VisualizeMode::Reduced,
            (true, false) => VisualizeMode::Full,
            (false, false) => VisualizeMode::Off,
        };

        AppConfig {
            sample_rate: self.sample_rate,
            window_size: self.window_size,
            bucket_count: self.bucket_count,
            cycle_count: self.cycle_count,
            overlap: self.overlap,
            learn: self.learn,
            visualize,
            input_path: self.input,
            labels_path: self.labels,
            state_path: self.state,
            events_path: self.events,
            write_state_path: self.write_state,
        }
    }
}
