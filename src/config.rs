// AppConfig - resolved, immutable configuration built once from CLI args.
//
// A plain struct assembled once at startup and threaded through everything
// else, rather than re-reading flags throughout the call graph.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizeMode {
    Off,
    /// Every window.
    Full,
    /// Only labelled regions / once per cycle.
    Reduced,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sample_rate: u32,
    pub window_size: usize,
    pub bucket_count: usize,
    pub cycle_count: usize,
    pub overlap: usize,
    pub learn: bool,
    pub visualize: VisualizeMode,
    pub input_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    pub events_path: Option<PathBuf>,
    pub write_state_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            window_size: 2048,
            bucket_count: 128,
            cycle_count: 8,
            overlap: 2,
            learn: false,
            visualize: VisualizeMode::Off,
            input_path: None,
            labels_path: None,
            state_path: None,
            events_path: None,
            write_state_path: None,
        }
    }
}
