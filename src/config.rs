// src/config.rs

// Default audio configuration
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;
pub const DEFAULT_MAX_BLOCK: usize = 512;

// Default save endpoint
pub const DEFAULT_SAVE_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_SAVE_PATH: &str = "/saveRecording";

/// Configuration for a piano instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PianoConfig {
    /// Sample rate in Hz (e.g., 44100.0, 48000.0).
    pub sample_rate: f64,

    /// Maximum audio block size in frames.
    pub max_block_size: usize,

    /// Scheme, host and port of the recording service.
    pub save_base_url: String,

    /// Path recordings are posted to.
    pub save_path: String,
}

impl PianoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    pub fn with_save_endpoint(mut self, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        self.save_base_url = base_url.into();
        self.save_path = path.into();
        self
    }

    /// Full URL recordings are posted to.
    pub fn save_url(&self) -> String {
        let base = self.save_base_url.trim_end_matches('/');
        if self.save_path.starts_with('/') {
            format!("{}{}", base, self.save_path)
        } else {
            format!("{}/{}", base, self.save_path)
        }
    }
}

impl Default for PianoConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_block_size: DEFAULT_MAX_BLOCK,
            save_base_url: DEFAULT_SAVE_BASE_URL.to_string(),
            save_path: DEFAULT_SAVE_PATH.to_string(),
        }
    }
}
