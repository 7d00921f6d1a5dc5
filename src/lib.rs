pub mod symbol;
pub mod encoder;
pub mod alphabet;
pub mod sink;
pub mod audio;
pub mod scheduler;
pub mod export;
pub mod error;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use symbol::*;
pub use encoder::*;
pub use alphabet::*;
pub use sink::*;
pub use audio::*;
pub use scheduler::*;
pub use export::*;
pub use error::*;

pub const SAMPLE_RATE: u32 = 32000;
pub const DEFAULT_TONE_DURATION_MS: u32 = 100;
pub const DEFAULT_GAP_MS: u32 = 50;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;
pub const DEFAULT_PAYLOAD: &str = "hi im remy";
pub const NUM_SYMBOLS: usize = 16;

/// Shape of the synthesized tone clips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneConfig {
    pub sample_rate: u32,
    pub tone_duration_ms: u32,
    /// Trailing silence inside each clip, so repeated symbols stay distinct.
    pub gap_ms: u32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            tone_duration_ms: DEFAULT_TONE_DURATION_MS,
            gap_ms: DEFAULT_GAP_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub payload: String,
    pub tone: ToneConfig,
    pub volume: f32,
    pub tick_interval_ms: u64,
}

impl Config {
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            payload: DEFAULT_PAYLOAD.to_string(),
            tone: ToneConfig::default(),
            volume: 1.0,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}
