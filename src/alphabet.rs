use crate::error::{DtmfPipeError, Result};
use crate::symbol::SymbolCode;
use crate::{ToneConfig, NUM_SYMBOLS};
use log::{debug, warn};
use std::f32::consts::PI;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const FADE_SECONDS: f32 = 0.005;

/// Mono PCM tone, normalised to `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = self.samples.len() as u128 * 1_000_000_000 / self.sample_rate as u128;
        Duration::from_nanos(nanos as u64)
    }
}

pub fn generate_dual_tone(low: f32, high: f32, config: &ToneConfig) -> Vec<f32> {
    let rate = config.sample_rate as f32;
    let tone_samples = (rate * config.tone_duration_ms as f32 / 1000.0) as usize;
    let gap_samples = (rate * config.gap_ms as f32 / 1000.0) as usize;
    let fade_samples = ((rate * FADE_SECONDS) as usize).min(tone_samples / 2).max(1);

    let mut samples = Vec::with_capacity(tone_samples + gap_samples);

    for i in 0..tone_samples {
        let t = i as f32 / rate;
        // two unit sines summed, halved so the sum never clips
        let sample = 0.5 * ((2.0 * PI * low * t).sin() + (2.0 * PI * high * t).sin());

        let fade = if i < fade_samples {
            i as f32 / fade_samples as f32
        } else if i >= tone_samples - fade_samples {
            (tone_samples - i) as f32 / fade_samples as f32
        } else {
            1.0
        };

        samples.push(sample * fade);
    }

    samples.resize(tone_samples + gap_samples, 0.0);
    samples
}

fn read_wav(path: &Path) -> Result<AudioClip> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        raw
    } else {
        raw.chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(AudioClip::new(samples, spec.sample_rate))
}

/// The sixteen tone clips, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Alphabet {
    clips: [Option<Arc<AudioClip>>; NUM_SYMBOLS],
}

impl Alphabet {
    pub fn synthesize(config: &ToneConfig) -> Self {
        let mut alphabet = Self::default();

        for symbol in SymbolCode::ALL {
            let (low, high) = symbol.frequencies();
            let clip = AudioClip::new(generate_dual_tone(low, high, config), config.sample_rate);
            alphabet.insert(symbol, clip);
        }

        debug!(
            "Synthesized {} tones ({} ms + {} ms gap @ {} Hz)",
            NUM_SYMBOLS, config.tone_duration_ms, config.gap_ms, config.sample_rate
        );
        alphabet
    }

    /// Loads `<stem>.wav` for every symbol (`0`..`9`, `a`..`d`, `star`,
    /// `pound`). Missing files stay unresolved; undecodable ones fail here.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut alphabet = Self::default();

        for symbol in SymbolCode::ALL {
            let path = dir.join(format!("{}.wav", symbol.file_stem()));
            if !path.is_file() {
                warn!("No clip for '{}' at {}", symbol, path.display());
                continue;
            }

            let clip = read_wav(&path).map_err(|e| DtmfPipeError::ResourceResolution {
                symbol,
                reason: format!("{}: {}", path.display(), e),
            })?;
            debug!("Loaded '{}' from {} ({:?})", symbol, path.display(), clip.duration());
            alphabet.insert(symbol, clip);
        }

        Ok(alphabet)
    }

    pub fn insert(&mut self, symbol: SymbolCode, clip: AudioClip) {
        self.clips[symbol.index()] = Some(Arc::new(clip));
    }

    pub fn clip(&self, symbol: SymbolCode) -> Result<Arc<AudioClip>> {
        self.clips[symbol.index()]
            .clone()
            .ok_or_else(|| DtmfPipeError::ResourceResolution {
                symbol,
                reason: "clip not loaded".into(),
            })
    }

    pub fn missing(&self) -> Vec<SymbolCode> {
        SymbolCode::ALL
            .into_iter()
            .filter(|s| self.clips[s.index()].is_none())
            .collect()
    }
}
