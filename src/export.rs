//! Offline rendering of a symbol sequence, for recording a transmission to
//! disk instead of playing it live.

use crate::alphabet::{Alphabet, AudioClip};
use crate::error::{DtmfPipeError, Result};
use crate::symbol::SymbolCode;
use log::info;
use std::path::Path;

/// Concatenates the clips of `symbols` back-to-back, scaled by `volume`.
///
/// All clips must share one sample rate. An empty sequence renders to an
/// empty clip at the alphabet's first available rate.
pub fn render(symbols: &[SymbolCode], alphabet: &Alphabet, volume: f32) -> Result<AudioClip> {
    let volume = volume.clamp(0.0, 1.0);
    let mut samples = Vec::new();
    let mut sample_rate = None;

    for &symbol in symbols {
        let clip = alphabet.clip(symbol)?;

        match sample_rate {
            None => sample_rate = Some(clip.sample_rate),
            Some(rate) if rate != clip.sample_rate => {
                return Err(DtmfPipeError::Encoding(format!(
                    "Clip for '{}' is {} Hz, expected {} Hz",
                    symbol, clip.sample_rate, rate
                )));
            }
            Some(_) => {}
        }

        samples.extend(clip.samples.iter().map(|s| s * volume));
    }

    let sample_rate = match sample_rate {
        Some(rate) => rate,
        None => SymbolCode::ALL
            .iter()
            .find_map(|&s| alphabet.clip(s).ok())
            .map(|c| c.sample_rate)
            .unwrap_or(crate::SAMPLE_RATE),
    };

    Ok(AudioClip::new(samples, sample_rate))
}

/// Writes `clip` as 16-bit mono PCM.
pub fn write_wav<P: AsRef<Path>>(output_path: P, clip: &AudioClip) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(output_path.as_ref(), spec)?;
    for &sample in &clip.samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    info!(
        "Wrote {} samples ({:?}) to {}",
        clip.len(),
        clip.duration(),
        output_path.as_ref().display()
    );
    Ok(())
}
