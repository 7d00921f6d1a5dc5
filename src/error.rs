use crate::symbol::SymbolCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DtmfPipeError {
    #[error("No audio clip for symbol '{symbol}': {reason}")]
    ResourceResolution { symbol: SymbolCode, reason: String },

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Playback halted after a fatal error")]
    Halted,

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DtmfPipeError>;
