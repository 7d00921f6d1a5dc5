#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use crate::{
    alphabet::Alphabet,
    encoder::{checksum, encode},
    export::render,
    symbol::format_symbols,
    ToneConfig,
};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct DtmfPipeWasm {
    tone: ToneConfig,
    volume: f32,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl DtmfPipeWasm {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();

        Self {
            tone: ToneConfig::default(),
            volume: 1.0,
        }
    }

    #[wasm_bindgen]
    pub fn set_tone_duration(&mut self, duration_ms: u32) {
        self.tone.tone_duration_ms = duration_ms;
    }

    #[wasm_bindgen]
    pub fn set_gap(&mut self, gap_ms: u32) {
        self.tone.gap_ms = gap_ms;
    }

    #[wasm_bindgen]
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Space-separated symbol string, checksum included.
    #[wasm_bindgen]
    pub fn encode(&self, text: &str) -> String {
        format_symbols(&encode(text))
    }

    #[wasm_bindgen]
    pub fn checksum(&self, text: &str) -> u8 {
        checksum(text.as_bytes())
    }

    /// Mono samples for the whole transmission, ready for an AudioBuffer.
    #[wasm_bindgen]
    pub fn render(&self, text: &str) -> Result<Vec<f32>, JsValue> {
        let alphabet = Alphabet::synthesize(&self.tone);
        render(&encode(text), &alphabet, self.volume)
            .map(|clip| clip.samples)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen]
    pub fn sample_rate(&self) -> u32 {
        self.tone.sample_rate
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for DtmfPipeWasm {
    fn default() -> Self {
        Self::new()
    }
}
