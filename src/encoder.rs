use crate::symbol::{format_symbols, SymbolCode};
use crc::{Crc, CRC_8_MAXIM_DOW};

/// CRC-8 as used by 1-Wire device ROM codes.
pub const CRC8_MAXIM: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);
pub const CHECKSUM_SYMBOLS: usize = 2;

pub fn checksum(data: &[u8]) -> u8 {
    CRC8_MAXIM.checksum(data)
}

fn substitute(hex_digits: &str, out: &mut Vec<SymbolCode>) {
    // hex::encode only emits [0-9a-f]
    out.extend(hex_digits.chars().filter_map(SymbolCode::from_hex_digit));
}

pub fn encode_bytes(data: &[u8]) -> Vec<SymbolCode> {
    let mut symbols = Vec::with_capacity(data.len() * 2 + CHECKSUM_SYMBOLS);
    substitute(&hex::encode(data), &mut symbols);
    substitute(&format!("{:02x}", checksum(data)), &mut symbols);
    symbols
}

/// Hex-encodes `input`, maps each digit to a symbol and appends the
/// two-symbol checksum of the raw bytes.
pub fn encode(input: &str) -> Vec<SymbolCode> {
    encode_bytes(input.as_bytes())
}

/// An encoded payload, kept together with its checksum for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    pub payload: String,
    pub symbols: Vec<SymbolCode>,
    pub checksum: u8,
}

impl Transmission {
    pub fn new(payload: impl Into<String>) -> Self {
        let payload = payload.into();
        let symbols = encode(&payload);
        let checksum = checksum(payload.as_bytes());

        Self {
            payload,
            symbols,
            checksum,
        }
    }

    pub fn payload_symbols(&self) -> &[SymbolCode] {
        &self.symbols[..self.symbols.len() - CHECKSUM_SYMBOLS]
    }

    pub fn checksum_symbols(&self) -> &[SymbolCode] {
        &self.symbols[self.symbols.len() - CHECKSUM_SYMBOLS..]
    }

    pub fn display(&self) -> String {
        format_symbols(&self.symbols)
    }
}
