use std::fmt;

pub const ROW_FREQUENCIES: [f32; 4] = [697.0, 770.0, 852.0, 941.0];
pub const COLUMN_FREQUENCIES: [f32; 4] = [1209.0, 1336.0, 1477.0, 1633.0];

/// One of the sixteen DTMF keys.
///
/// Hex digits map onto the keypad one-to-one, except that `e` and `f` are
/// carried by `*` and `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolCode {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    D8,
    D9,
    A,
    B,
    C,
    D,
    Star,
    Pound,
}

impl SymbolCode {
    /// Canonical order: the position of each symbol is its nibble value.
    pub const ALL: [SymbolCode; 16] = [
        SymbolCode::D0,
        SymbolCode::D1,
        SymbolCode::D2,
        SymbolCode::D3,
        SymbolCode::D4,
        SymbolCode::D5,
        SymbolCode::D6,
        SymbolCode::D7,
        SymbolCode::D8,
        SymbolCode::D9,
        SymbolCode::A,
        SymbolCode::B,
        SymbolCode::C,
        SymbolCode::D,
        SymbolCode::Star,
        SymbolCode::Pound,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_nibble(nibble: u8) -> Self {
        Self::ALL[(nibble & 0x0F) as usize]
    }

    pub fn as_char(self) -> char {
        match self {
            SymbolCode::Star => '*',
            SymbolCode::Pound => '#',
            other => other.hex_digit(),
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '*' => Some(SymbolCode::Star),
            '#' => Some(SymbolCode::Pound),
            'e' | 'E' | 'f' | 'F' => None,
            _ => Self::from_hex_digit(c.to_ascii_lowercase()),
        }
    }

    /// Hex-to-symbol substitution: `e` becomes `*`, `f` becomes `#`.
    pub fn from_hex_digit(c: char) -> Option<Self> {
        match c {
            '0'..='9' | 'a'..='f' => c.to_digit(16).map(|n| Self::from_nibble(n as u8)),
            _ => None,
        }
    }

    /// Inverse of [`SymbolCode::from_hex_digit`].
    pub fn hex_digit(self) -> char {
        // index() is always < 16
        std::char::from_digit(self.index() as u32, 16).unwrap_or('0')
    }

    /// Asset name of the clip carrying this symbol.
    pub fn file_stem(self) -> &'static str {
        match self {
            SymbolCode::D0 => "0",
            SymbolCode::D1 => "1",
            SymbolCode::D2 => "2",
            SymbolCode::D3 => "3",
            SymbolCode::D4 => "4",
            SymbolCode::D5 => "5",
            SymbolCode::D6 => "6",
            SymbolCode::D7 => "7",
            SymbolCode::D8 => "8",
            SymbolCode::D9 => "9",
            SymbolCode::A => "a",
            SymbolCode::B => "b",
            SymbolCode::C => "c",
            SymbolCode::D => "d",
            SymbolCode::Star => "star",
            SymbolCode::Pound => "pound",
        }
    }

    /// Keypad position as (row, column).
    fn key_position(self) -> (usize, usize) {
        match self {
            SymbolCode::D1 => (0, 0),
            SymbolCode::D2 => (0, 1),
            SymbolCode::D3 => (0, 2),
            SymbolCode::A => (0, 3),
            SymbolCode::D4 => (1, 0),
            SymbolCode::D5 => (1, 1),
            SymbolCode::D6 => (1, 2),
            SymbolCode::B => (1, 3),
            SymbolCode::D7 => (2, 0),
            SymbolCode::D8 => (2, 1),
            SymbolCode::D9 => (2, 2),
            SymbolCode::C => (2, 3),
            SymbolCode::Star => (3, 0),
            SymbolCode::D0 => (3, 1),
            SymbolCode::Pound => (3, 2),
            SymbolCode::D => (3, 3),
        }
    }

    /// Low (row) and high (column) tone frequencies in Hz.
    pub fn frequencies(self) -> (f32, f32) {
        let (row, column) = self.key_position();
        (ROW_FREQUENCIES[row], COLUMN_FREQUENCIES[column])
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

pub fn format_symbols(symbols: &[SymbolCode]) -> String {
    symbols
        .iter()
        .map(|s| s.as_char().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
