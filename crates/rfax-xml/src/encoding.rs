//! Byte-to-text decoding for candidate ranges.
//!
//! The candidate order matters: Latin-1 decodes any byte sequence without
//! error and would mask genuine UTF-8 or UTF-16 content if tried first.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Encoding {
    Utf8,
    Utf16,
    Latin1,
    Windows1252,
}

impl Encoding {
    pub const CANDIDATES: [Encoding; 4] =
        [Encoding::Utf8, Encoding::Utf16, Encoding::Latin1, Encoding::Windows1252];

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16 => "utf-16",
            Encoding::Latin1 => "latin-1",
            Encoding::Windows1252 => "windows-1252",
        }
    }
}

pub fn decode(bytes: &[u8], encoding: Encoding) -> Option<String> {
    match encoding {
        Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
        Encoding::Utf16 => decode_utf16(bytes),
        Encoding::Latin1 => Some(decode_latin1(bytes)),
        Encoding::Windows1252 => decode_windows1252(bytes),
    }
}

/// First candidate that decodes without error, in fixed order.
pub fn decode_any(bytes: &[u8]) -> Option<(String, Encoding)> {
    Encoding::CANDIDATES
        .iter()
        .find_map(|&encoding| decode(bytes, encoding).map(|text| (text, encoding)))
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    // BOM selects the byte order; without one the stream is read little-endian.
    let (data, be) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        _ => (bytes, false),
    };
    if data.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|chunk| {
            if be {
                u16::from_be_bytes([chunk[0], chunk[1]])
            } else {
                u16::from_le_bytes([chunk[0], chunk[1]])
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

// Windows-1252 remaps of the C1 range; 0 marks the five undefined bytes.
const CP1252_C1: [u16; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039,
    0x0152, 0, 0x017D, 0, 0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC,
    0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
];

fn decode_windows1252(bytes: &[u8]) -> Option<String> {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        let ch = match b {
            0x80..=0x9F => {
                let mapped = CP1252_C1[(b - 0x80) as usize];
                if mapped == 0 {
                    return None;
                }
                char::from_u32(mapped as u32)?
            }
            _ => b as char,
        };
        out.push(ch);
    }
    Some(out)
}
