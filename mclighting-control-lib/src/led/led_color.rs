use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// An 8-bit RGB color as sent to and reported by McLighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl LedColor {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        LedColor { red, green, blue }
    }

    /// Formats the color the way the firmware expects it, e.g. `#FF8000`.
    pub fn to_hex(&self) -> String {
        format!("#{:X}", Srgb::<u8>::from(*self))
    }

    /// Reads a color out of a status document value.
    ///
    /// Accepted shapes:
    /// - `[r, g, b]` (extra channels such as white are ignored)
    /// - `{"r": .., "g": .., "b": ..}` or `{"red": .., "green": .., "blue": ..}`
    /// - `"#rrggbb"`, `"rrggbb"` or `"#rgb"`
    /// - a packed `0xRRGGBB` integer
    pub fn from_json(value: &Value) -> Result<Self> {
        let invalid = || Error::InvalidColor(value.to_string());
        match value {
            Value::Array(channels) if channels.len() >= 3 => {
                let channel = |i: usize| channel_from_json(&channels[i]).ok_or_else(invalid);
                Ok(LedColor::new(channel(0)?, channel(1)?, channel(2)?))
            }
            Value::Object(map) => {
                let channel = |short: &str, long: &str| {
                    map.get(short)
                        .or_else(|| map.get(long))
                        .and_then(channel_from_json)
                        .ok_or_else(invalid)
                };
                Ok(LedColor::new(
                    channel("r", "red")?,
                    channel("g", "green")?,
                    channel("b", "blue")?,
                ))
            }
            Value::String(text) => text.parse(),
            Value::Number(number) => number
                .as_u64()
                .filter(|packed| *packed <= 0xFF_FF_FF)
                .map(|packed| Self::from_packed(packed as u32))
                .ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }

    fn from_packed(packed: u32) -> Self {
        LedColor::new(
            ((packed >> 16) & 0xFF) as u8,
            ((packed >> 8) & 0xFF) as u8,
            (packed & 0xFF) as u8,
        )
    }
}

fn channel_from_json(value: &Value) -> Option<u8> {
    if let Some(int) = value.as_u64() {
        return u8::try_from(int).ok();
    }
    // Some firmware builds report channels as floats.
    value
        .as_f64()
        .filter(|float| (0.0..=255.0).contains(float))
        .map(|float| float.round() as u8)
}

impl FromStr for LedColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches('#');
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => return Err(Error::InvalidColor(s.to_string())),
        };
        u32::from_str_radix(&expanded, 16)
            .map(Self::from_packed)
            .map_err(|_| Error::InvalidColor(s.to_string()))
    }
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<LedColor> for Srgb<u8> {
    fn from(color: LedColor) -> Self {
        Srgb::new(color.red, color.green, color.blue)
    }
}
