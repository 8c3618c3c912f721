use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::Error;
use crate::led::led_color::LedColor;

/// An effect mode as reported by the device: either the numeric effect or a mode name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModeValue {
    Number(u32),
    Name(String),
}

impl ModeValue {
    pub(crate) fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(ModeValue::Number),
            Value::String(name) if !name.is_empty() => Some(ModeValue::Name(name.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ModeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeValue::Number(number) => write!(f, "{}", number),
            ModeValue::Name(name) => write!(f, "{}", name),
        }
    }
}

/// A text command understood by the McLighting WebSocket interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LightCommand {
    /// `#RRGGBB`
    Color(LedColor),
    /// `/<mode>`
    Mode(ModeValue),
    /// `?<speed>`
    Speed(u32),
    /// `%<brightness>`
    Brightness(u32),
    /// Anything else, sent verbatim.
    Raw(String),
}

impl fmt::Display for LightCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightCommand::Color(color) => write!(f, "{}", color.to_hex()),
            LightCommand::Mode(mode) => write!(f, "/{}", mode),
            LightCommand::Speed(speed) => write!(f, "?{}", speed),
            LightCommand::Brightness(brightness) => write!(f, "%{}", brightness),
            LightCommand::Raw(text) => write!(f, "{}", text),
        }
    }
}

impl FromStr for LightCommand {
    type Err = Error;

    /// Recognises the structured commands; any other text becomes [`LightCommand::Raw`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.chars().next() {
            Some('#') => s.parse().ok().map(LightCommand::Color),
            Some('/') => Some(LightCommand::Mode(
                s[1..]
                    .parse()
                    .map(ModeValue::Number)
                    .unwrap_or_else(|_| ModeValue::Name(s[1..].to_string())),
            )),
            Some('?') => s[1..].parse().ok().map(LightCommand::Speed),
            Some('%') => s[1..].parse().ok().map(LightCommand::Brightness),
            _ => None,
        };
        Ok(parsed.unwrap_or_else(|| LightCommand::Raw(s.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            LightCommand::Color(LedColor::new(0, 128, 255)).to_string(),
            "#0080FF"
        );
        assert_eq!(
            LightCommand::Mode(ModeValue::Name("off".into())).to_string(),
            "/off"
        );
        assert_eq!(LightCommand::Speed(42).to_string(), "?42");
        assert_eq!(LightCommand::Brightness(255).to_string(), "%255");
        assert_eq!(LightCommand::Raw("=rainbow".into()).to_string(), "=rainbow");
    }

    #[test]
    fn test_parse_structured() {
        assert_eq!(
            "#ff0000".parse::<LightCommand>().unwrap(),
            LightCommand::Color(LedColor::new(255, 0, 0))
        );
        assert_eq!(
            "/12".parse::<LightCommand>().unwrap(),
            LightCommand::Mode(ModeValue::Number(12))
        );
        assert_eq!(
            "%10".parse::<LightCommand>().unwrap(),
            LightCommand::Brightness(10)
        );
    }

    #[test]
    fn test_parse_falls_back_to_raw() {
        assert_eq!(
            "?fast".parse::<LightCommand>().unwrap(),
            LightCommand::Raw("?fast".into())
        );
        assert_eq!(
            "$".parse::<LightCommand>().unwrap(),
            LightCommand::Raw("$".into())
        );
    }
}
