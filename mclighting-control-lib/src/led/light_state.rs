use serde_json::Value;

use crate::control_interface::command::{LightCommand, ModeValue};
use crate::error::{Error, Result};
use crate::led::led_color::LedColor;

/// The parts of a captured status document needed to put a light back the way it was.
#[derive(Debug, Clone, PartialEq)]
pub struct LightState {
    pub color: LedColor,
    pub mode: ModeValue,
    pub speed: u32,
    pub brightness: u32,
}

impl LightState {
    /// Extracts the restorable state from a `/status` document.
    ///
    /// Newer firmware reports the effect as `ws2812fx_mode` and the speed as
    /// `delay_ms`; these win over the older `mode` and `speed` fields when present.
    /// `index` only labels errors.
    pub fn from_status(index: usize, status: &Value) -> Result<Self> {
        let missing = |field: &'static str| Error::MissingStateField { index, field };

        let color = status
            .get("color")
            .filter(|value| !value.is_null())
            .ok_or_else(|| missing("color"))
            .and_then(LedColor::from_json)?;

        let mode = first_present(status, &["ws2812fx_mode", "mode"])
            .and_then(ModeValue::from_json)
            .ok_or_else(|| missing("mode"))?;

        let speed = first_present(status, &["delay_ms", "speed"])
            .and_then(number_from_json)
            .ok_or_else(|| missing("speed"))?;

        let brightness = status
            .get("brightness")
            .and_then(number_from_json)
            .ok_or_else(|| missing("brightness"))?;

        Ok(LightState {
            color,
            mode,
            speed,
            brightness,
        })
    }

    /// The commands that reapply this state, in the order they must be sent.
    pub fn restore_commands(&self) -> [LightCommand; 4] {
        [
            LightCommand::Color(self.color),
            LightCommand::Mode(self.mode.clone()),
            LightCommand::Speed(self.speed),
            LightCommand::Brightness(self.brightness),
        ]
    }
}

fn first_present<'a>(status: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| status.get(*key))
        .find(|value| !value.is_null())
}

fn number_from_json(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_status_prefers_newer_fields() {
        let status = json!({
            "mode": 1,
            "ws2812fx_mode": 12,
            "ws2812fx_mode_name": "Rainbow Cycle",
            "speed": 196,
            "delay_ms": 250,
            "brightness": 80,
            "color": [255, 0, 0]
        });
        let state = LightState::from_status(0, &status).unwrap();
        assert_eq!(state.color, LedColor::new(255, 0, 0));
        assert_eq!(state.mode, ModeValue::Number(12));
        assert_eq!(state.speed, 250);
        assert_eq!(state.brightness, 80);
    }

    #[test]
    fn test_from_status_falls_back_to_older_fields() {
        let status = json!({
            "mode": "SET_MODE",
            "speed": 196,
            "brightness": 196,
            "color": [0, 0, 255]
        });
        let state = LightState::from_status(0, &status).unwrap();
        assert_eq!(state.mode, ModeValue::Name("SET_MODE".to_string()));
        assert_eq!(state.speed, 196);
    }

    #[test]
    fn test_zero_mode_is_kept() {
        let status = json!({
            "mode": "SET_MODE",
            "ws2812fx_mode": 0,
            "speed": 10,
            "brightness": 5,
            "color": [1, 2, 3]
        });
        let state = LightState::from_status(0, &status).unwrap();
        assert_eq!(state.mode, ModeValue::Number(0));
    }

    #[test]
    fn test_restore_commands_order() {
        let state = LightState {
            color: LedColor::new(16, 32, 48),
            mode: ModeValue::Number(7),
            speed: 120,
            brightness: 50,
        };
        let wire: Vec<String> = state
            .restore_commands()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(wire, vec!["#102030", "/7", "?120", "%50"]);
    }

    #[test]
    fn test_missing_brightness() {
        let status = json!({"mode": 3, "speed": 10, "color": [1, 2, 3]});
        let err = LightState::from_status(4, &status).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingStateField {
                index: 4,
                field: "brightness"
            }
        ));
    }
}
