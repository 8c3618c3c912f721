pub mod led_color;
pub mod light_state;
