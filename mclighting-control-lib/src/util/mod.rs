pub mod address;
pub mod fan_out;
