//! Alert domain - threshold hysteresis state

mod hysteresis;

pub use hysteresis::{AlertKey, AlertState};
