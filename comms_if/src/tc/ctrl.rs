//! # Control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A request from the operator to change the vehicle's steering and speed directly.
///
/// Only acted on while the vehicle is in [`Mode::Manual`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtrlChange {
    /// The requested steering angle, positive to the left.
    pub angle: f64,

    /// The requested speed, positive forwards.
    pub speed: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Operating mode of the vehicle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// The operator's control change requests are forwarded straight to the actuators.
    Manual,

    /// The vehicle drives the queued missions itself.
    Autonomous,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

/// The vehicle powers on under operator control, which with a zeroed request holds it stationary.
impl Default for Mode {
    fn default() -> Self {
        Mode::Manual
    }
}
