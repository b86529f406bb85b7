//! # Actuator Demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands produced by the regulator and sent to the actuator board.
///
/// The default value demands a straight, stationary vehicle.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct ActDems {
    /// The demanded steering angle.
    ///
    /// Positive angles steer to the left, negative to the right.
    pub angle: f64,

    /// The demanded speed.
    ///
    /// Positive speeds are "forwards", negative speeds are "backwards".
    pub speed: f64,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl ActDems {
    /// Demands which bring the vehicle to a stop with the wheels straight.
    pub fn stop() -> Self {
        Self::default()
    }

    /// True if these demands hold the vehicle stationary.
    pub fn is_stopped(&self) -> bool {
        self.speed == 0.0
    }
}
