//! Mission control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Mission Control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Maximum magnitude of the steering angle demand.
    ///
    /// Units: radians
    pub max_angle: f64,

    /// Maximum magnitude of the speed demand.
    ///
    /// Units: meters/second
    pub max_speed: f64,

    /// Time to wait at the end of a mission before starting the next one.
    ///
    /// Units: seconds
    pub settle_duration_s: f64,

    /// Distance to the stop line the regulator samples are reset to when a mission finishes,
    /// which is the furthest a stop line can be seen (the height of the camera image).
    ///
    /// Units: pixels
    pub stop_line_reset_dist: f64,

    /// Write a status report archive every cycle.
    #[serde(default)]
    pub archive: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            max_angle: 0.5,
            max_speed: 1.0,
            settle_duration_s: 1.0,
            stop_line_reset_dist: 480.0,
            archive: false,
        }
    }
}
