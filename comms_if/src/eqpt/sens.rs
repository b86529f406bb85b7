//! # Sensor and telemetry data
//!
//! Data produced by the sensor board and the image processing pipeline. The control core treats
//! these as opaque inputs to the regulator.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Raw readings from the sensor board.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct SensorData {
    /// Distance to the nearest obstacle in front of the vehicle.
    ///
    /// Units: meters
    pub obstacle_dist_m: f64,

    /// Measured wheel speed.
    ///
    /// Units: meters/second
    pub wheel_speed_ms: f64,

    /// Total distance driven since power on.
    ///
    /// Units: meters
    pub odometer_m: f64,
}

/// Telemetry extracted from the vehicle's camera.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Lateral offset of the vehicle from the centre of the lane, positive to the right.
    ///
    /// Units: pixels
    pub lane_offset_px: f64,

    /// Heading of the lane relative to the vehicle's forward axis.
    ///
    /// Units: radians
    pub lane_heading_rad: f64,

    /// Distance between the bottom of the image and the next stop line, or `None` if no stop line
    /// is visible.
    ///
    /// Units: pixels
    pub stop_line_dist_px: Option<f64>,

    /// True if a junction has been detected ahead of the vehicle.
    pub junction_ahead: bool,
}
