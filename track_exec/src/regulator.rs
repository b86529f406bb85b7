//! # Regulation contract
//!
//! The regulation step turns the vehicle's current state into corrected actuator demands and
//! tracks the vehicle's progress along the planned path. The mission controller treats it as a
//! pure function: everything it needs is copied into a [`RegInput`] and everything it changes is
//! returned in a [`RegResult`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Internal
use crate::graph::{NodeId, TrackGraph};
use crate::path_engine::Path;
use comms_if::eqpt::sens::{SensorData, Telemetry};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A regulation function.
///
/// Any `Fn(&RegInput) -> RegResult` closure is a regulator.
pub trait Regulator {
    fn regulate(&self, input: &RegInput) -> RegResult;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains of a PID loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
}

/// Tunable regulator parameters, loaded from `regulator.toml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegParams {
    /// Gains of the lane keeping loop
    pub angle_gains: PidGains,

    /// Gains of the speed loop
    pub speed_gains: PidGains,

    /// Cruise speed between junctions.
    ///
    /// Units: meters/second
    pub target_speed: f64,

    /// Steering angle used to take a left or right edge at a junction.
    ///
    /// Units: radians
    pub turn_angle: f64,

    /// Distance to the stop line under which the vehicle starts braking.
    pub stop_line_threshold: f64,
}

/// Measurements accumulated by the regulator between cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegSamples {
    /// Distance to the next stop line. Reset to its maximum when a mission finishes.
    pub dist_stop_line: f64,

    /// Distance travelled along the current edge.
    pub dist_travelled: f64,

    /// Integral of the lane keeping error.
    pub angle_err_integral: f64,

    /// Lane keeping error of the previous cycle.
    pub prev_angle_err: f64,

    /// Integral of the wheel speed error.
    pub speed_err_integral: f64,

    /// Wheel speed error of the previous cycle.
    pub prev_speed_err: f64,
}

/// Where the vehicle is on the track and where it is going.
#[derive(Debug, Clone)]
pub struct MapContext {
    pub graph: Arc<TrackGraph>,

    pub path: Path,

    /// Last node the vehicle passed
    pub previous_pos: NodeId,

    /// Node the vehicle is heading to
    pub next_pos: NodeId,

    /// Index of the step of `path` currently being driven
    pub index: usize,
}

/// Everything the regulator is given each cycle.
#[derive(Debug, Clone)]
pub struct RegInput {
    pub telemetry: Telemetry,
    pub sensor_data: SensorData,
    pub params: RegParams,

    /// Time since the start of the previous regulated cycle.
    ///
    /// Units: seconds
    pub dt: f64,

    pub samples: RegSamples,
    pub map: MapContext,
}

/// Everything the regulator gives back each cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegResult {
    pub angle: f64,
    pub speed: f64,
    pub samples: RegSamples,
    pub previous_pos: NodeId,
    pub next_pos: NodeId,
    pub index: usize,
    pub mission_finished: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RegSamples {
    /// Samples of a vehicle waiting at a stop line, with the stop line distance at its maximum.
    pub fn at_rest(max_dist_stop_line: f64) -> Self {
        Self {
            dist_stop_line: max_dist_stop_line,
            ..Default::default()
        }
    }
}

impl RegResult {
    /// A result which holds the vehicle where it is without changing its progress.
    pub fn hold(input: &RegInput) -> Self {
        Self {
            angle: 0.0,
            speed: 0.0,
            samples: input.samples,
            previous_pos: input.map.previous_pos,
            next_pos: input.map.next_pos,
            index: input.map.index,
            mission_finished: false,
        }
    }
}

impl<F> Regulator for F
where
    F: Fn(&RegInput) -> RegResult,
{
    fn regulate(&self, input: &RegInput) -> RegResult {
        self(input)
    }
}
