//! # Simulated regulator
//!
//! A stand-in for the vehicle and its regulator which lets the executable drive missions without
//! any hardware. The vehicle moves along the edges of the path at the target speed, treating each
//! edge's cost as its length, and slows down as it approaches the stop line at the end of the
//! mission.
//!
//! The stop line is placed at the end of the last edge, so a finished mission leaves the vehicle
//! waiting in front of its end node with `previous_pos` still on the node before it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use crate::graph::{Direction, Graph};
use crate::regulator::{RegInput, RegResult, RegSamples, Regulator};
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Longest time step the simulation will take in one go.
///
/// Units: seconds
const MAX_STEP_S: f64 = 0.5;

/// Height of the simulated camera image, over which the distance to the stop line is measured.
///
/// Units: pixels
const VIEW_HEIGHT_PX: f64 = 480.0;

/// Fraction of the target speed the vehicle creeps at when right at the stop line.
const CREEP_FACTOR: f64 = 0.1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulated vehicle and regulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimRegulator;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Regulator for SimRegulator {
    fn regulate(&self, input: &RegInput) -> RegResult {
        let map = &input.map;
        let params = &input.params;
        let mut result = RegResult::hold(input);

        let step = match map.path.get(map.index) {
            Some(s) => *s,
            None => return result,
        };
        let is_last = map.index + 1 == map.path.len();

        // Edges missing from the graph are treated as already driven
        let edge_len = map
            .graph
            .edge(map.previous_pos, step.node)
            .map(|e| e.cost as f64)
            .unwrap_or(0.0);

        let dt = input.dt.max(0.0).min(MAX_STEP_S);

        // Lane keeping on top of the junction's steering angle
        let err = input.telemetry.lane_heading_rad;
        let samples = &mut result.samples;
        samples.angle_err_integral += err * dt;
        let err_rate = if dt > 0.0 {
            (err - samples.prev_angle_err) / dt
        } else {
            0.0
        };
        samples.prev_angle_err = err;

        let gains = params.angle_gains;
        result.angle = dir_sign(step.dir) * params.turn_angle
            - (gains.k_p * err + gains.k_i * samples.angle_err_integral + gains.k_d * err_rate);

        // Brake on the approach to the final stop line
        let remaining = (edge_len - samples.dist_travelled).max(0.0);
        samples.dist_stop_line = if edge_len > 0.0 {
            lin_map((0.0, edge_len), (0.0, VIEW_HEIGHT_PX), remaining)
        } else {
            0.0
        };

        let mut speed = params.target_speed;
        if is_last && samples.dist_stop_line < params.stop_line_threshold {
            speed = lin_map(
                (0.0, params.stop_line_threshold),
                (CREEP_FACTOR * params.target_speed, params.target_speed),
                samples.dist_stop_line,
            );
        }

        // The simulated vehicle holds the set point exactly, the speed loop only shapes the demand
        samples.dist_travelled += speed * dt;
        let speed_dem = speed + speed_correction(speed, input, samples, dt);

        if samples.dist_travelled >= edge_len {
            if is_last {
                samples.dist_travelled = 0.0;
                samples.dist_stop_line = 0.0;
                result.next_pos = step.node;
                result.mission_finished = true;
                speed = 0.0;
                samples.speed_err_integral = 0.0;
                samples.prev_speed_err = 0.0;
            } else {
                samples.dist_travelled -= edge_len;
                result.previous_pos = step.node;
                result.index = map.index + 1;
                result.next_pos = map
                    .path
                    .get(result.index)
                    .map(|s| s.node)
                    .unwrap_or(step.node);
            }
        } else {
            result.next_pos = step.node;
        }

        result.speed = if result.mission_finished {
            speed
        } else {
            speed_dem
        };

        trace!(
            "Sim: {} -> {} ({:.2}/{:.2}), index {}, speed {:.2}",
            result.previous_pos,
            result.next_pos,
            result.samples.dist_travelled,
            edge_len,
            result.index,
            result.speed
        );

        result
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// PID correction of the speed demand from the measured wheel speed, updating the speed loop's
/// samples.
fn speed_correction(set_point: f64, input: &RegInput, samples: &mut RegSamples, dt: f64) -> f64 {
    let gains = input.params.speed_gains;
    let err = set_point - input.sensor_data.wheel_speed_ms;

    samples.speed_err_integral += err * dt;
    let err_rate = if dt > 0.0 {
        (err - samples.prev_speed_err) / dt
    } else {
        0.0
    };
    samples.prev_speed_err = err;

    gains.k_p * err + gains.k_i * samples.speed_err_integral + gains.k_d * err_rate
}

/// Steering sign for an edge direction, positive to the left.
fn dir_sign(dir: Direction) -> f64 {
    match dir {
        Direction::Forward => 0.0,
        Direction::Left => 1.0,
        Direction::Right => -1.0,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
