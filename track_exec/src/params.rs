//! # Track Executable Parameters
//!
//! This module provides parameters for the track executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackExecParams {
    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of consecutive cycle overruns reported before they are only counted
    pub overrun_warn_limit: u64,

    /// Node of the track the vehicle is placed at on startup
    pub start_node: usize,

    /// Track graph file, relative to the params directory
    pub track_file: String,

    /// Log levels for individual modules, overriding the executable's level
    #[serde(default)]
    pub module_log_levels: BTreeMap<String, String>,
}
