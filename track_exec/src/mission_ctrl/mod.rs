//! # Mission control module
//!
//! The mission controller is the control loop's decision maker. Each cycle it reads the mode and
//! mission state from the registry and either forwards the operator's request (manual mode) or
//! drives the front mission of the queue (autonomous mode): replanning when the cached path is
//! stale, sending the vehicle back to the mission's start when it is elsewhere, running the
//! regulator and bounding its output.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod mission;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use mission::*;
pub use params::*;
pub use state::*;

use crate::path_engine::PathError;
use util::{archive::ArchiveError, params::LoadError};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MissionCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum MissionCtrlError {
    #[error("Could not load the mission control parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Could not set up the mission control archive: {0}")]
    ArchiveError(ArchiveError),

    #[error("Mission {mission} references a node outside the track (which has {num_nodes} nodes)")]
    InvalidMission { mission: Mission, num_nodes: usize },

    #[error("Could not plan a path for mission {mission}: {source}")]
    PlanningFailed {
        mission: Mission,
        #[source]
        source: PathError,
    },
}
