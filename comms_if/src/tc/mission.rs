//! # Mission telecommands

use serde::{Deserialize, Serialize};

/// Queue a traversal of the track from the `start` node to the `end` node.
///
/// Setting `start` equal to `end` requests one full circuit of the track from that node.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionCmd {
    /// Node the mission starts from.
    pub start: usize,

    /// Node the mission finishes at.
    pub end: usize,
}
