//! Missions and the mission state shared through the registry

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

// Internal
use super::MissionCtrlError;
use crate::graph::{Graph, NodeId, TrackGraph};
use comms_if::tc::MissionCmd;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A traversal of the track from one node to another.
///
/// A mission whose start and end are the same is a full loop of the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub start: NodeId,
    pub end: NodeId,
}

/// The mission queue and the vehicle's position on the track.
///
/// `previous_pos`, `next_pos` and `index` describe the vehicle's progress along the path held in
/// the registry and are only meaningful together with it.
#[derive(Debug, Clone)]
pub struct MissionData {
    pub graph: Arc<TrackGraph>,

    /// Pending missions, the front one being driven
    pub missions: VecDeque<Mission>,

    /// The last node the vehicle passed
    pub previous_pos: NodeId,

    /// The node the vehicle is heading to
    pub next_pos: NodeId,

    /// Index into the path of the step being driven
    pub index: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MissionData {
    /// Mission state for a vehicle waiting at `start_pos` with nothing to do.
    pub fn new(graph: Arc<TrackGraph>, start_pos: NodeId) -> Self {
        Self {
            graph,
            missions: VecDeque::new(),
            previous_pos: start_pos,
            next_pos: start_pos,
            index: 0,
        }
    }

    /// The mission currently being driven.
    pub fn current(&self) -> Option<&Mission> {
        self.missions.front()
    }

    /// Add a mission to the back of the queue, if both of its nodes are on the track.
    pub fn queue(&mut self, mission: Mission) -> Result<(), MissionCtrlError> {
        let num_nodes = self.graph.num_nodes();

        if mission.start >= num_nodes || mission.end >= num_nodes {
            return Err(MissionCtrlError::InvalidMission { mission, num_nodes });
        }

        self.missions.push_back(mission);

        Ok(())
    }

    /// Drop every pending mission.
    pub fn clear(&mut self) {
        self.missions.clear();
        self.index = 0;
    }
}

impl From<MissionCmd> for Mission {
    fn from(cmd: MissionCmd) -> Self {
        Self {
            start: cmd.start,
            end: cmd.end,
        }
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} -> {})", self.start, self.end)
    }
}
