//! # Track library.
//!
//! The decision making core of the track vehicle: the shared state registry, the track graph and
//! path engine, and the mission controller run by the control loop.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Control loop worker - runs mission control at a fixed rate on its own thread
pub mod ctrl_loop;

/// Track graph - the nodes and edges of the track
pub mod graph;

/// Mission control - mode switching, mission queue management and output bounding
pub mod mission_ctrl;

/// Cycle pacer - fixed period timing for the control loop
pub mod pacer;

/// Executable parameters
pub mod params;

/// Path engine - shortest paths through the track graph
pub mod path_engine;

/// Shared state registry - all data shared between workers
pub mod registry;

/// Regulation contract - the interface to the regulator
pub mod regulator;

/// Simulated regulator - drives missions without hardware
pub mod sim;

/// Telecommand processor - writes telecommands into the registry
pub mod tc_processor;
