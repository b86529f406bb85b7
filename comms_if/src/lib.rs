//! # Communications interface crate.
//!
//! Provides all data exchanged between the control core and the I/O workers which surround it:
//! the operator's telecommands and the structures passed to and from the sensor/actuator board.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommands issued by the operator
pub mod tc;

/// Demands and data exchanged with the sensor/actuator board
pub mod eqpt;
