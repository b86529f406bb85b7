//! # Equipment Interface
//!
//! This module defines the interface structures exchanged with the sensor/actuator board. The
//! transport itself lives outside the control core, it only moves these structures in and out of
//! the registry.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod act;
pub mod sens;
