//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface.
//!
//! Telecommands are JSON objects with a `type` string and, for those types which need one, a
//! `payload`:
//!
//! ```json
//! {"type": "MISSION", "payload": {"start": 0, "end": 4}}
//! ```

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod ctrl;
pub mod mission;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::de::DeserializeOwned;
use serde_json::{self, Value};
use thiserror::Error;

// Internal
pub use ctrl::{CtrlChange, Mode};
pub use mission::MissionCmd;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the vehicle by the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Tc {
    /// Switch between manual and autonomous operation.
    SetMode(Mode),

    /// Directly set the steering and speed, used in manual mode.
    CtrlChange(CtrlChange),

    /// Add a mission to the back of the mission queue.
    QueueMission(MissionCmd),

    /// Drop all queued missions and the cached path.
    ClearMissions,

    /// Bring the vehicle to a stop under manual control.
    Stop,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC has an invalid type ({0})")]
    InvalidType(String),

    #[error("TC of type {0} is expected to have a payload but it doesn't")]
    MissingPayload(String),

    #[error("The payload of a {0} TC is invalid: {1}")]
    InvalidPayload(String, serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        let val: Value = serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)?;

        let tc_type = match val["type"].as_str() {
            Some(s) => s,
            None => {
                return Err(TcParseError::InvalidType(String::from(
                    "Expected \"type\" to be a string",
                )))
            }
        };

        match tc_type {
            "MODE" => Ok(Tc::SetMode(payload(tc_type, &val)?)),
            "CTRL" => Ok(Tc::CtrlChange(payload(tc_type, &val)?)),
            "MISSION" => Ok(Tc::QueueMission(payload(tc_type, &val)?)),
            "CLEAR" => Ok(Tc::ClearMissions),
            "STOP" => Ok(Tc::Stop),
            t => Err(TcParseError::InvalidType(format!(
                "{} is not a recognised TC type",
                t
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Deserialise the payload of a TC of the given type.
fn payload<T: DeserializeOwned>(tc_type: &str, val: &Value) -> Result<T, TcParseError> {
    if val["payload"].is_null() {
        return Err(TcParseError::MissingPayload(tc_type.to_string()));
    }

    serde_json::from_value(val["payload"].clone())
        .map_err(|e| TcParseError::InvalidPayload(tc_type.to_string(), e))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
