//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable which must point at the root of the software checkout. Parameters are
/// loaded from, and sessions written into, directories beneath this root.
pub const SW_ROOT_ENV_VAR: &str = "TRACK_SW_ROOT";

/// Retrieve the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
