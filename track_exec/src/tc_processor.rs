//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source, writing them into the
//! registry for the control loop to act on.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};

// Internal
use crate::mission_ctrl::{Mission, MissionCtrlError};
use crate::path_engine::Path;
use crate::registry::{kind, Registry};
use comms_if::tc::{CtrlChange, Mode, Tc};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Only mission commands can be rejected, if they reference nodes which aren't on the track.
pub fn exec(registry: &Registry, tc: &Tc) -> Result<(), MissionCtrlError> {
    match tc {
        Tc::SetMode(m) => {
            info!("Switching to {:?} mode", m);
            registry.write::<kind::Mode>(*m);
        }
        Tc::CtrlChange(c) => {
            debug!("Control change request: {:?}", c);
            registry.write::<kind::CtrlChange>(*c);
        }
        Tc::QueueMission(cmd) => {
            let mission = Mission::from(*cmd);
            let num_missions = registry.update::<kind::Mission, _, _>(|md| {
                md.queue(mission).map(|_| md.missions.len())
            })?;
            info!("Mission {} queued, {} missions pending", mission, num_missions);
        }
        Tc::ClearMissions => {
            info!("Clearing all missions");
            registry.update::<kind::Mission, _, _>(|md| md.clear());
            registry.write::<kind::Path>(Path::default());
        }
        Tc::Stop => {
            info!("Stop commanded, switching to manual mode");
            registry.write::<kind::CtrlChange>(CtrlChange::default());
            registry.write::<kind::Mode>(Mode::Manual);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{Direction, TrackGraph};
    use crate::mission_ctrl::MissionData;
    use crate::path_engine::PathStep;
    use crate::regulator::{RegParams, RegSamples};
    use comms_if::tc::MissionCmd;
    use std::sync::Arc;

    fn registry() -> Registry {
        Registry::new(
            MissionData::new(Arc::new(TrackGraph::new(3)), 0),
            RegParams::default(),
            RegSamples::default(),
        )
    }

    #[test]
    fn test_mode_and_ctrl() {
        let reg = registry();

        exec(&reg, &Tc::SetMode(Mode::Autonomous)).unwrap();
        assert_eq!(reg.read::<kind::Mode>(), Mode::Autonomous);

        let req = CtrlChange {
            angle: 0.1,
            speed: 0.4,
        };
        exec(&reg, &Tc::CtrlChange(req)).unwrap();
        assert_eq!(reg.read::<kind::CtrlChange>(), req);

        exec(&reg, &Tc::Stop).unwrap();
        assert_eq!(reg.read::<kind::Mode>(), Mode::Manual);
        assert_eq!(reg.read::<kind::CtrlChange>(), CtrlChange::default());
    }

    #[test]
    fn test_missions() {
        let reg = registry();

        exec(&reg, &Tc::QueueMission(MissionCmd { start: 0, end: 2 })).unwrap();
        exec(&reg, &Tc::QueueMission(MissionCmd { start: 2, end: 2 })).unwrap();
        assert!(exec(&reg, &Tc::QueueMission(MissionCmd { start: 0, end: 3 })).is_err());

        let md = reg.read::<kind::Mission>();
        assert_eq!(
            md.missions.iter().copied().collect::<Vec<_>>(),
            vec![Mission { start: 0, end: 2 }, Mission { start: 2, end: 2 }]
        );

        reg.write::<kind::Path>(Path::new(vec![PathStep {
            node: 2,
            dir: Direction::Forward,
        }]));

        exec(&reg, &Tc::ClearMissions).unwrap();
        assert!(reg.read::<kind::Mission>().missions.is_empty());
        assert!(reg.read::<kind::Path>().is_empty());
    }
}
