//! Implementations for the MissionCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

// Internal
use super::{Mission, MissionCtrlError, MissionData, Params};
use crate::graph::Graph;
use crate::path_engine::{find_shortest_path, Path, PathError};
use crate::registry::{kind, Registry};
use crate::regulator::{MapContext, RegInput, Regulator};
use comms_if::{eqpt::act::ActDems, tc::Mode};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::clamp_sym,
    module::State,
    params,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mission control module state
pub struct MissionCtrl<R> {
    pub(crate) params: Params,

    registry: Arc<Registry>,

    regulator: R,

    /// Start of the last regulated cycle, the baseline for `dt`
    prev_cycle_start: Instant,

    pub(crate) report: StatusReport,
    arch_report: Archiver,
}

/// Input data to Mission Control.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// The instant the cycle was marked as started by the pacer
    pub cycle_start: Instant,
}

/// The actuator demands published this cycle, or `None` if the output was left untouched.
pub type OutputData = Option<ActDems>;

/// Status report for MissionCtrl processing, archived once per cycle.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// Session time at the start of processing
    pub time_s: f64,

    pub mode: Mode,
    pub outcome: CycleOutcome,
    pub replan: Replan,

    /// Time since the previous regulated cycle
    pub dt_s: f64,

    pub num_missions: usize,
    pub path_len: usize,
    pub index: usize,

    /// The regulator's index went past the end of the path
    pub index_overshoot: bool,
    pub mission_finished: bool,

    /// The operator replaced the front mission while it was being driven
    pub queue_changed: bool,

    pub angle_limited: bool,
    pub speed_limited: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What the controller did in a cycle.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The operator's request was forwarded
    Manual,

    /// Autonomous with no mission to drive
    Idle,

    /// The front mission was driven by the regulator
    Regulated,
}

/// How the path was obtained in a regulated cycle.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
pub enum Replan {
    /// The cached path still leads to the mission's end
    NotNeeded,

    /// A new path was planned for the front mission
    Planned,

    /// The vehicle wasn't at the mission's start, a mission taking it back there was queued
    Detour,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<R: Regulator> MissionCtrl<R> {
    /// Create a new controller acting on the given registry.
    ///
    /// The first regulated cycle measures its `dt` from this call.
    pub fn new(params: Params, registry: Arc<Registry>, regulator: R) -> Self {
        Self {
            params,
            registry,
            regulator,
            prev_cycle_start: Instant::now(),
            report: StatusReport::default(),
            arch_report: Archiver::default(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// True if status reports are being archived.
    pub fn is_archiving(&self) -> bool {
        self.arch_report.is_active()
    }

    /// Forward the operator's request to the actuators.
    fn forward_request(&mut self) -> ActDems {
        let request = self.registry.read::<kind::CtrlChange>();

        let output = ActDems {
            angle: request.angle,
            speed: request.speed,
        };

        self.registry.write::<kind::RegOutput>(output);
        self.report.outcome = CycleOutcome::Manual;

        output
    }

    /// Drive the front mission of the queue, if there is one.
    fn drive_mission(&mut self, cycle_start: Instant) -> Result<OutputData, MissionCtrlError> {
        let mission_data = self.registry.read::<kind::Mission>();
        self.report.num_missions = mission_data.missions.len();

        let mission = match mission_data.current() {
            Some(&m) => m,
            None => {
                self.report.outcome = CycleOutcome::Idle;
                return Ok(None);
            }
        };

        let telemetry = self.registry.read::<kind::Telemetry>();
        let reg_params = self.registry.read::<kind::RegParams>();
        let samples = self.registry.read::<kind::RegSamples>();
        let cached_path = self.registry.read::<kind::Path>();
        let sensor_data = self.registry.read::<kind::SensorData>();

        let dt = cycle_start
            .saturating_duration_since(self.prev_cycle_start)
            .as_secs_f64();
        self.report.dt_s = dt;

        let (path, detour) = self
            .plan(&mission_data, mission, cached_path)
            .map_err(|source| MissionCtrlError::PlanningFailed { mission, source })?;

        // A new path restarts progress from its first step
        let index = match self.report.replan {
            Replan::NotNeeded => mission_data.index,
            _ => 0,
        };

        self.registry.write::<kind::Path>(path.clone());

        let input = RegInput {
            telemetry,
            sensor_data,
            params: reg_params,
            dt,
            samples,
            map: MapContext {
                graph: mission_data.graph.clone(),
                path,
                previous_pos: mission_data.previous_pos,
                next_pos: mission_data.next_pos,
                index,
            },
        };

        let mut result = self.regulator.regulate(&input);

        let path_len = input.map.path.len();
        self.report.path_len = path_len;

        if result.index >= path_len {
            result.speed = 0.0;
            result.mission_finished = true;
            self.report.index_overshoot = true;
        }

        if result.mission_finished {
            result.index = 0;
            result.samples.dist_stop_line = self.params.stop_line_reset_dist;
            self.report.mission_finished = true;
        }

        let (angle, angle_limited) = bound(result.angle, self.params.max_angle);
        let (speed, speed_limited) = bound(result.speed, self.params.max_speed);
        self.report.angle_limited = angle_limited;
        self.report.speed_limited = speed_limited;

        let output = ActDems { angle, speed };

        trace!("MissionCtrl output: {:?}", output);

        self.registry.write::<kind::RegOutput>(output);
        self.registry.write::<kind::RegSamples>(result.samples);

        // Queue changes are applied to the current queue rather than overwriting it, so missions
        // queued by the operator during this cycle are kept. If the operator replaced the front
        // mission meanwhile, this cycle's progress no longer applies to the queue.
        let (still_current, finished, num_missions, index) =
            self.registry.update::<kind::Mission, _, _>(|md| {
                md.previous_pos = result.previous_pos;
                md.next_pos = result.next_pos;

                if md.missions.front() != Some(&mission) {
                    md.index = 0;
                    return (false, None, md.missions.len(), md.index);
                }

                if let Some(d) = detour {
                    md.missions.push_front(d);
                }

                let finished = if result.mission_finished {
                    md.missions.pop_front()
                } else {
                    None
                };

                md.index = result.index;

                (true, finished, md.missions.len(), md.index)
            });

        if !still_current {
            info!(
                "Mission queue changed during the cycle, {} no longer at the front",
                mission
            );
            self.report.queue_changed = true;
            self.registry.write::<kind::Path>(Path::default());
        } else if let Some(m) = finished {
            // The finished path no longer leads anywhere useful
            self.registry.write::<kind::Path>(Path::default());

            info!(
                "Mission {} finished at node {}, {} missions remaining",
                m, result.previous_pos, num_missions
            );
        }

        self.report.outcome = CycleOutcome::Regulated;
        self.report.num_missions = num_missions;
        self.report.index = index;
        self.prev_cycle_start = cycle_start;

        Ok(Some(output))
    }

    /// Get the path to drive for the mission, and the detour mission to queue in front of it if
    /// the vehicle must first return to the mission's start.
    fn plan(
        &mut self,
        mission_data: &MissionData,
        mission: Mission,
        cached_path: Path,
    ) -> Result<(Path, Option<Mission>), PathError> {
        let graph = mission_data.graph.as_ref();
        let pos = mission_data.previous_pos;
        let stale = !cached_path.terminates_at(mission.end);

        if pos != mission.start && stale {
            // Drive to the end of the start's first edge, arriving there from the start
            let target = graph
                .first_edge(mission.start)
                .ok_or(PathError::NoOutgoingEdge(mission.start))?
                .end;
            let detour = Mission { start: pos, end: target };

            let path = find_shortest_path(graph, pos, target)?;

            info!(
                "Vehicle at node {} is not at the start of mission {}, queueing detour {}",
                pos, mission, detour
            );
            self.report.replan = Replan::Detour;
            session::save_with_timestamp("mission_ctrl/path.json", path.clone());

            Ok((path, Some(detour)))
        } else if stale {
            let path = find_shortest_path(graph, pos, mission.end)?;

            debug!(
                "Planned path for mission {} from node {}: {:?}",
                mission,
                pos,
                path.nodes().collect::<Vec<_>>()
            );
            self.report.replan = Replan::Planned;
            session::save_with_timestamp("mission_ctrl/path.json", path.clone());

            Ok((path, None))
        } else {
            self.report.replan = Replan::NotNeeded;

            Ok((cached_path, None))
        }
    }
}

impl<R: Regulator> State for MissionCtrl<R> {
    type InitData = &'static str;
    type InitError = MissionCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = MissionCtrlError;

    /// Initialise the MissionCtrl module.
    ///
    /// Expected init data is the path to the parameter file. The regulator samples are reset to
    /// those of a vehicle stopped at a stop line.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data).map_err(MissionCtrlError::ParamLoadError)?;

        if self.params.archive {
            self.arch_report = Archiver::from_path(session, "mission_ctrl/status_report.csv")
                .map_err(MissionCtrlError::ArchiveError)?;
        }

        self.registry.update::<kind::RegSamples, _, _>(|s| {
            s.dist_stop_line = self.params.stop_line_reset_dist
        });

        Ok(())
    }

    /// Perform cyclic processing of Mission Control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport {
            time_s: session::get_elapsed_seconds(),
            ..Default::default()
        };

        let mode = self.registry.read::<kind::Mode>();
        self.report.mode = mode;

        let output = match mode {
            Mode::Manual => Some(self.forward_request()),
            Mode::Autonomous => self.drive_mission(input_data.cycle_start)?,
        };

        Ok((output, self.report))
    }

    /// Demand a stop.
    fn make_safe(&mut self) {
        self.registry.write::<kind::RegOutput>(ActDems::stop());
    }
}

impl<R> Archived for MissionCtrl<R> {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)
    }
}

impl Default for CycleOutcome {
    fn default() -> Self {
        CycleOutcome::Idle
    }
}

impl Default for Replan {
    fn default() -> Self {
        Replan::NotNeeded
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Limit a demand to `[-limit, limit]`, replacing non-finite demands with zero.
fn bound(value: f64, limit: f64) -> (f64, bool) {
    if value.is_finite() {
        clamp_sym(value, limit)
    } else {
        (0.0, true)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{Direction::*, NodeId, TrackGraph};
    use crate::path_engine::PathStep;
    use crate::regulator::{RegResult, RegSamples};
    use crate::tc_processor;
    use comms_if::tc::{CtrlChange, MissionCmd, Tc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Ring 0 -> 1 -> 2 -> 3 -> 0 with unit costs
    fn ring() -> Arc<TrackGraph> {
        let mut g = TrackGraph::new(4);
        g.add_edge(0, 1, 1, Forward).unwrap();
        g.add_edge(1, 2, 1, Forward).unwrap();
        g.add_edge(2, 3, 1, Left).unwrap();
        g.add_edge(3, 0, 1, Left).unwrap();
        Arc::new(g)
    }

    fn registry(graph: Arc<TrackGraph>, missions: &[(NodeId, NodeId)], pos: NodeId) -> Arc<Registry> {
        let mut md = MissionData::new(graph, pos);
        for &(start, end) in missions {
            md.queue(Mission { start, end }).unwrap();
        }

        let reg = Registry::new(md, Default::default(), RegSamples::at_rest(480.0));
        reg.write::<kind::Mode>(Mode::Autonomous);

        Arc::new(reg)
    }

    /// A regulator recording its inputs and answering with `respond`.
    fn recorder<F>(respond: F) -> (impl Fn(&RegInput) -> RegResult, Arc<Mutex<Vec<RegInput>>>)
    where
        F: Fn(&RegInput) -> RegResult,
    {
        let inputs = Arc::new(Mutex::new(Vec::new()));
        let i = inputs.clone();

        let reg = move |input: &RegInput| {
            i.lock().unwrap().push(input.clone());
            respond(input)
        };

        (reg, inputs)
    }

    fn now() -> InputData {
        InputData {
            cycle_start: Instant::now(),
        }
    }

    #[test]
    fn test_manual_forwarding() {
        let reg = registry(ring(), &[(0, 2)], 0);
        reg.write::<kind::Mode>(Mode::Manual);
        reg.write::<kind::CtrlChange>(CtrlChange {
            angle: 2.0,
            speed: -3.0,
        });

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), move |i: &RegInput| {
            c.fetch_add(1, Ordering::SeqCst);
            RegResult::hold(i)
        });

        let (output, report) = ctrl.proc(&now()).unwrap();

        // Forwarded unchanged, even outside the autonomous bounds
        let expected = ActDems {
            angle: 2.0,
            speed: -3.0,
        };
        assert_eq!(output, Some(expected));
        assert_eq!(reg.read::<kind::RegOutput>(), expected);
        assert_eq!(report.outcome, CycleOutcome::Manual);
        assert_eq!(reg.read::<kind::Mode>(), Mode::Manual);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(reg.read::<kind::Path>().is_empty());
        assert!(!ctrl.is_archiving());
    }

    #[test]
    fn test_empty_queue() {
        let reg = registry(ring(), &[], 0);
        let previous = ActDems {
            angle: 0.1,
            speed: 0.2,
        };
        reg.write::<kind::RegOutput>(previous);

        let (regulator, inputs) = recorder(RegResult::hold);
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), regulator);

        let (output, report) = ctrl.proc(&now()).unwrap();

        assert_eq!(output, None);
        assert_eq!(report.outcome, CycleOutcome::Idle);
        assert_eq!(reg.read::<kind::RegOutput>(), previous);
        assert!(reg.read::<kind::Path>().is_empty());
        assert!(inputs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_plan_from_start() {
        let mut g = TrackGraph::new(3);
        g.add_edge(0, 1, 1, Forward).unwrap();
        g.add_edge(1, 2, 1, Forward).unwrap();

        let reg = registry(Arc::new(g), &[(0, 2)], 0);
        let (regulator, inputs) = recorder(RegResult::hold);
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), regulator);

        let (_, report) = ctrl.proc(&now()).unwrap();

        let expected = Path::new(vec![
            PathStep {
                node: 1,
                dir: Forward,
            },
            PathStep {
                node: 2,
                dir: Forward,
            },
        ]);

        assert_eq!(report.replan, Replan::Planned);
        assert_eq!(reg.read::<kind::Path>(), expected);

        // No detour, the vehicle is already at the start
        let md = reg.read::<kind::Mission>();
        assert_eq!(md.missions.len(), 1);
        assert_eq!(md.current(), Some(&Mission { start: 0, end: 2 }));

        let inputs = inputs.lock().unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].map.path, expected);
        assert_eq!(inputs[0].map.previous_pos, 0);
        assert_eq!(inputs[0].samples.dist_stop_line, 480.0);
    }

    #[test]
    fn test_detour() {
        let reg = registry(ring(), &[(0, 2)], 2);
        let (regulator, inputs) = recorder(RegResult::hold);
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), regulator);

        let (_, report) = ctrl.proc(&now()).unwrap();
        assert_eq!(report.replan, Replan::Detour);

        // 0's first edge ends at 1, so the vehicle goes 2 -> 1 first
        let md = reg.read::<kind::Mission>();
        assert_eq!(
            md.missions.iter().copied().collect::<Vec<_>>(),
            vec![Mission { start: 2, end: 1 }, Mission { start: 0, end: 2 }]
        );

        let path = reg.read::<kind::Path>();
        assert_eq!(path.nodes().collect::<Vec<_>>(), vec![3, 0, 1]);
        assert_eq!(inputs.lock().unwrap()[0].map.path, path);

        // The detour path now terminates at the front mission's end, so it is reused
        let (_, report) = ctrl.proc(&now()).unwrap();
        assert_eq!(report.replan, Replan::NotNeeded);
        assert_eq!(reg.read::<kind::Mission>().missions.len(), 2);
    }

    /// Junction 0 with two ways out, turning right to `first` and going forward to `second`, on
    /// the roads 1 -> 2 -> 0 and 3 -> 2
    fn junction(first: NodeId, second: NodeId) -> Arc<TrackGraph> {
        let mut g = TrackGraph::new(4);
        g.add_edge(0, first, 1, Right).unwrap();
        g.add_edge(0, second, 1, Forward).unwrap();
        g.add_edge(1, 2, 1, Forward).unwrap();
        g.add_edge(2, 0, 1, Left).unwrap();
        g.add_edge(3, 2, 1, Left).unwrap();
        Arc::new(g)
    }

    #[test]
    fn test_detour_uses_first_edge() {
        let reg = registry(junction(3, 1), &[(0, 2)], 1);
        let (regulator, _) = recorder(RegResult::hold);
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), regulator);

        let (_, report) = ctrl.proc(&now()).unwrap();
        assert_eq!(report.replan, Replan::Detour);

        // 0 -> 3 is listed first, even though 0 -> 1 also exists
        assert_eq!(
            reg.read::<kind::Mission>().current(),
            Some(&Mission { start: 1, end: 3 })
        );
        assert_eq!(
            reg.read::<kind::Path>().nodes().collect::<Vec<_>>(),
            vec![2, 0, 3]
        );
    }

    #[test]
    fn test_detour_to_current_node_is_a_loop() {
        // 0 -> 1 listed first and the vehicle is already at 1
        let reg = registry(junction(1, 3), &[(0, 2)], 1);
        let (regulator, _) = recorder(RegResult::hold);
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), regulator);

        let (_, report) = ctrl.proc(&now()).unwrap();
        assert_eq!(report.replan, Replan::Detour);

        let md = reg.read::<kind::Mission>();
        assert_eq!(
            md.missions.iter().copied().collect::<Vec<_>>(),
            vec![Mission { start: 1, end: 1 }, Mission { start: 0, end: 2 }]
        );

        // Round the loop back to 1, arriving from 0
        let path = reg.read::<kind::Path>();
        assert_eq!(
            path.steps().to_vec(),
            vec![
                PathStep {
                    node: 2,
                    dir: Forward
                },
                PathStep { node: 0, dir: Left },
                PathStep { node: 1, dir: Right },
            ]
        );
    }

    #[test]
    fn test_operator_replaces_queue_mid_cycle() {
        let reg = registry(ring(), &[(0, 2)], 0);

        // The operator clears the queue and queues a new mission while the regulator runs, and the
        // regulator finishes the old one in the same cycle
        let r = reg.clone();
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), move |i: &RegInput| {
            tc_processor::exec(&r, &Tc::ClearMissions).unwrap();
            tc_processor::exec(&r, &Tc::QueueMission(MissionCmd { start: 3, end: 1 })).unwrap();

            RegResult {
                previous_pos: 1,
                index: 1,
                mission_finished: true,
                ..RegResult::hold(i)
            }
        });

        let (_, report) = ctrl.proc(&now()).unwrap();
        assert!(report.queue_changed);

        // The new mission was never driven so it is still queued
        let md = reg.read::<kind::Mission>();
        assert_eq!(
            md.missions.iter().copied().collect::<Vec<_>>(),
            vec![Mission { start: 3, end: 1 }]
        );
        assert_eq!(md.index, 0);
        assert_eq!(md.previous_pos, 1);
        assert!(reg.read::<kind::Path>().is_empty());
    }

    #[test]
    fn test_operator_clears_during_detour() {
        let reg = registry(ring(), &[(0, 2)], 2);

        let r = reg.clone();
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), move |i: &RegInput| {
            tc_processor::exec(&r, &Tc::ClearMissions).unwrap();

            RegResult {
                index: 1,
                ..RegResult::hold(i)
            }
        });

        let (_, report) = ctrl.proc(&now()).unwrap();
        assert_eq!(report.replan, Replan::Detour);
        assert!(report.queue_changed);
        assert_eq!(report.num_missions, 0);

        // The detour is not queued again for a cancelled mission
        let md = reg.read::<kind::Mission>();
        assert!(md.missions.is_empty());
        assert_eq!(md.index, 0);
        assert!(reg.read::<kind::Path>().is_empty());

        let (output, report) = ctrl.proc(&now()).unwrap();
        assert_eq!(output, None);
        assert_eq!(report.outcome, CycleOutcome::Idle);
    }

    #[test]
    fn test_operator_appends_during_detour() {
        let reg = registry(ring(), &[(0, 2)], 2);

        let r = reg.clone();
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), move |i: &RegInput| {
            tc_processor::exec(&r, &Tc::QueueMission(MissionCmd { start: 2, end: 3 })).unwrap();
            RegResult::hold(i)
        });

        let (_, report) = ctrl.proc(&now()).unwrap();
        assert!(!report.queue_changed);

        let md = reg.read::<kind::Mission>();
        assert_eq!(
            md.missions.iter().copied().collect::<Vec<_>>(),
            vec![
                Mission { start: 2, end: 1 },
                Mission { start: 0, end: 2 },
                Mission { start: 2, end: 3 }
            ]
        );
        assert_eq!(reg.read::<kind::Path>().nodes().collect::<Vec<_>>(), vec![3, 0, 1]);
    }

    #[test]
    fn test_cached_path_reused() {
        let reg = registry(ring(), &[(0, 2)], 1);
        let cached = Path::new(vec![
            PathStep {
                node: 1,
                dir: Forward,
            },
            PathStep {
                node: 2,
                dir: Forward,
            },
        ]);
        reg.write::<kind::Path>(cached.clone());
        reg.update::<kind::Mission, _, _>(|md| md.index = 1);

        let (regulator, inputs) = recorder(RegResult::hold);
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), regulator);

        let (_, report) = ctrl.proc(&now()).unwrap();

        // Away from the start but on the way to the end, so no detour
        assert_eq!(report.replan, Replan::NotNeeded);
        assert_eq!(reg.read::<kind::Mission>().missions.len(), 1);
        assert_eq!(inputs.lock().unwrap()[0].map.index, 1);
        assert_eq!(inputs.lock().unwrap()[0].map.path, cached);
    }

    #[test]
    fn test_index_overshoot() {
        let reg = registry(ring(), &[(0, 2), (2, 0)], 0);
        let (regulator, _) = recorder(|i: &RegInput| RegResult {
            speed: 0.8,
            index: i.map.path.len(),
            previous_pos: 1,
            next_pos: 2,
            samples: RegSamples {
                dist_stop_line: 3.0,
                ..i.samples
            },
            ..RegResult::hold(i)
        });
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), regulator);

        let (output, report) = ctrl.proc(&now()).unwrap();

        assert_eq!(output.map(|o| o.speed), Some(0.0));
        assert!(report.index_overshoot);
        assert!(report.mission_finished);

        let md = reg.read::<kind::Mission>();
        assert_eq!(md.current(), Some(&Mission { start: 2, end: 0 }));
        assert_eq!(md.index, 0);
        assert_eq!(md.previous_pos, 1);
        assert_eq!(md.next_pos, 2);

        assert_eq!(reg.read::<kind::RegSamples>().dist_stop_line, 480.0);
        assert!(reg.read::<kind::Path>().is_empty());
    }

    #[test]
    fn test_mission_finished() {
        let reg = registry(ring(), &[(0, 2)], 0);
        let (regulator, _) = recorder(|i: &RegInput| RegResult {
            speed: 0.3,
            previous_pos: 1,
            mission_finished: true,
            ..RegResult::hold(i)
        });
        let mut params = Params::default();
        params.stop_line_reset_dist = 200.0;
        let mut ctrl = MissionCtrl::new(params, reg.clone(), regulator);

        let (output, report) = ctrl.proc(&now()).unwrap();

        // The regulator's own stop is respected, only overshoot forces the speed
        assert_eq!(output.map(|o| o.speed), Some(0.3));
        assert!(report.mission_finished);
        assert!(!report.index_overshoot);
        assert_eq!(report.num_missions, 0);

        let md = reg.read::<kind::Mission>();
        assert!(md.missions.is_empty());
        assert_eq!(md.previous_pos, 1);
        assert_eq!(reg.read::<kind::RegSamples>().dist_stop_line, 200.0);

        // Nothing left to do
        let (output, report) = ctrl.proc(&now()).unwrap();
        assert_eq!(output, None);
        assert_eq!(report.outcome, CycleOutcome::Idle);
    }

    #[test]
    fn test_output_bounds() {
        let reg = registry(ring(), &[(0, 2)], 0);
        let demands = Arc::new(Mutex::new((0.1, -5.0)));
        let d = demands.clone();
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), move |i: &RegInput| {
            let (angle, speed) = *d.lock().unwrap();
            RegResult {
                angle,
                speed,
                ..RegResult::hold(i)
            }
        });

        // Large reverse speed with a small angle, the speed must still be bounded
        let (output, report) = ctrl.proc(&now()).unwrap();
        assert_eq!(
            output,
            Some(ActDems {
                angle: 0.1,
                speed: -1.0
            })
        );
        assert!(!report.angle_limited);
        assert!(report.speed_limited);

        *demands.lock().unwrap() = (-3.0, 0.5);
        let (output, report) = ctrl.proc(&now()).unwrap();
        assert_eq!(
            output,
            Some(ActDems {
                angle: -0.5,
                speed: 0.5
            })
        );
        assert!(report.angle_limited);
        assert!(!report.speed_limited);

        *demands.lock().unwrap() = (0.2, std::f64::NAN);
        let (output, _) = ctrl.proc(&now()).unwrap();
        assert_eq!(output.map(|o| o.speed), Some(0.0));
        assert_eq!(reg.read::<kind::RegOutput>().speed, 0.0);
    }

    #[test]
    fn test_planning_failure() {
        // 3 can't be reached from anywhere
        let mut g = TrackGraph::new(4);
        g.add_edge(0, 1, 1, Forward).unwrap();
        g.add_edge(1, 0, 1, Forward).unwrap();

        let reg = registry(Arc::new(g), &[(0, 3)], 0);
        reg.write::<kind::RegOutput>(ActDems {
            angle: 0.2,
            speed: 0.7,
        });

        let (regulator, inputs) = recorder(RegResult::hold);
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), regulator);

        match ctrl.proc(&now()) {
            Err(MissionCtrlError::PlanningFailed { mission, source }) => {
                assert_eq!(mission, Mission { start: 0, end: 3 });
                assert_eq!(source, PathError::Unreachable { start: 0, end: 3 });
            }
            r => panic!("Expected a planning failure, got {:?}", r.map(|(o, _)| o)),
        }

        ctrl.make_safe();

        assert!(reg.read::<kind::RegOutput>().is_stopped());
        assert_eq!(reg.read::<kind::Mission>().missions.len(), 1);
        assert!(inputs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dt_baseline() {
        let reg = registry(ring(), &[(0, 2)], 0);
        let (regulator, inputs) = recorder(RegResult::hold);
        let mut ctrl = MissionCtrl::new(Params::default(), reg.clone(), regulator);

        let t0 = Instant::now() + Duration::from_millis(10);
        ctrl.proc(&InputData { cycle_start: t0 }).unwrap();

        // Manual cycles don't move the baseline
        reg.write::<kind::Mode>(Mode::Manual);
        ctrl.proc(&InputData {
            cycle_start: t0 + Duration::from_millis(20),
        })
        .unwrap();

        reg.write::<kind::Mode>(Mode::Autonomous);
        let (_, report) = ctrl
            .proc(&InputData {
                cycle_start: t0 + Duration::from_millis(50),
            })
            .unwrap();

        assert!((report.dt_s - 0.05).abs() < 1e-9);

        let inputs = inputs.lock().unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs[0].dt > 0.0);
        assert!((inputs[1].dt - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_mission() {
        let mut md = MissionData::new(ring(), 0);

        assert!(md.queue(Mission { start: 0, end: 3 }).is_ok());
        assert!(matches!(
            md.queue(Mission { start: 4, end: 0 }),
            Err(MissionCtrlError::InvalidMission { num_nodes: 4, .. })
        ));
        assert_eq!(md.missions.len(), 1);

        md.index = 2;
        md.clear();
        assert!(md.current().is_none());
        assert_eq!(md.index, 0);
    }
}
