//! # Control loop worker
//!
//! Runs the mission controller on its own thread at the pacer's period until the shared running
//! flag is cleared. A cycle always runs to completion once started.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

// Internal
use crate::mission_ctrl::{InputData, MissionCtrl, MissionCtrlError, StatusReport};
use crate::pacer::CyclePacer;
use crate::regulator::Regulator;
use util::{archive::Archived, module::State, time};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The control loop, owning the mission controller and its pacer.
pub struct CtrlLoop<R> {
    ctrl: MissionCtrl<R>,
    pacer: CyclePacer,
    running: Arc<AtomicBool>,

    num_cycles: u64,
    num_consec_errors: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CtrlLoopError {
    #[error("Could not spawn the control loop thread: {0}")]
    SpawnError(std::io::Error),

    #[error("The control loop thread panicked")]
    Panicked,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<R: Regulator> CtrlLoop<R> {
    pub fn new(ctrl: MissionCtrl<R>, pacer: CyclePacer, running: Arc<AtomicBool>) -> Self {
        Self {
            ctrl,
            pacer,
            running,
            num_cycles: 0,
            num_consec_errors: 0,
        }
    }

    /// Run cycles until the running flag is cleared.
    pub fn run(&mut self) {
        info!(
            "Control loop started, period {:.3} s",
            self.pacer.period().as_secs_f64()
        );

        while self.running.load(Ordering::Relaxed) {
            self.cycle();
        }

        // Leave the vehicle stopped
        self.ctrl.make_safe();

        info!("Control loop stopped after {} cycles", self.num_cycles);
    }

    /// Run a single cycle, including the wait for the end of the period.
    ///
    /// Returns the controller's report, or `None` if the cycle failed.
    pub fn cycle(&mut self) -> Option<StatusReport> {
        let cycle_start = self.pacer.mark();

        let report = match self.ctrl.proc(&InputData { cycle_start }) {
            Ok((_, report)) => {
                if self.num_consec_errors > 0 {
                    info!(
                        "Mission control recovered after {} failed cycles",
                        self.num_consec_errors
                    );
                }
                self.num_consec_errors = 0;
                Some(report)
            }
            Err(e) => {
                self.handle_error(e);
                None
            }
        };

        if let Err(e) = self.ctrl.write() {
            warn!("Could not archive the mission control report: {}", e);
        }

        self.num_cycles += 1;

        match report {
            Some(r) if r.mission_finished => {
                let settle = time::secs_to_duration(self.ctrl.params().settle_duration_s);
                debug!("Settling for {:.3} s", settle.as_secs_f64());
                self.pacer.settle(settle);
            }
            _ => {
                self.pacer.wait();
            }
        }

        report
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn num_consec_errors(&self) -> u64 {
        self.num_consec_errors
    }

    /// Hold the vehicle stationary, only warning on the first of a run of failures since the
    /// same failure repeats every cycle until the queue changes.
    fn handle_error(&mut self, e: MissionCtrlError) {
        if self.num_consec_errors == 0 {
            warn!("Error during MissionCtrl processing: {}", e);
        } else {
            debug!("Error during MissionCtrl processing: {}", e);
        }

        self.num_consec_errors += 1;
        self.ctrl.make_safe();
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Spawn the control loop on its own thread.
pub fn spawn<R>(mut ctrl_loop: CtrlLoop<R>) -> Result<JoinHandle<()>, CtrlLoopError>
where
    R: Regulator + Send + 'static,
{
    thread::Builder::new()
        .name("ctrl_loop".into())
        .spawn(move || ctrl_loop.run())
        .map_err(CtrlLoopError::SpawnError)
}

/// Wait for a spawned control loop to finish.
pub fn join(jh: JoinHandle<()>) -> Result<(), CtrlLoopError> {
    jh.join().map_err(|_| CtrlLoopError::Panicked)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{Direction, TrackGraph};
    use crate::mission_ctrl::{Mission, MissionData, Params};
    use crate::registry::{kind, Registry};
    use crate::regulator::{RegInput, RegResult, RegParams, RegSamples};
    use comms_if::{eqpt::act::ActDems, tc::Mode};
    use std::time::{Duration, Instant};

    fn registry(graph: TrackGraph, mission: Mission) -> Arc<Registry> {
        let mut md = MissionData::new(Arc::new(graph), mission.start);
        md.queue(mission).unwrap();

        let reg = Registry::new(md, RegParams::default(), RegSamples::default());
        reg.write::<kind::Mode>(Mode::Autonomous);

        Arc::new(reg)
    }

    fn params(settle_duration_s: f64) -> Params {
        Params {
            settle_duration_s,
            ..Default::default()
        }
    }

    #[test]
    fn test_failed_cycles_hold_stationary() {
        // Node 2 can't be reached
        let mut g = TrackGraph::new(3);
        g.add_edge(0, 1, 1, Direction::Forward).unwrap();

        let reg = registry(g, Mission { start: 0, end: 2 });
        reg.write::<kind::RegOutput>(ActDems {
            angle: 0.0,
            speed: 0.5,
        });

        let ctrl = MissionCtrl::new(params(0.0), reg.clone(), RegResult::hold);
        let mut ctrl_loop = CtrlLoop::new(
            ctrl,
            CyclePacer::new(Duration::from_millis(1), 10),
            Arc::new(AtomicBool::new(true)),
        );

        assert!(ctrl_loop.cycle().is_none());
        assert!(ctrl_loop.cycle().is_none());

        assert_eq!(ctrl_loop.num_consec_errors(), 2);
        assert_eq!(ctrl_loop.num_cycles(), 2);
        assert!(reg.read::<kind::RegOutput>().is_stopped());
        assert_eq!(reg.read::<kind::Mission>().missions.len(), 1);

        // The queue being cleared brings the loop back to idle
        reg.update::<kind::Mission, _, _>(|md| md.clear());
        assert!(ctrl_loop.cycle().is_some());
        assert_eq!(ctrl_loop.num_consec_errors(), 0);
    }

    #[test]
    fn test_settle_after_mission() {
        let mut g = TrackGraph::new(2);
        g.add_edge(0, 1, 1, Direction::Forward).unwrap();

        let reg = registry(g, Mission { start: 0, end: 1 });
        let finish = |i: &RegInput| RegResult {
            mission_finished: true,
            ..RegResult::hold(i)
        };

        let ctrl = MissionCtrl::new(params(0.05), reg.clone(), finish);
        let mut ctrl_loop = CtrlLoop::new(
            ctrl,
            CyclePacer::new(Duration::from_millis(1), 10),
            Arc::new(AtomicBool::new(true)),
        );

        let start = Instant::now();
        let report = ctrl_loop.cycle();

        assert!(report.map(|r| r.mission_finished).unwrap_or(false));
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(reg.read::<kind::Mission>().missions.is_empty());
    }

    #[test]
    fn test_thread_stops() {
        let mut g = TrackGraph::new(2);
        g.add_edge(0, 1, 1, Direction::Forward).unwrap();

        let reg = registry(g, Mission { start: 0, end: 1 });
        reg.write::<kind::Mode>(Mode::Manual);
        reg.write::<kind::CtrlChange>(comms_if::tc::CtrlChange {
            angle: 0.0,
            speed: 0.2,
        });

        let running = Arc::new(AtomicBool::new(true));
        let ctrl = MissionCtrl::new(params(0.0), reg.clone(), RegResult::hold);
        let jh = spawn(CtrlLoop::new(
            ctrl,
            CyclePacer::new(Duration::from_millis(2), 10),
            running.clone(),
        ))
        .unwrap();

        // Wait for the request to be forwarded
        let start = Instant::now();
        while reg.read::<kind::RegOutput>().speed != 0.2 {
            assert!(start.elapsed() < Duration::from_secs(5));
            thread::sleep(Duration::from_millis(1));
        }

        running.store(false, Ordering::Relaxed);
        join(jh).unwrap();

        // Left stopped on exit
        assert!(reg.read::<kind::RegOutput>().is_stopped());
    }
}
