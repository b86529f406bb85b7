//! Main track-side executable entry point.
//!
//! # Architecture
//!
//! The executable consists of:
//!
//!     - Initialisation of the session, logging, parameters and the registry
//!     - The control loop thread, running mission control with the simulated regulator
//!     - The main thread, feeding telecommands from a script into the registry
//!
//! Usage: `track_exec <script.tcs>`. Execution ends when the end of the script is reached.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

// Internal
use track_lib::{
    ctrl_loop::{self, CtrlLoop},
    graph::{Graph, TrackGraph},
    mission_ctrl::{self, MissionCtrl, MissionData},
    pacer::CyclePacer,
    params::TrackExecParams,
    registry::{kind, Registry},
    regulator::{RegParams, RegSamples},
    sim::SimRegulator,
    tc_processor,
};
use util::{
    logger::{logger_init, parse_module_levels, LevelFilter},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
    time::secs_to_duration,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("track_exec", "sessions").wrap_err("Failed to create the session")?;

    // Exec params are needed to set up logging
    let exec_params: TrackExecParams =
        util::params::load("track_exec.toml").wrap_err("Could not load exec params")?;

    // Initialise logger
    let module_levels = parse_module_levels(&exec_params.module_log_levels)
        .wrap_err("Invalid module log levels")?;
    logger_init(LevelFilter::Debug, &module_levels, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Track Vehicle Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let reg_params: RegParams =
        util::params::load("regulator.toml").wrap_err("Could not load regulator params")?;

    let graph: TrackGraph = util::params::load(&exec_params.track_file)
        .wrap_err_with(|| format!("Could not load the track from {}", exec_params.track_file))?;
    graph.validate().wrap_err("The track is invalid")?;

    if exec_params.start_node >= graph.num_nodes() {
        return Err(eyre!(
            "The start node ({}) is not on the track, which has {} nodes",
            exec_params.start_node,
            graph.num_nodes()
        ));
    }

    info!(
        "Parameters loaded, track has {} nodes, vehicle starts at node {}",
        graph.num_nodes(),
        exec_params.start_node
    );

    // Keep a copy of the track this session ran on
    session.save("track.json", graph.clone());

    // ---- INITIALISE TC SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected one argument (the TC script path), found {}",
            args.len() - 1
        ));
    }

    info!("Loading script from \"{}\"", &args[1]);

    let mut si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        si.get_duration(),
        si.get_num_tcs()
    );

    // ---- INITIALISE REGISTRY AND MODULES ----

    info!("Initialising modules...");

    let registry = Arc::new(Registry::new(
        MissionData::new(Arc::new(graph), exec_params.start_node),
        reg_params,
        RegSamples::default(),
    ));

    let mut mission_ctrl = MissionCtrl::new(
        mission_ctrl::Params::default(),
        registry.clone(),
        SimRegulator,
    );
    mission_ctrl
        .init("mission_ctrl.toml", &session)
        .wrap_err("Failed to initialise MissionCtrl")?;
    info!(
        "MissionCtrl init complete, status report archiving {}",
        if mission_ctrl.is_archiving() {
            "enabled"
        } else {
            "disabled"
        }
    );

    let cycle_period = secs_to_duration(exec_params.cycle_period_s);
    let running = Arc::new(AtomicBool::new(true));

    let ctrl_jh = ctrl_loop::spawn(CtrlLoop::new(
        mission_ctrl,
        CyclePacer::new(cycle_period, exec_params.overrun_warn_limit),
        running.clone(),
    ))
    .wrap_err("Failed to start the control loop")?;

    info!("Module initialisation complete\n");

    // ---- TELECOMMAND LOOP ----

    info!("Begining telecommand processing\n");

    loop {
        let cycle_start = Instant::now();

        match si.get_pending_tcs() {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    if let Err(e) = tc_processor::exec(&registry, tc) {
                        warn!("Could not execute TC {:?}: {}", tc, e);
                    }
                }
            }
            // Exit if end of script reached
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break;
            }
        }

        if let Some(d) = cycle_period.checked_sub(cycle_start.elapsed()) {
            thread::sleep(d);
        }
    }

    // ---- SHUTDOWN ----

    running.store(false, Ordering::Relaxed);
    ctrl_loop::join(ctrl_jh).wrap_err("The control loop did not stop cleanly")?;

    let mission_data = registry.read::<kind::Mission>();
    info!(
        "Vehicle stopped after node {} with {} missions pending",
        mission_data.previous_pos,
        mission_data.missions.len()
    );

    session.exit();

    info!("End of execution");

    Ok(())
}
