//! Run loop for a single oscillator experiment.
//!
//! The loop:
//! 1. Seed the run RNG, sample ω, draw θ uniform in [−π, π), zero memory
//! 2. At each step t = step·dt:
//!    a. Apply due perturbations, then restore expired omega kicks
//!    b. Advance the state with the configured physics and integrator
//!    c. Evaluate the enabled observers and record a metrics row
//! 3. Summarize R over the final 20% of rows

use std::f64::consts::PI;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::error::LabResult;
use crate::integrator::{advance, OscillatorState};
use crate::observer::{order_parameter, OrderParameter, SyncTracker};
use crate::perturbation::{EventRecord, PerturbationScheduler};
use crate::physics::{CouplingParams, PhysicsModel};
use crate::stats;
use crate::topology::{build_graph, CouplingGraph};

/// R must strictly exceed this for a run to count as locked.
pub const LOCK_IN_THRESHOLD: f64 = 0.9;
/// Fraction of rows, from the start, excluded from the final-window summary.
pub const TRANSIENT_FRACTION: f64 = 0.8;
/// Metrics rows reserved up front; longer runs grow the table as they go.
const PREALLOC_ROWS: usize = 1 << 16;

/// Observer output after one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    /// Time at the end of the step, rounded to 8 decimals.
    pub t: f64,
    #[serde(rename = "R")]
    pub r: f64,
    pub psi: f64,
    pub sigma_theta: f64,
    pub delta_phi: f64,
}

/// Aggregate figures for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Mean R over the final window.
    #[serde(rename = "mean_R_final")]
    pub mean_r_final: f64,
    /// Standard error of R over the final window.
    #[serde(rename = "se_R_final")]
    pub se_r_final: f64,
    /// Time of the first row with R above the lock-in threshold.
    pub settling_time: Option<f64>,
    pub n_steps: usize,
    pub t_end_actual: f64,
    #[serde(rename = "N")]
    pub n_oscillators: usize,
    pub plugin: PhysicsModel,
    pub kappa: f64,
    pub seed: u64,
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub config: SimulationConfig,
    pub metrics: Vec<MetricsRow>,
    pub events: Vec<EventRecord>,
    pub summary: RunSummary,
}

impl RunResult {
    /// The first and last `k` rows when there are more than `2k`, else all rows.
    pub fn metrics_sample(&self, k: usize) -> Vec<MetricsRow> {
        let len = self.metrics.len();
        if len <= 2 * k {
            return self.metrics.clone();
        }
        let mut sample = Vec::with_capacity(2 * k);
        sample.extend_from_slice(&self.metrics[..k]);
        sample.extend_from_slice(&self.metrics[len - k..]);
        sample
    }

    /// R at every recorded step.
    pub fn r_curve(&self) -> Vec<f64> {
        self.metrics.iter().map(|row| row.r).collect()
    }

    /// Whether R ever exceeded the lock-in threshold.
    pub fn locked(&self) -> bool {
        self.summary.settling_time.is_some()
    }
}

/// A run in progress.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    graph: CouplingGraph,
    params: CouplingParams,
    state: OscillatorState,
    scheduler: PerturbationScheduler,
    tracker: SyncTracker,
    rng: StdRng,
    step: usize,
    n_steps: usize,
    metrics: Vec<MetricsRow>,
    events: Vec<EventRecord>,
    fallback_logged: bool,
}

impl Simulation {
    /// Validate `config` and build the initial state.
    pub fn new(config: SimulationConfig) -> LabResult<Self> {
        config.validate()?;
        let n = config.n_oscillators;
        let graph = build_graph(&config.topology, n, config.phi0, config.offset_mode, config.topo_seed);

        let mut rng = StdRng::seed_from_u64(config.seed);
        let omega = config.freq_dist.sample(n, &mut rng);
        let theta: Vec<f64> = (0..n).map(|_| rng.gen_range(-PI..PI)).collect();

        let scheduler = PerturbationScheduler::new(config.inject_events.clone(), omega.clone())?;
        let n_steps = config.n_steps();
        debug!(
            "run: N={} plugin={} kappa={} seed={} steps={}",
            n,
            config.plugin.label(),
            config.kappa,
            config.seed,
            n_steps
        );

        Ok(Self {
            params: config.coupling_params(),
            state: OscillatorState::new(theta, omega),
            graph,
            scheduler,
            tracker: SyncTracker::new(),
            rng,
            step: 0,
            n_steps,
            metrics: Vec::with_capacity(n_steps.min(PREALLOC_ROWS)),
            events: Vec::new(),
            fallback_logged: false,
            config,
        })
    }

    pub fn state(&self) -> &OscillatorState {
        &self.state
    }

    pub fn graph(&self) -> &CouplingGraph {
        &self.graph
    }

    /// Steps taken so far.
    pub fn steps_taken(&self) -> usize {
        self.step
    }

    pub fn is_done(&self) -> bool {
        self.step >= self.n_steps
    }

    /// Advance one step and return its metrics row, or `None` once done.
    pub fn step(&mut self) -> Option<MetricsRow> {
        if self.is_done() {
            return None;
        }
        let dt = self.config.dt;
        let t = self.step as f64 * dt;

        let triggered = self.scheduler.apply_due(t, dt, &mut self.state);
        self.events.extend(triggered);
        self.scheduler.expire(t, &mut self.state);

        let applied = advance(
            self.config.integrator,
            self.config.plugin,
            &mut self.state,
            &self.graph,
            &self.params,
            dt,
            &mut self.rng,
        );
        if applied != self.config.integrator && !self.fallback_logged {
            warn!(
                "{:?} integrator unavailable for {} with sigma={}, using {:?}",
                self.config.integrator,
                self.config.plugin.label(),
                self.config.sigma,
                applied
            );
            self.fallback_logged = true;
        }

        let o1 = if self.config.observers.order_parameter {
            order_parameter(&self.state.theta)
        } else {
            OrderParameter::ZERO
        };
        self.tracker.record(o1.r);
        let delta_phi = if self.config.observers.instability {
            self.tracker.instability(self.config.o2_window)
        } else {
            0.0
        };

        self.step += 1;
        let row = MetricsRow {
            t: stats::round8(self.step as f64 * dt),
            r: o1.r,
            psi: o1.psi,
            sigma_theta: o1.sigma_theta,
            delta_phi,
        };
        self.metrics.push(row);
        Some(row)
    }

    /// Step until `t_end` is reached.
    pub fn run_to_end(&mut self) {
        while self.step().is_some() {}
    }

    /// Summarize the rows recorded so far.
    pub fn finish(self) -> RunResult {
        let rs: Vec<f64> = self.metrics.iter().map(|row| row.r).collect();
        let start = (TRANSIENT_FRACTION * rs.len() as f64) as usize;
        let final_window = &rs[start..];
        let settling_time = self
            .tracker
            .lock_in_index(LOCK_IN_THRESHOLD)
            .map(|i| self.metrics[i].t);

        let summary = RunSummary {
            mean_r_final: stats::mean(final_window),
            se_r_final: stats::standard_error(final_window),
            settling_time,
            n_steps: self.step,
            t_end_actual: stats::round8(self.step as f64 * self.config.dt),
            n_oscillators: self.config.n_oscillators,
            plugin: self.config.plugin,
            kappa: self.config.kappa,
            seed: self.config.seed,
        };
        debug!(
            "run done: mean_R_final={:.4} settling_time={:?} events={}",
            summary.mean_r_final,
            summary.settling_time,
            self.events.len()
        );

        RunResult {
            config: self.config,
            metrics: self.metrics,
            events: self.events,
            summary,
        }
    }
}

/// Run one configuration to completion.
pub fn run_simulation(config: &SimulationConfig) -> LabResult<RunResult> {
    let mut sim = Simulation::new(config.clone())?;
    sim.run_to_end();
    Ok(sim.finish())
}
