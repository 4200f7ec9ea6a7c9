//! Run and sweep configuration.
//!
//! Every field has a default, so a JSON object with any subset of keys is a
//! valid configuration. Numeric ranges are checked by `validate` before any
//! integration step runs.

use serde::{Deserialize, Serialize};

use crate::error::{LabError, LabResult};
use crate::frequency::FrequencyDistribution;
use crate::integrator::IntegratorScheme;
use crate::observer::{ObserverSet, DEFAULT_O2_WINDOW};
use crate::perturbation::PerturbationEvent;
use crate::physics::{CouplingParams, PhysicsModel};
use crate::sweep;
use crate::topology::{OffsetMode, Topology};

/// Largest number of integration steps a run may request.
pub const MAX_STEPS: usize = 50_000_000;

/// Configuration for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Physics model.
    pub plugin: PhysicsModel,
    /// Number of oscillators.
    #[serde(rename = "N")]
    pub n_oscillators: usize,
    pub topology: Topology,
    /// Seed of the topology-local RNG (random graph families and offsets).
    pub topo_seed: u64,
    /// Coupling strength κ.
    pub kappa: f64,
    /// Noise amplitude σ.
    pub sigma: f64,
    /// Memory feedback gain η.
    pub eta: f64,
    /// Memory time constant τₘ.
    pub tau_m: f64,
    /// Phase-offset magnitude φ₀.
    pub phi0: f64,
    pub offset_mode: OffsetMode,
    /// Run seed for frequencies, initial phases and noise.
    pub seed: u64,
    pub dt: f64,
    pub t_end: f64,
    pub integrator: IntegratorScheme,
    pub observers: ObserverSet,
    /// Baseline window of the instability functional.
    pub o2_window: usize,
    pub freq_dist: FrequencyDistribution,
    pub inject_events: Vec<PerturbationEvent>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            plugin: PhysicsModel::Baseline,
            n_oscillators: 32,
            topology: Topology::Ring,
            topo_seed: 0,
            kappa: 1.0,
            sigma: 0.0,
            eta: 0.5,
            tau_m: 5.0,
            phi0: 0.0,
            offset_mode: OffsetMode::Chiral,
            seed: 42,
            dt: 0.05,
            t_end: 50.0,
            integrator: IntegratorScheme::Explicit,
            observers: ObserverSet::default(),
            o2_window: DEFAULT_O2_WINDOW,
            freq_dist: FrequencyDistribution::default(),
            inject_events: Vec::new(),
        }
    }
}

fn require_finite(field: &'static str, value: f64) -> LabResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LabError::invalid(field, format!("must be finite, got {}", value)))
    }
}

fn require_positive(field: &'static str, value: f64) -> LabResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LabError::invalid(field, format!("must be positive, got {}", value)))
    }
}

impl SimulationConfig {
    /// Parse a JSON object; missing keys take their defaults.
    pub fn from_json(json: &str) -> LabResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of integration steps, round(t_end / dt).
    pub fn n_steps(&self) -> usize {
        (self.t_end / self.dt).round() as usize
    }

    /// The scalar parameters handed to the coupling laws.
    pub fn coupling_params(&self) -> CouplingParams {
        CouplingParams {
            kappa: self.kappa,
            sigma: self.sigma,
            eta: self.eta,
            tau_m: self.tau_m,
        }
    }

    /// Check every numeric parameter and event target.
    pub fn validate(&self) -> LabResult<()> {
        let n = self.n_oscillators;
        if n < 2 {
            return Err(LabError::invalid("N", format!("must be at least 2, got {}", n)));
        }
        require_positive("dt", self.dt)?;
        require_positive("t_end", self.t_end)?;
        let steps = (self.t_end / self.dt).round();
        if !(steps.is_finite() && steps <= MAX_STEPS as f64) {
            return Err(LabError::invalid(
                "t_end",
                format!("t_end / dt gives {} steps, at most {} allowed", steps, MAX_STEPS),
            ));
        }
        require_finite("kappa", self.kappa)?;
        require_finite("eta", self.eta)?;
        require_finite("phi0", self.phi0)?;
        if !(self.sigma.is_finite() && self.sigma >= 0.0) {
            return Err(LabError::invalid("sigma", format!("must be non-negative, got {}", self.sigma)));
        }
        require_positive("tau_m", self.tau_m)?;
        if self.o2_window == 0 {
            return Err(LabError::invalid("o2_window", "must be at least 1"));
        }

        match self.topology {
            Topology::SmallWorld { k, beta } => {
                if k < 2 || k % 2 != 0 || k >= n {
                    return Err(LabError::invalid(
                        "topology.k",
                        format!("must be even with 2 <= k < N ({}), got {}", n, k),
                    ));
                }
                if !(0.0..=1.0).contains(&beta) {
                    return Err(LabError::invalid("topology.beta", format!("must lie in [0, 1], got {}", beta)));
                }
            }
            Topology::ErdosRenyi { p } => {
                if !(0.0..=1.0).contains(&p) {
                    return Err(LabError::invalid("topology.p", format!("must lie in [0, 1], got {}", p)));
                }
            }
            Topology::Ring | Topology::FullyConnected => {}
        }

        self.freq_dist.validate()?;
        for ev in &self.inject_events {
            ev.validate(n)?;
        }
        Ok(())
    }
}

/// Configuration for a κ sweep: a base run plus the grid and seed range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    #[serde(flatten)]
    pub base: SimulationConfig,
    pub kappa_min: f64,
    pub kappa_max: f64,
    pub kappa_step: f64,
    /// Seeds per κ value.
    pub num_seeds: usize,
    /// Seed of the first run at every κ; run s uses seed_base + s.
    pub seed_base: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            base: SimulationConfig::default(),
            kappa_min: 0.0,
            kappa_max: 6.0,
            kappa_step: 0.2,
            num_seeds: 10,
            seed_base: 0,
        }
    }
}

impl SweepConfig {
    pub fn from_json(json: &str) -> LabResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> LabResult<()> {
        require_finite("kappa_min", self.kappa_min)?;
        require_finite("kappa_max", self.kappa_max)?;
        require_positive("kappa_step", self.kappa_step)?;
        if self.kappa_max < self.kappa_min {
            return Err(LabError::invalid(
                "kappa_max",
                format!("must be >= kappa_min ({}), got {}", self.kappa_min, self.kappa_max),
            ));
        }
        if self.kappa_min + self.kappa_step == self.kappa_min {
            return Err(LabError::invalid(
                "kappa_step",
                format!("{} does not advance from kappa_min {}", self.kappa_step, self.kappa_min),
            ));
        }
        if sweep::kappa_count(self.kappa_min, self.kappa_max, self.kappa_step).is_none() {
            return Err(LabError::invalid(
                "kappa_step",
                format!("grid has more than {} values", sweep::MAX_KAPPA_VALUES),
            ));
        }
        if self.num_seeds == 0 {
            return Err(LabError::invalid("num_seeds", "must be at least 1"));
        }
        self.base.validate()
    }

    /// The run configuration for one (κ, seed index) pair.
    pub fn run_config(&self, kappa: f64, seed_index: usize) -> SimulationConfig {
        SimulationConfig {
            kappa,
            seed: self.seed_base.wrapping_add(seed_index as u64),
            ..self.base.clone()
        }
    }
}
