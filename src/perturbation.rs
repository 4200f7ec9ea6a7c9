//! Scheduled external perturbations.
//!
//! Events are held in a time-sorted list with a cursor. Omega kicks register
//! an expiry in a small per-node map that is swept once per step.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{LabError, LabResult};
use crate::integrator::OscillatorState;

/// Default kick amplitude.
pub const DEFAULT_AMPLITUDE: f64 = 0.1;
/// Default omega-kick duration.
pub const DEFAULT_DURATION: f64 = 1.0;

fn default_amplitude() -> f64 {
    DEFAULT_AMPLITUDE
}

fn default_duration() -> f64 {
    DEFAULT_DURATION
}

/// Kind of perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationKind {
    /// Instantaneous phase offset θᵢ += amplitude.
    PhaseKick,
    /// Temporary frequency offset ωᵢ = original + amplitude for `duration`.
    OmegaKick,
}

impl Default for PerturbationKind {
    fn default() -> Self {
        PerturbationKind::PhaseKick
    }
}

impl fmt::Display for PerturbationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerturbationKind::PhaseKick => write!(f, "phase_kick"),
            PerturbationKind::OmegaKick => write!(f, "omega_kick"),
        }
    }
}

/// Nodes affected by an event.
///
/// Serialized as either a node index or the string `"all"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TargetRepr", into = "TargetRepr")]
pub enum Target {
    Node(usize),
    All,
}

impl Default for Target {
    fn default() -> Self {
        Target::All
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TargetRepr {
    Index(usize),
    Name(String),
}

impl TryFrom<TargetRepr> for Target {
    type Error = String;

    fn try_from(repr: TargetRepr) -> Result<Self, Self::Error> {
        match repr {
            TargetRepr::Index(i) => Ok(Target::Node(i)),
            TargetRepr::Name(name) if name.eq_ignore_ascii_case("all") => Ok(Target::All),
            TargetRepr::Name(name) => Err(format!("invalid perturbation target '{}'", name)),
        }
    }
}

impl From<Target> for TargetRepr {
    fn from(target: Target) -> Self {
        match target {
            Target::Node(i) => TargetRepr::Index(i),
            Target::All => TargetRepr::Name("all".to_string()),
        }
    }
}

impl Target {
    /// Expand to an explicit node list for a population of `n`.
    pub fn nodes(&self, n: usize) -> Vec<usize> {
        match *self {
            Target::Node(i) => vec![i],
            Target::All => (0..n).collect(),
        }
    }
}

/// A scheduled perturbation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationEvent {
    /// Trigger time.
    #[serde(default)]
    pub time: f64,
    #[serde(rename = "type", default)]
    pub kind: PerturbationKind,
    #[serde(rename = "node", default)]
    pub target: Target,
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    /// Omega kicks only.
    #[serde(default = "default_duration")]
    pub duration: f64,
}

impl PerturbationEvent {
    pub fn phase_kick(time: f64, target: Target, amplitude: f64) -> Self {
        Self {
            time,
            kind: PerturbationKind::PhaseKick,
            target,
            amplitude,
            duration: DEFAULT_DURATION,
        }
    }

    pub fn omega_kick(time: f64, target: Target, amplitude: f64, duration: f64) -> Self {
        Self {
            time,
            kind: PerturbationKind::OmegaKick,
            target,
            amplitude,
            duration,
        }
    }

    /// Check time, duration and target against a population of `n`.
    pub fn validate(&self, n: usize) -> LabResult<()> {
        if !(self.time.is_finite() && self.time >= 0.0) {
            return Err(LabError::invalid(
                "inject_events.time",
                format!("must be finite and non-negative, got {}", self.time),
            ));
        }
        if !self.amplitude.is_finite() {
            return Err(LabError::invalid(
                "inject_events.amplitude",
                format!("must be finite, got {}", self.amplitude),
            ));
        }
        if self.kind == PerturbationKind::OmegaKick && !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(LabError::invalid(
                "inject_events.duration",
                format!("must be finite and non-negative, got {}", self.duration),
            ));
        }
        if let Target::Node(index) = self.target {
            if index >= n {
                return Err(LabError::TargetOutOfRange {
                    index,
                    n_oscillators: n,
                });
            }
        }
        Ok(())
    }
}

/// Log entry for a triggered event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Step time at which the event was applied.
    pub t: f64,
    #[serde(rename = "type")]
    pub kind: PerturbationKind,
    pub nodes: Vec<usize>,
    pub amplitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Applies events in time order and restores expired omega kicks.
#[derive(Debug, Clone)]
pub struct PerturbationScheduler {
    events: Vec<PerturbationEvent>,
    cursor: usize,
    omega_original: Vec<f64>,
    expiries: BTreeMap<usize, f64>,
}

impl PerturbationScheduler {
    /// Sort `events` by time (stable) and remember the unperturbed ω.
    ///
    /// Every event is validated against the population size first.
    pub fn new(mut events: Vec<PerturbationEvent>, omega_original: Vec<f64>) -> LabResult<Self> {
        let n = omega_original.len();
        for ev in &events {
            ev.validate(n)?;
        }
        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self {
            events,
            cursor: 0,
            omega_original,
            expiries: BTreeMap::new(),
        })
    }

    /// Apply every unconsumed event with time ≤ t + dt/2.
    pub fn apply_due(&mut self, t: f64, dt: f64, state: &mut OscillatorState) -> Vec<EventRecord> {
        let horizon = t + 0.5 * dt;
        let mut log = Vec::new();
        while let Some(ev) = self.events.get(self.cursor) {
            if ev.time > horizon {
                break;
            }
            let nodes = ev.target.nodes(state.len());
            match ev.kind {
                PerturbationKind::PhaseKick => {
                    for &i in &nodes {
                        state.theta[i] += ev.amplitude;
                    }
                }
                PerturbationKind::OmegaKick => {
                    let end = ev.time + ev.duration;
                    for &i in &nodes {
                        state.omega[i] = self.omega_original[i] + ev.amplitude;
                        self.expiries.insert(i, end);
                    }
                }
            }
            debug!("t={:.4}: {} on {} node(s), amplitude {}", t, ev.kind, nodes.len(), ev.amplitude);
            log.push(EventRecord {
                t,
                kind: ev.kind,
                nodes,
                amplitude: ev.amplitude,
                duration: (ev.kind == PerturbationKind::OmegaKick).then_some(ev.duration),
            });
            self.cursor += 1;
        }
        log
    }

    /// Restore ω exactly on nodes whose kick expired at or before `t`.
    pub fn expire(&mut self, t: f64, state: &mut OscillatorState) {
        let original = &self.omega_original;
        self.expiries.retain(|&i, &mut end| {
            if end <= t {
                state.omega[i] = original[i];
                false
            } else {
                true
            }
        });
    }

    /// Events not yet applied.
    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor
    }

    /// Nodes with an active omega kick.
    pub fn active_kicks(&self) -> usize {
        self.expiries.len()
    }
}
