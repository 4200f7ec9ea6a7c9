//! Time stepping for the oscillator state.
//!
//! Explicit Euler covers every physics model. Classical RK4 is only defined
//! for the noiseless baseline: a stochastic term cannot be re-drawn across
//! the four stages without changing its statistics, so any other request
//! resolves to Euler.

use std::f64::consts::{PI, TAU};

use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::physics::{self, CouplingParams, PhysicsModel};
use crate::topology::CouplingGraph;

/// Integration scheme selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum IntegratorScheme {
    /// First-order explicit (Euler) update.
    Explicit,
    /// Classical fourth-order Runge–Kutta.
    Rk4,
}

impl Default for IntegratorScheme {
    fn default() -> Self {
        IntegratorScheme::Explicit
    }
}

impl From<String> for IntegratorScheme {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "explicit" | "euler" => IntegratorScheme::Explicit,
            "rk4" => IntegratorScheme::Rk4,
            other => {
                warn!("unknown integrator '{}', using explicit", other);
                IntegratorScheme::Explicit
            }
        }
    }
}

impl IntegratorScheme {
    /// The scheme actually used for `model` at noise amplitude `sigma`.
    pub fn effective(self, model: PhysicsModel, sigma: f64) -> IntegratorScheme {
        match self {
            IntegratorScheme::Rk4 if model == PhysicsModel::Baseline && sigma == 0.0 => IntegratorScheme::Rk4,
            _ => IntegratorScheme::Explicit,
        }
    }
}

/// Mutable per-run oscillator state.
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorState {
    /// Phases θᵢ, wrapped to (−π, π] after every step.
    pub theta: Vec<f64>,
    /// Current natural frequencies ωᵢ (overridden during omega kicks).
    pub omega: Vec<f64>,
    /// Memory mᵢ, used by the memory-kernel model only.
    pub memory: Vec<f64>,
}

impl OscillatorState {
    /// Fresh state with zero memory.
    pub fn new(theta: Vec<f64>, omega: Vec<f64>) -> Self {
        let n = theta.len();
        Self {
            theta,
            omega,
            memory: vec![0.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.theta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.theta.is_empty()
    }
}

/// Wrap an angle to (−π, π].
pub fn wrap_phase(theta: f64) -> f64 {
    if theta > -PI && theta <= PI {
        return theta;
    }
    let wrapped = (theta + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

/// Advance `state` by one step of size `dt` and wrap the phases.
///
/// Returns the scheme that was actually applied.
pub fn advance<R: Rng>(
    scheme: IntegratorScheme,
    model: PhysicsModel,
    state: &mut OscillatorState,
    graph: &CouplingGraph,
    params: &CouplingParams,
    dt: f64,
    rng: &mut R,
) -> IntegratorScheme {
    let applied = scheme.effective(model, params.sigma);
    match applied {
        IntegratorScheme::Rk4 => rk4_baseline(state, graph, params, dt, rng),
        IntegratorScheme::Explicit => explicit_step(model, state, graph, params, dt, rng),
    }
    for th in state.theta.iter_mut() {
        *th = wrap_phase(*th);
    }
    applied
}

/// θ ← θ + dt·dθ, m ← m + dt·dm.
fn explicit_step<R: Rng>(
    model: PhysicsModel,
    state: &mut OscillatorState,
    graph: &CouplingGraph,
    params: &CouplingParams,
    dt: f64,
    rng: &mut R,
) {
    let d = model.derivative(&state.theta, &state.omega, &state.memory, graph, params, rng);
    for (th, dth) in state.theta.iter_mut().zip(&d.dtheta) {
        *th += dt * dth;
    }
    if let Some(dmemory) = d.dmemory {
        for (m, dm) in state.memory.iter_mut().zip(&dmemory) {
            *m += dt * dm;
        }
    }
}

fn rk4_baseline<R: Rng>(
    state: &mut OscillatorState,
    graph: &CouplingGraph,
    params: &CouplingParams,
    dt: f64,
    rng: &mut R,
) {
    let quiet = CouplingParams { sigma: 0.0, ..*params };
    let omega = &state.omega;
    let mut f = |th: &[f64]| physics::baseline(th, omega, &graph.adjacency, &quiet, rng);
    let shifted = |base: &[f64], k: &[f64], h: f64| -> Vec<f64> {
        base.iter().zip(k).map(|(&b, &ki)| b + h * ki).collect()
    };

    let theta = state.theta.as_slice();
    let k1 = f(theta);
    let k2 = f(shifted(theta, &k1, 0.5 * dt).as_slice());
    let k3 = f(shifted(theta, &k2, 0.5 * dt).as_slice());
    let k4 = f(shifted(theta, &k3, dt).as_slice());

    let next: Vec<f64> = (0..theta.len())
        .map(|i| theta[i] + (dt / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
        .collect();
    state.theta = next;
}
