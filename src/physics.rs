//! Coupling laws: ẋ = F(θ, ω, m; A, φ, params).
//!
//! Three closed variants share one derivative operation:
//!
//! ```text
//! baseline       θ̇ᵢ = ωᵢ + κ Σⱼ Aᵢⱼ sin(θⱼ − θᵢ)            + σ ξᵢ
//! memory kernel  θ̇ᵢ = ωᵢ + κ Sᵢ + η mᵢ                     + σ ξᵢ
//!                ṁᵢ = −mᵢ/τₘ + Sᵢ,   Sᵢ = Σⱼ Aᵢⱼ sin(θⱼ − θᵢ)
//! phase offset   θ̇ᵢ = ωᵢ + κ Σⱼ Aᵢⱼ sin(θⱼ − θᵢ + φᵢⱼ)      + σ ξᵢ
//! ```
//!
//! ξᵢ are i.i.d. standard normal draws taken once per derivative call, and
//! only when σ > 0, so a noiseless run never touches the RNG after setup.

use log::warn;
use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::topology::CouplingGraph;

/// Physics model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PhysicsModel {
    /// Kuramoto baseline.
    Baseline,
    /// Exponential memory kernel (non-Markovian).
    MemoryKernel,
    /// Chiral phase-offset coupling.
    PhaseOffset,
}

impl Default for PhysicsModel {
    fn default() -> Self {
        PhysicsModel::Baseline
    }
}

impl From<String> for PhysicsModel {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "baseline" | "p1" | "kuramoto" => PhysicsModel::Baseline,
            "memory_kernel" | "p2" | "memory" => PhysicsModel::MemoryKernel,
            "phase_offset" | "p3" | "chiral" => PhysicsModel::PhaseOffset,
            other => {
                warn!("unknown physics model '{}', falling back to baseline", other);
                PhysicsModel::Baseline
            }
        }
    }
}

impl PhysicsModel {
    pub fn label(&self) -> &'static str {
        match self {
            PhysicsModel::Baseline => "baseline",
            PhysicsModel::MemoryKernel => "memory_kernel",
            PhysicsModel::PhaseOffset => "phase_offset",
        }
    }

    /// Whether this model carries the auxiliary memory vector.
    pub fn uses_memory(&self) -> bool {
        matches!(self, PhysicsModel::MemoryKernel)
    }

    /// Evaluate the derivative for the current state.
    ///
    /// `memory` is read only by the memory-kernel variant; the returned
    /// `dmemory` is `Some` exactly for that variant.
    pub fn derivative<R: Rng>(
        &self,
        theta: &[f64],
        omega: &[f64],
        memory: &[f64],
        graph: &CouplingGraph,
        params: &CouplingParams,
        rng: &mut R,
    ) -> Derivative {
        match self {
            PhysicsModel::Baseline => Derivative {
                dtheta: baseline(theta, omega, &graph.adjacency, params, rng),
                dmemory: None,
            },
            PhysicsModel::MemoryKernel => {
                let (dtheta, dmemory) = memory_kernel(theta, omega, memory, &graph.adjacency, params, rng);
                Derivative {
                    dtheta,
                    dmemory: Some(dmemory),
                }
            }
            PhysicsModel::PhaseOffset => Derivative {
                dtheta: phase_offset(theta, omega, &graph.adjacency, &graph.offsets, params, rng),
                dmemory: None,
            },
        }
    }
}

/// Scalar parameters consumed by the coupling laws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CouplingParams {
    /// Coupling strength κ.
    pub kappa: f64,
    /// Noise amplitude σ.
    pub sigma: f64,
    /// Memory feedback gain η.
    pub eta: f64,
    /// Memory time constant τₘ.
    pub tau_m: f64,
}

impl Default for CouplingParams {
    fn default() -> Self {
        Self {
            kappa: 1.0,
            sigma: 0.0,
            eta: 0.5,
            tau_m: 5.0,
        }
    }
}

/// Output of one derivative evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivative {
    pub dtheta: Vec<f64>,
    pub dmemory: Option<Vec<f64>>,
}

/// Sᵢ = Σⱼ Aᵢⱼ sin(θⱼ − θᵢ [+ φᵢⱼ]).
///
/// Zero-weight pairs are skipped; adding their exact-zero contribution would
/// not change the sum.
pub fn coupling_sums(theta: &[f64], adjacency: &DMatrix<f64>, offsets: Option<&DMatrix<f64>>) -> Vec<f64> {
    let n = theta.len();
    (0..n)
        .map(|i| {
            let mut sum = 0.0;
            for j in 0..n {
                let w = adjacency[(i, j)];
                if w == 0.0 {
                    continue;
                }
                let mut diff = theta[j] - theta[i];
                if let Some(phi) = offsets {
                    diff += phi[(i, j)];
                }
                sum += w * diff.sin();
            }
            sum
        })
        .collect()
}

fn add_noise<R: Rng>(dtheta: &mut [f64], sigma: f64, rng: &mut R) {
    if sigma > 0.0 {
        for d in dtheta.iter_mut() {
            let xi: f64 = rng.sample(StandardNormal);
            *d += sigma * xi;
        }
    }
}

/// Baseline Kuramoto derivative.
pub fn baseline<R: Rng>(
    theta: &[f64],
    omega: &[f64],
    adjacency: &DMatrix<f64>,
    params: &CouplingParams,
    rng: &mut R,
) -> Vec<f64> {
    let sums = coupling_sums(theta, adjacency, None);
    let mut dtheta: Vec<f64> = omega
        .iter()
        .zip(&sums)
        .map(|(&w, &s)| w + params.kappa * s)
        .collect();
    add_noise(&mut dtheta, params.sigma, rng);
    dtheta
}

/// Memory-kernel derivative, returning (dθ, dm).
pub fn memory_kernel<R: Rng>(
    theta: &[f64],
    omega: &[f64],
    memory: &[f64],
    adjacency: &DMatrix<f64>,
    params: &CouplingParams,
    rng: &mut R,
) -> (Vec<f64>, Vec<f64>) {
    let sums = coupling_sums(theta, adjacency, None);
    let mut dtheta: Vec<f64> = omega
        .iter()
        .zip(&sums)
        .zip(memory)
        .map(|((&w, &s), &m)| w + params.kappa * s + params.eta * m)
        .collect();
    add_noise(&mut dtheta, params.sigma, rng);

    let dmemory = memory
        .iter()
        .zip(&sums)
        .map(|(&m, &s)| -m / params.tau_m + s)
        .collect();
    (dtheta, dmemory)
}

/// Phase-offset (chiral) derivative. Identical to [`baseline`] when φ ≡ 0.
pub fn phase_offset<R: Rng>(
    theta: &[f64],
    omega: &[f64],
    adjacency: &DMatrix<f64>,
    offsets: &DMatrix<f64>,
    params: &CouplingParams,
    rng: &mut R,
) -> Vec<f64> {
    let sums = coupling_sums(theta, adjacency, Some(offsets));
    let mut dtheta: Vec<f64> = omega
        .iter()
        .zip(&sums)
        .map(|(&w, &s)| w + params.kappa * s)
        .collect();
    add_noise(&mut dtheta, params.sigma, rng);
    dtheta
}
