//! # kuramoto-lab-sim
//!
//! Reproducible phase-oscillator experiments: a population of coupled
//! Kuramoto oscillators on a chosen graph, one of three coupling laws, a
//! schedule of external kicks, and order-parameter observers evaluated at
//! every step.
//!
//! ## Model
//!
//! θ̇ᵢ = ωᵢ + κ Σⱼ Aᵢⱼ sin(θⱼ − θᵢ + φᵢⱼ) (+ η mᵢ) + σ ξᵢ
//!
//! with natural frequencies ωᵢ drawn from a seeded distribution. The order
//! parameter R e^{iψ} = (1/N) Σⱼ e^{iθⱼ} measures global phase coherence.
//! Runs are fully determined by their config and seed, and a κ sweep over
//! many seeds exposes the synchronization transition.
//!
//! ## Usage
//!
//! ```no_run
//! use kuramoto_lab_sim::prelude::*;
//!
//! let config = SimulationConfig {
//!     n_oscillators: 64,
//!     topology: Topology::FullyConnected,
//!     kappa: 2.0,
//!     ..Default::default()
//! };
//! let result = run_simulation(&config).unwrap();
//! println!("Mean R (final 20%): {:.3}", result.summary.mean_r_final);
//!
//! let bundle = build_artifact_bundle(&result).unwrap();
//! println!("hash: {}", bundle.hash);
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod frequency;
pub mod integrator;
pub mod observer;
pub mod perturbation;
pub mod physics;
pub mod simulation;
pub mod spectral;
pub mod stats;
pub mod sweep;
pub mod topology;

pub use artifact::build_artifact_bundle;
pub use error::{LabError, LabResult};
pub use simulation::run_simulation;
pub use sweep::{run_kappa_sweep, run_kappa_sweep_with_cancel};

pub mod prelude {
    pub use crate::artifact::*;
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::frequency::*;
    pub use crate::integrator::*;
    pub use crate::observer::*;
    pub use crate::perturbation::*;
    pub use crate::physics::*;
    pub use crate::simulation::*;
    pub use crate::spectral::*;
    pub use crate::sweep::*;
    pub use crate::topology::*;
}
