//! Synchronization observers and order-parameter tracking.
//!
//! O1 is the Kuramoto order parameter R e^{iψ} = (1/N) Σⱼ e^{iθⱼ}.
//! O2 is the instability functional ΔΦ: the relative jump of the latest R
//! against the mean of the preceding window.

use num_complex::Complex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::integrator::wrap_phase;

/// Floor applied to R before taking its logarithm.
pub const R_FLOOR: f64 = 1e-12;
/// Baselines below this are treated as zero by the instability functional.
pub const BASELINE_FLOOR: f64 = 1e-9;
/// Default O2 baseline window.
pub const DEFAULT_O2_WINDOW: usize = 10;

/// O1 output for one phase vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderParameter {
    /// Magnitude R ∈ [0, 1].
    pub r: f64,
    /// Mean phase ψ ∈ (−π, π].
    pub psi: f64,
    /// Circular spread sqrt(−2 ln R).
    pub sigma_theta: f64,
}

impl OrderParameter {
    /// Neutral value reported when O1 is disabled.
    pub const ZERO: OrderParameter = OrderParameter {
        r: 0.0,
        psi: 0.0,
        sigma_theta: 0.0,
    };
}

/// Compute the order parameter of a phase vector.
pub fn order_parameter(theta: &[f64]) -> OrderParameter {
    if theta.is_empty() {
        return OrderParameter::ZERO;
    }
    let sum: Complex<f64> = theta.iter().map(|&t| Complex::from_polar(1.0, t)).sum();
    let z = sum / theta.len() as f64;
    let r = z.norm().min(1.0);
    let sigma_theta = (-2.0 * r.max(R_FLOOR).ln()).max(0.0).sqrt();
    OrderParameter {
        r,
        psi: wrap_phase(z.arg()),
        sigma_theta,
    }
}

/// Instability functional ΔΦ over an R history.
///
/// Returns 0 until the history holds at least `window + 1` samples, and 0
/// when the baseline is numerically negligible.
pub fn instability_functional(history: &[f64], window: usize) -> f64 {
    let n = history.len();
    if window == 0 || n < window + 1 {
        return 0.0;
    }
    let baseline = history[n - window - 1..n - 1].iter().sum::<f64>() / window as f64;
    if baseline < BASELINE_FLOOR {
        return 0.0;
    }
    (history[n - 1] - baseline).abs() / baseline
}

/// Which observers are evaluated each step.
///
/// Serialized as the list of enabled observer tags, e.g. `["O1", "O2"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverSet {
    /// O1: order parameter R, ψ, σθ.
    pub order_parameter: bool,
    /// O2: instability functional ΔΦ.
    pub instability: bool,
}

impl Default for ObserverSet {
    fn default() -> Self {
        Self {
            order_parameter: true,
            instability: false,
        }
    }
}

impl ObserverSet {
    pub fn all() -> Self {
        Self {
            order_parameter: true,
            instability: true,
        }
    }

    /// Enabled observer tags in canonical order.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags = Vec::with_capacity(2);
        if self.order_parameter {
            tags.push("O1");
        }
        if self.instability {
            tags.push("O2");
        }
        tags
    }

    /// Build from tag names; unrecognized tags are ignored.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut set = Self {
            order_parameter: false,
            instability: false,
        };
        for tag in tags {
            match tag.as_ref().to_ascii_uppercase().as_str() {
                "O1" => set.order_parameter = true,
                "O2" => set.instability = true,
                other => log::warn!("ignoring unknown observer '{}'", other),
            }
        }
        set
    }
}

impl Serialize for ObserverSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tags().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ObserverSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tags = Vec::<String>::deserialize(deserializer)?;
        Ok(ObserverSet::from_tags(&tags))
    }
}

/// Tracks R over the steps of one run.
#[derive(Debug, Clone, Default)]
pub struct SyncTracker {
    /// R at each recorded step.
    pub r_curve: Vec<f64>,
}

impl SyncTracker {
    pub fn new() -> Self {
        Self { r_curve: Vec::new() }
    }

    /// Record R for the current step.
    pub fn record(&mut self, r: f64) {
        self.r_curve.push(r);
    }

    /// ΔΦ for the most recent sample.
    pub fn instability(&self, window: usize) -> f64 {
        instability_functional(&self.r_curve, window)
    }

    /// Index of the first step where R strictly exceeds `threshold`.
    pub fn lock_in_index(&self, threshold: f64) -> Option<usize> {
        self.r_curve.iter().position(|&r| r > threshold)
    }

    pub fn len(&self) -> usize {
        self.r_curve.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r_curve.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn synchronized_phases_give_unit_r() {
        let o1 = order_parameter(&[0.7; 32]);
        assert!((o1.r - 1.0).abs() < 1e-5);
        assert!((o1.psi - 0.7).abs() < 1e-12);
        assert!(o1.sigma_theta < 1e-5);
    }

    #[test]
    fn uniform_phases_give_low_r() {
        let n = 1000;
        let theta: Vec<f64> = (0..n).map(|i| -PI + 2.0 * PI * i as f64 / n as f64).collect();
        assert!(order_parameter(&theta).r < 0.05);
    }

    #[test]
    fn r_in_unit_interval_and_spread_non_negative() {
        let theta = [0.1, 2.0, -1.3, 3.0, -2.9, 0.4];
        let o1 = order_parameter(&theta);
        assert!((0.0..=1.0).contains(&o1.r));
        assert!(o1.psi > -PI && o1.psi <= PI);
        assert!(o1.sigma_theta >= 0.0);
    }

    #[test]
    fn mean_phase_on_negative_axis_is_pi() {
        for theta in [vec![-PI], vec![-PI; 3], vec![PI, -PI, -PI]] {
            let o1 = order_parameter(&theta);
            assert!(o1.psi > -PI && o1.psi <= PI, "psi = {} for {:?}", o1.psi, theta);
            assert!(PI - o1.psi.abs() < 1e-12);
        }
    }

    #[test]
    fn antipodal_pair_clamps_log() {
        let o1 = order_parameter(&[0.0, PI]);
        assert!(o1.r < 1e-12);
        assert!(o1.sigma_theta.is_finite());
        assert!((o1.sigma_theta - (-2.0 * R_FLOOR.ln()).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn instability_zero_for_short_history() {
        let history = vec![0.5; 10];
        assert_eq!(instability_functional(&history, 10), 0.0);
        assert_eq!(instability_functional(&history[..3], 10), 0.0);
    }

    #[test]
    fn instability_low_for_stable_signal() {
        let history = vec![0.6; 30];
        assert!(instability_functional(&history, 10) < 1e-12);
    }

    #[test]
    fn instability_detects_step_change() {
        let mut history = vec![0.3; 20];
        history.push(0.9);
        let delta = instability_functional(&history, 10);
        assert!(delta > 0.1);
        assert!((delta - 2.0).abs() < 1e-12);
    }

    #[test]
    fn instability_negligible_baseline() {
        let mut history = vec![0.0; 11];
        history.push(0.8);
        assert_eq!(instability_functional(&history, 10), 0.0);
    }

    #[test]
    fn observer_set_round_trip_and_unknown_tags() {
        let set: ObserverSet = serde_json::from_str(r#"["O2", "o1", "O9"]"#).unwrap();
        assert_eq!(set, ObserverSet::all());
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["O1","O2"]"#);
        assert_eq!(ObserverSet::default().tags(), vec!["O1"]);
    }

    #[test]
    fn tracker_finds_lock_in() {
        let mut tracker = SyncTracker::new();
        for r in [0.2, 0.5, 0.9, 0.95, 0.97] {
            tracker.record(r);
        }
        assert_eq!(tracker.lock_in_index(0.9), Some(3));
        assert_eq!(tracker.lock_in_index(0.99), None);
        assert_eq!(tracker.len(), 5);
    }
}
