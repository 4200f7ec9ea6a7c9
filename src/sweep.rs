//! κ sweeps: many independent runs aggregated per coupling strength.
//!
//! Every (κ, seed) pair is an independent run owning its own RNG and state.
//! With the `parallel` feature the runs execute on the rayon pool; results
//! are collected in grid order and aggregated afterwards, so the output does
//! not depend on scheduling.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SweepConfig;
use crate::error::{LabError, LabResult};
use crate::simulation::{run_simulation, RunSummary};
use crate::stats;

/// Aggregate over the seeds at one κ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KappaPoint {
    pub kappa: f64,
    /// Mean of the per-seed final-window R.
    #[serde(rename = "mean_R")]
    pub mean_r: f64,
    /// Standard error of the per-seed final-window R.
    #[serde(rename = "se_R")]
    pub se_r: f64,
    /// Mean settling time over the seeds that locked.
    pub mean_settling_time: Option<f64>,
    pub n_locked: usize,
    pub num_seeds: usize,
}

/// Result of a κ sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub sweep_config: SweepConfig,
    pub kappa_values: Vec<f64>,
    pub results: Vec<KappaPoint>,
}

impl SweepResult {
    /// κ at which the mean R first crosses `r_threshold`, linearly
    /// interpolated between neighbouring grid points.
    pub fn estimate_critical_kappa(&self, r_threshold: f64) -> Option<f64> {
        if let Some(first) = self.results.first() {
            if first.mean_r >= r_threshold {
                return Some(first.kappa);
            }
        }
        for window in self.results.windows(2) {
            let (a, b) = (&window[0], &window[1]);
            if a.mean_r < r_threshold && b.mean_r >= r_threshold {
                let frac = (r_threshold - a.mean_r) / (b.mean_r - a.mean_r);
                return Some(a.kappa + frac * (b.kappa - a.kappa));
            }
        }
        None
    }
}

/// Largest κ grid a sweep may request.
pub const MAX_KAPPA_VALUES: usize = 100_000;

/// Number of grid points, or `None` when the grid is empty, unbounded or
/// larger than [`MAX_KAPPA_VALUES`].
pub fn kappa_count(kappa_min: f64, kappa_max: f64, kappa_step: f64) -> Option<usize> {
    if !(kappa_step > 0.0) {
        return None;
    }
    let last = ((kappa_max - kappa_min) / kappa_step + 0.5).floor();
    if !last.is_finite() || last < 0.0 || last >= MAX_KAPPA_VALUES as f64 {
        return None;
    }
    Some(last as usize + 1)
}

/// The κ grid: κ_i = κ_min + i·step for every i with κ_i ≤ κ_max + step/2,
/// each value rounded to 8 decimals. Empty when [`kappa_count`] is `None`.
pub fn kappa_values(kappa_min: f64, kappa_max: f64, kappa_step: f64) -> Vec<f64> {
    match kappa_count(kappa_min, kappa_max, kappa_step) {
        Some(count) => (0..count)
            .map(|i| stats::round8(kappa_min + i as f64 * kappa_step))
            .collect(),
        None => Vec::new(),
    }
}

/// Run a κ sweep to completion.
pub fn run_kappa_sweep(config: &SweepConfig) -> LabResult<SweepResult> {
    run_sweep_inner(config, None)
}

/// Run a κ sweep, checking `cancel` before each independent run.
///
/// Returns [`LabError::Cancelled`] once the flag is observed set; runs that
/// already started finish but their results are discarded.
pub fn run_kappa_sweep_with_cancel(config: &SweepConfig, cancel: &AtomicBool) -> LabResult<SweepResult> {
    run_sweep_inner(config, Some(cancel))
}

fn run_sweep_inner(config: &SweepConfig, cancel: Option<&AtomicBool>) -> LabResult<SweepResult> {
    config.validate()?;
    let kappas = kappa_values(config.kappa_min, config.kappa_max, config.kappa_step);
    let seeds = config.num_seeds;
    info!(
        "kappa sweep: {} values x {} seeds, N={}",
        kappas.len(),
        seeds,
        config.base.n_oscillators
    );

    let jobs: Vec<(f64, usize)> = kappas
        .iter()
        .flat_map(|&k| (0..seeds).map(move |s| (k, s)))
        .collect();

    let run_one = |&(kappa, s): &(f64, usize)| -> LabResult<RunSummary> {
        if cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
            return Err(LabError::Cancelled);
        }
        run_simulation(&config.run_config(kappa, s)).map(|result| result.summary)
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<LabResult<RunSummary>> = jobs.par_iter().map(run_one).collect();
    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<LabResult<RunSummary>> = jobs.iter().map(run_one).collect();

    let summaries = outcomes.into_iter().collect::<LabResult<Vec<_>>>()?;

    let results: Vec<KappaPoint> = kappas
        .iter()
        .zip(summaries.chunks(seeds))
        .map(|(&kappa, runs)| aggregate(kappa, runs))
        .collect();
    for point in &results {
        debug!(
            "kappa={:.4} mean_R={:.4} se_R={:.4} locked={}/{}",
            point.kappa, point.mean_r, point.se_r, point.n_locked, point.num_seeds
        );
    }

    Ok(SweepResult {
        sweep_config: config.clone(),
        kappa_values: kappas,
        results,
    })
}

/// Aggregate the per-seed summaries at one κ.
fn aggregate(kappa: f64, runs: &[RunSummary]) -> KappaPoint {
    let rs: Vec<f64> = runs.iter().map(|s| s.mean_r_final).collect();
    let settle: Vec<f64> = runs.iter().filter_map(|s| s.settling_time).collect();
    KappaPoint {
        kappa,
        mean_r: stats::mean(&rs),
        se_r: stats::standard_error(&rs),
        mean_settling_time: if settle.is_empty() {
            None
        } else {
            Some(stats::mean(&settle))
        },
        n_locked: settle.len(),
        num_seeds: runs.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::frequency::FrequencyDistribution;
    use crate::topology::Topology;

    fn small_sweep() -> SweepConfig {
        SweepConfig {
            base: SimulationConfig {
                n_oscillators: 16,
                topology: Topology::FullyConnected,
                freq_dist: FrequencyDistribution::Gaussian { mean: 0.0, std: 0.5 },
                dt: 0.1,
                t_end: 20.0,
                ..Default::default()
            },
            kappa_min: 0.0,
            kappa_max: 4.0,
            kappa_step: 2.0,
            num_seeds: 3,
            seed_base: 0,
        }
    }

    #[test]
    fn grid_includes_endpoint() {
        let ks = kappa_values(0.0, 6.0, 0.2);
        assert_eq!(ks.len(), 31);
        assert_eq!(ks[0], 0.0);
        assert_eq!(ks[30], 6.0);
        assert_eq!(ks[3], 0.6);
        assert_eq!(kappa_values(1.0, 1.0, 0.5), vec![1.0]);
        assert!(kappa_values(0.0, 1.0, 0.0).is_empty());
    }

    #[test]
    fn grid_is_indexed_not_accumulated() {
        assert_eq!(kappa_count(1e17, 1e17, 1.0), Some(1));
        assert_eq!(kappa_values(1e17, 1e17, 1.0).len(), 1);
        assert_eq!(kappa_count(0.0, 1e12, 1.0), None);
        assert_eq!(kappa_count(0.0, f64::MAX, f64::MIN_POSITIVE), None);
        assert_eq!(kappa_count(2.0, 1.0, 0.5), None);

        let ks = kappa_values(0.0, 10.0, 0.1);
        assert_eq!(ks.len(), 101);
        assert_eq!(ks[100], 10.0);
        assert_eq!(ks[70], 7.0);
    }

    #[test]
    fn sweep_shape_and_aggregates() {
        let cfg = small_sweep();
        let result = run_kappa_sweep(&cfg).unwrap();
        assert_eq!(result.kappa_values, vec![0.0, 2.0, 4.0]);
        assert_eq!(result.results.len(), 3);
        for point in &result.results {
            assert_eq!(point.num_seeds, 3);
            assert!(point.n_locked <= 3);
            assert_eq!(point.mean_settling_time.is_some(), point.n_locked > 0);
            assert!((0.0..=1.0).contains(&point.mean_r));
        }
        assert!(result.results[2].mean_r > result.results[0].mean_r);
    }

    #[test]
    fn aggregates_match_individual_runs() {
        let cfg = small_sweep();
        let result = run_kappa_sweep(&cfg).unwrap();
        let rs: Vec<f64> = (0..3)
            .map(|s| run_simulation(&cfg.run_config(2.0, s)).unwrap().summary.mean_r_final)
            .collect();
        let point = &result.results[1];
        assert!((point.mean_r - stats::mean(&rs)).abs() < 1e-12);
        assert!((point.se_r - stats::standard_error(&rs)).abs() < 1e-12);
    }

    #[test]
    fn sweep_is_deterministic() {
        let cfg = small_sweep();
        assert_eq!(run_kappa_sweep(&cfg).unwrap(), run_kappa_sweep(&cfg).unwrap());
    }

    #[test]
    fn cancelled_sweep_returns_error() {
        let cancel = AtomicBool::new(true);
        let err = run_kappa_sweep_with_cancel(&small_sweep(), &cancel).unwrap_err();
        assert!(matches!(err, LabError::Cancelled));
    }

    #[test]
    fn invalid_grid_rejected() {
        let cfg = SweepConfig {
            num_seeds: 0,
            ..small_sweep()
        };
        assert!(matches!(run_kappa_sweep(&cfg), Err(LabError::InvalidConfig { .. })));
    }

    #[test]
    fn critical_kappa_interpolates() {
        let point = |kappa, mean_r| KappaPoint {
            kappa,
            mean_r,
            se_r: 0.0,
            mean_settling_time: None,
            n_locked: 0,
            num_seeds: 1,
        };
        let result = SweepResult {
            sweep_config: SweepConfig::default(),
            kappa_values: vec![0.0, 1.0, 2.0],
            results: vec![point(0.0, 0.1), point(1.0, 0.3), point(2.0, 0.7)],
        };
        let kc = result.estimate_critical_kappa(0.5).unwrap();
        assert!((kc - 1.5).abs() < 1e-12);
        assert_eq!(result.estimate_critical_kappa(0.95), None);
    }
}
