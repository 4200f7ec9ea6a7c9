//! Natural-frequency distributions.
//!
//! Each oscillator's intrinsic frequency ωᵢ is drawn once at setup from the
//! run's seeded RNG. The Lorentzian (Cauchy) case is the canonical Kuramoto
//! disorder: its heavy tails keep a fraction of oscillators drifting even
//! above the locking threshold.

use log::warn;
use rand::Rng;
use rand_distr::{Cauchy, Distribution, Normal};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{LabError, LabResult};

/// Distribution of natural frequencies ωᵢ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrequencyDistribution {
    /// Cauchy centred at 0 with scale γ.
    Lorentzian { gamma: f64 },
    /// Normal with the given mean and standard deviation.
    Gaussian { mean: f64, std: f64 },
    /// Uniform on [low, high).
    Uniform { low: f64, high: f64 },
    /// Every ωᵢ = 0.
    Constant,
}

impl Default for FrequencyDistribution {
    fn default() -> Self {
        FrequencyDistribution::Lorentzian { gamma: 0.5 }
    }
}

#[derive(Deserialize)]
struct FrequencyRepr {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    gamma: Option<f64>,
    mean: Option<f64>,
    std: Option<f64>,
    low: Option<f64>,
    high: Option<f64>,
}

impl From<FrequencyRepr> for FrequencyDistribution {
    fn from(repr: FrequencyRepr) -> Self {
        let kind = repr.kind.unwrap_or_else(|| "lorentzian".to_string());
        match kind.to_ascii_lowercase().as_str() {
            "lorentzian" | "cauchy" => FrequencyDistribution::Lorentzian {
                gamma: repr.gamma.unwrap_or(0.5),
            },
            "gaussian" | "normal" => FrequencyDistribution::Gaussian {
                mean: repr.mean.unwrap_or(0.0),
                std: repr.std.unwrap_or(0.5),
            },
            "uniform" => FrequencyDistribution::Uniform {
                low: repr.low.unwrap_or(-1.0),
                high: repr.high.unwrap_or(1.0),
            },
            "constant" => FrequencyDistribution::Constant,
            other => {
                warn!("unknown frequency distribution '{}', using lorentzian(0.5)", other);
                FrequencyDistribution::default()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FrequencyDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        FrequencyRepr::deserialize(deserializer).map(FrequencyDistribution::from)
    }
}

impl FrequencyDistribution {
    /// Check the distribution parameters.
    pub fn validate(&self) -> LabResult<()> {
        match *self {
            FrequencyDistribution::Lorentzian { gamma } => {
                if !(gamma.is_finite() && gamma > 0.0) {
                    return Err(LabError::invalid("freq_dist.gamma", format!("must be positive, got {}", gamma)));
                }
            }
            FrequencyDistribution::Gaussian { mean, std } => {
                if !mean.is_finite() {
                    return Err(LabError::invalid("freq_dist.mean", format!("must be finite, got {}", mean)));
                }
                if !(std.is_finite() && std >= 0.0) {
                    return Err(LabError::invalid("freq_dist.std", format!("must be non-negative, got {}", std)));
                }
            }
            FrequencyDistribution::Uniform { low, high } => {
                if !(low.is_finite() && high.is_finite() && low <= high) {
                    return Err(LabError::invalid(
                        "freq_dist",
                        format!("uniform bounds must satisfy low <= high, got [{}, {}]", low, high),
                    ));
                }
            }
            FrequencyDistribution::Constant => {}
        }
        Ok(())
    }

    /// Draw `n` natural frequencies.
    ///
    /// Parameters are assumed validated; a degenerate spread (std = 0 or
    /// low = high) yields constant draws.
    pub fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<f64> {
        match *self {
            FrequencyDistribution::Lorentzian { gamma } => match Cauchy::new(0.0, gamma) {
                Ok(dist) => dist.sample_iter(rng).take(n).collect(),
                Err(_) => vec![0.0; n],
            },
            FrequencyDistribution::Gaussian { mean, std } => match Normal::new(mean, std) {
                Ok(dist) => dist.sample_iter(rng).take(n).collect(),
                Err(_) => vec![mean; n],
            },
            FrequencyDistribution::Uniform { low, high } => {
                if low < high {
                    (0..n).map(|_| rng.gen_range(low..high)).collect()
                } else {
                    vec![low; n]
                }
            }
            FrequencyDistribution::Constant => vec![0.0; n],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sample_lengths() {
        let mut rng = StdRng::seed_from_u64(0);
        for dist in [
            FrequencyDistribution::Lorentzian { gamma: 0.5 },
            FrequencyDistribution::Gaussian { mean: 0.0, std: 0.5 },
            FrequencyDistribution::Uniform { low: -1.0, high: 1.0 },
            FrequencyDistribution::Constant,
        ] {
            assert_eq!(dist.sample(17, &mut rng).len(), 17);
        }
    }

    #[test]
    fn constant_is_zero() {
        let mut rng = StdRng::seed_from_u64(0);
        let omega = FrequencyDistribution::Constant.sample(8, &mut rng);
        assert!(omega.iter().all(|&w| w == 0.0));
    }

    #[test]
    fn reproducible_for_same_seed() {
        let dist = FrequencyDistribution::Lorentzian { gamma: 0.5 };
        let a = dist.sample(32, &mut StdRng::seed_from_u64(42));
        let b = dist.sample(32, &mut StdRng::seed_from_u64(42));
        let c = dist.sample(32, &mut StdRng::seed_from_u64(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn uniform_within_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        let omega = FrequencyDistribution::Uniform { low: 0.5, high: 1.5 }.sample(200, &mut rng);
        assert!(omega.iter().all(|&w| (0.5..1.5).contains(&w)));
    }

    #[test]
    fn gaussian_moments_roughly_match() {
        let mut rng = StdRng::seed_from_u64(9);
        let omega = FrequencyDistribution::Gaussian { mean: 1.0, std: 0.5 }.sample(5000, &mut rng);
        let mean = omega.iter().sum::<f64>() / omega.len() as f64;
        assert!((mean - 1.0).abs() < 0.05, "sample mean {}", mean);
    }

    #[test]
    fn unknown_type_falls_back_to_lorentzian() {
        let dist: FrequencyDistribution = serde_json::from_str(r#"{"type": "pareto"}"#).unwrap();
        assert_eq!(dist, FrequencyDistribution::Lorentzian { gamma: 0.5 });
    }

    #[test]
    fn parses_parameters_with_defaults() {
        let dist: FrequencyDistribution = serde_json::from_str(r#"{"type": "gaussian", "std": 0.2}"#).unwrap();
        assert_eq!(dist, FrequencyDistribution::Gaussian { mean: 0.0, std: 0.2 });
    }

    #[test]
    fn validation_rejects_bad_parameters() {
        assert!(FrequencyDistribution::Lorentzian { gamma: 0.0 }.validate().is_err());
        assert!(FrequencyDistribution::Gaussian { mean: 0.0, std: -1.0 }.validate().is_err());
        assert!(FrequencyDistribution::Uniform { low: 2.0, high: 1.0 }.validate().is_err());
        assert!(FrequencyDistribution::Constant.validate().is_ok());
    }
}
