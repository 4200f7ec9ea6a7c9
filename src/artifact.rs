//! Content-hashed artifact bundles.
//!
//! A bundle holds the serialized config, the metrics table, the event log
//! and a SHA-256 over those three byte strings in that order. Config keys
//! are emitted sorted, so identical configs hash identically.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::LabResult;
use crate::simulation::RunResult;

pub const CONFIG_FILE: &str = "config.json";
pub const METRICS_FILE: &str = "metrics.csv";
pub const EVENTS_FILE: &str = "events.jsonl";
pub const HASH_FILE: &str = "hash.txt";

/// Column order of the metrics table.
pub const METRICS_HEADER: &str = "t,R,psi,sigma_theta,delta_phi";

/// The four files of a run artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    #[serde(rename = "config.json")]
    pub config_json: String,
    #[serde(rename = "metrics.csv")]
    pub metrics_csv: String,
    #[serde(rename = "events.jsonl")]
    pub events_jsonl: String,
    /// Lowercase hex SHA-256.
    #[serde(rename = "hash.txt")]
    pub hash: String,
}

impl ArtifactBundle {
    /// (file name, contents) pairs in bundle order.
    pub fn files(&self) -> [(&'static str, &[u8]); 4] {
        [
            (CONFIG_FILE, self.config_json.as_bytes()),
            (METRICS_FILE, self.metrics_csv.as_bytes()),
            (EVENTS_FILE, self.events_jsonl.as_bytes()),
            (HASH_FILE, self.hash.as_bytes()),
        ]
    }

    /// Recompute the digest and compare it with the stored one.
    pub fn verify(&self) -> bool {
        content_hash(&self.config_json, &self.metrics_csv, &self.events_jsonl) == self.hash
    }
}

/// Rebuild every object with its keys in sorted order.
fn sorted_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k, sorted_keys(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted_keys).collect()),
        other => other,
    }
}

fn content_hash(config_json: &str, metrics_csv: &str, events_jsonl: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    hasher.update(metrics_csv.as_bytes());
    hasher.update(events_jsonl.as_bytes());
    hex::encode(hasher.finalize())
}

/// Serialize a run into its artifact bundle.
pub fn build_artifact_bundle(result: &RunResult) -> LabResult<ArtifactBundle> {
    let config_json = serde_json::to_string_pretty(&sorted_keys(serde_json::to_value(&result.config)?))?;

    let mut metrics_csv = String::with_capacity(64 * (result.metrics.len() + 1));
    metrics_csv.push_str(METRICS_HEADER);
    metrics_csv.push('\n');
    for row in &result.metrics {
        metrics_csv.push_str(&format!(
            "{},{},{},{},{}\n",
            row.t, row.r, row.psi, row.sigma_theta, row.delta_phi
        ));
    }

    let events_jsonl = result
        .events
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?
        .join("\n");

    let hash = content_hash(&config_json, &metrics_csv, &events_jsonl);
    Ok(ArtifactBundle {
        config_json,
        metrics_csv,
        events_jsonl,
        hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::perturbation::{PerturbationEvent, Target};
    use crate::simulation::run_simulation;

    fn config() -> SimulationConfig {
        SimulationConfig {
            n_oscillators: 8,
            dt: 0.1,
            t_end: 5.0,
            seed: 0,
            ..Default::default()
        }
    }

    #[test]
    fn bundle_layout() {
        let result = run_simulation(&SimulationConfig {
            inject_events: vec![
                PerturbationEvent::phase_kick(1.0, Target::Node(2), 0.5),
                PerturbationEvent::omega_kick(2.0, Target::All, 0.3, 1.0),
            ],
            ..config()
        })
        .unwrap();
        let bundle = build_artifact_bundle(&result).unwrap();

        let mut lines = bundle.metrics_csv.lines();
        assert_eq!(lines.next(), Some(METRICS_HEADER));
        let first_row = lines.next().unwrap();
        let m = &result.metrics[0];
        assert_eq!(first_row, format!("{},{},{},{},{}", m.t, m.r, m.psi, m.sigma_theta, m.delta_phi));
        assert_eq!(lines.count() + 1, result.metrics.len());
        assert!(bundle.metrics_csv.ends_with('\n'));

        let events: Vec<&str> = bundle.events_jsonl.split('\n').collect();
        assert_eq!(events.len(), 2);
        let first: serde_json::Value = serde_json::from_str(events[0]).unwrap();
        assert_eq!(first["type"], "phase_kick");
        assert_eq!(first["nodes"], serde_json::json!([2]));

        assert_eq!(bundle.hash.len(), 64);
        assert!(bundle.hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(bundle.verify());

        let names: Vec<&str> = bundle.files().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec![CONFIG_FILE, METRICS_FILE, EVENTS_FILE, HASH_FILE]);
    }

    #[test]
    fn config_keys_sorted_and_parseable() {
        let bundle = build_artifact_bundle(&run_simulation(&config()).unwrap()).unwrap();
        let keys: Vec<usize> = ["\"N\"", "\"dt\"", "\"kappa\"", "\"seed\"", "\"t_end\""]
            .iter()
            .map(|k| bundle.config_json.find(k).unwrap())
            .collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        let parsed = SimulationConfig::from_json(&bundle.config_json).unwrap();
        assert_eq!(parsed, config());
    }

    #[test]
    fn empty_event_log_is_empty_string() {
        let bundle = build_artifact_bundle(&run_simulation(&config()).unwrap()).unwrap();
        assert!(bundle.events_jsonl.is_empty());
    }

    #[test]
    fn hash_is_stable_and_config_sensitive() {
        let a = build_artifact_bundle(&run_simulation(&config()).unwrap()).unwrap();
        let b = build_artifact_bundle(&run_simulation(&config()).unwrap()).unwrap();
        assert_eq!(a, b);

        let c = build_artifact_bundle(
            &run_simulation(&SimulationConfig {
                eta: 0.6,
                ..config()
            })
            .unwrap(),
        )
        .unwrap();
        assert_ne!(a.hash, c.hash);
    }

    #[test]
    fn tampering_breaks_verification() {
        let mut bundle = build_artifact_bundle(&run_simulation(&config()).unwrap()).unwrap();
        bundle.metrics_csv.push_str("0,0,0,0,0\n");
        assert!(!bundle.verify());
    }
}
