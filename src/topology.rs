//! Coupling topologies defining oscillator connectivity and phase offsets.
//!
//! Builds the dense adjacency matrix A and the phase-offset matrix φ for the
//! four supported graph families. Random families draw from a topology-local
//! RNG seeded independently of the run seed, so every seed of a sweep sees
//! the same graph.

use log::warn;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Deserializer, Serialize};

/// Default ring-lattice degree for the small-world family.
pub const DEFAULT_SW_K: usize = 4;
/// Default rewiring probability for the small-world family.
pub const DEFAULT_SW_BETA: f64 = 0.1;
/// Default edge probability for the Erdős–Rényi family.
pub const DEFAULT_ER_P: f64 = 0.2;

/// Coupling topology variant for an oscillator population.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Topology {
    /// Nearest-neighbour ring: weight 1.0 for |i-j| = 1 (mod N).
    Ring,

    /// Mean-field coupling: every off-diagonal entry equals 1/(N-1).
    FullyConnected,

    /// Watts–Strogatz: ring lattice of even degree `k`, each lattice edge
    /// rewired with probability `beta`.
    SmallWorld { k: usize, beta: f64 },

    /// Erdős–Rényi G(N, p): each unordered pair connected with probability `p`.
    ErdosRenyi { p: f64 },
}

impl Default for Topology {
    fn default() -> Self {
        Topology::Ring
    }
}

/// Wire form accepted for a topology: either a bare name or an object with
/// a `type` field and optional sub-parameters.
#[derive(Deserialize)]
#[serde(untagged)]
enum TopologyRepr {
    Name(String),
    Spec {
        #[serde(rename = "type")]
        kind: String,
        k: Option<usize>,
        beta: Option<f64>,
        p: Option<f64>,
    },
}

impl Topology {
    /// Resolve a topology name. Unknown names fall back to [`Topology::Ring`].
    pub fn from_name(name: &str, k: Option<usize>, beta: Option<f64>, p: Option<f64>) -> Self {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "ring" => Topology::Ring,
            "fully_connected" | "all_to_all" | "mean_field" => Topology::FullyConnected,
            "small_world" => Topology::SmallWorld {
                k: k.unwrap_or(DEFAULT_SW_K),
                beta: beta.unwrap_or(DEFAULT_SW_BETA),
            },
            "erdos_renyi" => Topology::ErdosRenyi {
                p: p.unwrap_or(DEFAULT_ER_P),
            },
            other => {
                warn!("unknown topology '{}', falling back to ring", other);
                Topology::Ring
            }
        }
    }
}

impl From<TopologyRepr> for Topology {
    fn from(repr: TopologyRepr) -> Self {
        match repr {
            TopologyRepr::Name(name) => Topology::from_name(&name, None, None, None),
            TopologyRepr::Spec { kind, k, beta, p } => Topology::from_name(&kind, k, beta, p),
        }
    }
}

impl<'de> Deserialize<'de> for Topology {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        TopologyRepr::deserialize(deserializer).map(Topology::from)
    }
}

/// How the phase-offset matrix φ is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum OffsetMode {
    /// Forward ring edges +φ₀, backward ring edges −φ₀.
    Chiral,
    /// Each directed off-diagonal offset uniform in [−φ₀, φ₀].
    Random,
    /// All zeros.
    Zero,
}

impl Default for OffsetMode {
    fn default() -> Self {
        OffsetMode::Chiral
    }
}

impl From<String> for OffsetMode {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "chiral" => OffsetMode::Chiral,
            "random" => OffsetMode::Random,
            "zero" => OffsetMode::Zero,
            other => {
                warn!("unknown offset mode '{}', using zero offsets", other);
                OffsetMode::Zero
            }
        }
    }
}

/// Adjacency and phase-offset matrices for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingGraph {
    /// A[i,j] ≥ 0, zero diagonal.
    pub adjacency: DMatrix<f64>,
    /// φ[i,j] in radians, added inside the sine for phase-offset coupling.
    pub offsets: DMatrix<f64>,
}

impl CouplingGraph {
    /// Number of oscillators.
    pub fn len(&self) -> usize {
        self.adjacency.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.nrows() == 0
    }

    /// Weighted degree of node `i` (row sum of A).
    pub fn degree(&self, i: usize) -> f64 {
        self.adjacency.row(i).sum()
    }

    /// Number of unordered pairs with a non-zero coupling weight.
    pub fn edge_count(&self) -> usize {
        let n = self.len();
        let mut count = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                if self.adjacency[(i, j)] > 0.0 || self.adjacency[(j, i)] > 0.0 {
                    count += 1;
                }
            }
        }
        count
    }

    /// True if A equals its transpose within `tol`.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        let n = self.len();
        (0..n).all(|i| (0..n).all(|j| (self.adjacency[(i, j)] - self.adjacency[(j, i)]).abs() <= tol))
    }
}

/// Undirected ring: each node connects to its two nearest neighbours.
pub fn ring(n: usize) -> DMatrix<f64> {
    let mut a = DMatrix::zeros(n, n);
    if n < 2 {
        return a;
    }
    for i in 0..n {
        a[(i, (i + 1) % n)] = 1.0;
        a[(i, (i + n - 1) % n)] = 1.0;
    }
    a
}

/// Mean-field coupling, row-normalized by N-1.
pub fn fully_connected(n: usize) -> DMatrix<f64> {
    if n < 2 {
        return DMatrix::zeros(n, n);
    }
    let w = 1.0 / (n - 1) as f64;
    DMatrix::from_fn(n, n, |i, j| if i == j { 0.0 } else { w })
}

/// Watts–Strogatz small-world graph (unweighted).
///
/// Starts from a ring lattice where node i links to i±1..i±k/2, then for
/// each lattice edge (i, i+d) draws once against `beta`; on success the edge
/// moves to a uniformly chosen node that is neither i nor already adjacent
/// to i. Edge count, symmetry and the zero diagonal are preserved.
pub fn small_world<R: Rng>(n: usize, k: usize, beta: f64, rng: &mut R) -> DMatrix<f64> {
    let mut a = DMatrix::zeros(n, n);
    let half = k / 2;
    for i in 0..n {
        for d in 1..=half {
            let j = (i + d) % n;
            if j != i {
                a[(i, j)] = 1.0;
                a[(j, i)] = 1.0;
            }
        }
    }

    for i in 0..n {
        for d in 1..=half {
            if rng.gen::<f64>() >= beta {
                continue;
            }
            let j_old = (i + d) % n;
            if a[(i, j_old)] == 0.0 {
                continue;
            }
            let candidates: Vec<usize> = (0..n).filter(|&m| m != i && a[(i, m)] == 0.0).collect();
            if candidates.is_empty() {
                continue;
            }
            let j_new = candidates[rng.gen_range(0..candidates.len())];
            a[(i, j_old)] = 0.0;
            a[(j_old, i)] = 0.0;
            a[(i, j_new)] = 1.0;
            a[(j_new, i)] = 1.0;
        }
    }
    a
}

/// Erdős–Rényi G(N, p) random graph (unweighted, symmetric).
pub fn erdos_renyi<R: Rng>(n: usize, p: f64, rng: &mut R) -> DMatrix<f64> {
    let mut a = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen::<f64>() < p {
                a[(i, j)] = 1.0;
                a[(j, i)] = 1.0;
            }
        }
    }
    a
}

/// Build the phase-offset matrix φ.
///
/// Chiral mode writes the ring edges only, so on other topologies it acts
/// on whichever of those pairs are coupled.
pub fn phase_offsets<R: Rng>(n: usize, phi0: f64, mode: OffsetMode, rng: &mut R) -> DMatrix<f64> {
    let mut phi = DMatrix::zeros(n, n);
    if n < 2 {
        return phi;
    }
    match mode {
        OffsetMode::Chiral => {
            for i in 0..n {
                phi[(i, (i + 1) % n)] = phi0;
                phi[(i, (i + n - 1) % n)] = -phi0;
            }
        }
        OffsetMode::Random => {
            let half = phi0.abs();
            for i in 0..n {
                for j in 0..n {
                    if i != j {
                        phi[(i, j)] = rng.gen_range(-half..=half);
                    }
                }
            }
        }
        OffsetMode::Zero => {}
    }
    phi
}

/// Build (A, φ) for `n` oscillators from a topology-local seed.
pub fn build_graph(
    topology: &Topology,
    n: usize,
    phi0: f64,
    offset_mode: OffsetMode,
    topo_seed: u64,
) -> CouplingGraph {
    let mut rng = StdRng::seed_from_u64(topo_seed);
    let adjacency = match *topology {
        Topology::Ring => ring(n),
        Topology::FullyConnected => fully_connected(n),
        Topology::SmallWorld { k, beta } => small_world(n, k, beta, &mut rng),
        Topology::ErdosRenyi { p } => erdos_renyi(n, p, &mut rng),
    };
    let offsets = phase_offsets(n, phi0, offset_mode, &mut rng);
    CouplingGraph { adjacency, offsets }
}

/// Label string for a topology (for output formatting).
pub fn topology_label(topology: &Topology) -> &'static str {
    match topology {
        Topology::Ring => "ring",
        Topology::FullyConnected => "fully_connected",
        Topology::SmallWorld { .. } => "small_world",
        Topology::ErdosRenyi { .. } => "erdos_renyi",
    }
}
