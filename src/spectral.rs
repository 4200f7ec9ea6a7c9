//! Spectral diagnostics of coupling graphs.
//!
//! Builds the weighted graph Laplacian L = D − A from a coupling matrix and
//! computes its spectrum via dense symmetric eigendecomposition (nalgebra).
//!
//! The algebraic connectivity λ₂ bounds how fast phase differences diffuse
//! across the graph: a disconnected graph has λ₂ = 0 and can never reach
//! global synchrony, no matter how large κ is.

use nalgebra::{DMatrix, SymmetricEigen};

use crate::topology::CouplingGraph;

/// Eigenvalues at or below this are treated as zero.
const ZERO_TOL: f64 = 1e-9;

/// A graph Laplacian built from a dense adjacency matrix.
///
/// L = D − A where D = diag(weighted degree). Directed input is symmetrized
/// as (A + Aᵀ)/2 first.
#[derive(Debug, Clone)]
pub struct GraphLaplacian {
    /// Number of vertices
    pub n: usize,
    /// Dense Laplacian matrix (n×n, symmetric)
    pub matrix: DMatrix<f64>,
}

impl GraphLaplacian {
    pub fn from_adjacency(adjacency: &DMatrix<f64>) -> Self {
        let n = adjacency.nrows();
        let sym = (adjacency + adjacency.transpose()) * 0.5;
        let mut mat = -sym;
        for i in 0..n {
            mat[(i, i)] = 0.0;
            let degree: f64 = -mat.row(i).sum();
            mat[(i, i)] = degree;
        }
        Self { n, matrix: mat }
    }

    /// Laplacian of the unweighted cycle C_N.
    ///
    /// Spectrum: λ_k = 2 − 2cos(2πk/N), k = 0..N−1.
    pub fn cycle(n: usize) -> Self {
        Self::from_adjacency(&crate::topology::ring(n))
    }

    /// Compute all eigenvalues, sorted ascending.
    pub fn eigenvalues(&self) -> Vec<f64> {
        if self.n == 0 {
            return Vec::new();
        }
        let eigen = SymmetricEigen::new(self.matrix.clone());
        let mut vals: Vec<f64> = eigen.eigenvalues.iter().cloned().collect();
        vals.sort_by(|a, b| a.total_cmp(b));
        vals
    }

    /// Algebraic connectivity λ₂ (second-smallest eigenvalue).
    pub fn algebraic_connectivity(&self) -> Option<f64> {
        self.eigenvalues().get(1).map(|&v| v.max(0.0))
    }

    /// Number of connected components (multiplicity of the zero eigenvalue).
    pub fn component_count(&self) -> usize {
        self.eigenvalues().iter().filter(|&&v| v.abs() <= ZERO_TOL).count()
    }

    /// Spectral radius: largest eigenvalue.
    pub fn spectral_radius(&self) -> f64 {
        self.eigenvalues().last().copied().unwrap_or(0.0)
    }
}

/// Structural summary of a coupling graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphDiagnostics {
    pub n: usize,
    /// Unordered pairs with non-zero coupling.
    pub edge_count: usize,
    /// Mean weighted degree.
    pub mean_degree: f64,
    pub min_degree: f64,
    pub max_degree: f64,
    /// λ₂ of the Laplacian.
    pub algebraic_connectivity: f64,
    pub spectral_radius: f64,
    pub connected: bool,
}

/// Describe `graph` by degree statistics and Laplacian spectrum.
pub fn graph_diagnostics(graph: &CouplingGraph) -> GraphDiagnostics {
    let n = graph.len();
    let degrees: Vec<f64> = (0..n).map(|i| graph.degree(i)).collect();
    let lap = GraphLaplacian::from_adjacency(&graph.adjacency);
    let vals = lap.eigenvalues();
    let lambda2 = vals.get(1).map(|&v| v.max(0.0)).unwrap_or(0.0);

    GraphDiagnostics {
        n,
        edge_count: graph.edge_count(),
        mean_degree: crate::stats::mean(&degrees),
        min_degree: degrees.iter().cloned().fold(f64::INFINITY, f64::min),
        max_degree: degrees.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        algebraic_connectivity: lambda2,
        spectral_radius: vals.last().copied().unwrap_or(0.0),
        connected: n > 0 && lambda2 > ZERO_TOL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{build_graph, OffsetMode, Topology};
    use std::f64::consts::PI;

    #[test]
    fn cycle_spectral_gap_matches_formula() {
        for n in [4, 8, 16, 32] {
            let lap = GraphLaplacian::cycle(n);
            let gap = lap.algebraic_connectivity().unwrap();
            let expected = 2.0 - 2.0 * (2.0 * PI / n as f64).cos();
            assert!((gap - expected).abs() < 1e-10, "C_{}: gap={}, expected={}", n, gap, expected);
        }
    }

    #[test]
    fn laplacian_row_sums_zero() {
        let graph = build_graph(&Topology::SmallWorld { k: 4, beta: 0.3 }, 20, 0.0, OffsetMode::Zero, 3);
        let lap = GraphLaplacian::from_adjacency(&graph.adjacency);
        for i in 0..lap.n {
            assert!(lap.matrix.row(i).sum().abs() < 1e-12);
        }
    }

    #[test]
    fn fully_connected_spectrum() {
        // L = (N/(N−1)) I − J/(N−1): one zero, the rest N/(N−1).
        let n = 10;
        let graph = build_graph(&Topology::FullyConnected, n, 0.0, OffsetMode::Zero, 0);
        let diag = graph_diagnostics(&graph);
        let expected = n as f64 / (n - 1) as f64;
        assert!((diag.algebraic_connectivity - expected).abs() < 1e-10);
        assert!((diag.spectral_radius - expected).abs() < 1e-10);
        assert!((diag.mean_degree - 1.0).abs() < 1e-12);
        assert!(diag.connected);
        assert_eq!(diag.edge_count, n * (n - 1) / 2);
    }

    #[test]
    fn empty_graph_is_disconnected() {
        let graph = build_graph(&Topology::ErdosRenyi { p: 0.0 }, 6, 0.0, OffsetMode::Zero, 0);
        let diag = graph_diagnostics(&graph);
        assert!(!diag.connected);
        assert_eq!(diag.edge_count, 0);
        assert_eq!(GraphLaplacian::from_adjacency(&graph.adjacency).component_count(), 6);
    }

    #[test]
    fn ring_diagnostics() {
        let graph = build_graph(&Topology::Ring, 12, 0.0, OffsetMode::Zero, 0);
        let diag = graph_diagnostics(&graph);
        assert_eq!(diag.min_degree, 2.0);
        assert_eq!(diag.max_degree, 2.0);
        assert!((diag.spectral_radius - 4.0).abs() < 1e-10);
    }
}
