// Iterative pairwise overlap removal.
//
// Every sweep visits each unordered pair once. A pair closer than its required
// separation is pushed apart along the line joining it: both points move by half of
// the missing distance when both are free, a lone free point takes the whole
// correction, and fixed points never move. Sweeps repeat until the worst overlap of
// a sweep is within tolerance or the sweep budget runs out.
//
// With a unit cell the pair vector is the minimum image and free points are wrapped
// back into the cell after the last sweep.

use crate::crystal::unit_cell::UnitCell;
use glam::f64::DVec3;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

// Below this distance two points are treated as coincident
const COINCIDENT_EPSILON: f64 = 1e-12;

/// Configuration for the point separator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationConfig {
    /// Largest overlap fraction (1 - actual/required) accepted as separated.
    pub tolerance: f64,
    /// Maximum number of sweeps over all pairs.
    pub max_iterations: u32,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_iterations: 10000,
        }
    }
}

/// Result of a separation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparationResult {
    /// Whether the last sweep found no overlap above the tolerance.
    pub converged: bool,
    /// Number of sweeps performed.
    pub iterations: u32,
    /// Worst overlap fraction seen in the last sweep.
    pub max_overlap_fraction: f64,
}

/// Points to separate together with their pairwise required distances.
#[derive(Debug, Clone)]
pub struct SeparationProblem {
    pub points: Vec<DVec3>,
    // Row-major N x N matrix of squared minimum distances
    min_sep_sq: Vec<f64>,
    fixed: Vec<bool>,
    unit_cell: Option<UnitCell>,
}

impl SeparationProblem {
    /// A problem with no separation requirements and no fixed points.
    pub fn new(points: Vec<DVec3>, unit_cell: Option<UnitCell>) -> Self {
        let n = points.len();
        Self {
            points,
            min_sep_sq: vec![0.0; n * n],
            fixed: vec![false; n],
            unit_cell,
        }
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn unit_cell(&self) -> Option<&UnitCell> {
        self.unit_cell.as_ref()
    }

    /// Sets the minimum distance between points `i` and `j` (symmetric).
    pub fn set_min_separation(&mut self, i: usize, j: usize, distance: f64) {
        let n = self.points.len();
        let sq = distance * distance;
        self.min_sep_sq[i * n + j] = sq;
        self.min_sep_sq[j * n + i] = sq;
    }

    pub fn min_separation_sq(&self, i: usize, j: usize) -> f64 {
        self.min_sep_sq[i * self.points.len() + j]
    }

    pub fn set_fixed(&mut self, i: usize, fixed: bool) {
        self.fixed[i] = fixed;
    }

    pub fn is_fixed(&self, i: usize) -> bool {
        self.fixed[i]
    }

    /// Vector from point `i` to point `j`, the minimum image when periodic.
    pub fn separation_vector(&self, i: usize, j: usize) -> DVec3 {
        let diff = self.points[j] - self.points[i];
        match &self.unit_cell {
            Some(cell) => cell.minimum_image(&diff),
            None => diff,
        }
    }

    /// Worst overlap fraction over all pairs in the current configuration.
    pub fn max_overlap_fraction(&self) -> f64 {
        let n = self.points.len();
        let mut worst: f64 = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let required_sq = self.min_separation_sq(i, j);
                if required_sq <= 0.0 {
                    continue;
                }
                let actual = self.separation_vector(i, j).length();
                worst = worst.max(1.0 - actual / required_sq.sqrt());
            }
        }
        worst.max(0.0)
    }
}

/// Removes overlaps between points by repeated pairwise displacement.
#[derive(Debug, Clone, Default)]
pub struct PointSeparator {
    pub config: SeparationConfig,
}

impl PointSeparator {
    pub fn new(config: SeparationConfig) -> Self {
        Self { config }
    }

    /// Separates the points of `problem` in place.
    ///
    /// Fixed points keep their exact coordinates. The returned result reports whether
    /// every pair ended within tolerance of its required distance.
    pub fn separate(&self, problem: &mut SeparationProblem) -> SeparationResult {
        let n = problem.num_points();
        if n < 2 || problem.fixed.iter().all(|&f| f) {
            return SeparationResult {
                converged: problem.max_overlap_fraction() <= self.config.tolerance,
                iterations: 0,
                max_overlap_fraction: problem.max_overlap_fraction(),
            };
        }

        let mut iterations = 0;
        let mut max_overlap_fraction = f64::INFINITY;
        while iterations < self.config.max_iterations {
            max_overlap_fraction = Self::sweep(problem);
            iterations += 1;
            trace!("separation sweep {}: max overlap {:.3e}", iterations, max_overlap_fraction);
            if max_overlap_fraction <= self.config.tolerance {
                break;
            }
        }

        if let Some(cell) = problem.unit_cell.clone() {
            for (point, fixed) in problem.points.iter_mut().zip(problem.fixed.iter()) {
                if !*fixed {
                    *point = cell.wrap(point);
                }
            }
        }

        let converged = max_overlap_fraction <= self.config.tolerance;
        debug!(
            "Separated {} points in {} sweeps (converged: {}, max overlap {:.3e})",
            n, iterations, converged, max_overlap_fraction
        );
        SeparationResult {
            converged,
            iterations,
            max_overlap_fraction,
        }
    }

    // One pass over all pairs; returns the largest overlap fraction encountered.
    fn sweep(problem: &mut SeparationProblem) -> f64 {
        let n = problem.num_points();
        let mut max_overlap: f64 = 0.0;

        for i in 0..n {
            for j in (i + 1)..n {
                let i_movable = !problem.fixed[i];
                let j_movable = !problem.fixed[j];
                if !i_movable && !j_movable {
                    continue;
                }
                let required_sq = problem.min_separation_sq(i, j);
                if required_sq <= 0.0 {
                    continue;
                }
                let diff = problem.separation_vector(i, j);
                let actual_sq = diff.length_squared();
                if actual_sq >= required_sq {
                    continue;
                }

                let actual = actual_sq.sqrt();
                let required = required_sq.sqrt();
                max_overlap = max_overlap.max((1.0 - actual / required).max(0.0));

                let direction = if actual > COINCIDENT_EPSILON {
                    diff / actual
                } else {
                    fallback_direction(i, j)
                };
                let correction = direction * (required - actual);

                if i_movable && j_movable {
                    problem.points[i] -= correction * 0.5;
                    problem.points[j] += correction * 0.5;
                } else if i_movable {
                    problem.points[i] -= correction;
                } else {
                    problem.points[j] += correction;
                }
            }
        }
        max_overlap
    }
}

// Deterministic unit vector for pushing apart coincident points (golden spiral).
fn fallback_direction(i: usize, j: usize) -> DVec3 {
    let k = (i * 31 + j) as f64;
    let z = 1.0 - 2.0 * (k * 0.618_033_988_749_895).fract();
    let phi = k * 2.399_963_229_728_653;
    let r = (1.0 - z * z).max(0.0).sqrt();
    DVec3::new(r * phi.cos(), r * phi.sin(), z)
}
