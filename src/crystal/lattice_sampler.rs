// Random unit cell sampling under lattice constraints.
//
// Each of the six lattice parameters is drawn uniformly from its resolved bound
// (per-parameter range, else the global length/angle bound, else a default).
// Lengths are then pulled together until the max/min ratio is acceptable,
// angles are redrawn until they describe a realisable cell, and finally the
// cell is rescaled isotropically to a volume sampled around the target.

use crate::crystal::unit_cell::{LatticeParam, UnitCell, UnitCellError};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_LENGTH: f64 = 0.25;
pub const DEFAULT_MAX_LENGTH: f64 = 2.0;
pub const DEFAULT_MIN_ANGLE: f64 = 45.0;
pub const DEFAULT_MAX_ANGLE: f64 = 135.0;
pub const DEFAULT_VOLUME_DELTA: f64 = 0.25;
pub const DEFAULT_BULK_CONTENTS_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_CLUSTER_CONTENTS_MULTIPLIER: f64 = 4.0;

const MAX_LENGTH_RATIO_ITERATIONS: usize = 10;
const MAX_ANGLE_ATTEMPTS: usize = 1000;
const PINNED_EPSILON: f64 = 1e-12;

/// Inclusive (min, max) range for one lattice parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub fn new(min: f64, max: f64) -> Self {
        ParamRange { min, max }
    }

    pub fn fixed(value: f64) -> Self {
        ParamRange { min: value, max: value }
    }

    pub fn is_pinned(&self) -> bool {
        (self.max - self.min).abs() < PINNED_EPSILON
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Declarative bounds on the cell to generate.
///
/// Every field is optional; unset bounds fall back to the global length/angle
/// bounds and then to the module defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConstraints {
    pub a: Option<ParamRange>,
    pub b: Option<ParamRange>,
    pub c: Option<ParamRange>,
    pub alpha: Option<ParamRange>,
    pub beta: Option<ParamRange>,
    pub gamma: Option<ParamRange>,
    pub min_length: Option<f64>,
    pub max_length: Option<f64>,
    pub min_angle: Option<f64>,
    pub max_angle: Option<f64>,
    pub target_volume: Option<f64>,
    /// Fractional half-width of the volume window around the target
    pub volume_delta: f64,
    pub max_length_ratio: Option<f64>,
    pub contents_multiplier: Option<f64>,
}

impl Default for LatticeConstraints {
    fn default() -> Self {
        Self {
            a: None,
            b: None,
            c: None,
            alpha: None,
            beta: None,
            gamma: None,
            min_length: None,
            max_length: None,
            min_angle: None,
            max_angle: None,
            target_volume: None,
            volume_delta: DEFAULT_VOLUME_DELTA,
            max_length_ratio: None,
            contents_multiplier: None,
        }
    }
}

impl LatticeConstraints {
    /// The explicitly set range for a parameter, if any.
    pub fn param_range(&self, param: LatticeParam) -> Option<ParamRange> {
        match param {
            LatticeParam::A => self.a,
            LatticeParam::B => self.b,
            LatticeParam::C => self.c,
            LatticeParam::Alpha => self.alpha,
            LatticeParam::Beta => self.beta,
            LatticeParam::Gamma => self.gamma,
        }
    }

    pub fn set_param_range(&mut self, param: LatticeParam, range: Option<ParamRange>) {
        let slot = match param {
            LatticeParam::A => &mut self.a,
            LatticeParam::B => &mut self.b,
            LatticeParam::C => &mut self.c,
            LatticeParam::Alpha => &mut self.alpha,
            LatticeParam::Beta => &mut self.beta,
            LatticeParam::Gamma => &mut self.gamma,
        };
        *slot = range;
    }

    /// The range a parameter is actually sampled from.
    pub fn resolved_range(&self, param: LatticeParam) -> ParamRange {
        if let Some(range) = self.param_range(param) {
            return range;
        }
        if param.is_length() {
            ParamRange::new(
                self.min_length.unwrap_or(DEFAULT_MIN_LENGTH),
                self.max_length.unwrap_or(DEFAULT_MAX_LENGTH),
            )
        } else {
            ParamRange::new(
                self.min_angle.unwrap_or(DEFAULT_MIN_ANGLE),
                self.max_angle.unwrap_or(DEFAULT_MAX_ANGLE),
            )
        }
    }

    /// True when all six parameters are pinned to single values.
    pub fn is_fully_specified(&self) -> bool {
        LatticeParam::ALL
            .iter()
            .all(|&p| self.param_range(p).map_or(false, |r| r.is_pinned()))
    }
}

/// Samples unit cells from a set of constraints.
///
/// Owned by the caller and passed to whatever needs cells; there is no shared instance.
#[derive(Debug, Clone, Default)]
pub struct LatticeSampler {
    constraints: LatticeConstraints,
}

impl LatticeSampler {
    pub fn new(constraints: LatticeConstraints) -> Self {
        LatticeSampler { constraints }
    }

    pub fn constraints(&self) -> &LatticeConstraints {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut LatticeConstraints {
        &mut self.constraints
    }

    /// Samples a cell.
    ///
    /// `contents_volume` is the summed atomic volume of what will go into the cell; it is
    /// used (times the contents multiplier) as the volume target when no explicit target
    /// is configured. `is_cluster` selects the cluster default multiplier instead of the
    /// bulk one.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        contents_volume: Option<f64>,
        is_cluster: bool,
        rng: &mut R,
    ) -> Result<UnitCell, UnitCellError> {
        let mut params = [0.0; 6];
        for param in LatticeParam::LENGTHS {
            params[param.index()] = uniform(rng, self.constraints.resolved_range(param));
        }
        self.enforce_length_ratio(&mut params);

        let angles = self.sample_angles(rng);
        params[3..].copy_from_slice(&angles);

        let mut cell = UnitCell::from_param_array(params)?;

        let target = self.target_volume(&cell, contents_volume, is_cluster);
        if let Some(target) = target {
            let delta = self.constraints.volume_delta.max(0.0);
            let volume = uniform(rng, ParamRange::new(target * (1.0 - delta), target * (1.0 + delta)));
            cell.set_volume(volume)?;
        }

        debug!(
            "Sampled cell {:?} with volume {:.4}",
            cell.parameters(),
            cell.volume()
        );
        Ok(cell)
    }

    /// Volume to rescale to, or `None` when the cell must be kept as sampled.
    fn target_volume(&self, cell: &UnitCell, contents_volume: Option<f64>, is_cluster: bool) -> Option<f64> {
        if let Some(target) = self.constraints.target_volume {
            return Some(target);
        }
        if self.constraints.is_fully_specified() {
            return None;
        }
        match contents_volume {
            Some(volume) if volume > 0.0 => {
                let multiplier = self.constraints.contents_multiplier.unwrap_or(if is_cluster {
                    DEFAULT_CLUSTER_CONTENTS_MULTIPLIER
                } else {
                    DEFAULT_BULK_CONTENTS_MULTIPLIER
                });
                Some(multiplier * volume)
            }
            _ => Some(cell.volume()),
        }
    }

    /// Pulls the shortest and longest lengths towards each other until their ratio is
    /// within the configured maximum, keeping their product fixed and respecting any
    /// per-parameter bounds the user set.
    fn enforce_length_ratio(&self, params: &mut [f64; 6]) {
        let max_ratio = match self.constraints.max_length_ratio {
            Some(ratio) if ratio >= 1.0 => ratio,
            _ => return,
        };

        for _ in 0..MAX_LENGTH_RATIO_ITERATIONS {
            let (min_idx, max_idx) = min_max_indices(&params[..3]);
            let (min_len, max_len) = (params[min_idx], params[max_idx]);
            if max_len / min_len <= max_ratio {
                return;
            }

            let product = min_len * max_len;
            let mut new_min = (product / max_ratio).sqrt();
            let mut new_max = (product * max_ratio).sqrt();
            if let Some(range) = self.constraints.param_range(LatticeParam::LENGTHS[min_idx]) {
                new_min = range.clamp(new_min);
            }
            if let Some(range) = self.constraints.param_range(LatticeParam::LENGTHS[max_idx]) {
                new_max = range.clamp(new_max);
            }

            if (new_min - min_len).abs() < PINNED_EPSILON && (new_max - max_len).abs() < PINNED_EPSILON {
                break;
            }
            params[min_idx] = new_min;
            params[max_idx] = new_max;
        }

        let (min_idx, max_idx) = min_max_indices(&params[..3]);
        if params[max_idx] / params[min_idx] > max_ratio {
            warn!(
                "Could not bring length ratio {:.3} under {:.3}; keeping best effort",
                params[max_idx] / params[min_idx],
                max_ratio
            );
        }
    }

    fn sample_angles<R: Rng + ?Sized>(&self, rng: &mut R) -> [f64; 3] {
        let ranges = [
            self.constraints.resolved_range(LatticeParam::Alpha),
            self.constraints.resolved_range(LatticeParam::Beta),
            self.constraints.resolved_range(LatticeParam::Gamma),
        ];

        for _ in 0..MAX_ANGLE_ATTEMPTS {
            let angles = [uniform(rng, ranges[0]), uniform(rng, ranges[1]), uniform(rng, ranges[2])];
            if angles_are_valid(&angles) {
                return angles;
            }
        }

        warn!(
            "No valid angle triple found in {} attempts, falling back to minimum angles",
            MAX_ANGLE_ATTEMPTS
        );
        [ranges[0].min, ranges[1].min, ranges[2].min]
    }
}

/// Necessary conditions for three angles (degrees) to form a non-degenerate cell.
pub fn angles_are_valid(angles: &[f64; 3]) -> bool {
    let [alpha, beta, gamma] = *angles;
    alpha + beta + gamma < 360.0
        && (alpha - beta).abs() <= gamma
        && (beta - gamma).abs() <= alpha
        && (gamma - alpha).abs() <= beta
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, range: ParamRange) -> f64 {
    if range.max <= range.min {
        range.min
    } else {
        rng.gen_range(range.min..=range.max)
    }
}

fn min_max_indices(values: &[f64]) -> (usize, usize) {
    let mut min_idx = 0;
    let mut max_idx = 0;
    for (i, &v) in values.iter().enumerate() {
        if v < values[min_idx] {
            min_idx = i;
        }
        if v > values[max_idx] {
            max_idx = i;
        }
    }
    (min_idx, max_idx)
}
