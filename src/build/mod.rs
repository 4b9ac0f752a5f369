//! Structure generation: planning, placement, separation and orbit expansion.

use crate::build::structure_builder::GeneratedStructure;
use crate::crystal::unit_cell::UnitCellError;
use thiserror::Error;

pub mod atom_group;
pub mod atoms_generator;
pub mod build_atom_info;
pub mod build_context;
pub mod multiplicity;
pub mod plan;
pub mod shape;
pub mod structure_builder;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// The requested counts, symmetry and shape cannot be satisfied together.
    #[error("constraint infeasible: {0}")]
    ConstraintInfeasible(String),

    #[error("degenerate geometry: {0}")]
    GeometricDegenerate(String),

    /// Overlaps remain after the separator's sweep budget. The structure is kept so
    /// the caller can decide whether to discard it.
    #[error("separation did not converge after {iterations} sweeps (max overlap {max_overlap_fraction:.3e})")]
    SeparationUnresolved {
        iterations: u32,
        max_overlap_fraction: f64,
        structure: Box<GeneratedStructure>,
    },
}

impl From<UnitCellError> for GenerationError {
    fn from(err: UnitCellError) -> Self {
        GenerationError::GeometricDegenerate(err.to_string())
    }
}

pub type Outcome<T = ()> = Result<T, GenerationError>;
