// A closed set of symmetry operators and its special positions.
//
// Lifecycle: operators are added (identity is always index 0), then
// `generate_eigenvectors` analyses the group once. Adding an operator after the
// analysis discards it, so the analysed data always matches the operator list.
//
// Special positions are subspaces through the origin that some non-identity
// operators leave pointwise invariant: the eigenvalue-1 eigenspaces of the
// operators' linear parts. A point placed on such a subspace is fixed by its
// stabiliser (every operator whose fixed space spans the subspace), so its orbit
// has order/|stabiliser| members. The operator mask keeps exactly one operator per
// coset of the stabiliser, so expanding the orbit never creates coincident atoms.

use crate::symmetry::eigenspaces::{real_eigenspaces, spans};
use crate::symmetry::symmetry_operator::{
    approx_eq, compose, has_translation, is_identity, linear_part, SymmetryOperator,
};
use glam::f64::{DMat4, DVec3};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};

/// Per-operator flags: `true` means the operator generates an orbit member. Index 0
/// (identity) stands for the representative itself.
pub type OperatorMask = Vec<bool>;

#[derive(Debug, Clone)]
pub struct SpecialPosition {
    /// Orthonormal basis of the invariant subspace (an axis or a plane)
    pub subspace: Vec<DVec3>,
    pub op_mask: OperatorMask,
    /// Indices of the operators that leave the subspace pointwise fixed (includes identity)
    pub stabilizer: Vec<usize>,
    pub multiplicity: usize,
}

impl SpecialPosition {
    pub fn dimension(&self) -> usize {
        self.subspace.len()
    }
}

#[derive(Debug, Clone)]
pub struct SymmetryGroup {
    ops: Vec<SymmetryOperator>,
    special_positions: Option<BTreeMap<usize, Vec<SpecialPosition>>>,
}

impl Default for SymmetryGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl SymmetryGroup {
    pub fn new() -> Self {
        SymmetryGroup {
            ops: vec![DMat4::IDENTITY],
            special_positions: None,
        }
    }

    pub fn from_operators(ops: impl IntoIterator<Item = SymmetryOperator>) -> Self {
        let mut group = Self::new();
        for op in ops {
            group.add_op(op);
        }
        group
    }

    /// Appends an operator unless an equal one is already present. Returns true if added.
    pub fn add_op(&mut self, op: SymmetryOperator) -> bool {
        if self.contains(&op) {
            return false;
        }
        self.ops.push(op);
        self.special_positions = None;
        true
    }

    pub fn contains(&self, op: &SymmetryOperator) -> bool {
        self.ops.iter().any(|existing| approx_eq(existing, op))
    }

    pub fn index_of(&self, op: &SymmetryOperator) -> Option<usize> {
        self.ops.iter().position(|existing| approx_eq(existing, op))
    }

    pub fn ops(&self) -> &[SymmetryOperator] {
        &self.ops
    }

    pub fn op(&self, index: usize) -> Option<&SymmetryOperator> {
        self.ops.get(index)
    }

    pub fn order(&self) -> usize {
        self.ops.len()
    }

    /// Every pairwise product of operators is again an operator of the group.
    pub fn is_closed(&self) -> bool {
        self.ops
            .iter()
            .all(|a| self.ops.iter().all(|b| self.contains(&compose(a, b))))
    }

    pub fn is_analyzed(&self) -> bool {
        self.special_positions.is_some()
    }

    /// A mask with every operator applicable: the orbit of a general position.
    pub fn full_mask(&self) -> OperatorMask {
        vec![true; self.ops.len()]
    }

    /// Computes the special positions of the group. Does nothing if already analysed.
    pub fn generate_eigenvectors(&mut self) {
        if self.special_positions.is_some() {
            return;
        }

        let order = self.order();
        let mut subspaces: Vec<Vec<DVec3>> = Vec::new();

        for (index, op) in self.ops.iter().enumerate() {
            if is_identity(op) {
                continue;
            }
            // A translated operator moves every point, whatever its linear part does
            if has_translation(op) {
                continue;
            }
            for space in real_eigenspaces(&linear_part(op)) {
                if space.dimension() == 0 || space.dimension() == 3 {
                    continue;
                }
                // Only fixed directions reduce the multiplicity; anything else would be a
                // general position
                if (space.eigenvalue - 1.0).abs() > 1e-6 {
                    trace!("op {}: eigenvalue {:.3} gives no special position", index, space.eigenvalue);
                    continue;
                }
                let duplicate = subspaces.iter().any(|existing| {
                    existing.len() == space.basis.len() && spans(existing, &space.basis)
                });
                if !duplicate {
                    subspaces.push(space.basis);
                }
            }
        }

        let mut table: BTreeMap<usize, Vec<SpecialPosition>> = BTreeMap::new();
        for subspace in subspaces {
            let stabilizer = self.stabilizer_of(&subspace);
            let multiplicity = order / stabilizer.len();
            if multiplicity == order {
                continue;
            }
            let op_mask = self.coset_mask(&stabilizer);
            table.entry(multiplicity).or_default().push(SpecialPosition {
                subspace,
                op_mask,
                stabilizer,
                multiplicity,
            });
        }

        debug!(
            "Symmetry group of order {} has special multiplicities {:?}",
            order,
            table.keys().collect::<Vec<_>>()
        );
        self.special_positions = Some(table);
    }

    /// The set of reduced multiplicities achievable by placing a point on a special position.
    pub fn get_multiplicities(&self) -> BTreeSet<usize> {
        self.special_positions
            .as_ref()
            .map(|table| table.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Special positions with multiplicity `multiplicity`; empty if there are none or the
    /// group has not been analysed.
    pub fn get_eigenspaces_and_masks(&self, multiplicity: usize) -> &[SpecialPosition] {
        self.special_positions
            .as_ref()
            .and_then(|table| table.get(&multiplicity))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Operator indices (identity included) that fix every vector of `subspace`.
    fn stabilizer_of(&self, subspace: &[DVec3]) -> Vec<usize> {
        self.ops
            .iter()
            .enumerate()
            .filter(|(_, op)| {
                !has_translation(op) && {
                    let linear = linear_part(op);
                    subspace.iter().all(|v| (linear * *v - *v).length() < 1e-6)
                }
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Marks the lowest-index member of every left coset g*S. The identity represents S
    /// itself, so the number of set flags equals the multiplicity.
    fn coset_mask(&self, stabilizer: &[usize]) -> OperatorMask {
        let mut mask = vec![false; self.ops.len()];
        for (index, op) in self.ops.iter().enumerate() {
            let representative = stabilizer
                .iter()
                .filter_map(|&s| self.index_of(&compose(op, &self.ops[s])))
                .min()
                .unwrap_or(index);
            mask[index] = representative == index;
        }
        mask
    }
}
