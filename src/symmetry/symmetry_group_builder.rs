use crate::symmetry::symmetry_group::SymmetryGroup;
use crate::symmetry::symmetry_operator::{compose, SymmetryOperator};
use glam::f64::DMat4;
use log::warn;

/// Upper bound on the closure size; no finite crystallographic group comes close.
pub const MAX_GROUP_ORDER: usize = 1024;

/// Closes a set of generators under composition.
#[derive(Debug, Clone, Default)]
pub struct SymmetryGroupBuilder {
    generators: Vec<SymmetryOperator>,
}

impl SymmetryGroupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generators(generators: impl IntoIterator<Item = SymmetryOperator>) -> Self {
        SymmetryGroupBuilder {
            generators: generators.into_iter().collect(),
        }
    }

    pub fn add_generator(&mut self, generator: SymmetryOperator) -> &mut Self {
        self.generators.push(generator);
        self
    }

    pub fn generators(&self) -> &[SymmetryOperator] {
        &self.generators
    }

    /// Builds the group generated by the identity plus all generators.
    ///
    /// Repeatedly multiplies every pair of known operators and appends products that are
    /// not yet present, until a full pass adds nothing.
    pub fn build(&self) -> SymmetryGroup {
        let mut group = SymmetryGroup::from_operators(
            self.generators.iter().map(|g| compose(&DMat4::IDENTITY, g)),
        );

        // Pairs (i, j) with both indices below `checked` have already been multiplied
        let mut checked = 0;
        while checked < group.order() {
            let known = group.order();
            for i in 0..known {
                for j in 0..known {
                    if i < checked && j < checked {
                        continue;
                    }
                    let product = compose(&group.ops()[i], &group.ops()[j]);
                    group.add_op(product);
                    if group.order() >= MAX_GROUP_ORDER {
                        warn!(
                            "Symmetry closure stopped at {} operators; generators do not form a finite group",
                            MAX_GROUP_ORDER
                        );
                        return group;
                    }
                }
            }
            checked = known;
        }
        group
    }
}
