pub mod eigenspaces;
pub mod point_groups;
pub mod symmetry_group;
pub mod symmetry_group_builder;
pub mod symmetry_operator;
