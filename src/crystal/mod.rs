pub mod atomic_structure;
pub mod lattice_sampler;
pub mod unit_cell;
