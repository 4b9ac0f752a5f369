pub mod build;
pub mod common;
pub mod config;
pub mod crystal;
pub mod separation;
pub mod symmetry;
