//! Tools for binaries
/// Command line argument helpers
pub mod args;
/// Dataset loading helpers
pub mod loaders;
