//! Library for tuning-set data methods
#![warn(missing_docs, unused)]

/// Definitions of sparse feature vectors
pub mod datatypes;
/// Shared feature and label indexes
pub mod index;
/// Helper kernels for dense and sparse math
pub mod intrinsics;
/// Defines methods for loading tuning data from files
pub mod load;
/// Definitions of n-best lists and tuning instances
pub mod nbest;
