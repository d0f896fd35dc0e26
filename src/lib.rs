//! Tunekit
//!
//! Tunekit is a library and an executable for tuning the feature weights of
//! a statistical machine-translation system with online pairwise ranking
//! optimization (PRO-SGD).  The sampling and gradient machinery lives in
//! `tune_core`; this crate supplies sentence-level BLEU metrics, the outer
//! tuning loop, and the `pro-tune` binary.
#![warn(missing_docs, unused)]

#[macro_use]
extern crate clap;

/// Tools for binaries
pub mod bin_utils;
/// Sentence-level translation quality metrics
pub mod metrics;
/// The outer online tuning loop
pub mod tuner;
