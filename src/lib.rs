//! arbor-classifiers: frame column transforms and a random-forest classifier
//! wrapper.
//!
//! This crate provides an ordered, typed `Frame` with an append-only column
//! transform, a validated hyperparameter configuration for random-forest
//! training, and a model wrapper (train, predict, test, feature importances,
//! save/load, archive export, single-row scoring) over a pluggable
//! `ForestEngine`. The production engine delegates tree induction to
//! smartcore; the orchestration layer is testable against stand-in engines
//! with canned outputs.
pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod math;
pub mod metadata;
pub mod metrics;
pub mod models;
