//! Clarifier - vagueness scoring for natural-language requests
//!
//! ```rust,ignore
//! use clarifier::engine::HybridDecisionEngine;
//!
//! let engine = HybridDecisionEngine::default();
//! let result = engine.analyze("make something");
//! assert!(result.is_vague);
//! ```

pub mod ai;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod heuristics;
pub mod models;
