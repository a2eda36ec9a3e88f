//! credscore: deterministic feature pipeline for credit decisioning
//!
//! Fits bin edges and skew-correction parameters on a training extract,
//! replays them on single applicants or CSV batches, and scores the
//! result with a logistic scorecard. Offline helpers cover IV ranking,
//! exploratory summaries and stratified splitting.

pub mod cli;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod service;
pub mod utils;
