//! Pipeline module - fitted feature transforms and the offline analysis
//! that feeds them

pub mod artifacts;
pub mod binning;
pub mod config;
pub mod correlation;
pub mod eda;
pub mod error;
pub mod iv;
pub mod loader;
pub mod manifest;
pub mod missing;
pub mod orchestrator;
pub mod record;
pub mod skew;
pub mod split;
pub mod stats;
pub mod target;

pub use artifacts::*;
pub use binning::*;
pub use config::*;
pub use correlation::*;
pub use eda::*;
pub use error::*;
pub use iv::*;
pub use loader::*;
pub use manifest::*;
pub use missing::*;
pub use orchestrator::*;
pub use record::*;
pub use skew::*;
pub use split::*;
pub use target::*;
