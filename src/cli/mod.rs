//! CLI module - argument parsing and one runner per subcommand

mod args;
mod eda;
mod fit;
mod iv;
mod predict;
mod schema;
mod score;
mod split;

pub use args::*;
pub use eda::run_eda;
pub use fit::{ensure_parent_dir, run_fit, FitOverrides};
pub use iv::{run_iv, IvOptions};
pub use predict::run_predict;
pub use schema::run_schema;
pub use score::run_score;
pub use split::{run_split, split_output_paths, SplitOptions};
