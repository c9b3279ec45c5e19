//! CLI command handlers, one file per command.

mod normalize;
mod run;
mod score;

pub use normalize::run_normalize;
pub use run::{run_ingest, IngestArgs};
pub use score::run_score;
