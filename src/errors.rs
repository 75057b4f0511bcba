//! Build failure taxonomy.
//!
//! Every subprocess failure carries the exact command line and the captured
//! output so the user can re-run the step by hand.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("duplicate build unit id '{0}'")]
    DuplicateNode(String),

    #[error("Build graph contains a cycle or unresolved dependency")]
    Cycle,

    #[error("source error: {0}")]
    Source(String),

    #[error("failed to compile {unit}\n  command: {command}\n{output}")]
    Compile {
        unit: String,
        command: String,
        output: String,
    },

    #[error("failed to link {target}\n  command: {command}\n{output}")]
    Link {
        target: String,
        command: String,
        output: String,
    },

    #[error("failed to archive {target}\n  command: {command}\n{output}")]
    Archive {
        target: String,
        command: String,
        output: String,
    },

    #[error("worker pool error: {0}")]
    Pool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
