//! CLI support for tally-lang
//!
//! The binary is a thin wrapper over these functions, so tools that embed
//! the language can offer the same commands without shelling out.

mod check;
mod functions;
mod refs;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use functions::functions_overview;
pub use refs::collect_refs;

use std::io;

use crate::{convert::ConvertError, evaluator::EvalError, parser::ParseError};

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("evaluation error E{code}: {0}", code = .0.code())]
    Eval(#[from] EvalError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid variables: {0}")]
    Variables(#[from] ConvertError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Flag value that does not map onto a configuration setting
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

impl CliError {
    /// Process exit code: 2 for source errors, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Parse(_) | CliError::Eval(_) => 2,
            _ => 1,
        }
    }
}
