//! Validate and run scripts against JSON variables

use super::CliError;
use crate::{
    Config, Expression, Scope, TraceLog, Variables,
    convert::{value_to_json, variables_from_json, variables_to_json},
};

/// Options for the `eval` and `check` commands
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Script source
    pub source: String,
    /// JSON object whose keys become variables
    pub variables: Option<String>,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
    /// Record a trace of every evaluated node
    pub trace: bool,
    /// Include the namespace after execution in the result
    pub show_variables: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Script executed successfully
    Success {
        result: serde_json::Value,
        variables: Option<serde_json::Value>,
        trace: Vec<String>,
    },
}

fn empty_variables(config: &Config) -> Variables {
    if config.case_sensitive {
        Variables::new()
    } else {
        Variables::case_insensitive()
    }
}

/// Execute a tally check operation
pub fn execute_check(options: &CheckOptions, config: &Config) -> Result<CheckResult, CliError> {
    let expr = Expression::compile(&options.source, config)?;
    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let mut vars = match &options.variables {
        Some(text) if !text.trim().is_empty() => {
            variables_from_json(serde_json::from_str(text)?, config)?
        }
        _ => empty_variables(config),
    };

    let log = TraceLog::new();
    let result = if options.trace {
        expr.execute_traced(&mut vars, &Scope::new(), config, &log)?
    } else {
        expr.execute(&mut vars, config)?
    };

    Ok(CheckResult::Success {
        result: value_to_json(&result, config),
        variables: options
            .show_variables
            .then(|| variables_to_json(&vars, config)),
        trace: log.take(),
    })
}
