//! Static reference listing for the `refs` command

use serde_json::json;

use super::CliError;
use crate::{Config, Expression};

/// Parses `source` and returns the variables and external functions it
/// refers to as `{"variables": [...], "functions": [...]}`.
pub fn collect_refs(source: &str, config: &Config) -> Result<serde_json::Value, CliError> {
    let refs = Expression::compile(source, config)?.references(config);
    Ok(json!({
        "variables": refs.variables,
        "functions": refs.functions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refs_json_shape() {
        let refs = collect_refs("d = extf(c[0] + e)", &Config::default()).unwrap();
        assert_eq!(
            refs,
            json!({"variables": ["c", "d", "e"], "functions": ["extf"]})
        );
    }
}
