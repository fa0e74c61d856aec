//! Compile-once, run-many entry point.

use crate::{
    ast::Program,
    config::Config,
    evaluator::{EvalError, Evaluator},
    namespace::VariantContainer,
    parser::{ParseError, parse_program},
    references::References,
    scope::Scope,
    trace::TraceListener,
    value::Value,
};

/// Any failure of [`evaluate`]: either the source did not parse or it failed
/// while running.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl Error {
    pub fn code(&self) -> u32 {
        match self {
            Error::Parse(err) => err.code(),
            Error::Eval(err) => err.code(),
        }
    }
}

/// A parsed script.
///
/// The parsed tree carries no evaluation state, so one `Expression` can be
/// executed repeatedly, against different namespaces, scopes and
/// configurations, and shared between threads.
///
/// # Examples
///
/// ```
/// use tally_lang::{Config, Expression, Value, Variables, VariantContainer};
///
/// let config = Config::default();
/// let expr = Expression::compile("3 + x * sqrt(4)", &config).unwrap();
///
/// let mut vars = Variables::new().with("x", 5);
/// assert_eq!(expr.execute(&mut vars, &config).unwrap(), Value::from(13));
///
/// vars.set("x", Value::from(1));
/// assert_eq!(expr.execute(&mut vars, &config).unwrap(), Value::from(5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    program: Program,
}

impl Expression {
    pub fn compile(source: &str, config: &Config) -> Result<Self, ParseError> {
        Ok(Expression {
            program: parse_program(source, config)?,
        })
    }

    /// Source text, after empty input has been replaced by the configured
    /// default expression.
    pub fn source(&self) -> &str {
        &self.program.source
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Runs against `vars` with no user functions beyond those the script
    /// declares.
    pub fn execute(&self, vars: &mut dyn VariantContainer, config: &Config) -> Result<Value, EvalError> {
        self.execute_in(vars, &Scope::new(), config)
    }

    /// Runs against `vars`, resolving calls through `scope` after the
    /// script's own functions.
    pub fn execute_in(
        &self,
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
        config: &Config,
    ) -> Result<Value, EvalError> {
        Evaluator::new(config).execute(&self.program, vars, scope)
    }

    /// Like [`execute_in`](Self::execute_in), reporting each evaluated node
    /// to `tracer`.
    pub fn execute_traced(
        &self,
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
        config: &Config,
        tracer: &dyn TraceListener,
    ) -> Result<Value, EvalError> {
        Evaluator::new(config)
            .with_tracer(tracer)
            .execute(&self.program, vars, scope)
    }

    /// Variables and external functions the script refers to.
    pub fn references(&self, config: &Config) -> References {
        References::collect(&self.program, config)
    }
}

/// Parses and runs `source` in one step.
pub fn evaluate(source: &str, vars: &mut dyn VariantContainer, config: &Config) -> Result<Value, Error> {
    Ok(Expression::compile(source, config)?.execute(vars, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Variables;

    #[test]
    fn test_empty_source_uses_default_expression() {
        let config = Config::default().with_default_expression("42");
        let expr = Expression::compile("   ", &config).unwrap();
        assert_eq!(expr.source(), "42");
        assert_eq!(expr.execute(&mut Variables::new(), &config).unwrap(), Value::from(42));
    }

    #[test]
    fn test_error_codes_pass_through() {
        let config = Config::default();
        let parse = evaluate("(1 + 2", &mut Variables::new(), &config).unwrap_err();
        assert_eq!(parse.code(), 3);
        let eval = evaluate("1 / 0", &mut Variables::new(), &config).unwrap_err();
        assert_eq!(eval, Error::Eval(EvalError::DivisionByZero));
    }

    #[test]
    fn test_expression_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Expression>();
    }
}
