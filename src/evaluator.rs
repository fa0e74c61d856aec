use std::sync::Arc;

use crate::{
    ast::{BinOp, Block, Expr, Program, Statement, VarRef},
    config::Config,
    namespace::{LocalVariables, VariantContainer, element_of, resolve_name, with_element},
    scope::{Resolved, Scope},
    trace::TraceListener,
    value::Value,
};

mod builtins;
pub mod dates;
pub mod operators;

/// Errors that can occur while a program runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Operation not defined for the operand types
    #[error("type error: {0}")]
    TypeError(String),

    #[error("division by zero")]
    DivisionByZero,

    /// Built-in called with the wrong number of arguments
    #[error("{function}() expects {expected} argument(s), got {found}")]
    ArgumentCount {
        function: String,
        expected: String,
        found: usize,
    },

    /// Result does not fit in a decimal
    #[error("numeric overflow in '{0}'")]
    Overflow(String),

    /// Call to a name not defined anywhere in the scope chain
    #[error("unresolved function: {0}")]
    UnresolvedFunction(String),

    /// Native function signature that is not `name(p1, p2, ...)`
    #[error("invalid function signature: {0}")]
    InvalidSignature(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EvalError {
    /// Stable numeric code, reported by the CLI and usable by hosts.
    pub fn code(&self) -> u32 {
        match self {
            EvalError::TypeError(_) => 100,
            EvalError::DivisionByZero => 101,
            EvalError::ArgumentCount { .. } => 102,
            EvalError::Overflow(_) => 103,
            EvalError::UnresolvedFunction(_) => 200,
            EvalError::InvalidSignature(_) => 201,
            EvalError::Internal(_) => 900,
        }
    }
}

/// Tree-walking evaluator.
///
/// The evaluator holds no state of its own: a run is a function of the
/// program, the namespace and the scope chain it is given. Scopes for function
/// bodies and blocks with local function declarations are built on the stack
/// as execution descends.
pub struct Evaluator<'a> {
    config: &'a Config,
    tracer: Option<&'a dyn TraceListener>,
}

impl<'a> Evaluator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Evaluator {
            config,
            tracer: None,
        }
    }

    /// Reports every node evaluation to `tracer`. While tracing, a failing
    /// node is reported and yields `Null` instead of aborting the run.
    pub fn with_tracer(mut self, tracer: &'a dyn TraceListener) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// Runs a whole program against `vars`, resolving user functions through
    /// `scope`.
    ///
    /// # Returns
    ///
    /// The value of the last statement executed, or `Null` for a program
    /// without statements.
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_lang::{Config, Scope, Value, Variables, VariantContainer};
    /// use tally_lang::evaluator::Evaluator;
    /// use tally_lang::parser::parse_program;
    ///
    /// let config = Config::default();
    /// let program = parse_program("a = -1.0 * (2.5 + 3.5)", &config).unwrap();
    /// let mut vars = Variables::new();
    ///
    /// Evaluator::new(&config)
    ///     .execute(&program, &mut vars, &Scope::new())
    ///     .unwrap();
    /// assert_eq!(vars.get("a").to_string(), "-6");
    /// ```
    pub fn execute(
        &self,
        program: &Program,
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
    ) -> Result<Value, EvalError> {
        if let Some(tracer) = self.tracer {
            tracer.trace(&format!("source: {}", program.source));
        }
        tracing::trace!(source = %program.source, "executing program");
        self.run_block(&program.body, vars, scope)
    }

    /// Evaluates a single expression node.
    pub fn eval_expression(
        &self,
        expr: &Expr,
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
    ) -> Result<Value, EvalError> {
        self.eval_expr(expr, vars, scope)
    }

    /// Registers the block's functions in a child scope, then runs its
    /// statements there.
    fn run_block(
        &self,
        block: &Block,
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
    ) -> Result<Value, EvalError> {
        if block.functions.is_empty() {
            return self.run_statements(&block.statements, vars, scope);
        }

        let mut local = scope.child();
        for function in &block.functions {
            local.define_script(Arc::clone(function));
        }
        self.run_statements(&block.statements, vars, &local)
    }

    fn run_statements(
        &self,
        statements: &[Statement],
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
    ) -> Result<Value, EvalError> {
        let mut last = Value::Null;
        for statement in statements {
            last = self.run_statement(statement, vars, scope)?;
        }
        Ok(last)
    }

    fn run_statement(
        &self,
        statement: &Statement,
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
    ) -> Result<Value, EvalError> {
        match statement {
            Statement::Expression(expr) => self.eval_expr(expr, vars, scope),
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(condition, vars, scope)?.as_bool() {
                    self.run_statements(then_branch, vars, scope)
                } else if let Some(else_branch) = else_branch {
                    self.run_statements(else_branch, vars, scope)
                } else {
                    Ok(Value::Null)
                }
            }
            Statement::While { condition, body } => {
                let mut last = Value::Null;
                while self.eval_expr(condition, vars, scope)?.as_bool() {
                    last = self.run_statements(body, vars, scope)?;
                }
                Ok(last)
            }
        }
    }

    fn eval_expr(
        &self,
        expr: &Expr,
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
    ) -> Result<Value, EvalError> {
        let Some(tracer) = self.tracer else {
            return self.eval_node(expr, vars, scope, &mut Vec::new());
        };

        let mut operands = Vec::new();
        match self.eval_node(expr, vars, scope, &mut operands) {
            Ok(value) => {
                tracer.trace(&format!(
                    "{} => {}",
                    self.describe(expr, &operands),
                    value.render(self.config)
                ));
                Ok(value)
            }
            Err(err) => {
                tracer.trace(&format!("{} failed: {}", self.describe(expr, &operands), err));
                Ok(Value::Null)
            }
        }
    }

    /// Keeps an operand's value for the trace message of the node being
    /// evaluated. Nothing is kept without a tracer.
    fn note(&self, operands: &mut Vec<Value>, value: &Value) {
        if self.tracer.is_some() {
            operands.push(value.clone());
        }
    }

    /// `<node>` or `<node> [<operand values>]`.
    fn describe(&self, expr: &Expr, operands: &[Value]) -> String {
        if operands.is_empty() {
            return expr.to_string();
        }
        let rendered: Vec<String> = operands
            .iter()
            .map(|value| match value {
                Value::String(s) => format!("\"{}\"", s),
                other => other.render(self.config),
            })
            .collect();
        format!("{} [{}]", expr, rendered.join(", "))
    }

    fn eval_node(
        &self,
        expr: &Expr,
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
        operands: &mut Vec<Value>,
    ) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),

            Expr::Variable(var) => self.read_variable(var, vars, scope),

            Expr::Assign { target, value } => {
                let value = self.eval_expr(value, vars, scope)?;
                self.note(operands, &value);
                self.write_variable(target, value, vars, scope)
            }

            Expr::Binary {
                op: BinOp::And,
                left,
                right,
            } => {
                let left = self.eval_expr(left, vars, scope)?;
                self.note(operands, &left);
                if !left.as_bool() {
                    return Ok(Value::Boolean(false));
                }
                let right = self.eval_expr(right, vars, scope)?;
                self.note(operands, &right);
                Ok(Value::Boolean(right.as_bool()))
            }

            Expr::Binary {
                op: BinOp::Or,
                left,
                right,
            } => {
                let left = self.eval_expr(left, vars, scope)?;
                self.note(operands, &left);
                if left.as_bool() {
                    return Ok(Value::Boolean(true));
                }
                let right = self.eval_expr(right, vars, scope)?;
                self.note(operands, &right);
                Ok(Value::Boolean(right.as_bool()))
            }

            Expr::Binary { op, left, right } => {
                let left = self.eval_expr(left, vars, scope)?;
                self.note(operands, &left);
                let right = self.eval_expr(right, vars, scope)?;
                self.note(operands, &right);
                operators::apply(*op, &left, &right, self.config)
            }

            Expr::Not(operand) => {
                let value = self.eval_expr(operand, vars, scope)?;
                self.note(operands, &value);
                match value {
                    Value::Null => Ok(Value::Null),
                    value => Ok(Value::Boolean(!value.as_bool())),
                }
            }

            Expr::Builtin { function, args } => {
                self.call_builtin(*function, args, vars, scope, operands)
            }

            Expr::Call { name, args } => self.call_function(name, args, vars, scope, operands),

            Expr::Substitute { primary, fallback } => {
                let value = self.eval_expr(primary, vars, scope)?;
                self.note(operands, &value);
                match value {
                    Value::Null => self.eval_expr(fallback, vars, scope),
                    value => Ok(value),
                }
            }
        }
    }

    /// Evaluates call arguments left to right in the caller's namespace.
    pub(super) fn eval_arguments(
        &self,
        args: &[Expr],
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
        operands: &mut Vec<Value>,
    ) -> Result<Vec<Value>, EvalError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.eval_expr(arg, vars, scope)?;
            self.note(operands, &value);
            values.push(value);
        }
        Ok(values)
    }

    /// Evaluates an index expression. `None` means the index cannot address
    /// an element (null or negative).
    fn eval_index(
        &self,
        index: &Expr,
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
    ) -> Result<Option<usize>, EvalError> {
        let value = self.eval_expr(index, vars, scope)?;
        match &value {
            Value::Null => Ok(None),
            Value::Numeric(_) | Value::String(_) => match value.as_i64() {
                Some(i) => Ok(usize::try_from(i).ok()),
                None => Err(EvalError::TypeError(format!(
                    "array index '{}' is not numeric",
                    value
                ))),
            },
            other => Err(EvalError::TypeError(format!(
                "array index must be numeric, got {}",
                other.type_name()
            ))),
        }
    }

    fn read_variable(
        &self,
        var: &VarRef,
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
    ) -> Result<Value, EvalError> {
        let index = match &var.index {
            Some(index) => Some(self.eval_index(index, vars, scope)?),
            None => None,
        };
        let name = resolve_name(&*vars, &var.name, self.config.case_sensitive);
        let Some(index) = index else {
            return Ok(if var.local {
                vars.get_local(&name)
            } else {
                vars.get(&name)
            });
        };

        Ok(match index {
            Some(i) if var.local => element_of(vars.get_local(&name), i),
            Some(i) => vars.get_element(&name, i),
            None => Value::Null,
        })
    }

    /// Stores `value` and returns what reading the target gives afterwards.
    fn write_variable(
        &self,
        var: &VarRef,
        value: Value,
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
    ) -> Result<Value, EvalError> {
        let index = match &var.index {
            Some(index) => Some(self.eval_index(index, vars, scope)?),
            None => None,
        };
        let name = resolve_name(&*vars, &var.name, self.config.case_sensitive).into_owned();
        let Some(index) = index else {
            vars.set(&name, value);
            return Ok(if var.local {
                vars.get_local(&name)
            } else {
                vars.get(&name)
            });
        };

        let i = index.ok_or_else(|| {
            EvalError::TypeError(format!("cannot write {} with a null or negative index", var))
        })?;
        if var.local {
            let updated = with_element(vars.get_local(&name), i, value);
            vars.set(&name, updated);
            Ok(element_of(vars.get_local(&name), i))
        } else {
            vars.set_element(&name, i, value);
            Ok(vars.get_element(&name, i))
        }
    }

    /// Calls a script or native function. Arguments are evaluated in the
    /// caller's namespace; the callee sees a fresh namespace holding its
    /// parameters that reads through to the caller's.
    fn call_function(
        &self,
        name: &str,
        args: &[Expr],
        vars: &mut dyn VariantContainer,
        scope: &Scope<'_>,
        operands: &mut Vec<Value>,
    ) -> Result<Value, EvalError> {
        let resolved = scope
            .resolve(name, self.config)
            .ok_or_else(|| EvalError::UnresolvedFunction(name.to_string()))?;

        let values = self.eval_arguments(args, vars, scope, operands)?;
        tracing::trace!(function = %name, args = values.len(), "calling function");

        match resolved {
            Resolved::Script { function, home } => {
                let mut locals = LocalVariables::new(&*vars, self.config.case_sensitive);
                locals.set(&function.name, Value::Null);
                self.bind(&mut locals, &function.params, values);
                self.run_block(&function.body, &mut locals, home)?;
                Ok(locals.get_local(&function.name))
            }
            Resolved::Native(native) => {
                let mut locals = LocalVariables::new(&*vars, self.config.case_sensitive);
                self.bind(&mut locals, &native.params, values);
                native.call(&mut locals, self.config)
            }
        }
    }

    /// Binds as many arguments as there are both parameters and values.
    fn bind(&self, locals: &mut LocalVariables<'_>, params: &[String], values: Vec<Value>) {
        for (param, value) in params.iter().zip(values) {
            if param.trim().is_empty() {
                continue;
            }
            locals.set(param, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::parse_program, trace::TraceLog, Variables};

    fn run(source: &str, vars: &mut Variables) -> Result<Value, EvalError> {
        let config = Config::default();
        let program = parse_program(source, &config).unwrap();
        Evaluator::new(&config).execute(&program, vars, &Scope::new())
    }

    #[test]
    fn test_statement_value_is_last_executed() {
        let mut vars = Variables::new();
        assert_eq!(run("1; 2; 3", &mut vars).unwrap(), Value::from(3));
        assert_eq!(run("if (false) { 1 }", &mut vars).unwrap(), Value::Null);
        assert_eq!(run("", &mut vars).unwrap(), Value::Null);
    }

    #[test]
    fn test_while_loop() {
        let mut vars = Variables::new();
        run("i = 0; total = 0; while (i < 5) { total = total + i; i = i + 1 }", &mut vars).unwrap();
        assert_eq!(vars.get("total"), Value::from(10));
        assert_eq!(vars.get("i"), Value::from(5));
    }

    #[test]
    fn test_else_if_chain() {
        let mut vars = Variables::new().with("score", 75);
        run(
            "if (score >= 90) { grade = \"A\" } else if (score >= 70) { grade = \"B\" } else { grade = \"C\" }",
            &mut vars,
        )
        .unwrap();
        assert_eq!(vars.get("grade"), Value::from("B"));
    }

    #[test]
    fn test_assignment_reads_back() {
        let mut vars = Variables::new();
        assert_eq!(run("list[2] = 7", &mut vars).unwrap(), Value::from(7));
        assert_eq!(
            vars.get("list"),
            Value::Array(vec![Value::Null, Value::Null, Value::from(7)])
        );
    }

    #[test]
    fn test_negative_index_reads_null_and_rejects_writes() {
        let mut vars = Variables::new().with("arr", Value::Array(vec![Value::from(1)]));
        assert_eq!(run("arr[-1]", &mut vars).unwrap(), Value::Null);
        assert!(matches!(
            run("arr[-1] = 2", &mut vars),
            Err(EvalError::TypeError(_))
        ));
    }

    #[test]
    fn test_script_function_returns_slot_value() {
        let mut vars = Variables::new().with("rate", Value::from(2));
        let result = run("function scaled(x) { scaled = x * rate }; scaled(21)", &mut vars).unwrap();
        assert_eq!(result, Value::from(42));
    }

    #[test]
    fn test_function_body_does_not_leak_into_caller() {
        let mut vars = Variables::new().with("x", 1);
        run("function f(x) { x = 100; y = 5; f = x }; r = f(3)", &mut vars).unwrap();
        assert_eq!(vars.get("r"), Value::from(100));
        assert_eq!(vars.get("x"), Value::from(1));
        assert_eq!(vars.get("y"), Value::Null);
    }

    #[test]
    fn test_recursive_function() {
        let mut vars = Variables::new();
        let result = run(
            "function fact(n) { if (n <= 1) { fact = 1 } else { fact = n * fact(n - 1) } }; fact(6)",
            &mut vars,
        )
        .unwrap();
        assert_eq!(result, Value::from(720));
    }

    #[test]
    fn test_nested_function_visible_only_inside() {
        let mut vars = Variables::new();
        let result = run(
            "function outer(x) { function inner(y) { inner = y + 1 }; outer = inner(x) * 2 }; outer(4)",
            &mut vars,
        )
        .unwrap();
        assert_eq!(result, Value::from(10));
        assert!(matches!(
            run(
                "function outer(x) { function inner(y) { inner = y }; outer = x }; inner(1)",
                &mut vars
            ),
            Err(EvalError::UnresolvedFunction(name)) if name == "inner"
        ));
    }

    #[test]
    fn test_extra_and_missing_arguments() {
        let mut vars = Variables::new().with("b", 9);
        assert_eq!(
            run("function f(a, b) { f = to_array(a, b) }; f(1)", &mut vars).unwrap(),
            Value::Array(vec![Value::from(1), Value::from(9)])
        );
        assert_eq!(
            run("function g(a) { g = a }; g(1, 2, 3)", &mut vars).unwrap(),
            Value::from(1)
        );
    }

    #[test]
    fn test_local_variable_ignores_parent() {
        let mut vars = Variables::new().with("count", 5);
        let result = run(
            "function f() { f = var count?0 }; f()",
            &mut vars,
        )
        .unwrap();
        assert_eq!(result, Value::from(0));
    }

    #[test]
    fn test_tracer_turns_errors_into_null() {
        let config = Config::default();
        let program = parse_program("a = 1 / 0; b = 2", &config).unwrap();
        let log = TraceLog::new();
        let mut vars = Variables::new();

        let result = Evaluator::new(&config)
            .with_tracer(&log)
            .execute(&program, &mut vars, &Scope::new())
            .unwrap();

        assert_eq!(result, Value::from(2));
        assert_eq!(vars.get("a"), Value::Null);
        let messages = log.messages();
        assert_eq!(messages[0], "source: a = 1 / 0; b = 2");
        assert!(messages.iter().any(|m| m == "(1 / 0) [1, 0] failed: division by zero"));
        assert!(messages.iter().any(|m| m == "b = 2 [2] => 2"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(EvalError::TypeError(String::new()).code(), 100);
        assert_eq!(EvalError::DivisionByZero.code(), 101);
        assert_eq!(EvalError::UnresolvedFunction(String::new()).code(), 200);
        assert_eq!(EvalError::Internal(String::new()).code(), 900);
    }
}
