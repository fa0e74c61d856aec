//! Function resolution chain.
//!
//! A [`Scope`] is one execution block: it owns the native (Rust) functions and
//! script functions registered at its level and borrows the block that encloses
//! it. Lookups walk outward, so the nearest definition wins. Scopes are never
//! stored in the AST; the evaluator builds child scopes on the stack while it
//! runs, which lets one parsed program run under any number of enclosing
//! scopes.

use std::{collections::HashMap, fmt, sync::Arc, sync::LazyLock};

use regex::Regex;

use crate::{
    ast::FunctionDef,
    config::Config,
    evaluator::EvalError,
    namespace::VariantContainer,
    parser::{ParseError, parse_program},
    value::Value,
};

/// Body of a native function. It receives a namespace holding the bound
/// parameters (reads of other names fall through to the caller's namespace).
pub type NativeBody = dyn Fn(&mut dyn VariantContainer, &Config) -> Result<Value, EvalError>;

/// A function implemented in Rust and callable from scripts.
pub struct NativeFunction {
    pub name: String,
    /// Parameter names; a blank name ignores that argument position
    pub params: Vec<String>,
    body: Box<NativeBody>,
}

impl NativeFunction {
    /// Builds a native function from a signature such as `"clamp(x, lo, hi)"`.
    pub fn new<F>(signature: &str, body: F) -> Result<Self, EvalError>
    where
        F: Fn(&mut dyn VariantContainer, &Config) -> Result<Value, EvalError> + 'static,
    {
        let (name, params) = parse_signature(signature)?;
        Ok(NativeFunction {
            name,
            params,
            body: Box::new(body),
        })
    }

    pub fn call(&self, args: &mut dyn VariantContainer, config: &Config) -> Result<Value, EvalError> {
        (self.body)(args, config)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\((.*)\)\s*$").expect("signature pattern is valid")
});

static PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("parameter pattern is valid"));

/// Splits `name(a, , c)` into the name and its parameter list. Blank entries
/// are kept as empty strings so positions line up with call arguments.
pub fn parse_signature(signature: &str) -> Result<(String, Vec<String>), EvalError> {
    let invalid = || EvalError::InvalidSignature(signature.to_string());
    let captures = SIGNATURE.captures(signature).ok_or_else(invalid)?;
    let name = captures[1].to_string();
    let inner = captures[2].trim();

    if inner.is_empty() {
        return Ok((name, Vec::new()));
    }

    let params: Vec<String> = inner.split(',').map(|p| p.trim().to_string()).collect();
    if params.iter().any(|p| !p.is_empty() && !PARAM.is_match(p)) {
        return Err(invalid());
    }
    Ok((name, params))
}

/// A function found by [`Scope::resolve`].
pub enum Resolved<'a> {
    /// Script function, with the scope it was registered in (its body runs in
    /// a child of that scope)
    Script {
        function: &'a Arc<FunctionDef>,
        home: &'a Scope<'a>,
    },
    Native(&'a NativeFunction),
}

/// One execution block's function registries plus a link to the enclosing
/// block.
///
/// # Examples
///
/// ```
/// use tally_lang::{Config, Expression, Scope, Value, Variables, VariantContainer};
///
/// let config = Config::default();
/// let mut scope = Scope::new();
/// scope
///     .define_native("twice(x)", |args, _| match args.get("x") {
///         Value::Numeric(n) => Ok(Value::Numeric(n * rust_decimal::Decimal::TWO)),
///         _ => Ok(Value::Null),
///     })
///     .unwrap();
///
/// let expr = Expression::compile("twice(21)", &config).unwrap();
/// let result = expr.execute_in(&mut Variables::new(), &scope, &config).unwrap();
/// assert_eq!(result, Value::from(42));
/// ```
#[derive(Debug, Default)]
pub struct Scope<'p> {
    natives: HashMap<String, NativeFunction>,
    scripts: HashMap<String, Arc<FunctionDef>>,
    parent: Option<&'p Scope<'p>>,
}

impl<'p> Scope<'p> {
    /// A root scope with no enclosing block.
    pub fn new() -> Self {
        Scope {
            natives: HashMap::new(),
            scripts: HashMap::new(),
            parent: None,
        }
    }

    /// A scope nested inside `self`.
    pub fn child(&self) -> Scope<'_> {
        Scope {
            natives: HashMap::new(),
            scripts: HashMap::new(),
            parent: Some(self),
        }
    }

    pub fn parent(&self) -> Option<&'p Scope<'p>> {
        self.parent
    }

    /// Registers a native function under the name in `signature`, replacing
    /// any previous definition at this level.
    pub fn define_native<F>(&mut self, signature: &str, body: F) -> Result<(), EvalError>
    where
        F: Fn(&mut dyn VariantContainer, &Config) -> Result<Value, EvalError> + 'static,
    {
        let function = NativeFunction::new(signature, body)?;
        self.natives.insert(function.name.clone(), function);
        Ok(())
    }

    /// Registers a script function at this level.
    pub fn define_script(&mut self, function: Arc<FunctionDef>) {
        self.scripts.insert(function.name.clone(), function);
    }

    /// Parses `source` and registers every top-level `function` declaration
    /// in it. Other statements are ignored. Returns how many functions were
    /// registered.
    pub fn load_functions(&mut self, source: &str, config: &Config) -> Result<usize, ParseError> {
        let program = parse_program(source, config)?;
        let count = program.body.functions.len();
        for function in program.body.functions {
            self.define_script(function);
        }
        Ok(count)
    }

    /// Names registered at this level (not including enclosing blocks).
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .natives
            .keys()
            .chain(self.scripts.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    fn find<'m, T>(map: &'m HashMap<String, T>, name: &str, config: &Config) -> Option<&'m T> {
        if config.case_sensitive {
            map.get(name)
        } else {
            map.iter()
                .find(|(key, _)| config.names_match(key, name))
                .map(|(_, value)| value)
        }
    }

    /// Finds `name`, checking this block and then each enclosing block. At
    /// each level a script function shadows a native one.
    pub fn resolve(&self, name: &str, config: &Config) -> Option<Resolved<'_>> {
        let mut current: &Scope<'_> = self;
        loop {
            if let Some(function) = Self::find(&current.scripts, name, config) {
                return Some(Resolved::Script {
                    function,
                    home: current,
                });
            }
            if let Some(native) = Self::find(&current.natives, name, config) {
                return Some(Resolved::Native(native));
            }
            current = current.parent?;
        }
    }

    /// True if `name` resolves anywhere in the chain.
    pub fn is_defined(&self, name: &str, config: &Config) -> bool {
        self.resolve(name, config).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Block;

    fn script(name: &str) -> Arc<FunctionDef> {
        Arc::new(FunctionDef {
            name: name.to_string(),
            params: vec![],
            body: Block::default(),
        })
    }

    #[test]
    fn signature_parsing() {
        assert_eq!(
            parse_signature("clamp(x, lo, hi)").unwrap(),
            ("clamp".to_string(), vec!["x".into(), "lo".into(), "hi".into()])
        );
        assert_eq!(parse_signature("now2()").unwrap(), ("now2".to_string(), vec![]));
        assert_eq!(
            parse_signature("pick(, b)").unwrap().1,
            vec![String::new(), "b".to_string()]
        );
        assert!(parse_signature("bad").is_err());
        assert!(parse_signature("f(1x)").is_err());
    }

    #[test]
    fn nearest_definition_wins() {
        let config = Config::default();
        let mut outer = Scope::new();
        outer.define_native("f()", |_, _| Ok(Value::from(1))).unwrap();
        outer.define_native("g()", |_, _| Ok(Value::from(2))).unwrap();

        let mut inner = outer.child();
        inner.define_native("f()", |_, _| Ok(Value::from(10))).unwrap();

        let mut args = crate::Variables::new();
        match inner.resolve("f", &config) {
            Some(Resolved::Native(f)) => assert_eq!(f.call(&mut args, &config).unwrap(), Value::from(10)),
            _ => panic!("expected native f"),
        }
        match inner.resolve("g", &config) {
            Some(Resolved::Native(g)) => assert_eq!(g.call(&mut args, &config).unwrap(), Value::from(2)),
            _ => panic!("expected native g from the outer scope"),
        }
        assert!(inner.resolve("h", &config).is_none());
    }

    #[test]
    fn script_shadows_native_at_same_level() {
        let config = Config::default();
        let mut scope = Scope::new();
        scope.define_native("f()", |_, _| Ok(Value::Null)).unwrap();
        scope.define_script(script("f"));
        assert!(matches!(scope.resolve("f", &config), Some(Resolved::Script { .. })));
    }

    #[test]
    fn script_home_is_defining_scope() {
        let config = Config::default();
        let mut outer = Scope::new();
        outer.define_script(script("f"));
        outer.define_native("marker()", |_, _| Ok(Value::Null)).unwrap();
        let inner = outer.child();

        match inner.resolve("f", &config) {
            Some(Resolved::Script { home, .. }) => {
                assert!(home.parent().is_none());
                assert_eq!(home.function_names(), vec!["f", "marker"]);
            }
            _ => panic!("expected script f"),
        }
    }

    #[test]
    fn case_insensitive_resolution() {
        let config = Config::default().with_case_sensitive(false);
        let mut scope = Scope::new();
        scope.define_script(script("Total"));
        assert!(scope.is_defined("total", &config));
        assert!(!scope.is_defined("total", &Config::default()));
    }

    #[test]
    fn load_functions_registers_declarations() {
        let config = Config::default();
        let mut scope = Scope::new();
        let count = scope
            .load_functions("function a() { a = 1 }; function b(x) { b = x }", &config)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(scope.function_names(), vec!["a", "b"]);
    }
}
