//! Static reference collection.
//!
//! Walks a parsed program without running it and reports which variables it
//! touches and which user functions it calls but does not define itself.
//! Hosts use this to decide which inputs to load before evaluating.

use std::collections::{BTreeSet, HashSet};

use crate::{
    ast::{Block, Expr, Program, Statement, VarRef},
    config::Config,
};

/// Names referenced by a program, in sorted order.
///
/// # Examples
///
/// ```
/// use tally_lang::{Config, Expression};
///
/// let config = Config::default();
/// let expr = Expression::compile("c[0] = a + b; d = extf(c[0] + e)", &config).unwrap();
/// let refs = expr.references(&config);
///
/// assert_eq!(refs.variables.iter().collect::<Vec<_>>(), ["a", "b", "c", "d", "e"]);
/// assert_eq!(refs.functions.iter().collect::<Vec<_>>(), ["extf"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    /// Variables read or written, including array names and names inside
    /// index expressions and call arguments
    pub variables: BTreeSet<String>,

    /// User functions called but not declared by the program. Built-ins are
    /// never listed.
    pub functions: BTreeSet<String>,
}

impl References {
    pub fn collect(program: &Program, config: &Config) -> Self {
        let mut declared = HashSet::new();
        declared_functions(&program.body, config, &mut declared);

        let mut collector = Collector {
            config,
            declared,
            hidden: Vec::new(),
            refs: References::default(),
        };
        collector.block(&program.body);
        collector.refs
    }
}

fn declared_functions(block: &Block, config: &Config, out: &mut HashSet<String>) {
    for function in &block.functions {
        out.insert(config.normalize_name(&function.name).into_owned());
        declared_functions(&function.body, config, out);
    }
}

struct Collector<'c> {
    config: &'c Config,
    declared: HashSet<String>,
    /// Parameter and return-slot names of the function bodies being walked
    hidden: Vec<HashSet<String>>,
    refs: References,
}

impl Collector<'_> {
    fn block(&mut self, block: &Block) {
        for function in &block.functions {
            let mut names: HashSet<String> = function
                .params
                .iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| self.config.normalize_name(p).into_owned())
                .collect();
            names.insert(self.config.normalize_name(&function.name).into_owned());

            self.hidden.push(names);
            self.block(&function.body);
            self.hidden.pop();
        }
        self.statements(&block.statements);
    }

    fn statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            match statement {
                Statement::Expression(expr) => self.expr(expr),
                Statement::If {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    self.expr(condition);
                    self.statements(then_branch);
                    if let Some(else_branch) = else_branch {
                        self.statements(else_branch);
                    }
                }
                Statement::While { condition, body } => {
                    self.expr(condition);
                    self.statements(body);
                }
            }
        }
    }

    fn variable(&mut self, var: &VarRef) {
        let name = self.config.normalize_name(&var.name);
        let is_hidden = self
            .hidden
            .last()
            .is_some_and(|names| names.contains(name.as_ref()));
        if !is_hidden {
            self.refs.variables.insert(name.into_owned());
        }
        if let Some(index) = &var.index {
            self.expr(index);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Variable(var) => self.variable(var),
            Expr::Assign { target, value } => {
                self.variable(target);
                self.expr(value);
            }
            Expr::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            Expr::Not(operand) => self.expr(operand),
            Expr::Builtin { args, .. } => args.iter().for_each(|arg| self.expr(arg)),
            Expr::Call { name, args } => {
                let name = self.config.normalize_name(name);
                if !self.declared.contains(name.as_ref()) {
                    self.refs.functions.insert(name.into_owned());
                }
                args.iter().for_each(|arg| self.expr(arg));
            }
            Expr::Substitute { primary, fallback } => {
                self.expr(primary);
                self.expr(fallback);
            }
        }
    }
}
