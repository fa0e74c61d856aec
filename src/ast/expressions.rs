use std::fmt;

use crate::{
    ast::{BinOp, Builtin},
    value::Value,
};

/// Reference to a variable, optionally to one element of it.
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub name: String,

    /// Index expression for `name[index]`
    pub index: Option<Box<Expr>>,

    /// Declared with `var`: reads and writes only the innermost namespace
    pub local: bool,
}

impl VarRef {
    pub fn new(name: impl Into<String>) -> Self {
        VarRef {
            name: name.into(),
            index: None,
            local: false,
        }
    }
}

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Nodes are immutable once parsed and hold no evaluation state, so the same
/// tree can be evaluated any number of times against different namespaces.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant: number, string, boolean, null, `PI` or `E`
    ///
    /// # Example
    /// ```text
    /// 42
    /// "hello"
    /// PI
    /// ```
    Literal(Value),

    /// Variable read
    ///
    /// # Examples
    /// ```text
    /// total
    /// items[i + 1]
    /// var counter
    /// ```
    Variable(VarRef),

    /// Assignment; the result is the value read back after the write
    ///
    /// # Example
    /// ```text
    /// items[3] = "d"
    /// ```
    Assign { target: VarRef, value: Box<Expr> },

    /// Binary operation (logical, arithmetic, comparison, bitwise)
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Logical not (`!`); null stays null
    Not(Box<Expr>),

    /// Built-in function call
    ///
    /// # Example
    /// ```text
    /// sqrt(x)
    /// ```
    Builtin { function: Builtin, args: Vec<Expr> },

    /// User function call, resolved through the scope chain at run time
    ///
    /// # Example
    /// ```text
    /// discount(price, 0.1)
    /// ```
    Call { name: String, args: Vec<Expr> },

    /// Null substitution (`primary?fallback`)
    ///
    /// The fallback is evaluated only when the primary evaluates to null.
    Substitute {
        primary: Box<Expr>,
        fallback: Box<Expr>,
    },
}

impl Expr {
    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Literal(_))
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.local {
            write!(f, "var ")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(index) = &self.index {
            write!(f, "[{}]", index)?;
        }
        Ok(())
    }
}

/// Source-like rendering, used in trace messages.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::String(s)) => write!(f, "\"{}\"", s),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Variable(var) => write!(f, "{}", var),
            Expr::Assign { target, value } => write!(f, "{} = {}", target, value),
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Not(operand) => write!(f, "!{}", operand),
            Expr::Builtin { function, args } => {
                write!(f, "{}(", function)?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::Substitute { primary, fallback } => write!(f, "{}?{}", primary, fallback),
        }
    }
}
