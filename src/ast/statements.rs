use std::sync::Arc;

use crate::ast::{Expr, FunctionDef};

/// A statement of a script.
///
/// Statements are separated by `;`. The value of a sequence of statements is
/// the value of the last statement executed.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Expression statement
    ///
    /// # Example
    /// ```text
    /// total = price * quantity
    /// ```
    Expression(Expr),

    /// Conditional
    ///
    /// # Example
    /// ```text
    /// if (age >= 18) { adult = true } else { adult = false }
    /// ```
    If {
        condition: Expr,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },

    /// Loop, re-testing the condition before every iteration
    ///
    /// # Example
    /// ```text
    /// while (i < 10) { i = i + 1 }
    /// ```
    While {
        condition: Expr,
        body: Vec<Statement>,
    },
}

/// Statements plus the functions declared at their level.
///
/// Functions are hoisted: they are registered before any statement of the
/// block runs, so a call may precede the declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub functions: Vec<Arc<FunctionDef>>,
    pub statements: Vec<Statement>,
}
