//! # Tally Expression Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for the tally
//! expression language, a small DSL for evaluating business rules against a
//! namespace of variables.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, variables, operators, calls)
//! - **[operators]** - Binary operators (logical, arithmetic, comparison, bitwise)
//! - **[builtins]** - Built-in math, introspection and date functions
//! - **[statements]** - Statements (`if`, `while`, expression statements) and blocks
//! - **[function]** - Script-authored function definitions
//! - **[program]** - A complete parsed script
//!
//! ## Quick Start
//!
//! ```text
//! total = price * quantity; total > 100 && customer.vip
//! ```
//!
//! ## Operator Precedence
//!
//! From the loosest to the tightest binding:
//!
//! | Tier            | Operators                       |
//! |-----------------|---------------------------------|
//! | assignment      | `=` (right associative)         |
//! | logical         | `\|\|` `&&` (short-circuit)     |
//! | additive        | `+` `-`                         |
//! | multiplicative  | `*` `/`                         |
//! | power           | `^` `$`                         |
//! | comparison      | `>` `<` `>=` `<=` `==` `!=`     |
//! | bitwise         | `&` `\|`                        |
//! | unary           | `!`                             |
//!
//! Comparison binds tighter than arithmetic, so `a + b > c` groups as
//! `a + (b > c)`; parenthesise arithmetic operands of comparisons.
//!
//! ## Null Substitution
//!
//! Any atom may carry a `?fallback` suffix. The fallback is evaluated only
//! when the atom evaluates to null:
//!
//! ```text
//! discount?0 * price
//! ```
//!
//! ## Statements
//!
//! ```text
//! function bonus(salary) { bonus = salary * 0.1 };
//! if (rating > 3) { pay = salary + bonus(salary) } else { pay = salary };
//! i = 0; while (i < 3) { items[i] = i; i = i + 1 }
//! ```
pub mod builtins;
pub mod expressions;
pub mod function;
pub mod operators;
pub mod program;
pub mod statements;
pub mod tokens;

pub use builtins::{Arity, Builtin};
pub use expressions::{Expr, VarRef};
pub use function::FunctionDef;
pub use operators::BinOp;
pub use program::Program;
pub use statements::{Block, Statement};
pub use tokens::Token;
