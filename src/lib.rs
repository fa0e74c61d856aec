//! # tally-lang
//!
//! An embeddable expression and scripting language for business rules:
//! decimal arithmetic, strings, booleans and arrays, `if`/`while`, script
//! and host-provided functions, all evaluated against a namespace of
//! variables supplied by the host.
//!
//! ```
//! use tally_lang::{Config, Expression, Value, Variables, VariantContainer};
//!
//! let config = Config::default().with_scale(2);
//! let mut vars = Variables::new().with("price", 10).with("qty", 3);
//!
//! let expr = Expression::compile("total = price * qty / 7; total > 4", &config).unwrap();
//! assert_eq!(expr.execute(&mut vars, &config).unwrap(), Value::Boolean(true));
//! assert_eq!(vars.get("total").render(&config), "4.29");
//! ```
pub mod ast;
pub mod config;
pub mod convert;
pub mod evaluator;
pub mod expression;
pub mod lexer;
pub mod namespace;
pub mod parser;
pub mod references;
pub mod scope;
pub mod trace;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{BinOp, Builtin, Expr, Program, Statement, Token};
pub use config::{Clock, Config, FixedClock, SystemClock};
pub use evaluator::{EvalError, Evaluator};
pub use expression::{Error, Expression, evaluate};
pub use lexer::{LexError, Lexer, Position};
pub use namespace::{LocalVariables, VariantContainer, Variables};
pub use parser::{ParseError, ParseErrorKind, Parser};
pub use references::References;
pub use scope::Scope;
pub use trace::{TraceListener, TraceLog, TracingListener};
pub use value::Value;
