use crate::ast::Block;

/// A parsed script, ready to be evaluated any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Source text that was parsed (after empty-input substitution)
    pub source: String,

    /// Top-level functions and statements
    pub body: Block,
}
