use crate::ast::Block;

/// Script-authored function.
///
/// Calling it binds the parameters positionally in a fresh call namespace that
/// also holds a slot named after the function. The body stores its result in
/// that slot:
///
/// ```text
/// function area(w, h) { area = w * h }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Function name
    pub name: String,

    /// Parameter names; a blank name skips that argument position
    pub params: Vec<String>,

    /// Function body (pre-parsed AST)
    pub body: Block,
}
