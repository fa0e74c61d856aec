use std::{fmt, mem, sync::Arc};

use rust_decimal::Decimal;

use crate::{
    ast::{BinOp, Block, Builtin, Expr, FunctionDef, Program, Statement, Token, VarRef},
    config::Config,
    lexer::{LexError, Lexer, Position, Spanned},
    value::Value,
};

/// Category of a syntax error. Each kind has a stable numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input ended in the middle of a statement
    IncompleteStatement,
    /// Unexpected token
    Syntax,
    /// Missing `)`
    MissingParenthesis,
    /// Missing `}`
    MissingBrace,
    /// Missing `]`
    MissingBracket,
    /// String literal without closing quote
    MissingQuotation,
    /// Character that is not part of the language
    IllegalSymbol,
    /// Malformed variable name
    IllegalVariableName,
    /// Missing `,` between call arguments
    MissingComma,
    /// Malformed or misplaced `function` declaration
    FunctionDeclaration,
    /// Assignment to a constant such as `true` or `5`
    ConstAssignment,
}

impl ParseErrorKind {
    pub fn code(&self) -> u32 {
        match self {
            ParseErrorKind::IncompleteStatement => 1,
            ParseErrorKind::Syntax => 2,
            ParseErrorKind::MissingParenthesis => 3,
            ParseErrorKind::MissingBrace => 4,
            ParseErrorKind::MissingBracket => 5,
            ParseErrorKind::MissingQuotation => 6,
            ParseErrorKind::IllegalSymbol => 7,
            ParseErrorKind::IllegalVariableName => 8,
            ParseErrorKind::MissingComma => 9,
            ParseErrorKind::FunctionDeclaration => 10,
            ParseErrorKind::ConstAssignment => 11,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ParseErrorKind::IncompleteStatement => "incomplete statement",
            ParseErrorKind::Syntax => "syntax error",
            ParseErrorKind::MissingParenthesis => "missing ')'",
            ParseErrorKind::MissingBrace => "missing '}'",
            ParseErrorKind::MissingBracket => "missing ']'",
            ParseErrorKind::MissingQuotation => "missing quotation mark",
            ParseErrorKind::IllegalSymbol => "illegal symbol",
            ParseErrorKind::IllegalVariableName => "illegal variable name",
            ParseErrorKind::MissingComma => "missing ','",
            ParseErrorKind::FunctionDeclaration => "invalid function declaration",
            ParseErrorKind::ConstAssignment => "assignment to a constant",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A syntax error with the line and character position where it was found.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("syntax error E{} ({}) at line {}, position {}{}", .kind.code(), .kind, .line, .position, detail_suffix(.detail))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub position: usize,
    /// What was found instead, when known
    pub detail: Option<String>,
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, at: Position) -> Self {
        ParseError {
            kind,
            line: at.line,
            position: at.column,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn code(&self) -> u32 {
        self.kind.code()
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        let kind = match &err {
            LexError::UnterminatedString(_) => ParseErrorKind::MissingQuotation,
            LexError::IllegalSymbol(..) => ParseErrorKind::IllegalSymbol,
            LexError::IllegalVariableName(..) => ParseErrorKind::IllegalVariableName,
            LexError::MalformedNumber(..) => ParseErrorKind::Syntax,
        };
        let detail = match &err {
            LexError::UnterminatedString(_) => None,
            LexError::IllegalSymbol(c, _) => Some(format!("{:?}", c)),
            LexError::IllegalVariableName(name, _) | LexError::MalformedNumber(name, _) => {
                Some(name.clone())
            }
        };
        let mut parsed = ParseError::new(kind, err.position());
        parsed.detail = detail;
        parsed
    }
}

/// Parses a complete script, substituting `config.default_expression` for
/// empty or whitespace-only input.
///
/// # Examples
///
/// ```
/// use tally_lang::{Config, parser::parse_program};
///
/// let program = parse_program("x = 1; y = x + 2", &Config::default()).unwrap();
/// assert_eq!(program.body.statements.len(), 2);
///
/// let empty = parse_program("   ", &Config::default()).unwrap();
/// assert_eq!(empty.source, "null");
/// ```
pub fn parse_program(source: &str, config: &Config) -> Result<Program, ParseError> {
    let source = if source.trim().is_empty() {
        config.default_expression.as_str()
    } else {
        source
    };
    let mut parser = Parser::new(Lexer::new(source))?.with_case_sensitive(config.case_sensitive);
    let body = parser.parse_block_contents(true, &Token::Eof)?;
    parser.expect(Token::Eof, ParseErrorKind::Syntax)?;
    tracing::debug!(
        statements = body.statements.len(),
        functions = body.functions.len(),
        "parsed program"
    );
    Ok(Program {
        source: source.to_string(),
        body,
    })
}

pub struct Parser {
    lexer: Lexer,
    current: Spanned,
    peeked: Option<Spanned>,
    case_sensitive: bool,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            peeked: None,
            case_sensitive: true,
        })
    }

    /// Matches built-in function names regardless of case when `false`.
    /// Keywords and the `PI`/`E` constants stay case sensitive.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    fn builtin_named(&self, name: &str) -> Option<Builtin> {
        if self.case_sensitive {
            Builtin::from_name(name)
        } else {
            Builtin::from_name(&name.to_lowercase())
        }
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = match self.peeked.take() {
            Some(next) => next,
            None => self.lexer.next_token()?,
        };
        Ok(())
    }

    fn peek(&mut self) -> Result<&Spanned, ParseError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token()?);
        }
        match &self.peeked {
            Some(next) => Ok(next),
            None => Err(self.error(ParseErrorKind::Syntax)),
        }
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    /// Error at the current token. Running out of input is always reported as
    /// an incomplete statement unless a more specific kind applies.
    fn error(&self, kind: ParseErrorKind) -> ParseError {
        let kind = match (&self.current.token, kind) {
            (Token::Eof, ParseErrorKind::Syntax) => ParseErrorKind::IncompleteStatement,
            (_, kind) => kind,
        };
        ParseError::new(kind, self.current.start).with_detail(format!(
            "found {}",
            self.current.token.describe()
        ))
    }

    fn expect(&mut self, expected: Token, kind: ParseErrorKind) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.error(kind));
        }
        self.advance()
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Parses statements up to (not including) `terminator`.
    fn parse_block_contents(
        &mut self,
        allow_functions: bool,
        terminator: &Token,
    ) -> Result<Block, ParseError> {
        let mut block = Block::default();

        loop {
            while self.check(&Token::Semicolon) {
                self.advance()?;
            }
            if self.check(terminator) || self.check(&Token::Eof) {
                return Ok(block);
            }

            if self.check(&Token::Function) {
                if !allow_functions {
                    return Err(self.error(ParseErrorKind::FunctionDeclaration));
                }
                block.functions.push(Arc::new(self.parse_function()?));
                continue;
            }

            let statement = self.parse_statement()?;
            let braced = !matches!(statement, Statement::Expression(_));
            block.statements.push(statement);

            if !(braced
                || self.check(&Token::Semicolon)
                || self.check(terminator)
                || self.check(&Token::Eof))
            {
                return Err(self.error(ParseErrorKind::Syntax));
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match &self.current.token {
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            _ => Ok(Statement::Expression(self.parse_expression()?)),
        }
    }

    fn parse_condition(&mut self) -> Result<Expr, ParseError> {
        self.expect(Token::LParen, ParseErrorKind::Syntax)?;
        let condition = self.parse_expression()?;
        self.expect(Token::RParen, ParseErrorKind::MissingParenthesis)?;
        Ok(condition)
    }

    /// `{ statements }` without function declarations.
    fn parse_braced(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.expect(Token::LBrace, ParseErrorKind::Syntax)?;
        let block = self.parse_block_contents(false, &Token::RBrace)?;
        self.expect(Token::RBrace, ParseErrorKind::MissingBrace)?;
        Ok(block.statements)
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // consume 'if'
        let condition = self.parse_condition()?;
        let then_branch = self.parse_braced()?;

        let else_branch = if self.check(&Token::Else) {
            self.advance()?;
            if self.check(&Token::If) {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_braced()?)
            }
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // consume 'while'
        let condition = self.parse_condition()?;
        let body = self.parse_braced()?;
        Ok(Statement::While { condition, body })
    }

    /// `function name(a, b) { body }`
    fn parse_function(&mut self) -> Result<FunctionDef, ParseError> {
        self.advance()?; // consume 'function'

        let name = match mem::replace(&mut self.current.token, Token::Eof) {
            Token::Identifier(name) => name,
            other => {
                self.current.token = other;
                return Err(self.error(ParseErrorKind::FunctionDeclaration));
            }
        };
        self.advance()?;

        self.expect(Token::LParen, ParseErrorKind::FunctionDeclaration)?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                match mem::replace(&mut self.current.token, Token::Eof) {
                    Token::Identifier(param) => params.push(param),
                    other => {
                        self.current.token = other;
                        return Err(self.error(ParseErrorKind::FunctionDeclaration));
                    }
                }
                self.advance()?;
                if self.check(&Token::Comma) {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, ParseErrorKind::FunctionDeclaration)?;

        self.expect(Token::LBrace, ParseErrorKind::FunctionDeclaration)?;
        let body = self.parse_block_contents(true, &Token::RBrace)?;
        self.expect(Token::RBrace, ParseErrorKind::MissingBrace)?;

        Ok(FunctionDef { name, params, body })
    }

    // ------------------------------------------------------------------
    // Expressions, loosest tier first
    // ------------------------------------------------------------------

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    /// Parses a single expression and requires the input to end after it.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(Token::Eof, ParseErrorKind::Syntax)?;
        Ok(expr)
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.start;
        let left = self.parse_logical()?;

        if !self.check(&Token::Assign) {
            return Ok(left);
        }

        let target = match left {
            Expr::Variable(var) => var,
            Expr::Literal(_) => return Err(ParseError::new(ParseErrorKind::ConstAssignment, start)),
            other => {
                return Err(ParseError::new(ParseErrorKind::Syntax, start)
                    .with_detail(format!("cannot assign to {}", other)));
            }
        };
        self.advance()?; // consume '='
        let value = self.parse_assignment()?; // Right-associative

        Ok(Expr::Assign {
            target,
            value: Box::new(value),
        })
    }

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn parse_logical(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match &self.current.token {
                Token::OrOr => BinOp::Or,
                Token::AndAnd => BinOp::And,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current.token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_power()?;

        loop {
            let op = match &self.current.token {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_power()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;

        while self.check(&Token::Caret) || self.check(&Token::Dollar) {
            self.advance()?;
            let right = self.parse_comparison()?;
            left = Self::binary(BinOp::Power, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitwise()?;

        loop {
            let op = match &self.current.token {
                Token::EqEq => BinOp::Equal,
                Token::NotEq => BinOp::NotEqual,
                Token::Lt => BinOp::LessThan,
                Token::Gt => BinOp::GreaterThan,
                Token::LtEq => BinOp::LessEqual,
                Token::GtEq => BinOp::GreaterEqual,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_bitwise()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_bitwise(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current.token {
                Token::Amp => BinOp::BitAnd,
                Token::Pipe => BinOp::BitOr,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::Bang) {
            self.advance()?;
            let operand = self.parse_unary()?; // Right-associative
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_postfix()
    }

    /// Atom with an optional `?fallback` suffix.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let primary = self.parse_primary()?;

        if self.check(&Token::Question) {
            self.advance()?;
            let fallback = self.parse_postfix()?;
            return Ok(Expr::Substitute {
                primary: Box::new(primary),
                fallback: Box::new(fallback),
            });
        }
        Ok(primary)
    }

    /// Parse primary expressions (atoms)
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.start;

        match mem::replace(&mut self.current.token, Token::Eof) {
            // Literals
            Token::Number(n) => {
                self.advance()?;
                Ok(Expr::Literal(Value::Numeric(n)))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expr::Literal(Value::String(s)))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(Expr::Literal(Value::Boolean(b)))
            }
            Token::Null => {
                self.advance()?;
                Ok(Expr::Literal(Value::Null))
            }

            // Negative literal: '-' must touch the digits
            Token::Minus => {
                self.current.token = Token::Minus;
                let minus_end = self.current.end;
                let touching = {
                    let next = self.peek()?;
                    matches!(next.token, Token::Number(_)) && next.start.offset == minus_end
                };
                if !touching {
                    return Err(ParseError::new(ParseErrorKind::IllegalSymbol, start)
                        .with_detail("'-' must be immediately followed by a digit"));
                }
                self.advance()?;
                match mem::replace(&mut self.current.token, Token::Eof) {
                    Token::Number(n) => {
                        self.advance()?;
                        Ok(Expr::Literal(Value::Numeric(-n)))
                    }
                    other => {
                        self.current.token = other;
                        Err(self.error(ParseErrorKind::Syntax))
                    }
                }
            }

            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen, ParseErrorKind::MissingParenthesis)?;
                Ok(expr)
            }

            Token::Var => {
                self.advance()?;
                match mem::replace(&mut self.current.token, Token::Eof) {
                    Token::Identifier(name) => {
                        self.advance()?;
                        let mut var = self.parse_var_ref(name)?;
                        var.local = true;
                        Ok(Expr::Variable(var))
                    }
                    other => {
                        self.current.token = other;
                        Err(self.error(ParseErrorKind::IllegalVariableName))
                    }
                }
            }

            Token::Identifier(name) => {
                if let Some(constant) = named_constant(&name) {
                    self.advance()?;
                    return Ok(Expr::Literal(constant));
                }
                self.advance()?;

                if self.check(&Token::LParen) {
                    self.advance()?;
                    let args = self.parse_arguments()?;
                    return Ok(match self.builtin_named(&name) {
                        Some(function) => Expr::Builtin { function, args },
                        None => Expr::Call { name, args },
                    });
                }

                Ok(Expr::Variable(self.parse_var_ref(name)?))
            }

            Token::Eof => Err(ParseError::new(ParseErrorKind::IncompleteStatement, start)),

            token => {
                let kind = match token {
                    Token::If | Token::Else | Token::While | Token::Function => {
                        ParseErrorKind::IllegalVariableName
                    }
                    _ => ParseErrorKind::Syntax,
                };
                Err(ParseError::new(kind, start).with_detail(format!("found {}", token.describe())))
            }
        }
    }

    /// Optional `[index]` after a variable name.
    fn parse_var_ref(&mut self, name: String) -> Result<VarRef, ParseError> {
        let mut var = VarRef::new(name);
        if self.check(&Token::LBracket) {
            self.advance()?;
            let index = self.parse_expression()?;
            self.expect(Token::RBracket, ParseErrorKind::MissingBracket)?;
            var.index = Some(Box::new(index));
        }
        Ok(var)
    }

    /// Comma separated arguments after `(`, consuming the closing `)`.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();

        if self.check(&Token::RParen) {
            self.advance()?;
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);

            match &self.current.token {
                Token::Comma => self.advance()?,
                Token::RParen => {
                    self.advance()?;
                    return Ok(args);
                }
                Token::Eof | Token::Semicolon | Token::RBrace => {
                    return Err(self.error(ParseErrorKind::MissingParenthesis));
                }
                _ => return Err(self.error(ParseErrorKind::MissingComma)),
            }
        }
    }
}

fn named_constant(name: &str) -> Option<Value> {
    match name {
        "PI" => Some(Value::Numeric(Decimal::PI)),
        "E" => Some(Value::Numeric(Decimal::E)),
        _ => None,
    }
}
