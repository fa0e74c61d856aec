use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Unsigned numeric literal
    ///
    /// A leading `-` is a separate token; the parser folds it into the
    /// literal when the two are adjacent.
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// ```
    Number(Decimal),

    /// String literal enclosed in double quotes, escapes already resolved
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// "say \"hi\"\n"
    /// ```
    String(String),

    /// `true` or `false`
    Boolean(bool),

    /// `null` or `NULL`
    Null,

    // Identifiers and keywords
    /// Variable or function name
    ///
    /// Starts with a letter or underscore, followed by letters, digits,
    /// underscores or dots.
    ///
    /// # Examples
    /// ```text
    /// total
    /// customer.address.zip
    /// _tmp1
    /// ```
    Identifier(String),

    /// `var`, declares a local variable
    Var,

    /// `if`
    If,

    /// `else`
    Else,

    /// `while`
    While,

    /// `function`
    Function,

    // Operators
    /// Assignment (`=`)
    Assign,

    /// Addition, concatenation or array append (`+`)
    Plus,

    /// Subtraction or array removal (`-`)
    Minus,

    /// Multiplication
    Star,

    /// Division
    Slash,

    /// Power (`^`)
    Caret,

    /// Alternate power spelling (`$`)
    Dollar,

    /// Equality operator
    EqEq,

    /// Inequality operator
    NotEq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    /// Logical AND (`&&`), short-circuit
    AndAnd,

    /// Logical OR (`||`), short-circuit
    OrOr,

    /// Bitwise AND (`&`)
    Amp,

    /// Bitwise OR (`|`)
    Pipe,

    /// Logical not (`!`)
    Bang,

    /// Null substitution (`?`)
    ///
    /// # Examples
    /// ```text
    /// discount?0
    /// ```
    Question,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,

    /// Statement separator
    Semicolon,

    /// End of input
    Eof,
}

impl Token {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.normalize().to_string(),
            Token::String(s) => format!("\"{}\"", s),
            Token::Boolean(b) => b.to_string(),
            Token::Null => "null".to_string(),
            Token::Identifier(name) => name.clone(),
            Token::Var => "var".to_string(),
            Token::If => "if".to_string(),
            Token::Else => "else".to_string(),
            Token::While => "while".to_string(),
            Token::Function => "function".to_string(),
            Token::Eof => "end of input".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::Assign => "=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Caret => "^",
            Token::Dollar => "$",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Bang => "!",
            Token::Question => "?",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Semicolon => ";",
            _ => "",
        }
    }
}
