//! Lexer (tokenizer) for shader documents
//!
//! Converts include-expanded source text into a flat [`Token`] stream consumed
//! by the parser. Whitespace and both comment forms are dropped. Macro
//! directives become single tokens whose payload is the rest of the directive
//! line, and `Family.Member` spellings of engine enums (see [`crate::engine`])
//! become single [`TokenKind::EnumValue`] tokens.

use super::ast::{Precision, SourceLocation, Span};
use crate::engine::{self, EngineEnumValue, EnumFamily};
use crate::render_state::RenderStateKind;
use std::fmt;
use thiserror::Error;

/// Built-in type keywords of the shading sub-language.
pub const BUILTIN_TYPES: &[&str] = &[
    "bool",
    "int",
    "float",
    "vec2",
    "vec3",
    "vec4",
    "ivec2",
    "ivec3",
    "ivec4",
    "bvec2",
    "bvec3",
    "bvec4",
    "mat2",
    "mat3",
    "mat4",
    "sampler2D",
    "samplerCube",
    "sampler2DArray",
    "sampler2DShadow",
];

/// Lexical category of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals (text kept as written)
    IntLiteral(String),
    FloatLiteral(String),
    StringLiteral(String),

    Ident(String),

    /// `BlendFactor.SrcAlpha` and friends
    EnumValue(EngineEnumValue),

    // Macro directives, payload is the rest of the line
    MacroDefine(String),
    MacroUndef(String),
    MacroIf(String),
    MacroIfdef(String),
    MacroIfndef(String),
    MacroElif(String),
    MacroElse,
    MacroEndif,

    // DSL keywords
    Shader,
    SubShader,
    Pass,
    Tags,
    UsePass,
    VertexShader,
    FragmentShader,
    EditorProperties,
    RenderQueueType,
    BlendState,
    DepthState,
    StencilState,
    RasterState,
    In,
    Out,
    InOut,
    Const,

    // Shading keywords
    Struct,
    If,
    Else,
    For,
    Return,
    Discard,
    Break,
    Continue,
    Void,
    True,
    False,
    Precision(Precision),
    BuiltinType(&'static str),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PlusPlus,
    MinusMinus,
    Dot,
    Question,
    Colon,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,

    Eof,
}

impl TokenKind {
    /// Whether both kinds are the same category, ignoring payloads.
    pub fn same_kind(&self, other: &TokenKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Block kind named by a render-state keyword.
    pub fn render_state_kind(&self) -> Option<RenderStateKind> {
        match self {
            TokenKind::BlendState => Some(RenderStateKind::Blend),
            TokenKind::DepthState => Some(RenderStateKind::Depth),
            TokenKind::StencilState => Some(RenderStateKind::Stencil),
            TokenKind::RasterState => Some(RenderStateKind::Raster),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::IntLiteral(s) => write!(f, "int literal {}", s),
            TokenKind::FloatLiteral(s) => write!(f, "float literal {}", s),
            TokenKind::StringLiteral(s) => write!(f, "string literal \"{}\"", s),
            TokenKind::Ident(s) => write!(f, "identifier '{}'", s),
            TokenKind::EnumValue(v) => write!(f, "'{}'", v),
            TokenKind::MacroDefine(_) => write!(f, "'#define'"),
            TokenKind::MacroUndef(_) => write!(f, "'#undef'"),
            TokenKind::MacroIf(_) => write!(f, "'#if'"),
            TokenKind::MacroIfdef(_) => write!(f, "'#ifdef'"),
            TokenKind::MacroIfndef(_) => write!(f, "'#ifndef'"),
            TokenKind::MacroElif(_) => write!(f, "'#elif'"),
            TokenKind::MacroElse => write!(f, "'#else'"),
            TokenKind::MacroEndif => write!(f, "'#endif'"),
            TokenKind::Shader => write!(f, "'Shader'"),
            TokenKind::SubShader => write!(f, "'SubShader'"),
            TokenKind::Pass => write!(f, "'Pass'"),
            TokenKind::Tags => write!(f, "'Tags'"),
            TokenKind::UsePass => write!(f, "'UsePass'"),
            TokenKind::VertexShader => write!(f, "'VertexShader'"),
            TokenKind::FragmentShader => write!(f, "'FragmentShader'"),
            TokenKind::EditorProperties => write!(f, "'EditorProperties'"),
            TokenKind::RenderQueueType => write!(f, "'RenderQueueType'"),
            TokenKind::BlendState => write!(f, "'BlendState'"),
            TokenKind::DepthState => write!(f, "'DepthState'"),
            TokenKind::StencilState => write!(f, "'StencilState'"),
            TokenKind::RasterState => write!(f, "'RasterState'"),
            TokenKind::In => write!(f, "'in'"),
            TokenKind::Out => write!(f, "'out'"),
            TokenKind::InOut => write!(f, "'inout'"),
            TokenKind::Const => write!(f, "'const'"),
            TokenKind::Struct => write!(f, "'struct'"),
            TokenKind::If => write!(f, "'if'"),
            TokenKind::Else => write!(f, "'else'"),
            TokenKind::For => write!(f, "'for'"),
            TokenKind::Return => write!(f, "'return'"),
            TokenKind::Discard => write!(f, "'discard'"),
            TokenKind::Break => write!(f, "'break'"),
            TokenKind::Continue => write!(f, "'continue'"),
            TokenKind::Void => write!(f, "'void'"),
            TokenKind::True => write!(f, "'true'"),
            TokenKind::False => write!(f, "'false'"),
            TokenKind::Precision(p) => write!(f, "'{}'", p.as_str()),
            TokenKind::BuiltinType(t) => write!(f, "'{}'", t),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Le => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Ge => write!(f, "'>='"),
            TokenKind::AndAnd => write!(f, "'&&'"),
            TokenKind::OrOr => write!(f, "'||'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::PlusEq => write!(f, "'+='"),
            TokenKind::MinusEq => write!(f, "'-='"),
            TokenKind::StarEq => write!(f, "'*='"),
            TokenKind::SlashEq => write!(f, "'/='"),
            TokenKind::PlusPlus => write!(f, "'++'"),
            TokenKind::MinusMinus => write!(f, "'--'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Question => write!(f, "'?'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

/// A classified token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn location(&self) -> SourceLocation {
        self.span.start
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Lexer error at {location}: {message}")]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lexer for shader documents
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            let start = self.current_location();
            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(start, start),
                });
                break;
            }

            let kind = self.next_token()?;
            tokens.push(Token {
                kind,
                span: Span::new(start, self.current_location()),
            });
        }

        Ok(tokens)
    }

    /// Get next token kind
    fn next_token(&mut self) -> Result<TokenKind, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        match ch {
            '"' => self.string_literal(loc),
            '#' => self.directive(loc),
            '0'..='9' => Ok(self.number_literal(ch)),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => Ok(self.number_literal(ch)),
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.identifier_or_keyword(ch)),

            '+' => Ok(match self.peek() {
                Some('+') => self.take(TokenKind::PlusPlus),
                Some('=') => self.take(TokenKind::PlusEq),
                _ => TokenKind::Plus,
            }),
            '-' => Ok(match self.peek() {
                Some('-') => self.take(TokenKind::MinusMinus),
                Some('=') => self.take(TokenKind::MinusEq),
                _ => TokenKind::Minus,
            }),
            '*' => Ok(match self.peek() {
                Some('=') => self.take(TokenKind::StarEq),
                _ => TokenKind::Star,
            }),
            '/' => Ok(match self.peek() {
                Some('=') => self.take(TokenKind::SlashEq),
                _ => TokenKind::Slash,
            }),
            '%' => Ok(TokenKind::Percent),
            '=' => Ok(match self.peek() {
                Some('=') => self.take(TokenKind::EqEq),
                _ => TokenKind::Eq,
            }),
            '!' => Ok(match self.peek() {
                Some('=') => self.take(TokenKind::NotEq),
                _ => TokenKind::Bang,
            }),
            '<' => Ok(match self.peek() {
                Some('=') => self.take(TokenKind::Le),
                _ => TokenKind::Lt,
            }),
            '>' => Ok(match self.peek() {
                Some('=') => self.take(TokenKind::Ge),
                _ => TokenKind::Gt,
            }),
            '&' if self.peek() == Some('&') => Ok(self.take(TokenKind::AndAnd)),
            '|' if self.peek() == Some('|') => Ok(self.take(TokenKind::OrOr)),
            '.' => Ok(TokenKind::Dot),
            '?' => Ok(TokenKind::Question),
            ':' => Ok(TokenKind::Colon),
            '(' => Ok(TokenKind::LParen),
            ')' => Ok(TokenKind::RParen),
            '{' => Ok(TokenKind::LBrace),
            '}' => Ok(TokenKind::RBrace),
            '[' => Ok(TokenKind::LBracket),
            ']' => Ok(TokenKind::RBracket),
            ';' => Ok(TokenKind::Semicolon),
            ',' => Ok(TokenKind::Comma),

            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Consume the second character of a two-character operator.
    fn take(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Parse string literal (opening quote already consumed)
    fn string_literal(&mut self, loc: SourceLocation) -> Result<TokenKind, LexError> {
        let mut string = String::new();

        while let Some(ch) = self.advance() {
            match ch {
                '"' => return Ok(TokenKind::StringLiteral(string)),
                '\\' => {
                    let escaped = self.advance().ok_or_else(|| LexError {
                        message: "Unexpected end of file in string literal".to_string(),
                        location: self.current_location(),
                    })?;
                    string.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
                '\n' => break,
                _ => string.push(ch),
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Numeric literal. Malformed spellings are left for the parser to reject.
    fn number_literal(&mut self, first: char) -> TokenKind {
        let mut text = String::new();
        text.push(first);
        let mut is_float = first == '.';

        if first == '0' && matches!(self.peek(), Some('x' | 'X')) {
            text.push(self.advance().unwrap_or('x'));
            while let Some(ch) = self.peek().filter(|c| c.is_ascii_hexdigit()) {
                text.push(ch);
                self.advance();
            }
            return TokenKind::IntLiteral(text);
        }

        self.push_digits(&mut text);

        if !is_float && self.peek() == Some('.') {
            is_float = true;
            text.push('.');
            self.advance();
            self.push_digits(&mut text);
        }

        // Exponent only when digits actually follow
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = matches!(self.peek_ahead(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_ahead(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    if let Some(ch) = self.advance() {
                        text.push(ch);
                    }
                }
                self.push_digits(&mut text);
            }
        }

        if is_float && matches!(self.peek(), Some('f' | 'F')) {
            self.advance();
        }

        if is_float {
            TokenKind::FloatLiteral(text)
        } else {
            TokenKind::IntLiteral(text)
        }
    }

    fn push_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.peek().filter(|c| c.is_ascii_digit()) {
            text.push(ch);
            self.advance();
        }
    }

    /// Parse identifier, keyword or `Family.Member` enum keyword
    fn identifier_or_keyword(&mut self, first_char: char) -> TokenKind {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Longest match: the family name only swallows `.Member` when the
        // member exists, otherwise it falls back to a plain word
        if let Some(family) = EnumFamily::from_name(&ident) {
            if self.peek() == Some('.') {
                let member = self.word_at(self.position + 1);
                if let Some(value) = engine::lookup(family, &member) {
                    for _ in 0..=member.chars().count() {
                        self.advance();
                    }
                    return TokenKind::EnumValue(value);
                }
            }
        }

        match ident.as_str() {
            "Shader" => TokenKind::Shader,
            "SubShader" => TokenKind::SubShader,
            "Pass" => TokenKind::Pass,
            "Tags" => TokenKind::Tags,
            "UsePass" => TokenKind::UsePass,
            "VertexShader" => TokenKind::VertexShader,
            "FragmentShader" => TokenKind::FragmentShader,
            "EditorProperties" => TokenKind::EditorProperties,
            "RenderQueueType" => TokenKind::RenderQueueType,
            "BlendState" => TokenKind::BlendState,
            "DepthState" => TokenKind::DepthState,
            "StencilState" => TokenKind::StencilState,
            "RasterState" => TokenKind::RasterState,
            "in" => TokenKind::In,
            "out" => TokenKind::Out,
            "inout" => TokenKind::InOut,
            "const" => TokenKind::Const,
            "struct" => TokenKind::Struct,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "return" => TokenKind::Return,
            "discard" => TokenKind::Discard,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "void" => TokenKind::Void,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "lowp" => TokenKind::Precision(Precision::Low),
            "mediump" => TokenKind::Precision(Precision::Medium),
            "highp" => TokenKind::Precision(Precision::High),
            other => match BUILTIN_TYPES.iter().find(|t| **t == other) {
                Some(&builtin) => TokenKind::BuiltinType(builtin),
                None => TokenKind::Ident(other.to_string()),
            },
        }
    }

    /// Identifier characters starting at `pos`, without consuming.
    fn word_at(&self, pos: usize) -> String {
        self.input
            .iter()
            .skip(pos)
            .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
            .collect()
    }

    /// Macro directive; `#` already consumed. The payload is the rest of the
    /// line with `\` continuations joined.
    fn directive(&mut self, loc: SourceLocation) -> Result<TokenKind, LexError> {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.advance();
        }
        let name = self.word_at(self.position);
        for _ in 0..name.chars().count() {
            self.advance();
        }

        let mut rest = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\\' && matches!(self.peek_ahead(1), Some('\n')) {
                self.advance();
                self.advance();
                rest.push(' ');
                continue;
            }
            if ch == '\n' {
                break;
            }
            if ch == '/' && matches!(self.peek_ahead(1), Some('/')) {
                self.skip_line_comment();
                break;
            }
            rest.push(ch);
            self.advance();
        }
        let rest = rest.trim().to_string();

        match name.as_str() {
            "define" => Ok(TokenKind::MacroDefine(rest)),
            "undef" => Ok(TokenKind::MacroUndef(rest)),
            "if" => Ok(TokenKind::MacroIf(rest)),
            "ifdef" => Ok(TokenKind::MacroIfdef(rest)),
            "ifndef" => Ok(TokenKind::MacroIfndef(rest)),
            "elif" => Ok(TokenKind::MacroElif(rest)),
            "else" => Ok(TokenKind::MacroElse),
            "endif" => Ok(TokenKind::MacroEndif),
            "include" => Err(LexError {
                message: format!("Unexpanded #include {}", rest),
                location: loc,
            }),
            other => Err(LexError {
                message: format!("Unsupported directive: #{}", other),
                location: loc,
            }),
        }
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...), leaving the newline in place
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Tokenize `source` in one call.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BlendFactor, CullMode};

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_block_keywords() {
        let tokens = kinds("Shader \"s\" { SubShader \"d\" { Pass \"p\" { } } }");
        assert_eq!(tokens[0], TokenKind::Shader);
        assert_eq!(tokens[1], TokenKind::StringLiteral("s".into()));
        assert_eq!(tokens[2], TokenKind::LBrace);
        assert_eq!(tokens[3], TokenKind::SubShader);
        assert_eq!(tokens[6], TokenKind::Pass);
        assert_eq!(*tokens.last().unwrap(), TokenKind::Eof);
    }

    #[test]
    fn test_enum_keywords_longest_match() {
        let tokens = kinds("SrcColorBlendFactor = BlendFactor.SrcAlpha; CullMode = CullMode.Back;");
        assert_eq!(tokens[0], TokenKind::Ident("SrcColorBlendFactor".into()));
        assert_eq!(
            tokens[2],
            TokenKind::EnumValue(BlendFactor::SrcAlpha.into())
        );
        // property name shares the family name but is not followed by a member
        assert_eq!(tokens[4], TokenKind::Ident("CullMode".into()));
        assert_eq!(tokens[6], TokenKind::EnumValue(CullMode::Back.into()));
    }

    #[test]
    fn test_unknown_enum_member_falls_back() {
        let tokens = kinds("BlendFactor.Bogus");
        assert_eq!(tokens[0], TokenKind::Ident("BlendFactor".into()));
        assert_eq!(tokens[1], TokenKind::Dot);
        assert_eq!(tokens[2], TokenKind::Ident("Bogus".into()));
    }

    #[test]
    fn test_render_queue_keyword() {
        let tokens = kinds("RenderQueueType = RenderQueueType.Transparent;");
        assert_eq!(tokens[0], TokenKind::RenderQueueType);
        assert!(matches!(tokens[2], TokenKind::EnumValue(_)));
    }

    #[test]
    fn test_number_literals() {
        let tokens = kinds("1 1.0 .5 2. 1e3 1.5e-3 3.0f 0xFF 4e");
        assert_eq!(tokens[0], TokenKind::IntLiteral("1".into()));
        assert_eq!(tokens[1], TokenKind::FloatLiteral("1.0".into()));
        assert_eq!(tokens[2], TokenKind::FloatLiteral(".5".into()));
        assert_eq!(tokens[3], TokenKind::FloatLiteral("2.".into()));
        assert_eq!(tokens[4], TokenKind::FloatLiteral("1e3".into()));
        assert_eq!(tokens[5], TokenKind::FloatLiteral("1.5e-3".into()));
        assert_eq!(tokens[6], TokenKind::FloatLiteral("3.0".into()));
        assert_eq!(tokens[7], TokenKind::IntLiteral("0xFF".into()));
        // malformed exponent is not diagnosed here
        assert_eq!(tokens[8], TokenKind::IntLiteral("4".into()));
        assert_eq!(tokens[9], TokenKind::Ident("e".into()));
    }

    #[test]
    fn test_directives_capture_rest_of_line() {
        let tokens = kinds("#define SCALE 2.0 // comment\n#ifdef FOO\n#else\n#endif\n");
        assert_eq!(tokens[0], TokenKind::MacroDefine("SCALE 2.0".into()));
        assert_eq!(tokens[1], TokenKind::MacroIfdef("FOO".into()));
        assert_eq!(tokens[2], TokenKind::MacroElse);
        assert_eq!(tokens[3], TokenKind::MacroEndif);
    }

    #[test]
    fn test_define_line_continuation() {
        let tokens = kinds("#define SUM(a, b) \\\n (a + b)\nx");
        assert_eq!(tokens[0], TokenKind::MacroDefine("SUM(a, b)   (a + b)".into()));
        assert_eq!(tokens[1], TokenKind::Ident("x".into()));
    }

    #[test]
    fn test_unexpanded_include_is_error() {
        let err = tokenize("#include \"common.glsl\"\n").unwrap_err();
        assert!(err.message.contains("#include"));
        assert_eq!(err.location, SourceLocation::new(1, 1));
    }

    #[test]
    fn test_comments_and_spans() {
        let tokens = tokenize("vec4 /* c */ x; // tail\n  y").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::BuiltinType("vec4"));
        assert_eq!(tokens[1].kind, TokenKind::Ident("x".into()));
        assert_eq!(tokens[1].span.start, SourceLocation::new(1, 14));
        assert_eq!(tokens[1].span.end, SourceLocation::new(1, 15));
        assert_eq!(tokens[3].span.start, SourceLocation::new(2, 3));
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert!(tokenize("x /* never closed").is_err());
    }
}
