//! Lexer (tokenizer) for the netlist language.

use crate::error::{DesignError, Result};

/// One lexeme with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, text: String, line: usize, column: usize) -> Self {
        Self { kind, text, line, column }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Component, node or keyword name.
    Identifier,
    /// Numeric literal as written, SI suffix included.
    Number,
    /// `.input`, `.output`, `.node`
    Directive,
    Equals,
    /// Lines are significant: a component ends at one.
    Newline,
    Eof,
}

/// SI multipliers accepted as a one-letter suffix on values.
const SI_PREFIXES: [(char, f64); 9] = [
    ('p', 1e-12),
    ('n', 1e-9),
    ('u', 1e-6),
    ('µ', 1e-6),
    ('m', 1e-3),
    ('k', 1e3),
    ('K', 1e3),
    ('M', 1e6),
    ('G', 1e9),
];

fn si_multiplier(suffix: char) -> Option<f64> {
    SI_PREFIXES.iter().find(|&&(c, _)| c == suffix).map(|&(_, m)| m)
}

/// Lexer for tokenizing netlist input.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Produce the next token, `Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia();

        let line = self.line;
        let column = self.column;
        let Some(ch) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, String::new(), line, column));
        };

        let (kind, text) = match ch {
            '\n' | '=' => {
                self.bump();
                let kind = if ch == '=' { TokenKind::Equals } else { TokenKind::Newline };
                (kind, ch.to_string())
            }
            '.' => {
                self.bump();
                (TokenKind::Directive, format!(".{}", self.read_word()))
            }
            '-' | '+' | '0'..='9' => (TokenKind::Number, self.read_number()),
            _ if ch.is_alphabetic() || ch == '_' => (TokenKind::Identifier, self.read_word()),
            _ => return Err(DesignError::lexer(line, column, format!("unexpected character '{}'", ch))),
        };

        Ok(Token::new(kind, text, line, column))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        match ch {
            '\n' => (self.line, self.column) = (self.line + 1, 1),
            _ => self.column += 1,
        }
        Some(ch)
    }

    /// Append the next character to `text` if it satisfies `accept`.
    fn eat_one(&mut self, text: &mut String, accept: impl Fn(char) -> bool) -> bool {
        match self.peek() {
            Some(ch) if accept(ch) => {
                text.push(ch);
                self.bump();
                true
            }
            _ => false,
        }
    }

    fn eat_while(&mut self, text: &mut String, accept: impl Fn(char) -> bool) {
        while self.eat_one(text, &accept) {}
    }

    /// Blanks and `#`/`;` comments; newlines are tokens and stay.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('#' | ';') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut text = String::new();
        self.eat_while(&mut text, |c| c.is_alphanumeric() || c == '_');
        text
    }

    /// `[sign] digits [. digits] [e [sign] digits] [SI suffix]`
    fn read_number(&mut self) -> String {
        let is_sign = |c: char| c == '-' || c == '+';
        let is_digit = |c: char| c.is_ascii_digit();

        let mut text = String::new();
        self.eat_one(&mut text, is_sign);
        self.eat_while(&mut text, is_digit);
        if self.eat_one(&mut text, |c| c == '.') {
            self.eat_while(&mut text, is_digit);
        }
        if self.eat_one(&mut text, |c| c == 'e' || c == 'E') {
            self.eat_one(&mut text, is_sign);
            self.eat_while(&mut text, is_digit);
        }
        self.eat_one(&mut text, |c| si_multiplier(c).is_some());
        text
    }
}

/// Convert a literal such as `4.7n` or `1e3` to its value.
pub fn parse_value(literal: &str) -> Option<f64> {
    let text = literal.trim();
    let scaled = text.chars().last().and_then(|c| si_multiplier(c).map(|m| (c, m)));
    let (digits, multiplier) = match scaled {
        Some((suffix, m)) => (&text[..text.len() - suffix.len_utf8()], m),
        None => (text, 1.0),
    };
    digits.parse::<f64>().ok().map(|v| v * multiplier)
}
