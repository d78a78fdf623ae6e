//! Module `scanner` implements a one‑pass, streaming Unicode lexer for Phortugol.
//!
//! It transforms a `&str` into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input text.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, PhortError>` on each `.next()`, where `Ok(token)` is a
//!   scanned token and `Err` reports a lexing error with line information. A bad
//!   character or an unterminated string yields one `Err` and scanning resumes
//!   right after it.
//!
//! - `scan_tokens(src, &mut Diagnostics) -> Vec<Token>`
//!   Drains a scanner, routing every lexical error into the diagnostics sink.
//!   Never fails.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `[`, `]`, `,`, `.`, `;`, `*`,
//!   `%`, `?`, `:`.
//! - One‑or‑two character operators: `+ ++`, `- --`, `! !=`, `= == =>`,
//!   `< <=`, `> >=`, `&&`, `||`.
//! - String literals: `"…"` or `'…'`, multi‑line allowed.
//! - Numeric literals: ASCII digits with an optional fractional part.
//! - Identifiers/keywords: runs of Unicode letters and digits, resolved via a
//!   perfect‑hash `KEYWORDS` map (keywords may be accented, e.g. `função`).
//! - Comments: `//` to end of line, skipped in bulk with `memchr`.

use crate::error::{Diagnostics, PhortError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "E"          => TokenType::AND,
    "OU"         => TokenType::OR,
    "classe"     => TokenType::CLASS,
    "senao"      => TokenType::ELSE,
    "senão"      => TokenType::ELSE,
    "falso"      => TokenType::FALSE,
    "funcao"     => TokenType::FUNCTION,
    "função"     => TokenType::FUNCTION,
    "repita"     => TokenType::FOR,
    "se"         => TokenType::IF,
    "nulo"       => TokenType::NULL,
    "indefinido" => TokenType::UNDEFINED,
    "escreva"    => TokenType::PRINT,
    "retorne"    => TokenType::RETURN,
    "pare"       => TokenType::BREAK,
    "continue"   => TokenType::CONTINUE,
    "meu"        => TokenType::THIS,
    "this"       => TokenType::THIS,
    "verdadeiro" => TokenType::TRUE,
    "var"        => TokenType::VAR,
    "enquanto"   => TokenType::WHILE,
    "NL"         => TokenType::NL,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    src: &'a str,               // entire source text
    start: usize,               // byte index of the *first* char of the current lexeme
    curr: usize,                // byte index *one past* the last char examined
    line: usize,                // 1‑based line counter (\n increments)
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one char and return it.  Returns `'\0'` at EOF; callers guard
    /// with [`is_at_end`](Self::is_at_end) anyway.
    #[inline(always)]
    fn advance(&mut self) -> char {
        match self.src[self.curr..].chars().next() {
            Some(c) => {
                self.curr += c.len_utf8();
                c
            }
            None => '\0',
        }
    }

    /// Peek at the current char without consuming it.  `'\0'` past EOF.
    #[inline(always)]
    fn peek(&self) -> char {
        self.src[self.curr..].chars().next().unwrap_or('\0')
    }

    /// Peek one char beyond [`peek`](Self::peek).  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> char {
        self.src[self.curr..].chars().nth(1).unwrap_or('\0')
    }

    /// Conditionally consume a char **iff** it matches `expected`.
    #[inline(always)]
    fn match_char(&mut self, expected: char) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn pick(&mut self, expected: char, matched: TokenType, otherwise: TokenType) {
        let tt = if self.match_char(expected) {
            matched
        } else {
            otherwise
        };

        self.pending = Some(tt);
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`.  If the lexeme produces an
    /// actual token the kind is stored in `self.pending`.  Whitespace and
    /// comments are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            // ── single‑character punctuators ──────────────────────────────
            '(' => self.pending = Some(TokenType::LEFT_PAREN),
            ')' => self.pending = Some(TokenType::RIGHT_PAREN),
            '{' => self.pending = Some(TokenType::LEFT_BRACE),
            '}' => self.pending = Some(TokenType::RIGHT_BRACE),
            '[' => self.pending = Some(TokenType::LEFT_BRACKET),
            ']' => self.pending = Some(TokenType::RIGHT_BRACKET),
            ',' => self.pending = Some(TokenType::COMMA),
            '.' => self.pending = Some(TokenType::DOT),
            ';' => self.pending = Some(TokenType::SEMICOLON),
            '*' => self.pending = Some(TokenType::STAR),
            '%' => self.pending = Some(TokenType::PERCENT),
            '?' => self.pending = Some(TokenType::QUESTION),
            ':' => self.pending = Some(TokenType::COLON),

            // ── one or two character operators ────────────────────────────
            '+' => self.pick('+', TokenType::PLUS_PLUS, TokenType::PLUS),
            '-' => self.pick('-', TokenType::MINUS_MINUS, TokenType::MINUS),
            '!' => self.pick('=', TokenType::BANG_EQUAL, TokenType::BANG),
            '<' => self.pick('=', TokenType::LESS_EQUAL, TokenType::LESS),
            '>' => self.pick('=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            '=' => {
                let tt = if self.match_char('=') {
                    TokenType::EQUAL_EQUAL
                } else if self.match_char('>') {
                    TokenType::ARROW
                } else {
                    TokenType::EQUAL
                };

                self.pending = Some(tt);
            }

            '&' if self.match_char('&') => self.pending = Some(TokenType::AND),
            '|' if self.match_char('|') => self.pending = Some(TokenType::OR),

            // ── whitespace / newline ─────────────────────────────────────
            ' ' | '\r' | '\t' => {
                return Ok(());
            }

            '\n' => {
                self.line += 1;

                return Ok(());
            }

            // ── comments (// … until newline) ────────────────────────────
            '/' => {
                if self.match_char('/') {
                    // Fast‑forward to the next newline; the newline itself is
                    // left for the main loop so the line counter stays right.
                    if let Some(pos) = memchr(b'\n', &self.src.as_bytes()[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.len();
                    }

                    return Ok(());
                }

                self.pending = Some(TokenType::SLASH);
            }

            // ── string literals, either quote style ──────────────────────
            '"' | '\'' => {
                return self.parse_string(c);
            }

            c if c.is_ascii_digit() => {
                self.parse_number();
            }

            c if c.is_alphabetic() => {
                self.parse_identifier();
            }

            // ── unexpected character ─────────────────────────────────────
            _ => {
                return Err(PhortError::lex(
                    self.line,
                    format!("Unexpected character: {}", c),
                ));
            }
        }

        Ok(())
    }

    /// Parse a string literal closed by `delimiter`.
    ///
    /// * `self.start` still points to the opening quote.
    /// * When we return, `self.curr` points **past** the closing quote.
    fn parse_string(&mut self, delimiter: char) -> Result<()> {
        while !self.is_at_end() && self.peek() != delimiter {
            if self.advance() == '\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(PhortError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // consume closing quote

        // Both delimiters are one byte wide.
        let s: &str = &self.src[self.start + 1..self.curr - 1];

        self.pending = Some(TokenType::STRING(s.to_owned()));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`).  A trailing `.` without a
    /// digit after it is left for the next token.
    fn parse_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let s: &str = &self.src[self.start..self.curr];
        let n: f64 = s.parse::<f64>().unwrap_or(0.0); // digits only, cannot fail
        self.pending = Some(TokenType::NUMBER(n));
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while self.peek().is_alphanumeric() {
            self.advance();
        }

        let word: &str = &self.src[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(word)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(tt);
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        // Loop until we either emit a token, hit EOF, or see an error.
        while self.curr <= self.len() {
            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1; // ensure fused semantics
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            // 2. Reset per‑token state.
            self.start = self.curr;
            self.pending = None;

            // 3. Attempt to scan a token.
            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            // 4. If a real token was recognised, build and return it.
            if let Some(tt) = self.pending.take() {
                let lex: &str = &self.src[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                return Some(Ok(Token::new(tt, lex, self.line)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None // already yielded EOF
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan `source` to completion.  Lexical errors go to `diagnostics`; the
/// offending input is skipped and never becomes a token.
pub fn scan_tokens(source: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => diagnostics.report(e),
        }
    }

    info!("Scanned {} tokens", tokens.len());

    tokens
}
