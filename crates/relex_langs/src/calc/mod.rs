//! Calc: arithmetic expressions.
//!
//! Operators and single spaces are flyweights. Numbers carry a `fractional`
//! property. `/* */` comments may be left
//! open; the lexer then ends in the in-comment state, and a lexer restarted
//! in that state continues the comment. Inside template code sections this
//! carries a comment across sections.

mod validate;

use std::sync::Arc;

use relex_ir::{LexerState, PartType, PropertyValue, Token, TokenId, TokenPropertyProvider};
use relex_lang::{
    EmbeddingPresence, EmbeddingQuery, EmbeddingSpec, Language, LanguageHierarchy, TokenValidator,
};
use relex_lexer_core::{LexedToken, Lexer, LexerInput, LexerRestartInfo};

use crate::LexerStats;

pub const MIME_TYPE: &str = "text/x-calc";

pub const WHITESPACE: TokenId = TokenId::with_category("WHITESPACE", 0, "whitespace");
pub const IDENTIFIER: TokenId = TokenId::with_category("IDENTIFIER", 1, "identifier");
pub const NUMBER: TokenId = TokenId::with_category("NUMBER", 2, "literal");
pub const PLUS: TokenId = TokenId::with_category("PLUS", 3, "operator");
pub const INCREMENT: TokenId = TokenId::with_category("INCREMENT", 4, "operator");
pub const MINUS: TokenId = TokenId::with_category("MINUS", 5, "operator");
pub const STAR: TokenId = TokenId::with_category("STAR", 6, "operator");
pub const SLASH: TokenId = TokenId::with_category("SLASH", 7, "operator");
pub const LPAREN: TokenId = TokenId::with_category("LPAREN", 8, "separator");
pub const RPAREN: TokenId = TokenId::with_category("RPAREN", 9, "separator");
pub const STRING: TokenId = TokenId::with_category("STRING", 10, "literal");
pub const COMMENT: TokenId = TokenId::with_category("COMMENT", 11, "comment");
pub const ERROR: TokenId = TokenId::with_category("ERROR", 12, "error");

/// Lexer state after an unterminated block comment.
pub const IN_COMMENT: u32 = 1;

/// Property key of number tokens: `Bool(true)` for `1.5`, `Bool(false)` for `15`.
pub const FRACTIONAL: &str = "fractional";

#[derive(Debug)]
struct NumberProperties {
    fractional: bool,
}

impl TokenPropertyProvider for NumberProperties {
    fn value(&self, token: &Token, key: &str) -> Option<PropertyValue> {
        (token.id() == NUMBER && key == FRACTIONAL).then_some(PropertyValue::Bool(self.fractional))
    }
}

/// One provider per number shape, shared by every number token of a
/// language so that equal numbers compare equal.
#[derive(Clone, Debug)]
struct NumberShapes {
    integral: Arc<dyn TokenPropertyProvider>,
    fractional: Arc<dyn TokenPropertyProvider>,
}

impl NumberShapes {
    fn new() -> Self {
        NumberShapes {
            integral: Arc::new(NumberProperties { fractional: false }),
            fractional: Arc::new(NumberProperties { fractional: true }),
        }
    }

    fn provider(&self, fractional: bool) -> Arc<dyn TokenPropertyProvider> {
        Arc::clone(if fractional { &self.fractional } else { &self.integral })
    }
}

pub struct Calc {
    strings: Option<Language>,
    numbers: NumberShapes,
    stats: Arc<LexerStats>,
}

impl Calc {
    /// Calc embedding `strings` in string literals, if given.
    pub fn new(strings: Option<Language>, stats: Arc<LexerStats>) -> Self {
        Calc {
            strings,
            numbers: NumberShapes::new(),
            stats,
        }
    }
}

impl LanguageHierarchy for Calc {
    fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }

    fn token_ids(&self) -> Vec<TokenId> {
        vec![
            WHITESPACE, IDENTIFIER, NUMBER, PLUS, INCREMENT, MINUS, STAR, SLASH, LPAREN, RPAREN,
            STRING, COMMENT, ERROR,
        ]
    }

    fn token_categories(&self) -> Vec<(&'static str, Vec<TokenId>)> {
        vec![("trivia", vec![WHITESPACE, COMMENT])]
    }

    fn create_lexer(&self, info: &LexerRestartInfo<'_>) -> Box<dyn Lexer> {
        self.stats.record_created();
        Box::new(CalcLexer {
            in_comment: info.state.as_small() == Some(IN_COMMENT),
            numbers: self.numbers.clone(),
            stats: Arc::clone(&self.stats),
        })
    }

    fn embedding(&self, query: &EmbeddingQuery<'_>) -> Option<EmbeddingSpec> {
        if query.token.id() != STRING {
            return None;
        }
        let strings = self.strings.clone()?;
        let end_skip = u32::from(query.token.part().is_complete());
        Some(EmbeddingSpec::new(strings, 1, end_skip))
    }

    fn embedding_presence(&self, id: TokenId) -> EmbeddingPresence {
        // Unterminated strings have no closing quote to skip.
        if id == STRING {
            EmbeddingPresence::AlwaysQuery
        } else {
            EmbeddingPresence::None
        }
    }

    fn validator(&self, id: TokenId) -> Option<Arc<dyn TokenValidator>> {
        match id {
            IDENTIFIER => Some(Arc::new(validate::IdentifierValidator)),
            NUMBER => Some(Arc::new(validate::NumberValidator)),
            STRING => Some(Arc::new(validate::StringValidator)),
            _ => None,
        }
    }
}

pub(crate) fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

pub(crate) fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

struct CalcLexer {
    in_comment: bool,
    numbers: NumberShapes,
    stats: Arc<LexerStats>,
}

impl CalcLexer {
    /// Scan up to and including `*/`. Returns `false` at the end of input.
    fn comment_body(input: &mut LexerInput<'_>) -> bool {
        loop {
            if !input.eat_until_byte(b'*') {
                return false;
            }
            input.advance(1);
            if input.consume("/") {
                return true;
            }
        }
    }

    fn comment(&mut self, input: &mut LexerInput<'_>, continued: bool) -> LexedToken {
        let closed = Self::comment_body(input);
        let part = match (continued, closed) {
            (false, true) => PartType::Complete,
            (false, false) => PartType::Start,
            (true, true) => PartType::End,
            (true, false) => PartType::Middle,
        };
        self.in_comment = !closed;
        input.create_part_token(COMMENT, part)
    }

    fn string(input: &mut LexerInput<'_>) -> LexedToken {
        loop {
            match input.read() {
                Some('"') => return input.create_token(STRING),
                Some('\\') => {
                    input.read();
                }
                Some('\n') => {
                    input.backup(1);
                    break;
                }
                Some(_) => {}
                None => break,
            }
        }
        input.create_part_token(STRING, PartType::Start)
    }

    fn number(&self, input: &mut LexerInput<'_>) -> LexedToken {
        input.eat_while(|ch| ch.is_ascii_digit());
        let mut fractional = false;
        if input.peek() == Some('.') {
            input.read();
            if input.peek().is_some_and(|ch| ch.is_ascii_digit()) {
                input.eat_while(|ch| ch.is_ascii_digit());
                fractional = true;
            } else {
                input.backup(1);
            }
        }
        let len = input.read_length();
        input.property_token(NUMBER, len, PartType::Complete, self.numbers.provider(fractional))
    }

    fn scan(&mut self, input: &mut LexerInput<'_>) -> Option<LexedToken> {
        if self.in_comment {
            input.peek()?;
            return Some(self.comment(input, true));
        }
        let ch = input.read()?;
        let token = match ch {
            ' ' if !input.peek().is_some_and(char::is_whitespace) => {
                input.flyweight_token(WHITESPACE, " ")
            }
            ch if ch.is_whitespace() => {
                input.eat_while(char::is_whitespace);
                input.create_token(WHITESPACE)
            }
            ch if is_ident_start(ch) => {
                input.eat_while(is_ident_continue);
                input.create_token(IDENTIFIER)
            }
            ch if ch.is_ascii_digit() => self.number(input),
            '+' if input.consume("+") => input.flyweight_token(INCREMENT, "++"),
            '+' => input.flyweight_token(PLUS, "+"),
            '-' => input.flyweight_token(MINUS, "-"),
            '*' => input.flyweight_token(STAR, "*"),
            '(' => input.flyweight_token(LPAREN, "("),
            ')' => input.flyweight_token(RPAREN, ")"),
            '/' if input.consume("*") => self.comment(input, false),
            '/' => input.flyweight_token(SLASH, "/"),
            '"' => Self::string(input),
            _ => input.create_token(ERROR),
        };
        Some(token)
    }
}

impl Lexer for CalcLexer {
    fn next_token(&mut self, input: &mut LexerInput<'_>) -> Option<LexedToken> {
        let token = self.scan(input)?;
        self.stats.record_token();
        Some(token)
    }

    fn state(&self) -> LexerState {
        if self.in_comment {
            LexerState::small(IN_COMMENT)
        } else {
            LexerState::Default
        }
    }

    fn restart(&mut self, info: &LexerRestartInfo<'_>) {
        self.stats.record_restart();
        self.in_comment = info.state.as_small() == Some(IN_COMMENT);
    }
}
