//! Escape sequences inside calc string literals.
//!
//! The scanner is a logos automaton run over the remaining input for each
//! token. Logos does not report how far it looked, so escape tokens are
//! charged the length of the longest escape as lookahead. Unicode escapes
//! of valid scalar values present the decoded character as their text.

use std::sync::Arc;

use logos::Logos;

use relex_ir::{LexerState, PartType, Token, TokenId};
use relex_lang::{EmbeddingPresence, LanguageHierarchy, TokenValidator, ValidationEdit};
use relex_lexer_core::{LexedToken, Lexer, LexerInput, LexerRestartInfo};

use crate::LexerStats;

pub const MIME_TYPE: &str = "text/x-calc-string";

pub const TEXT: TokenId = TokenId::with_category("TEXT", 0, "text");
pub const ESCAPE: TokenId = TokenId::with_category("ESCAPE", 1, "escape");
pub const UNICODE_ESCAPE: TokenId = TokenId::with_category("UNICODE_ESCAPE", 2, "escape");
pub const INVALID_ESCAPE: TokenId = TokenId::with_category("INVALID_ESCAPE", 3, "error");

/// `\u{10FFFF}`
const LONGEST_ESCAPE: u32 = 10;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawStringToken {
    #[regex(r"[^\\]+")]
    Text,

    #[regex(r#"\\["\\nrt0]"#)]
    Escape,

    #[regex(r"\\u\{[0-9a-fA-F]{1,6}\}")]
    Unicode,
}

/// Character named by a `\u{...}` escape, if it is a scalar value.
fn unicode_char(slice: &str) -> Option<char> {
    let hex = slice.strip_prefix("\\u{")?.strip_suffix('}')?;
    char::from_u32(u32::from_str_radix(hex, 16).ok()?)
}

/// Static text of a simple escape, for flyweight tokens.
fn escape_text(slice: &str) -> Option<&'static str> {
    Some(match slice {
        "\\\"" => "\\\"",
        "\\\\" => "\\\\",
        "\\n" => "\\n",
        "\\r" => "\\r",
        "\\t" => "\\t",
        "\\0" => "\\0",
        _ => return None,
    })
}

pub struct Strings {
    stats: Arc<LexerStats>,
}

impl Strings {
    pub fn new(stats: Arc<LexerStats>) -> Self {
        Strings { stats }
    }
}

impl LanguageHierarchy for Strings {
    fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }

    fn token_ids(&self) -> Vec<TokenId> {
        vec![TEXT, ESCAPE, UNICODE_ESCAPE, INVALID_ESCAPE]
    }

    fn create_lexer(&self, _info: &LexerRestartInfo<'_>) -> Box<dyn Lexer> {
        self.stats.record_created();
        Box::new(StringLexer {
            stats: Arc::clone(&self.stats),
        })
    }

    fn embedding_presence(&self, _id: TokenId) -> EmbeddingPresence {
        EmbeddingPresence::None
    }

    fn validator(&self, id: TokenId) -> Option<Arc<dyn TokenValidator>> {
        (id == TEXT).then(|| Arc::new(TextValidator) as Arc<dyn TokenValidator>)
    }
}

struct StringLexer {
    stats: Arc<LexerStats>,
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "token lengths are bounded by the u32 input length"
)]
fn byte_len(slice: &str) -> u32 {
    slice.len() as u32
}

impl Lexer for StringLexer {
    fn next_token(&mut self, input: &mut LexerInput<'_>) -> Option<LexedToken> {
        let remaining = input.remaining();
        let mut raw = RawStringToken::lexer(remaining);
        let result = raw.next()?;
        let slice = raw.slice();
        self.stats.record_token();
        let token = match result {
            Ok(RawStringToken::Text) => {
                input.advance(byte_len(slice));
                input.note_lookahead(1);
                input.create_token(TEXT)
            }
            Ok(RawStringToken::Escape) => {
                input.advance(byte_len(slice));
                input.note_lookahead(LONGEST_ESCAPE);
                match escape_text(slice) {
                    Some(text) => input.flyweight_token(ESCAPE, text),
                    None => input.create_token(ESCAPE),
                }
            }
            Ok(RawStringToken::Unicode) => {
                input.advance(byte_len(slice));
                input.note_lookahead(LONGEST_ESCAPE);
                match unicode_char(slice) {
                    Some(ch) => {
                        let text: Arc<str> = Arc::from(ch.to_string());
                        let len = byte_len(slice);
                        input.custom_text_token(UNICODE_ESCAPE, text, len, PartType::Complete)
                    }
                    None => input.create_token(UNICODE_ESCAPE),
                }
            }
            // Only a backslash can fail to match; it becomes a token of
            // its own and scanning resumes after it.
            Err(()) => {
                let len = remaining.chars().next().map_or(1, char::len_utf8);
                input.advance(u32::try_from(len).unwrap_or(1));
                input.note_lookahead(LONGEST_ESCAPE);
                input.create_token(INVALID_ESCAPE)
            }
        };
        Some(token)
    }

    fn state(&self) -> LexerState {
        LexerState::Default
    }

    fn restart(&mut self, _info: &LexerRestartInfo<'_>) {
        self.stats.record_restart();
    }
}

/// Accepts edits that leave plain text without backslashes.
struct TextValidator;

impl TokenValidator for TextValidator {
    fn validate(&self, edit: &ValidationEdit<'_>) -> Option<Token> {
        (!edit.text.contains('\\')).then(|| Token::new(TEXT, edit.new_len()))
    }
}
