//! Templates: plain text with `<% %>` code sections.
//!
//! Code between the delimiters embeds calc. All code sections under one
//! template form a single joined calc stream.

use std::sync::Arc;

use relex_ir::{LexerState, Token, TokenId};
use relex_lang::{
    EmbeddingPresence, EmbeddingQuery, EmbeddingSpec, Language, LanguageHierarchy, TokenValidator,
    ValidationEdit,
};
use relex_lexer_core::{LexedToken, Lexer, LexerInput, LexerRestartInfo};

use crate::LexerStats;

pub const MIME_TYPE: &str = "text/x-tmpl";

pub const TEXT: TokenId = TokenId::with_category("TEXT", 0, "text");
pub const OPEN: TokenId = TokenId::with_category("OPEN", 1, "delimiter");
pub const CODE: TokenId = TokenId::with_category("CODE", 2, "code");
pub const CLOSE: TokenId = TokenId::with_category("CLOSE", 3, "delimiter");

/// Lexer state between `<%` and `%>`.
pub const IN_CODE: u32 = 1;

pub struct Tmpl {
    calc: Language,
    stats: Arc<LexerStats>,
}

impl Tmpl {
    pub fn new(calc: Language, stats: Arc<LexerStats>) -> Self {
        Tmpl { calc, stats }
    }
}

impl LanguageHierarchy for Tmpl {
    fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }

    fn token_ids(&self) -> Vec<TokenId> {
        vec![TEXT, OPEN, CODE, CLOSE]
    }

    fn create_lexer(&self, info: &LexerRestartInfo<'_>) -> Box<dyn Lexer> {
        self.stats.record_created();
        Box::new(TmplLexer {
            in_code: info.state.as_small() == Some(IN_CODE),
            stats: Arc::clone(&self.stats),
        })
    }

    fn embedding(&self, query: &EmbeddingQuery<'_>) -> Option<EmbeddingSpec> {
        (query.token.id() == CODE).then(|| EmbeddingSpec::new(self.calc.clone(), 0, 0).joined())
    }

    fn embedding_presence(&self, id: TokenId) -> EmbeddingPresence {
        if id == CODE {
            EmbeddingPresence::CachedFirstQuery
        } else {
            EmbeddingPresence::None
        }
    }

    fn validator(&self, id: TokenId) -> Option<Arc<dyn TokenValidator>> {
        (id == TEXT).then(|| Arc::new(TextValidator) as Arc<dyn TokenValidator>)
    }
}

struct TmplLexer {
    in_code: bool,
    stats: Arc<LexerStats>,
}

impl TmplLexer {
    /// Scan up to `delimiter` or the end of input, leaving the delimiter
    /// unread.
    fn until(input: &mut LexerInput<'_>, delimiter: &str, first: u8) {
        while input.eat_until_byte(first) {
            if input.starts_with(delimiter) {
                return;
            }
            input.advance(1);
        }
    }

    fn scan(&mut self, input: &mut LexerInput<'_>) -> Option<LexedToken> {
        if self.in_code {
            if input.consume("%>") {
                self.in_code = false;
                return Some(input.flyweight_token(CLOSE, "%>"));
            }
            input.peek()?;
            Self::until(input, "%>", b'%');
            return Some(input.create_token(CODE));
        }
        if input.consume("<%") {
            self.in_code = true;
            return Some(input.flyweight_token(OPEN, "<%"));
        }
        input.peek()?;
        Self::until(input, "<%", b'<');
        Some(input.create_token(TEXT))
    }
}

impl Lexer for TmplLexer {
    fn next_token(&mut self, input: &mut LexerInput<'_>) -> Option<LexedToken> {
        let token = self.scan(input)?;
        self.stats.record_token();
        Some(token)
    }

    fn state(&self) -> LexerState {
        if self.in_code {
            LexerState::small(IN_CODE)
        } else {
            LexerState::Default
        }
    }

    fn restart(&mut self, info: &LexerRestartInfo<'_>) {
        self.stats.record_restart();
        self.in_code = info.state.as_small() == Some(IN_CODE);
    }
}

/// Accepts edits that introduce no `<%` into template text.
struct TextValidator;

impl TokenValidator for TextValidator {
    fn validate(&self, edit: &ValidationEdit<'_>) -> Option<Token> {
        (!edit.text.contains("<%")).then(|| Token::new(TEXT, edit.new_len()))
    }
}
