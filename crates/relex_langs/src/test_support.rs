//! Drive a sample lexer over a string.

use relex_ir::{LexerState, PartType, Token};
use relex_lang::Language;
use relex_lexer_core::{LexedToken, LexerInput, LexerRestartInfo};

/// One token as seen by the tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lexed {
    pub id: &'static str,
    pub text: String,
    pub part: PartType,
    pub flyweight: bool,
    pub lookahead: u32,
    pub state: LexerState,
    pub token: Token,
}

/// Lex all of `text` starting in `state`.
///
/// # Panics
///
/// Panics if the lexer stops before the end of the input or returns a skip.
pub fn lex(language: &Language, text: &str, state: &LexerState) -> Vec<Lexed> {
    let info = LexerRestartInfo::new(state, language.mime_type());
    let mut lexer = language.create_lexer(&info);
    lexer.restart(&info);
    let mut input = LexerInput::new(text, 0);
    let mut tokens = Vec::new();
    loop {
        let start = input.token_start() as usize;
        match lexer.next_token(&mut input) {
            Some(LexedToken::Token(token)) => {
                let end = start + token.len() as usize;
                tokens.push(Lexed {
                    id: token.id().name(),
                    text: text[start..end].to_owned(),
                    part: token.part(),
                    flyweight: token.is_flyweight(),
                    lookahead: input.last_lookahead(),
                    state: lexer.state(),
                    token,
                });
            }
            Some(LexedToken::Skip(len)) => panic!("unexpected skip of {len} bytes"),
            None => {
                assert!(input.is_exhausted(), "lexer stopped at {start}");
                return tokens;
            }
        }
    }
}

/// `(id, text)` pairs of a lexing run.
pub fn ids_and_texts(tokens: &[Lexed]) -> Vec<(&'static str, &str)> {
    tokens.iter().map(|t| (t.id, t.text.as_str())).collect()
}
