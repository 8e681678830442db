//! One cursor over every section of a joined language path.
//!
//! Joined sections are lexed as one continuous input, so a construct such as
//! a block comment may start in one section and end several sections later.
//! Its part tokens (`Start`, `Middle`..., `End`) are presented here as a
//! single logical token.

use relex_ir::{PartType, TokenId};

use crate::input::MutableTextInput;

use super::TokenSequence;

/// A logical token of a joined view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinedToken {
    pub id: TokenId,
    /// `Complete` for a `Start`..`End` run; otherwise the part type of a run
    /// cut off at either end.
    pub part: PartType,
    /// Absolute offset of the first part.
    pub offset: u32,
    /// Input bytes covered by the parts; the text between sections is not
    /// counted.
    pub len: u32,
    /// Number of part tokens merged into this one.
    pub parts: usize,
    /// Texts of the parts, concatenated.
    pub text: String,
}

/// Position of a part token: section and index within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PartRef {
    section: usize,
    index: usize,
}

/// Consecutive part tokens forming one logical token.
#[derive(Clone, Copy, Debug)]
struct Run {
    first: PartRef,
    last: PartRef,
    /// Absolute end of the last part.
    end: u32,
}

/// Bidirectional cursor over the logical tokens of joined sections.
pub struct JoinedTokenSequence<'h, I: MutableTextInput> {
    sections: Vec<TokenSequence<'h, I>>,
    runs: Vec<Run>,
    position: usize,
    current: Option<usize>,
}

impl<'h, I: MutableTextInput> JoinedTokenSequence<'h, I> {
    /// Join `sections`, given in text order.
    pub(crate) fn new(sections: Vec<TokenSequence<'h, I>>) -> Self {
        let runs = collect_runs(&sections);
        JoinedTokenSequence {
            sections,
            runs,
            position: 0,
            current: None,
        }
    }

    // === Movement ===

    /// Move to the next logical token. Returns `false`, without moving, at
    /// the end.
    pub fn move_next(&mut self) -> bool {
        let target = self.current.map_or(self.position, |index| index + 1);
        if target >= self.runs.len() {
            return false;
        }
        self.current = Some(target);
        self.position = target + 1;
        true
    }

    /// Move to the previous logical token. Returns `false`, without moving,
    /// at the start.
    pub fn move_previous(&mut self) -> bool {
        let Some(target) = self.current.unwrap_or(self.position).checked_sub(1) else {
            return false;
        };
        self.current = Some(target);
        self.position = target + 1;
        true
    }

    pub fn move_index(&mut self, index: usize) {
        self.position = index.min(self.runs.len());
        self.current = None;
    }

    pub fn move_start(&mut self) {
        self.move_index(0);
    }

    pub fn move_end(&mut self) {
        self.move_index(self.runs.len());
    }

    /// Position before the logical token ending after the absolute `offset`
    /// (the last one if none does) and return the distance from its start.
    /// `None` when there are no tokens.
    pub fn move_to(&mut self, offset: u32) -> Option<i64> {
        let last = self.runs.len().checked_sub(1)?;
        let index = self
            .runs
            .iter()
            .position(|run| run.end > offset)
            .unwrap_or(last);
        self.move_index(index);
        let start = self.part_offset(self.runs[index].first)?;
        Some(i64::from(offset) - i64::from(start))
    }

    // === Current token ===

    pub fn index(&self) -> Option<usize> {
        self.current
    }

    pub fn token_count(&self) -> usize {
        self.runs.len()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Sections the current token's parts lie in, as `first..=last`.
    pub fn section_range(&self) -> Option<(usize, usize)> {
        let run = self.runs[self.current?];
        Some((run.first.section, run.last.section))
    }

    pub fn token(&self) -> Option<JoinedToken> {
        let run = self.runs[self.current?];
        let first = self.sections[run.first.section].token_at(run.first.index)?;
        let last = self.sections[run.last.section].token_at(run.last.index)?;
        let mut len = 0;
        let mut parts = 0;
        let mut text = String::new();
        for part in parts_of(&self.sections, run) {
            let section = &self.sections[part.section];
            len += section.token_at(part.index)?.token.len();
            text.push_str(&section.text_at(part.index)?);
            parts += 1;
        }
        Some(JoinedToken {
            id: first.token.id(),
            part: merged_part(first.token.part(), last.token.part()),
            offset: self.part_offset(run.first)?,
            len,
            parts,
            text,
        })
    }

    /// Sequence over the section holding the first part of the current
    /// token, positioned on that part.
    pub fn section_sequence(&self) -> Option<TokenSequence<'h, I>> {
        let run = self.runs[self.current?];
        let section = &self.sections[run.first.section];
        let mut sequence =
            TokenSequence::new(section.hierarchy, section.list, section.base, section.path.clone());
        sequence.move_index(run.first.index);
        sequence.move_next();
        Some(sequence)
    }

    fn part_offset(&self, part: PartRef) -> Option<u32> {
        self.sections[part.section].offset_at(part.index)
    }
}

fn merged_part(first: PartType, last: PartType) -> PartType {
    match (first, last) {
        (PartType::Start, PartType::End) => PartType::Complete,
        (PartType::Middle, PartType::End) => PartType::End,
        (first, _) => first,
    }
}

/// Part tokens of `run` in text order.
fn parts_of<I: MutableTextInput>(sections: &[TokenSequence<'_, I>], run: Run) -> Vec<PartRef> {
    let mut parts = Vec::new();
    for section in run.first.section..=run.last.section {
        let from = if section == run.first.section { run.first.index } else { 0 };
        let to = if section == run.last.section {
            run.last.index + 1
        } else {
            sections[section].token_count()
        };
        parts.extend((from..to).map(|index| PartRef { section, index }));
    }
    parts
}

fn collect_runs<I: MutableTextInput>(sections: &[TokenSequence<'_, I>]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut open: Option<Run> = None;
    for (section_index, section) in sections.iter().enumerate() {
        for index in 0..section.token_count() {
            let (Some(located), Some(start)) = (section.token_at(index), section.offset_at(index))
            else {
                continue;
            };
            let part = PartRef {
                section: section_index,
                index,
            };
            let end = start + located.token.len();
            let extends = matches!(located.token.part(), PartType::Middle | PartType::End);
            match open.take() {
                Some(mut run) if extends => {
                    run.last = part;
                    run.end = end;
                    if located.token.part() == PartType::Middle {
                        open = Some(run);
                    } else {
                        runs.push(run);
                    }
                    continue;
                }
                Some(run) => runs.push(run),
                None => {}
            }
            let run = Run {
                first: part,
                last: part,
                end,
            };
            match located.token.part() {
                PartType::Start | PartType::Middle => open = Some(run),
                PartType::Complete | PartType::End => runs.push(run),
            }
        }
    }
    runs.extend(open);
    runs
}

impl<I: MutableTextInput> std::fmt::Debug for JoinedTokenSequence<'_, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinedTokenSequence")
            .field("sections", &self.sections.len())
            .field("tokens", &self.runs.len())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
