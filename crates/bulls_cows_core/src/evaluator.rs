//! Guess scoring.

use crate::code::{CODE_LENGTH, Code};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{instrument, trace};

/// How a single guessed symbol relates to the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Classification {
    /// Right symbol, right position.
    Bull,
    /// Symbol present in the secret at another position.
    Cow,
    /// Symbol absent from the secret.
    None,
}

/// One guessed symbol together with its classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolMark {
    /// The symbol as guessed.
    pub value: char,
    /// Its classification against the secret.
    pub kind: Classification,
}

/// Outcome of scoring one guess.
///
/// Decoding ignores any stored `is_winning` and derives it from the marks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ScoredMarks")]
pub struct GuessResult {
    marks: [SymbolMark; CODE_LENGTH],
    is_winning: bool,
}

#[derive(Deserialize)]
struct ScoredMarks {
    marks: [SymbolMark; CODE_LENGTH],
}

impl From<ScoredMarks> for GuessResult {
    fn from(scored: ScoredMarks) -> Self {
        Self::from_marks(scored.marks)
    }
}

impl GuessResult {
    fn from_marks(marks: [SymbolMark; CODE_LENGTH]) -> Self {
        let is_winning = marks.iter().all(|mark| mark.kind == Classification::Bull);
        Self { marks, is_winning }
    }

    /// Returns the per-position marks, aligned with the guess.
    pub fn marks(&self) -> &[SymbolMark; CODE_LENGTH] {
        &self.marks
    }

    /// Returns true if every position is a bull.
    pub fn is_winning(&self) -> bool {
        self.is_winning
    }

    /// Returns the classifications alone, in position order.
    pub fn classifications(&self) -> [Classification; CODE_LENGTH] {
        self.marks.map(|mark| mark.kind)
    }

    /// Number of bulls.
    pub fn bulls(&self) -> usize {
        self.count(Classification::Bull)
    }

    /// Number of cows.
    pub fn cows(&self) -> usize {
        self.count(Classification::Cow)
    }

    /// Reassembles the guess that produced this result.
    pub fn guess(&self) -> String {
        self.marks.iter().map(|mark| mark.value).collect()
    }

    fn count(&self, kind: Classification) -> usize {
        self.marks.iter().filter(|mark| mark.kind == kind).count()
    }
}

/// Scores `guess` against `target`.
///
/// Position `i` is a bull when both codes hold the same symbol there, a cow
/// when the guessed symbol sits elsewhere in the target, and `None`
/// otherwise. The result wins only when all four positions are bulls.
#[instrument(level = "trace", skip_all, fields(guess = %guess, target = %target))]
pub fn evaluate(guess: &Code, target: &Code) -> GuessResult {
    let present: HashSet<char> = target.symbols().iter().copied().collect();

    let marks: [SymbolMark; CODE_LENGTH] = std::array::from_fn(|i| {
        let value = guess.symbols()[i];
        let kind = if value == target.symbols()[i] {
            Classification::Bull
        } else if present.contains(&value) {
            Classification::Cow
        } else {
            Classification::None
        };
        SymbolMark { value, kind }
    });

    let result = GuessResult::from_marks(marks);
    trace!(is_winning = result.is_winning, "Guess scored");
    result
}
