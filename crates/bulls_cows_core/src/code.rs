//! Secret codes and guesses.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Number of symbols in every secret and every guess.
pub const CODE_LENGTH: usize = 4;

/// Set of symbols a code may be built from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Alphabet {
    /// Decimal digits `0-9`.
    #[default]
    Digits,
    /// ASCII letters and digits.
    Alphanumeric,
}

impl Alphabet {
    /// Returns true if `symbol` belongs to this alphabet.
    pub fn contains(self, symbol: char) -> bool {
        match self {
            Self::Digits => symbol.is_ascii_digit(),
            Self::Alphanumeric => symbol.is_ascii_alphanumeric(),
        }
    }
}

/// Reason a candidate code was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum CodeError {
    /// The candidate does not have exactly four symbols.
    #[display("combination must have exactly 4 symbols, got {found}")]
    WrongLength {
        /// Number of symbols actually submitted.
        found: usize,
    },

    /// A symbol appears more than once.
    #[display("symbol '{symbol}' can not be repeated")]
    RepeatedSymbol {
        /// The first symbol seen twice.
        symbol: char,
    },

    /// A symbol falls outside the configured alphabet.
    #[display("symbol '{symbol}' is not part of the {alphabet} alphabet")]
    ForeignSymbol {
        /// The offending symbol.
        symbol: char,
        /// Alphabet the code was checked against.
        alphabet: Alphabet,
    },
}

/// A secret or a guess: exactly four distinct symbols.
///
/// A `Code` can only be obtained through [`Code::parse`] or
/// [`CodeRules::validate`], so holding one proves the length and
/// uniqueness rules already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code([char; CODE_LENGTH]);

impl Code {
    /// Parses a code, checking length and uniqueness but not the alphabet.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::WrongLength`] or [`CodeError::RepeatedSymbol`].
    pub fn parse(candidate: &str) -> Result<Self, CodeError> {
        let symbols: Vec<char> = candidate.chars().collect();
        let symbols: [char; CODE_LENGTH] = symbols
            .try_into()
            .map_err(|rejected: Vec<char>| CodeError::WrongLength {
                found: rejected.len(),
            })?;

        let mut seen = HashSet::with_capacity(CODE_LENGTH);
        for symbol in symbols {
            if !seen.insert(symbol) {
                return Err(CodeError::RepeatedSymbol { symbol });
            }
        }

        Ok(Self(symbols))
    }

    /// Returns the symbols in position order.
    pub fn symbols(&self) -> &[char; CODE_LENGTH] {
        &self.0
    }

    /// Returns true if `symbol` appears anywhere in the code.
    pub fn contains(&self, symbol: char) -> bool {
        self.0.contains(&symbol)
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for symbol in self.0 {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Code {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.to_string()
    }
}

/// Validation rules applied to every submitted secret and guess.
///
/// Built once from configuration and handed to the match service, so
/// every command is checked against the same alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeRules {
    alphabet: Alphabet,
}

impl CodeRules {
    /// Creates rules accepting symbols from `alphabet`.
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet }
    }

    /// Returns the alphabet codes are checked against.
    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Validates a candidate code.
    ///
    /// # Errors
    ///
    /// Returns a [`CodeError`] describing the first rule the candidate breaks.
    #[instrument(skip(self), fields(alphabet = %self.alphabet))]
    pub fn validate(&self, candidate: &str) -> Result<Code, CodeError> {
        let code = Code::parse(candidate)?;

        if let Some(&symbol) = code.symbols().iter().find(|s| !self.alphabet.contains(**s)) {
            debug!(%symbol, "Rejected symbol outside alphabet");
            return Err(CodeError::ForeignSymbol {
                symbol,
                alphabet: self.alphabet,
            });
        }

        Ok(code)
    }
}
