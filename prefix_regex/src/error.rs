#[cfg(test)]
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(test, derive(Serialize))]
pub enum MalformedPatternKind {
    #[error("quantifier '{0}' has nothing to repeat")]
    DanglingQuantifier(String),
    #[error("quantifier bound '{0}' is out of range")]
    QuantifierOutOfRange(String),
    #[error("quantifier minimum {min} is greater than maximum {max}")]
    QuantifierMinGreaterMax { min: u32, max: u32 },
    #[error("backreference '\\{0}' is not supported")]
    UnsupportedBackreference(String),
}

/// A pattern the tokenizer could not turn into a token tree.
///
/// `position` is the char offset of the offending token in the pattern
/// as it was handed to [`crate::tokenize`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(test, derive(Serialize))]
#[error("malformed pattern: {kind} (at position {position})")]
pub struct MalformedPatternError {
    kind: MalformedPatternKind,
    position: usize,
}

impl MalformedPatternError {
    pub fn new(kind: MalformedPatternKind, position: usize) -> Self {
        MalformedPatternError { kind, position }
    }

    pub fn kind(&self) -> &MalformedPatternKind {
        &self.kind
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
    /// The host engine refused a checkpoint pattern. Checkpoints are built
    /// from tokenized fragments only, so this is a defect, not a verdict.
    #[error("engine rejected checkpoint pattern `{pattern}`: {message}")]
    Engine { pattern: String, message: String },
}
