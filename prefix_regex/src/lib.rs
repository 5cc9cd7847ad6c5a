//! Validate-as-you-type for regular expressions: decides whether a string is
//! a prefix of something a pattern would accept.

pub use engine::{Matcher, RegexMatcher};
pub use error::{MalformedPatternError, MalformedPatternKind, ValidateError};
pub use tree::{Element, Node, PatternTree, Quantifier, Sequence};
pub use validator::PrefixValidator;

mod cursor;
mod engine;
mod error;
mod token;
mod tree;
mod validator;

/// A tokenized pattern paired with the default engine.
#[derive(Debug, Clone)]
pub struct PrefixRegex {
    tree: PatternTree,
    validator: PrefixValidator,
}

impl PrefixRegex {
    pub fn new(pattern: &str) -> Result<Self, MalformedPatternError> {
        Ok(Self {
            tree: tokenize(pattern)?,
            validator: PrefixValidator::new(),
        })
    }

    pub fn with_repetition_limit(mut self, limit: usize) -> Self {
        self.validator = self.validator.with_repetition_limit(limit);
        self
    }

    pub fn tree(&self) -> &PatternTree {
        &self.tree
    }

    pub fn is_prefix_valid<'c>(
        &self,
        candidate: impl Into<Option<&'c str>>,
    ) -> Result<bool, ValidateError> {
        self.validator.is_prefix_valid(&self.tree, candidate)
    }
}

/// Builds the token tree of a regex body (no `/` delimiters).
pub fn tokenize(pattern: &str) -> Result<PatternTree, MalformedPatternError> {
    PatternTree::new(pattern)
}

/// Checks `candidate` against `tree` with the `regex` crate as engine.
pub fn is_prefix_valid<'c>(
    tree: &PatternTree,
    candidate: impl Into<Option<&'c str>>,
) -> Result<bool, ValidateError> {
    PrefixValidator::new().is_prefix_valid(tree, candidate)
}

/// Returns the body of a `/body/flags` literal, or the input unchanged when
/// it is not delimited. Flags are discarded.
pub fn strip_delimiters(literal: &str) -> &str {
    literal
        .strip_prefix('/')
        .and_then(|rest| rest.rfind('/').map(|end| &rest[..end]))
        .unwrap_or(literal)
}
