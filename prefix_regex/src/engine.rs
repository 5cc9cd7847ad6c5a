use crate::error::ValidateError;
use regex::Regex;

/// The host engine: decides whether a haystack is matched by a pattern the
/// validator has already anchored on both ends.
pub trait Matcher {
    fn full_match(&self, pattern: &str, haystack: &str) -> Result<bool, ValidateError>;
}

impl<M: Matcher + ?Sized> Matcher for &M {
    fn full_match(&self, pattern: &str, haystack: &str) -> Result<bool, ValidateError> {
        (**self).full_match(pattern, haystack)
    }
}

/// [`Matcher`] backed by the `regex` crate. Compiles every checkpoint
/// afresh; nothing is cached between calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexMatcher;

impl Matcher for RegexMatcher {
    fn full_match(&self, pattern: &str, haystack: &str) -> Result<bool, ValidateError> {
        let regex = Regex::new(pattern).map_err(|err| ValidateError::Engine {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;

        Ok(regex.is_match(haystack))
    }
}
