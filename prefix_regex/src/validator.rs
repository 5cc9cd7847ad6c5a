use crate::engine::{Matcher, RegexMatcher};
use crate::error::ValidateError;
use crate::token::atom_ends;
use crate::tree::{Element, Node, PatternTree, Quantifier, Sequence};
use log::{debug, trace};

/// Accepts any tail after a completed prefix, in syntax every common engine
/// understands.
const ANY_TAIL: &str = r"[\s\S]*";

/// Bookkeeping for one top-level validation. Never shared between calls.
struct Checkpoints<'a> {
    buffer: &'a str,
    /// Source text of every token visited so far, in walk order.
    pattern_so_far: String,
    /// `(` pushed into `pattern_so_far` and not closed yet.
    open_groups: usize,
}

impl<'a> Checkpoints<'a> {
    fn new(buffer: &'a str) -> Self {
        Self {
            buffer,
            pattern_so_far: String::with_capacity(64),
            open_groups: 0,
        }
    }

    fn open_group(&mut self) {
        self.pattern_so_far.push('(');
        self.open_groups += 1;
    }

    fn close_group(&mut self) {
        self.pattern_so_far.push(')');
        self.open_groups -= 1;
    }

    fn closed_with(&self, tail: &str) -> String {
        let mut pattern =
            String::with_capacity(self.pattern_so_far.len() + tail.len() + self.open_groups + 8);
        pattern.push_str("^(");
        pattern.push_str(&self.pattern_so_far);
        pattern.push_str(tail);
        pattern.extend(std::iter::repeat_n(')', self.open_groups));
        pattern.push(')');
        pattern
    }

    /// `pattern_so_far + tail`, closed and anchored on both ends.
    fn anchored(&self, tail: &str) -> String {
        let mut pattern = self.closed_with(tail);
        pattern.push('$');
        pattern
    }

    /// Matches buffers that start with a completed `pattern_so_far`.
    fn reachable(&self) -> String {
        let mut pattern = self.closed_with("");
        pattern.push_str(ANY_TAIL);
        pattern.push('$');
        pattern
    }
}

/// Decides whether a candidate is a prefix of some string a [`PatternTree`]
/// accepts.
///
/// The walk rebuilds the pattern token by token and, at every literal
/// position and class, asks the engine whether the whole candidate is
/// exactly what the pattern seen so far accepts. The first yes settles it:
/// whatever the pattern wants after that point, the user has not typed yet.
#[derive(Debug, Clone, Default)]
pub struct PrefixValidator<M = RegexMatcher> {
    matcher: M,
    repetition_limit: Option<usize>,
}

impl PrefixValidator<RegexMatcher> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: Matcher> PrefixValidator<M> {
    pub fn with_matcher(matcher: M) -> Self {
        Self {
            matcher,
            repetition_limit: None,
        }
    }

    /// Caps the extra repetitions tried per quantified element. Without a
    /// cap the search stops after `chars(candidate) + 1` repetitions, which
    /// never misses a match; a lower cap trades completeness for speed on
    /// deeply nested patterns.
    pub fn with_repetition_limit(mut self, limit: usize) -> Self {
        self.repetition_limit = Some(limit);
        self
    }

    /// `None` and `""` are never valid and never reach the engine.
    pub fn is_prefix_valid<'c>(
        &self,
        tree: &PatternTree,
        candidate: impl Into<Option<&'c str>>,
    ) -> Result<bool, ValidateError> {
        let Some(candidate) = candidate.into().filter(|c| !c.is_empty()) else {
            debug!("nothing to validate");
            return Ok(false);
        };

        let mut checkpoints = Checkpoints::new(candidate);
        let is_valid = self.validate_sequence(tree.root(), false, &mut checkpoints)?;
        debug!("'{candidate}' prefix-valid: {is_valid}");

        Ok(is_valid)
    }

    fn validate_sequence(
        &self,
        sequence: &Sequence,
        is_group: bool,
        acc: &mut Checkpoints,
    ) -> Result<bool, ValidateError> {
        if is_group {
            acc.open_group();
        }

        let mut is_valid = false;
        for element in sequence.elements() {
            is_valid = self.validate_element(element, acc)?;
            if is_valid {
                break;
            }
        }

        if is_group {
            acc.close_group();
        }
        Ok(is_valid)
    }

    fn validate_element(
        &self,
        element: &Element,
        acc: &mut Checkpoints,
    ) -> Result<bool, ValidateError> {
        let is_valid = match element.node() {
            Node::Group(body) => self.validate_sequence(body, true, acc)?,
            Node::CharClass(raw) => {
                let is_valid = self.checkpoint(acc, raw)?;
                acc.pattern_so_far.push_str(raw);
                is_valid
            }
            Node::Literal(text) => self.validate_literal(text, acc)?,
        };
        if is_valid {
            return Ok(true);
        }

        match (element.node(), element.quantifier()) {
            (Node::Group(body), Some(quantifier)) => {
                self.validate_repetitions(body, quantifier, acc)
            }
            _ => Ok(false),
        }
    }

    fn validate_literal(&self, text: &str, acc: &mut Checkpoints) -> Result<bool, ValidateError> {
        let mut is_valid = false;
        let mut atom_start = 0;

        for end in atom_ends(text) {
            // a dangling alternation bar would add an empty branch
            let upto = if &text[atom_start..end] == "|" {
                atom_start
            } else {
                end
            };
            atom_start = end;

            is_valid = self.checkpoint(acc, &text[..upto])?;
            if is_valid {
                break;
            }
        }

        acc.pattern_so_far.push_str(text);
        Ok(is_valid)
    }

    /// Tries the quantified group again and again after its first pass
    /// failed. Leaves `pattern_so_far` holding the group once followed by
    /// the quantifier, whatever happened.
    ///
    /// Stops at the first repetition that validates, at the quantifier's
    /// `max - 1`, at the search budget, or as soon as no prefix of the
    /// buffer matches what has been built so far.
    fn validate_repetitions(
        &self,
        body: &Sequence,
        quantifier: Quantifier,
        acc: &mut Checkpoints,
    ) -> Result<bool, ValidateError> {
        let before = acc.pattern_so_far.len();
        let budget = self.repetition_budget(quantifier, acc.buffer);
        let mut is_valid = false;

        for round in 0..budget {
            if !self.matcher.full_match(&acc.reachable(), acc.buffer)? {
                trace!("repetition {} of {quantifier} cannot progress", round + 1);
                break;
            }
            is_valid = self.validate_sequence(body, true, acc)?;
            if is_valid {
                break;
            }
        }

        acc.pattern_so_far.truncate(before);
        acc.pattern_so_far.push_str(&quantifier.to_string());
        Ok(is_valid)
    }

    /// A repetition that consumes nothing cannot enable a match, so more
    /// than one repetition per buffer char is never needed.
    fn repetition_budget(&self, quantifier: Quantifier, buffer: &str) -> usize {
        let search_limit = buffer.chars().count() + 1;
        let budget = match quantifier.max() {
            Some(max) => usize::try_from(max.saturating_sub(1))
                .unwrap_or(usize::MAX)
                .min(search_limit),
            None => search_limit,
        };
        self.repetition_limit
            .map_or(budget, |limit| budget.min(limit))
    }

    fn checkpoint(&self, acc: &Checkpoints, tail: &str) -> Result<bool, ValidateError> {
        let pattern = acc.anchored(tail);
        let is_match = self.matcher.full_match(&pattern, acc.buffer)?;
        trace!("checkpoint {pattern} on '{}': {is_match}", acc.buffer);
        Ok(is_match)
    }
}
