#[cfg(test)]
use serde::Serialize;

use crate::error::{MalformedPatternError, MalformedPatternKind};
use crate::token::{atom_ends, Lexer, Token};
use log::debug;
use std::fmt::{Display, Formatter};

/// Repetition bounds; `max == None` is unbounded.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub struct Quantifier {
    min: u32,
    max: Option<u32>,
}

impl Quantifier {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> Option<u32> {
        self.max
    }
}

impl Display for Quantifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "{{{},{}}}", self.min, max),
            None => write!(f, "{{{},}}", self.min),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub enum Node {
    /// Engine-ready text, matched char by char.
    Literal(String),
    /// An opaque bracket expression.
    CharClass(String),
    Group(Sequence),
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub struct Element {
    node: Node,
    #[cfg_attr(test, serde(skip_serializing_if = "Option::is_none"))]
    quantifier: Option<Quantifier>,
}

impl Element {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            quantifier: None,
        }
    }

    /// A quantified element always repeats a group.
    pub fn repeated(body: Sequence, quantifier: Quantifier) -> Self {
        Self {
            node: Node::Group(body),
            quantifier: Some(quantifier),
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn quantifier(&self) -> Option<Quantifier> {
        self.quantifier
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(test, derive(Serialize))]
#[cfg_attr(test, serde(transparent))]
pub struct Sequence(Vec<Element>);

impl Sequence {
    pub fn new(elements: Vec<Element>) -> Self {
        Self(elements)
    }

    pub fn elements(&self) -> &[Element] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, element: Element) {
        self.0.push(element)
    }
}

/// The token tree of one pattern. Immutable and free of per-call state, so a
/// single tree can back any number of concurrent validations.
#[derive(Clone, PartialEq, Debug)]
pub struct PatternTree {
    root: Sequence,
}

impl PatternTree {
    /// Tokenizes `pattern` (a regex body, without `/` delimiters). A leading
    /// `^` and a trailing unescaped `$` are dropped.
    pub fn new(pattern: &str) -> Result<Self, MalformedPatternError> {
        let (body, offset) = strip_anchors(pattern);
        let tokens = Lexer::tokenize(body, offset)?;

        TreeBuilder::build(tokens)
    }

    /// The top-level sequence. The validator walks it without the group
    /// bookkeeping every nested body gets.
    pub fn root(&self) -> &Sequence {
        &self.root
    }

    /// Renders the tree back into regex text, the way the validator will
    /// see it once every element has been visited.
    pub fn to_pattern_string(&self) -> String {
        self.root.to_string()
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.iter().try_for_each(|element| write!(f, "{element}"))
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.node {
            Node::Literal(text) => write!(f, "{text}")?,
            Node::CharClass(raw) => write!(f, "{raw}")?,
            Node::Group(body) => write!(f, "({body})")?,
        }
        match self.quantifier {
            Some(quantifier) => write!(f, "{quantifier}"),
            None => Ok(()),
        }
    }
}

fn strip_anchors(pattern: &str) -> (&str, usize) {
    let (body, offset) = match pattern.strip_prefix('^') {
        Some(rest) => (rest, 1),
        None => (pattern, 0),
    };
    match body.strip_suffix('$') {
        Some(rest) if rest.chars().rev().take_while(|&c| c == '\\').count() % 2 == 0 => {
            (rest, offset)
        }
        _ => (body, offset),
    }
}

/// Splits off the last atom of literal text, so `te?` repeats `e` alone.
fn split_last_atom(text: String) -> (Option<String>, String) {
    let ends = atom_ends(&text);
    if ends.len() < 2 {
        return (None, text);
    }
    let at = ends[ends.len() - 2];
    (Some(text[..at].to_string()), text[at..].to_string())
}

struct TreeBuilder {
    root: Sequence,
    open_groups: Vec<(usize, Sequence)>,
}

impl TreeBuilder {
    fn build(tokens: Vec<(usize, Token)>) -> Result<PatternTree, MalformedPatternError> {
        let mut builder = Self {
            root: Sequence::default(),
            open_groups: Vec::new(),
        };

        for (pos, token) in tokens {
            builder.consume(pos, token)?;
        }

        Ok(builder.finish())
    }

    fn current(&mut self) -> &mut Sequence {
        match self.open_groups.last_mut() {
            Some((_, body)) => body,
            None => &mut self.root,
        }
    }

    fn consume(&mut self, pos: usize, token: Token) -> Result<(), MalformedPatternError> {
        match token {
            Token::GroupOpen => self.open_groups.push((pos, Sequence::default())),
            Token::GroupClose => match self.open_groups.pop() {
                Some((_, body)) => self.current().push(Element::new(Node::Group(body))),
                None => {
                    debug!("unbalanced ')' at position {pos} read as literal");
                    self.current()
                        .push(Element::new(Node::Literal("\\)".to_string())));
                }
            },
            Token::Quantifier(quantifier) => self.attach_quantifier(pos, quantifier)?,
            Token::Literal(text) => self.current().push(Element::new(Node::Literal(text))),
            Token::Dot => self
                .current()
                .push(Element::new(Node::Literal(".".to_string()))),
            Token::Class(raw) => self.current().push(Element::new(Node::CharClass(raw))),
        }
        Ok(())
    }

    fn attach_quantifier(
        &mut self,
        pos: usize,
        quantifier: Quantifier,
    ) -> Result<(), MalformedPatternError> {
        let current = self.current();
        let Some(operand) = current.0.pop() else {
            return Err(MalformedPatternError::new(
                MalformedPatternKind::DanglingQuantifier(quantifier.to_string()),
                pos,
            ));
        };

        let body = match operand {
            Element {
                node: Node::Group(body),
                quantifier: None,
            } => body,
            Element {
                node: Node::Literal(text),
                quantifier: None,
            } => {
                let (head, last) = split_last_atom(text);
                if let Some(head) = head {
                    current.push(Element::new(Node::Literal(head)));
                }
                Sequence::new(vec![Element::new(Node::Literal(last))])
            }
            other => Sequence::new(vec![other]),
        };
        current.push(Element::repeated(body, quantifier));

        Ok(())
    }

    fn finish(mut self) -> PatternTree {
        while let Some((pos, body)) = self.open_groups.pop() {
            debug!("closing group opened at position {pos} at end of pattern");
            self.current().push(Element::new(Node::Group(body)));
        }
        PatternTree { root: self.root }
    }
}
