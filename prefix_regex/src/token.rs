#[cfg(test)]
use serde::Serialize;

use crate::cursor::Cursor;
use crate::error::{MalformedPatternError, MalformedPatternKind};
use crate::tree::Quantifier;
use log::debug;

/// Characters that end a literal run.
const RUN_BREAKERS: &str = ".?*+^${[()\\";

/// Escapes the engine knows and that mean the same thing as in the
/// browser-flavored patterns this crate is fed.
const ENGINE_ESCAPES: &str = "dDwWsSbBnrtfv";

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) enum Token {
    /// Engine-ready literal text: a run of plain characters or one escape.
    Literal(String),
    Dot,
    /// A terminated bracket expression, engine-ready.
    Class(String),
    GroupOpen,
    GroupClose,
    Quantifier(Quantifier),
}

/// One escape sequence: `source` is what was read after the backslash,
/// `text` is the engine-ready rewrite.
struct Escape {
    source: String,
    text: String,
}

pub(crate) struct Lexer<'a> {
    cursor: Cursor<'a>,
    res: Vec<(usize, Token)>,
}

impl<'a> Lexer<'a> {
    /// Scans `pattern` into position-tagged tokens. `offset` is the char
    /// position of `pattern` inside the caller's original text.
    pub fn tokenize(
        pattern: &'a str,
        offset: usize,
    ) -> Result<Vec<(usize, Token)>, MalformedPatternError> {
        let mut lexer = Self {
            cursor: Cursor::new(pattern, offset),
            res: Vec::with_capacity(pattern.len() / 2 + 1),
        };

        lexer.analyze()?;

        Ok(lexer.res)
    }

    fn analyze(&mut self) -> Result<(), MalformedPatternError> {
        while let Some(&c) = self.cursor.peek() {
            let pos = self.cursor.get_position();
            let token = match c {
                '[' => self.read_class(),
                '\\' => self.read_escape()?,
                '(' => self.read_group_open(),
                ')' => {
                    self.cursor.next();
                    Token::GroupClose
                }
                '?' | '*' | '+' => self.read_symbol_quantifier(),
                '{' => match self.read_counted_quantifier()? {
                    Some(quantifier) => Token::Quantifier(quantifier),
                    None => {
                        self.cursor.next();
                        debug!("'{{' at position {pos} starts no quantifier, read as literal");
                        Token::Literal("\\{".to_string())
                    }
                },
                '.' => {
                    self.cursor.next();
                    Token::Dot
                }
                '^' | '$' => {
                    self.cursor.next();
                    debug!("dropping inner anchor '{c}' at position {pos}");
                    continue;
                }
                _ => self.read_run(),
            };
            self.res.push((pos, token));
        }
        Ok(())
    }

    fn read_run(&mut self) -> Token {
        let raw = self.cursor.next_while(|c| !RUN_BREAKERS.contains(c));
        let mut text = String::with_capacity(raw.len());

        for c in raw.chars() {
            if matches!(c, ']' | '}') {
                text.push('\\');
            }
            text.push(c);
        }

        Token::Literal(text)
    }

    fn read_group_open(&mut self) -> Token {
        self.cursor.next();
        // (?:  (?=  (?!  and a bare (? all open an ordinary group
        if self.cursor.next_if(|c| c == '?').is_some() {
            self.cursor.next_if(|c| matches!(c, ':' | '=' | '!'));
        }
        Token::GroupOpen
    }

    fn skip_lazy_marker(&mut self) {
        self.cursor.next_if(|c| c == '?');
    }

    fn read_symbol_quantifier(&mut self) -> Token {
        let quantifier = match self.cursor.next() {
            Some('?') => Quantifier::new(0, Some(1)),
            Some('*') => Quantifier::new(0, None),
            _ => Quantifier::new(1, None),
        };
        self.skip_lazy_marker();
        Token::Quantifier(quantifier)
    }

    /// `{n}`, `{n,}` or `{n,m}`. Returns `Ok(None)` without consuming
    /// anything when the brace does not open one of these forms.
    fn read_counted_quantifier(&mut self) -> Result<Option<Quantifier>, MalformedPatternError> {
        let pos = self.cursor.get_position();
        let mut ahead = self.cursor.lookahead();
        ahead.next();

        let min_str = ahead.next_while(|c| c.is_ascii_digit());
        if min_str.is_empty() {
            return Ok(None);
        }
        let max_str = if ahead.next_if(|c| c == ',').is_some() {
            Some(ahead.next_while(|c| c.is_ascii_digit()))
        } else {
            None
        };
        if ahead.next_if(|c| c == '}').is_none() {
            return Ok(None);
        }
        self.cursor = ahead;

        let min = Self::parse_bound(&min_str, pos)?;
        let max = match max_str {
            None => Some(min),
            Some(s) if s.is_empty() => None,
            Some(s) => Some(Self::parse_bound(&s, pos)?),
        };
        if let Some(max) = max {
            if min > max {
                return Err(MalformedPatternError::new(
                    MalformedPatternKind::QuantifierMinGreaterMax { min, max },
                    pos,
                ));
            }
        }

        self.skip_lazy_marker();
        Ok(Some(Quantifier::new(min, max)))
    }

    fn parse_bound(digits: &str, pos: usize) -> Result<u32, MalformedPatternError> {
        digits.parse::<u32>().map_err(|_| {
            MalformedPatternError::new(
                MalformedPatternKind::QuantifierOutOfRange(digits.to_string()),
                pos,
            )
        })
    }

    fn read_escape(&mut self) -> Result<Token, MalformedPatternError> {
        let pos = self.cursor.get_position();
        self.cursor.next();

        let text = match self.cursor.peek().copied() {
            None => {
                debug!("trailing backslash at position {pos} read as literal backslash");
                "\\\\".to_string()
            }
            Some('1'..='9') => {
                let digits = self.cursor.next_while(|c| c.is_ascii_digit());
                return Err(MalformedPatternError::new(
                    MalformedPatternKind::UnsupportedBackreference(digits),
                    pos,
                ));
            }
            Some(_) => self.convert_escape(false).text,
        };

        Ok(Token::Literal(text))
    }

    /// Reads what follows a backslash and rewrites it into syntax the engine
    /// accepts. Inside a class `\b` is a backspace and `\1`..`\7` start an
    /// octal escape, the way browsers read them.
    fn convert_escape(&mut self, in_class: bool) -> Escape {
        let Some(c) = self.cursor.next() else {
            return Escape {
                source: String::new(),
                text: "\\\\".to_string(),
            };
        };

        let mut source = String::from(c);
        let text = match c {
            '0'..='7' => {
                let code = self.read_octal(c, &mut source);
                format!("\\x{{{code:02X}}}")
            }
            'x' => match self.cursor.next_exact(2, |c| c.is_ascii_hexdigit()) {
                Some(hex) => {
                    source.push_str(&hex);
                    format!("\\x{hex}")
                }
                None => "x".to_string(),
            },
            'u' => match self.cursor.next_exact(4, |c| c.is_ascii_hexdigit()) {
                Some(hex) => {
                    source.push_str(&hex);
                    format!("\\u{hex}")
                }
                None => "u".to_string(),
            },
            'c' => match self.cursor.next_if(|c| c.is_ascii_alphabetic()) {
                Some(letter) => {
                    source.push(letter);
                    format!("\\x{{{:02X}}}", letter as u32 % 32)
                }
                None => "\\\\c".to_string(),
            },
            'b' if in_class => "\\x08".to_string(),
            'B' if in_class => "B".to_string(),
            c if ENGINE_ESCAPES.contains(c) => format!("\\{c}"),
            c => regex::escape(c.encode_utf8(&mut [0; 4])),
        };

        Escape { source, text }
    }

    /// Legacy octal: up to three digits when the first is `0`..`3`, up to
    /// two otherwise, so the value never exceeds `\377`.
    fn read_octal(&mut self, first: char, source: &mut String) -> u32 {
        let max_digits = if first <= '3' { 3 } else { 2 };
        let mut digits = String::from(first);

        while digits.len() < max_digits {
            match self.cursor.next_if(|c| matches!(c, '0'..='7')) {
                Some(d) => {
                    digits.push(d);
                    source.push(d);
                }
                None => break,
            }
        }

        u32::from_str_radix(&digits, 8).unwrap_or_default()
    }

    /// Reads a bracket expression. An unterminated one swallows the rest of
    /// the pattern and comes back as escaped literal text.
    fn read_class(&mut self) -> Token {
        let pos = self.cursor.get_position();
        let mut source = String::with_capacity(16);
        let mut raw = String::with_capacity(16);

        self.cursor.next();
        source.push('[');
        raw.push('[');
        let negated = self.cursor.next_if(|c| c == '^').is_some();
        if negated {
            source.push('^');
            raw.push('^');
        }
        // `[]` never matches and `[^]` matches any char
        if self.cursor.next_if(|c| c == ']').is_some() {
            let class = if negated { r"[\s\S]" } else { r"[^\s\S]" };
            return Token::Class(class.to_string());
        }

        loop {
            match self.cursor.next() {
                None => {
                    debug!("unterminated class at position {pos} read as literal text");
                    return Token::Literal(regex::escape(&source));
                }
                Some(']') => {
                    raw.push(']');
                    return Token::Class(raw);
                }
                Some('\\') => {
                    let escape = self.convert_escape(true);
                    source.push('\\');
                    source.push_str(&escape.source);
                    raw.push_str(&escape.text);
                }
                Some(c) => {
                    source.push(c);
                    // the engine reads these as nested classes and set operators
                    if matches!(c, '[' | '&' | '~') {
                        raw.push('\\');
                    }
                    raw.push(c);
                }
            }
        }
    }
}

/// Byte offsets just past each atom of engine-ready literal text. An atom is
/// a single char or a whole escape sequence, so slicing at these offsets
/// never cuts an escape in half.
pub(crate) fn atom_ends(text: &str) -> Vec<usize> {
    let mut ends = Vec::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some((_, 'x')) if chars.peek().map(|&(_, c)| c) == Some('{') => {
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                    }
                }
                Some((_, 'x')) => {
                    chars.nth(1);
                }
                Some((_, 'u')) => {
                    chars.nth(3);
                }
                _ => {}
            }
        }
        ends.push(chars.peek().map_or(text.len(), |&(i, _)| i));
    }

    ends
}
