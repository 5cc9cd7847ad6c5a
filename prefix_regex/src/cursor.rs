use std::iter::Peekable;
use std::str::Chars;

pub(crate) struct Cursor<'a> {
    data: Peekable<Chars<'a>>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// `offset` is added to every reported position, so errors point into
    /// the caller's pattern even when a prefix was stripped before scanning.
    pub fn new(data: &'a str, offset: usize) -> Self {
        Self {
            data: data.chars().peekable(),
            pos: offset,
        }
    }

    pub fn next(&mut self) -> Option<char> {
        let c = self.data.next()?;
        self.pos += 1;
        Some(c)
    }

    pub fn next_if(&mut self, pred: impl FnOnce(char) -> bool) -> Option<char> {
        match self.data.peek() {
            Some(&c) if pred(c) => self.next(),
            _ => None,
        }
    }

    pub fn next_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut buf = String::with_capacity(8);

        while let Some(c) = self.next_if(&mut pred) {
            buf.push(c);
        }

        buf
    }

    /// Consumes exactly `n` chars matching `pred`, or nothing at all.
    pub fn next_exact(&mut self, n: usize, pred: impl Fn(char) -> bool) -> Option<String> {
        let candidate: String = self.data.clone().take(n).collect();
        if candidate.chars().count() == n && candidate.chars().all(pred) {
            for _ in 0..n {
                self.next();
            }
            Some(candidate)
        } else {
            None
        }
    }

    pub fn peek(&mut self) -> Option<&char> {
        self.data.peek()
    }

    /// A detached copy to scan ahead with; `self` does not move.
    pub fn lookahead(&self) -> Cursor<'a> {
        Cursor {
            data: self.data.clone(),
            pos: self.pos,
        }
    }

    pub fn get_position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_start_at_offset() {
        // given
        let mut cursor = Cursor::new("ab", 1);

        // when
        cursor.next();

        // then
        assert_eq!(cursor.get_position(), 2);
        assert_eq!(cursor.peek(), Some(&'b'));
    }

    #[test]
    fn next_exact_is_all_or_nothing() {
        // given
        let mut cursor = Cursor::new("4z", 0);

        // when
        let res = cursor.next_exact(2, |c| c.is_ascii_hexdigit());

        // then
        assert_eq!(res, None);
        assert_eq!(cursor.get_position(), 0);
        assert_eq!(cursor.next_exact(1, |c| c.is_ascii_hexdigit()), Some("4".to_string()));
    }

    #[test]
    fn lookahead_does_not_move_cursor() {
        // given
        let mut cursor = Cursor::new("{12}", 0);

        // when
        let mut ahead = cursor.lookahead();
        ahead.next();
        let digits = ahead.next_while(|c| c.is_ascii_digit());

        // then
        assert_eq!(digits, "12");
        assert_eq!(ahead.get_position(), 3);
        assert_eq!(cursor.get_position(), 0);
    }
}
