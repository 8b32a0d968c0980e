// builtins.rs

use crate::error::HistoryError;
use crate::history::HistoryStore;

/// Keywords handled in-process. Both match only the entire line.
pub const BUILTINS: [&str; 2] = ["exit", "history"];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Builtin {
    Exit,
    History,
}

impl Builtin {
    pub fn from_line(line: &str) -> Option<Self> {
        match line {
            "exit" => Some(Builtin::Exit),
            "history" => Some(Builtin::History),
            _ => None,
        }
    }
}

/// A history recall request, `!!` or `!<n>`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Recall {
    Latest,
    /// 0-based logical index, already shifted down from what the user typed.
    Number(i64),
}

impl Recall {
    /// `!!` recalls the latest entry. Any other line starting with `!` is a
    /// numbered recall: a bare `!` means entry 1, otherwise the leading
    /// integer after the `!` is taken (no digits counts as 0) and shifted
    /// to 0-based.
    pub fn parse(line: &str) -> Option<Self> {
        if line == "!!" {
            return Some(Recall::Latest);
        }
        let rest = line.strip_prefix('!')?;
        if rest.is_empty() {
            return Some(Recall::Number(0));
        }
        Some(Recall::Number(leading_integer(rest).saturating_sub(1)))
    }

    pub fn resolve(self, history: &HistoryStore) -> Result<&str, HistoryError> {
        match self {
            Recall::Latest => history.recall_latest(),
            Recall::Number(index) => history.recall_by_number(index),
        }
    }
}

/// `atoi`-style prefix parse: leading whitespace, optional sign, then digits
/// up to the first non-digit. Saturates instead of overflowing.
fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add(i64::from(b - b'0')));
    if negative {
        -magnitude
    } else {
        magnitude
    }
}
