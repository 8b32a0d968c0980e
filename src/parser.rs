// parser.rs

use itertools::Itertools;
use std::ffi::{CString, NulError};

pub const BACKGROUND_MARKER: &str = "&";

/// Argument vector for one dispatch, borrowed from the line it was split from.
///
/// The vector's length is its terminator here. The NULL sentinel `execvp`
/// wants is added when the arguments are turned into C strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens<'a> {
    args: Vec<&'a str>,
    wait: bool,
}

impl<'a> Tokens<'a> {
    pub fn args(&self) -> &[&'a str] {
        &self.args
    }

    pub fn program(&self) -> Option<&'a str> {
        self.args.first().copied()
    }

    /// False when the line asked for background execution.
    pub fn wait(&self) -> bool {
        self.wait
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn to_cstrings(&self) -> Result<Vec<CString>, NulError> {
        self.args().iter().map(|arg| CString::new(*arg)).collect()
    }
}

/// Splits `line` on runs of whitespace. Every token that is exactly `&` is
/// dropped from the arguments and clears the wait flag, wherever it appears.
/// No quoting, escaping or expansion.
pub fn tokenize(line: &str) -> Tokens<'_> {
    let mut wait = true;
    let args = line
        .split_whitespace()
        .filter(|token| {
            if *token == BACKGROUND_MARKER {
                wait = false;
                return false;
            }
            true
        })
        .collect_vec();
    Tokens { args, wait }
}
