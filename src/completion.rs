// completion.rs

use crate::builtins::BUILTINS;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Completes the program name: built-in keywords plus executables on `PATH`.
/// Arguments are left alone.
#[derive(Default)]
pub struct ProgramCompleter;

impl ProgramCompleter {
    pub fn candidates(&self, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = BUILTINS
            .iter()
            .filter(|b| b.starts_with(prefix))
            .map(|b| b.to_string())
            .collect();
        if let Some(path_var) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&path_var) {
                collect_executables(&dir, prefix, &mut names);
            }
        }
        names.sort();
        names.dedup();
        names
    }
}

fn collect_executables(dir: &Path, prefix: &str, names: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }
        // follows symlinks
        let Ok(meta) = std::fs::metadata(entry.path()) else {
            continue;
        };
        if meta.is_file() && meta.permissions().mode() & 0o111 != 0 {
            names.push(name.to_string());
        }
    }
}

impl Completer for ProgramCompleter {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix.len() - prefix.trim_start().len();
        let word = &prefix[start..];
        if word.is_empty() || word.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        let completions = self
            .candidates(word)
            .into_iter()
            .map(|name| Pair {
                replacement: format!("{name} "),
                display: name,
            })
            .collect();
        Ok((start, completions))
    }
}

impl Hinter for ProgramCompleter {
    type Hint = String;
}

impl Highlighter for ProgramCompleter {}

impl Validator for ProgramCompleter {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

impl Helper for ProgramCompleter {}
