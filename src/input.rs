// input.rs

use crate::completion::ProgramCompleter;
use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Editor};
use std::io::{BufRead, IsTerminal, Write};

/// Where command lines come from. `Ok(None)` is end of input.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Interactive terminal input with line editing and tab completion.
pub struct EditorSource {
    editor: Editor<ProgramCompleter, DefaultHistory>,
}

impl EditorSource {
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .auto_add_history(false)
            .build();
        let mut editor = Editor::with_config(config).context("cannot set up line editor")?;
        editor.set_helper(Some(ProgramCompleter));
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err).context("cannot read input"),
        }
    }
}

/// Plain line reader for piped input.
pub struct StreamSource<R, W> {
    reader: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> StreamSource<R, W> {
    pub fn new(reader: R, prompt_out: W) -> Self {
        Self { reader, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineSource for StreamSource<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.prompt_out, "{prompt}")?;
        self.prompt_out.flush()?;
        let mut line = String::new();
        if self.reader.read_line(&mut line).context("cannot read input")? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }
}

/// Line editor on a terminal, plain reads otherwise.
pub fn open() -> Result<Box<dyn LineSource>> {
    if std::io::stdin().is_terminal() {
        Ok(Box::new(EditorSource::new()?))
    } else {
        Ok(Box::new(StreamSource::new(
            std::io::stdin().lock(),
            std::io::stdout(),
        )))
    }
}
