// repl.rs

use crate::builtins::{Builtin, Recall};
use crate::config::Config;
use crate::dispatch::Dispatch;
use crate::history::HistoryStore;
use crate::input::LineSource;
use crate::parser::tokenize;
use anyhow::Result;
use std::io::{ErrorKind, Write};
use tracing::{debug, warn};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Exit,
}

/// What an accepted line turns into once it has been recorded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Action {
    Run,
    ListHistory,
    /// A failed recall: recorded, never run.
    Skip,
}

/// All state that outlives a single loop iteration.
pub struct Shell<D, W> {
    config: Config,
    history: HistoryStore,
    dispatcher: D,
    out: W,
}

impl<D: Dispatch, W: Write> Shell<D, W> {
    pub fn new(config: Config, dispatcher: D, out: W) -> Self {
        let history = HistoryStore::new(config.history_capacity);
        Self {
            config,
            history,
            dispatcher,
            out,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Reads and handles lines until `exit`, end of input, or a fatal error.
    pub fn run(&mut self, source: &mut dyn LineSource) -> Result<()> {
        loop {
            if self.config.reap_background {
                self.dispatcher.reap();
            }
            let Some(line) = source.read_line(&self.config.prompt)? else {
                debug!(newest = ?self.history().count(), "end of input");
                return Ok(());
            };
            if self.handle_line(&line)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// One loop iteration: rewrite through the recall grammar, route
    /// built-ins, record the line, then list history or run the command.
    pub fn handle_line(&mut self, raw: &str) -> Result<Flow> {
        let line = self.bounded(raw.trim()).trim_end();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        if Builtin::from_line(line) == Some(Builtin::Exit) {
            return Ok(Flow::Exit);
        }

        let mut action = Action::Run;
        let line = match Recall::parse(line) {
            Some(recall) => match recall.resolve(&self.history) {
                Ok(recalled) => {
                    debug!(?recall, recalled, "recalled from history");
                    let recalled = recalled.to_string();
                    self.say(&recalled)?;
                    recalled
                }
                Err(err) => {
                    self.say(&err.to_string())?;
                    action = Action::Skip;
                    line.to_string()
                }
            },
            None => line.to_string(),
        };
        if action == Action::Run && Builtin::from_line(&line) == Some(Builtin::History) {
            action = Action::ListHistory;
        }

        self.history.append(line.as_str());

        match action {
            Action::Skip => {}
            Action::ListHistory => self.print_history()?,
            Action::Run => {
                let tokens = tokenize(&line);
                if tokens.is_empty() {
                    debug!(line = line.as_str(), "nothing to run");
                    return Ok(Flow::Continue);
                }
                self.out.flush()?;
                match self.dispatcher.dispatch(&tokens) {
                    Ok(outcome) => debug!(?outcome, "dispatched"),
                    Err(err) if err.is_fatal() => return Err(err.into()),
                    Err(err) => {
                        warn!(%err, "command failed");
                        self.say(&err.to_string())?;
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn print_history(&mut self) -> Result<()> {
        match self.history.list_recent(self.config.history_list_limit) {
            Ok(entries) => {
                let mut listing = String::from("Command history:");
                for (number, line) in entries {
                    listing.push_str(&format!("\n{number:>5}  {line}"));
                }
                self.say(&listing)
            }
            Err(err) => self.say(&err.to_string()),
        }
    }

    fn bounded<'a>(&self, line: &'a str) -> &'a str {
        match line.char_indices().nth(self.config.max_line) {
            Some((cut, _)) => {
                warn!(max_line = self.config.max_line, "input line truncated");
                &line[..cut]
            }
            None => line,
        }
    }

    /// Writes one line of interpreter output. A closed stdout is not an error.
    fn say(&mut self, text: &str) -> Result<()> {
        match writeln!(self.out, "{text}") {
            Err(ref e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
            other => Ok(other?),
        }
    }
}
