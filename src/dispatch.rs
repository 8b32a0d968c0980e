// dispatch.rs

use crate::error::DispatchError;
use crate::parser::Tokens;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{execvp, fork, write, ForkResult, Pid};
use std::ffi::CString;
use std::io::Write;
use tracing::{debug, warn};

/// Exit status of a child whose `execvp` failed.
pub const EXEC_FAILURE_STATUS: i32 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// No program name, nothing was spawned.
    Skipped,
    /// A foreground child ran to completion.
    Finished(WaitStatus),
    /// A background child was started and left running.
    Background(Pid),
}

/// Runs an argument vector as a separate program.
pub trait Dispatch {
    fn dispatch(&mut self, tokens: &Tokens<'_>) -> Result<Dispatched, DispatchError>;

    /// Collects background children that have finished. Does nothing unless
    /// the implementation tracks them.
    fn reap(&mut self) {}
}

/// fork + execvp dispatcher.
#[derive(Debug, Default)]
pub struct ProcessDispatcher {
    track_background: bool,
    background: Vec<Pid>,
}

impl ProcessDispatcher {
    pub fn new(track_background: bool) -> Self {
        Self {
            track_background,
            background: Vec::new(),
        }
    }

    fn spawn(&self, program: &str, tokens: &Tokens<'_>) -> Result<Pid, DispatchError> {
        // Everything the child touches is prepared before the fork.
        let args = tokens.to_cstrings()?;
        let failure = format!("Error executing command {program}: ");
        std::io::stdout().flush().ok();
        match unsafe { fork() } {
            Ok(ForkResult::Child) => exec_child(&args, failure.as_bytes()),
            Ok(ForkResult::Parent { child }) => Ok(child),
            Err(errno) => Err(DispatchError::Fork(errno)),
        }
    }
}

impl Dispatch for ProcessDispatcher {
    fn dispatch(&mut self, tokens: &Tokens<'_>) -> Result<Dispatched, DispatchError> {
        let Some(program) = tokens.program() else {
            return Ok(Dispatched::Skipped);
        };
        let child = self.spawn(program, tokens)?;
        debug!(pid = child.as_raw(), program, wait = tokens.wait(), "spawned");
        if !tokens.wait() {
            if self.track_background {
                self.background.push(child);
            }
            return Ok(Dispatched::Background(child));
        }
        let status = wait_for(child)?;
        debug!(?status, "foreground process finished");
        Ok(Dispatched::Finished(status))
    }

    fn reap(&mut self) {
        self.background.retain(|&pid| match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => true,
            Ok(status) => {
                debug!(?status, "reaped background process");
                false
            }
            Err(err) => {
                warn!(pid = pid.as_raw(), %err, "cannot reap background process");
                false
            }
        });
    }
}

/// Child side of the fork. Never returns into interpreter code: either the
/// image is replaced or the process exits on the spot, skipping destructors
/// and stdio buffers shared with the parent.
fn exec_child(args: &[CString], failure: &[u8]) -> ! {
    let errno = match args.first() {
        Some(program) => match execvp(program.as_c_str(), args) {
            Ok(never) => match never {},
            Err(errno) => errno,
        },
        None => Errno::ENOENT,
    };
    let _ = write(libc::STDERR_FILENO, failure);
    let _ = write(libc::STDERR_FILENO, errno.desc().as_bytes());
    let _ = write(libc::STDERR_FILENO, b"\n");
    unsafe { libc::_exit(EXEC_FAILURE_STATUS) }
}

/// Blocks until `child` itself terminates. Interruptions are retried and other
/// children are never collected here.
fn wait_for(child: Pid) -> Result<WaitStatus, DispatchError> {
    loop {
        match waitpid(child, None) {
            Ok(status) if status.pid() == Some(child) => return Ok(status),
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(source) => {
                return Err(DispatchError::Wait {
                    pid: child.as_raw(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenize;
    use nix::sys::signal::{kill, Signal};
    use std::time::{Duration, Instant};

    #[test]
    fn empty_tokens_are_skipped() {
        let mut dispatcher = ProcessDispatcher::default();
        assert_eq!(dispatcher.dispatch(&tokenize("")).unwrap(), Dispatched::Skipped);
    }

    #[test]
    fn foreground_child_is_awaited() {
        let mut dispatcher = ProcessDispatcher::default();
        match dispatcher.dispatch(&tokenize("true")).unwrap() {
            Dispatched::Finished(WaitStatus::Exited(_, 0)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
        match dispatcher.dispatch(&tokenize("false")).unwrap() {
            Dispatched::Finished(WaitStatus::Exited(_, 1)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_program_child_exits_on_its_own() {
        let mut dispatcher = ProcessDispatcher::default();
        match dispatcher.dispatch(&tokenize("dsh-no-such-program-here --flag")).unwrap() {
            Dispatched::Finished(WaitStatus::Exited(_, EXEC_FAILURE_STATUS)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn background_child_is_tracked_and_reaped() {
        let mut dispatcher = ProcessDispatcher::new(true);
        let pid = match dispatcher.dispatch(&tokenize("sleep 0 &")).unwrap() {
            Dispatched::Background(pid) => pid,
            other => panic!("unexpected result: {other:?}"),
        };
        assert_eq!(dispatcher.background, vec![pid]);
        let deadline = Instant::now() + Duration::from_secs(10);
        while !dispatcher.background.is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
            dispatcher.reap();
        }
        assert!(dispatcher.background.is_empty());
    }

    #[test]
    fn untracked_background_child_is_not_remembered() {
        let mut dispatcher = ProcessDispatcher::new(false);
        let pid = match dispatcher.dispatch(&tokenize("true &")).unwrap() {
            Dispatched::Background(pid) => pid,
            other => panic!("unexpected result: {other:?}"),
        };
        assert!(dispatcher.background.is_empty());
        let _ = waitpid(pid, None);
    }

    #[test]
    fn background_dispatch_does_not_block() {
        let mut dispatcher = ProcessDispatcher::new(false);
        let started = Instant::now();
        let pid = match dispatcher.dispatch(&tokenize("sleep 5 &")).unwrap() {
            Dispatched::Background(pid) => pid,
            other => panic!("unexpected result: {other:?}"),
        };
        assert!(started.elapsed() < Duration::from_secs(1));
        kill(pid, Signal::SIGKILL).unwrap();
        assert!(matches!(
            waitpid(pid, None).unwrap(),
            WaitStatus::Signaled(_, Signal::SIGKILL, _)
        ));
    }

    #[test]
    fn foreground_wait_outlasts_background_exits() {
        let mut dispatcher = ProcessDispatcher::new(false);
        let background = match dispatcher.dispatch(&tokenize("sleep 0 &")).unwrap() {
            Dispatched::Background(pid) => pid,
            other => panic!("unexpected result: {other:?}"),
        };
        // no literal whitespace, so the script stays one argument
        let script = "sh -c sleep${IFS}0.3;exit${IFS}3";
        match dispatcher.dispatch(&tokenize(script)).unwrap() {
            Dispatched::Finished(WaitStatus::Exited(pid, 3)) => assert_ne!(pid, background),
            other => panic!("unexpected result: {other:?}"),
        }
        // the foreground wait left the background child for us to collect
        assert!(matches!(
            waitpid(background, None).unwrap(),
            WaitStatus::Exited(pid, 0) if pid == background
        ));
    }

    #[test]
    fn nul_argument_is_not_fatal() {
        let mut dispatcher = ProcessDispatcher::default();
        let err = dispatcher.dispatch(&tokenize("echo a\0b")).unwrap_err();
        assert!(matches!(err, DispatchError::Nul(_)));
        assert!(!err.is_fatal());
    }
}
