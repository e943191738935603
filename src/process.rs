//! Running local processes, optionally with a bounded wait.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::{Duration, Instant};

use failure::Fail;

/// How often a bounded wait polls the child for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The captured result of a process that ran to completion.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Fail)]
pub enum ProcessError {
    #[fail(display = "{} command not found", program)]
    NotFound { program: String },

    #[fail(display = "failed to run {}: {}", program, error)]
    Spawn {
        program: String,
        #[cause]
        error: io::Error,
    },

    #[fail(display = "{} did not exit within {:?}", program, timeout)]
    Timeout { program: String, timeout: Duration },

    #[fail(display = "error waiting for {}: {}", program, error)]
    Wait {
        program: String,
        #[cause]
        error: io::Error,
    },
}

/// Owns a running child. Dropping the guard kills and reaps the child if it is still running, so
/// no exit path of a bounded wait can leak a process.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        ChildGuard {
            child,
            reaped: false,
        }
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Map a spawn failure to a `ProcessError`, separating "not found" from everything else.
fn spawn_error(program: &str, error: io::Error) -> ProcessError {
    if error.kind() == io::ErrorKind::NotFound {
        ProcessError::NotFound {
            program: program.into(),
        }
    } else {
        ProcessError::Spawn {
            program: program.into(),
            error,
        }
    }
}

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Read `pipe` to EOF on a new thread and send its contents on `tx`. EOF only comes once every
/// process holding the write end has closed it, which may include the child's own children.
fn drain<R: Read + Send + 'static>(mut pipe: R, stream: Stream, tx: Sender<(Stream, String)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((stream, String::from_utf8_lossy(&buf).into_owned()));
    });
}

/// Run `cmd` to completion and capture its output. Blocks for as long as the process runs.
pub fn run_captured(cmd: &mut Command) -> Result<Captured, ProcessError> {
    let program = program_name(cmd);

    log::debug!("Running {:?}", cmd);

    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| spawn_error(&program, e))?;

    Ok(Captured {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run `cmd`, waiting at most `timeout` for it to exit and for its output to be complete. On
/// timeout the child is killed and reaped before `ProcessError::Timeout` is returned. A child that
/// exits in time but leaves a process behind holding its stdout or stderr also times out.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Captured, ProcessError> {
    let program = program_name(cmd);

    log::debug!("Running {:?} with a timeout of {:?}", cmd, timeout);

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map(ChildGuard::new)
        .map_err(|e| spawn_error(&program, e))?;

    // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
    let (tx, rx) = mpsc::channel();
    let mut pending = 0;
    if let Some(pipe) = child.child.stdout.take() {
        drain(pipe, Stream::Stdout, tx.clone());
        pending += 1;
    }
    if let Some(pipe) = child.child.stderr.take() {
        drain(pipe, Stream::Stderr, tx);
        pending += 1;
    }

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                return Err(ProcessError::Timeout { program, timeout });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(error) => return Err(ProcessError::Wait { program, error }),
        }
    };

    let mut captured = Captured {
        status,
        stdout: String::new(),
        stderr: String::new(),
    };
    for _ in 0..pending {
        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok((Stream::Stdout, out)) => captured.stdout = out,
            Ok((Stream::Stderr, err)) => captured.stderr = err,
            Err(_) => return Err(ProcessError::Timeout { program, timeout }),
        }
    }

    Ok(captured)
}
