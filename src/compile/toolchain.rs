//! Bounded subprocess execution and compiler diagnostics.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Lines of raw output kept when no LaTeX error lines are found.
const TAIL_LINES: usize = 20;

/// What a finished subprocess produced.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut all = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !all.is_empty() && !all.ends_with('\n') {
                all.push('\n');
            }
            all.push_str(&self.stderr);
        }
        all
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` did not finish within {}s", timeout.as_secs_f32())]
    TimedOut { program: String, timeout: Duration },
    #[error("waiting for `{program}` failed: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl RunError {
    /// The executable does not exist (as opposed to existing and failing to start).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Run `cmd` to completion with stdin closed and output captured, killing it after `timeout`.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<ToolOutput, RunError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    log::debug!("running {cmd:?} (timeout {}s)", timeout.as_secs_f32());

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| RunError::Spawn {
            program: program.clone(),
            source,
        })?;

    // Drain pipes on their own threads so a chatty child never blocks on a full pipe.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match wait_until(&mut child, Instant::now() + timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            log::warn!("`{program}` timed out after {}s, killing it", timeout.as_secs_f32());
            let _ = child.kill();
            let _ = child.wait();
            return Err(RunError::TimedOut { program, timeout });
        }
        Err(source) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RunError::Wait { program, source });
        }
    };

    Ok(ToolOutput {
        status,
        stdout: join(stdout),
        stderr: join(stderr),
    })
}

fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    let mut pipe = pipe?;
    Some(thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }))
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Pull the useful part out of LaTeX compiler output.
///
/// LaTeX reports errors as a `! message` line followed later by an `l.<n> context` line.
/// Those lines are returned when present; otherwise the last lines of the output.
pub fn extract_diagnostics(output: &str) -> String {
    let errors: Vec<&str> = output
        .lines()
        .map(str::trim_end)
        .filter(|line| line.starts_with('!') || is_line_marker(line))
        .collect();
    if !errors.is_empty() {
        return errors.join("\n");
    }

    let lines: Vec<&str> = output
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    lines[lines.len().saturating_sub(TAIL_LINES)..].join("\n")
}

/// `l.12 \foo` style context lines.
fn is_line_marker(line: &str) -> bool {
    line.strip_prefix("l.")
        .map(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(false)
}
