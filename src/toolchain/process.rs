//! Spawning external tools and streaming their output into the log.

use crate::error::{DocGenError, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, dispatcher, error, info};

/// Splits a byte stream into lines, holding a partial line across chunks.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, without the
    /// newline or a trailing carriage return.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let rest = self.pending.split_off(pos + 1);
            let line = std::mem::replace(&mut self.pending, rest);
            lines.push(decode(&line[..pos]));
        }
        lines
    }

    /// The trailing partial line, if the stream ended without a newline.
    pub fn finish(self) -> Option<String> {
        (!self.pending.is_empty()).then(|| decode(&self.pending))
    }
}

fn decode(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

fn log_line(step: &str, line: &str) {
    error!(target: "nodedocs::toolchain", "[{}] {}", step, line);
}

/// Log every line read from `stream` until it closes, on the caller's
/// subscriber.
fn stream_lines(step: String, mut stream: impl Read + Send + 'static) -> thread::JoinHandle<()> {
    let dispatch = dispatcher::get_default(|d| d.clone());
    thread::spawn(move || {
        dispatcher::with_default(&dispatch, || {
            let mut buffer = LineBuffer::new();
            let mut chunk = [0u8; 4096];
            loop {
                match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        for line in buffer.push(&chunk[..n]) {
                            log_line(&step, &line);
                        }
                    }
                }
            }
            if let Some(line) = buffer.finish() {
                log_line(&step, &line);
            }
        })
    })
}

/// Runs one external step to completion.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    pub poll_interval: Duration,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            cancel: None,
        }
    }
}

impl ProcessRunner {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            cancel: None,
        }
    }

    /// Kill the running child and fail with `Cancelled` once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Spawn `command`, stream its stdout and stderr line by line and poll
    /// until it exits. A nonzero exit code is an error.
    pub fn run(&self, step: &str, command: &mut Command) -> Result<()> {
        let program = PathBuf::from(command.get_program());
        info!("{}: running {}", step, program.display());
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DocGenError::Spawn {
                step: step.to_string(),
                program: program.clone(),
                source,
            })?;

        let readers: Vec<_> = [
            child.stdout.take().map(|s| stream_lines(step.to_string(), s)),
            child.stderr.take().map(|s| stream_lines(step.to_string(), s)),
        ]
        .into_iter()
        .flatten()
        .collect();

        let status = loop {
            if self.cancelled() {
                debug!("{}: cancelling", step);
                // The child may have exited in the meantime.
                let _ = child.kill();
                let _ = child.wait();
                // Readers are left detached; grandchildren may still hold the pipes.
                return Err(DocGenError::Cancelled {
                    step: step.to_string(),
                });
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(self.poll_interval),
                Err(source) => {
                    return Err(DocGenError::Wait {
                        step: step.to_string(),
                        program,
                        source,
                    })
                }
            }
        };
        for reader in readers {
            let _ = reader.join();
        }

        if !status.success() {
            return Err(DocGenError::ExitStatus {
                step: step.to_string(),
                code: status.code(),
            });
        }
        debug!("{}: finished", step);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_span_chunks() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"hel").is_empty());
        assert_eq!(buffer.push(b"lo\r\nwor"), ["hello"]);
        assert_eq!(buffer.push(b"ld\n\nlast"), ["world", ""]);
        assert_eq!(buffer.finish().as_deref(), Some("last"));
    }

    #[test]
    fn finish_without_partial_line() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.push(b"one\n"), ["one"]);
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let err = ProcessRunner::default()
            .run("convert", &mut Command::new("/nonexistent/nodedocs-convert"))
            .unwrap_err();
        assert!(matches!(err, DocGenError::Spawn { step, .. } if step == "convert"));
    }

    #[cfg(unix)]
    #[test]
    fn exit_codes_map_to_results() {
        let runner = ProcessRunner::new(Duration::from_millis(5));
        runner
            .run("ok", Command::new("sh").args(["-c", "echo out; echo err >&2"]))
            .unwrap();
        let err = runner
            .run("fail", Command::new("sh").args(["-c", "exit 3"]))
            .unwrap_err();
        assert!(matches!(err, DocGenError::ExitStatus { code: Some(3), .. }));
    }

    #[cfg(unix)]
    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    #[cfg(unix)]
    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[cfg(unix)]
    #[test]
    fn tool_output_is_logged_as_errors() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            ProcessRunner::new(Duration::from_millis(5))
                .run("convert", Command::new("sh").args(["-c", "echo page; printf tail >&2"]))
                .unwrap();
        });

        let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        for expected in ["[convert] page", "[convert] tail"] {
            assert!(
                log.lines().any(|l| l.contains("ERROR") && l.contains(expected)),
                "{expected} not logged as an error in:\n{log}"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn cancellation_kills_the_child() {
        let flag = Arc::new(AtomicBool::new(true));
        let runner = ProcessRunner::new(Duration::from_millis(5)).with_cancel(flag);
        let err = runner
            .run("site build", Command::new("sh").args(["-c", "exec sleep 30"]))
            .unwrap_err();
        assert!(matches!(err, DocGenError::Cancelled { .. }));
    }
}
