/// Stdin operator and exit-key listener.
///
/// One background thread owns stdin for the life of the process. Each line
/// it reads is either the configured exit key, which cancels the session
/// token, or an answer forwarded over a channel. Prompts in the core then
/// race that channel against the caller's cancel token (and a timeout for
/// the mode-switch prompt), so no read ever outlives an exit request.
///
/// Lines typed while no prompt is open are dropped when the next prompt
/// starts; an answer only counts for the prompt it was typed at.
use crossbeam_channel::{select, unbounded, Receiver};
use drivewatch_core::operator::Operator;
use drivewatch_core::CancelToken;
use std::io::{self, BufRead};
use std::time::Duration;
use tracing::debug;

/// What the listener makes of one input line.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Exit,
    Answer(String),
}

fn classify(raw: &str, exit_key: &str) -> Line {
    let answer = raw.trim();
    if !exit_key.is_empty() && answer.eq_ignore_ascii_case(exit_key) {
        Line::Exit
    } else {
        Line::Answer(answer.to_owned())
    }
}

pub struct StdinOperator {
    lines: Receiver<String>,
}

impl StdinOperator {
    /// Spawn the listener over process stdin.
    pub fn spawn_stdin(cancel_key: &str, cancel: CancelToken) -> io::Result<Self> {
        Self::spawn(io::BufReader::new(io::stdin()), cancel_key, cancel)
    }

    /// Spawn the listener over any line source. The exit key cancels
    /// `cancel`.
    pub fn spawn<R>(reader: R, cancel_key: &str, cancel: CancelToken) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = unbounded::<String>();
        let key = cancel_key.trim().to_owned();

        std::thread::Builder::new()
            .name("drivewatch-input".to_owned())
            .spawn(move || {
                for line in reader.lines() {
                    let Ok(line) = line else { break };
                    match classify(&line, &key) {
                        Line::Exit => {
                            debug!("Exit key received");
                            cancel.cancel();
                            break;
                        }
                        Line::Answer(answer) => {
                            if tx.send(answer).is_err() {
                                break;
                            }
                        }
                    }
                }
                debug!("Input listener stopped");
            })?;

        Ok(Self { lines: rx })
    }

    /// Drop answers typed before the current prompt opened.
    fn discard_pending(&self) {
        for stale in self.lines.try_iter() {
            debug!("Discarding input typed before the prompt: {stale:?}");
        }
    }
}

impl Operator for StdinOperator {
    fn read_token(&mut self, cancel: &CancelToken) -> Option<String> {
        self.discard_pending();
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            select! {
                recv(self.lines) -> line => match line {
                    Ok(line) if line.is_empty() => continue,
                    Ok(line) => return Some(line),
                    Err(_) => return None,
                },
                recv(cancel.receiver()) -> _ => return None,
            }
        }
    }

    fn read_line_timeout(&mut self, timeout: Duration, cancel: &CancelToken) -> Option<String> {
        self.discard_pending();
        if cancel.is_cancelled() {
            return None;
        }
        select! {
            recv(self.lines) -> line => line.ok(),
            recv(cancel.receiver()) -> _ => None,
            default(timeout) => None,
        }
    }
}
