#![forbid(unsafe_code)]

//! Console primitives: line prompts, the countdown display, notifications.
//!
//! Every blocking point goes through `tokio::select!` with `ctrl_c`, so an
//! interrupt is returned as a value (`Line::Cancelled`, `WaitOutcome::Interrupted`)
//! instead of tearing the process down mid-write.

use std::io::Write as _;
use std::time::Duration;

use anyhow::Context as _;
use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use tokio::io::{AsyncBufReadExt as _, BufReader, Lines, Stdin};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Entry(String),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    Interrupted,
}

#[derive(Debug)]
pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `msg`, then wait for one input line. Ctrl-C and end of input
    /// both come back as [`Line::Cancelled`].
    pub async fn prompt(&mut self, msg: &str) -> anyhow::Result<Line> {
        print!("{msg}");
        std::io::stdout().flush().context("failed to flush stdout")?;

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                Ok(Line::Cancelled)
            }
            line = self.lines.next_line() => {
                match line.context("failed to read stdin")? {
                    Some(s) => Ok(Line::Entry(s.trim().to_owned())),
                    None => Ok(Line::Cancelled),
                }
            }
        }
    }
}

/// Count down `seconds` on a single redrawn terminal line.
pub async fn countdown(label: &str, seconds: u64) -> anyhow::Result<WaitOutcome> {
    let mut out = std::io::stdout();
    let mut remaining = seconds;
    loop {
        execute!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))
            .context("failed to redraw countdown")?;
        write!(out, "{label} {:02}:{:02}", remaining / 60, remaining % 60)?;
        out.flush()?;

        if remaining == 0 {
            writeln!(out)?;
            return Ok(WaitOutcome::Completed);
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                writeln!(out)?;
                return Ok(WaitOutcome::Interrupted);
            }
            () = tokio::time::sleep(Duration::from_secs(1)) => {
                remaining -= 1;
            }
        }
    }
}

/// Fire-and-forget status notification.
pub fn notify(bell: bool, message: &str) {
    if bell {
        print!("\x07");
    }
    println!("*** {message}");
}

#[must_use]
pub fn rule(width: usize) -> String {
    "#".repeat(width)
}
