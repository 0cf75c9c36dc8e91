#![forbid(unsafe_code)]

//! The work/rest cycle engine.
//!
//! One invocation drives repeated pomodoros against a single task:
//! settle parameters, work, ask about continuing, rest, loop or leave.
//! Interrupting a work countdown discards the interval and re-prompts the
//! parameters; interrupting a rest goes straight back to work with the same
//! parameters. Cancelling a prompt ends the invocation and hands the tally
//! collected so far back to the caller.

use time::OffsetDateTime;

use crate::config::{CycleConfig, UiConfig};
use crate::session::log::{CycleRecord, SessionLog};
use crate::term::{self, Console, Line, WaitOutcome};
use crate::todo::model::Task;

/// Answer to "is the To-Do finished?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Done,
    Paused,
}

/// One invocation's contribution; the caller accumulates across invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTally {
    pub completion: Completion,
    pub cycles: u32,
    pub worked_secs: u64,
}

impl CycleTally {
    const fn empty() -> Self {
        Self {
            completion: Completion::Paused,
            cycles: 0,
            worked_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The user chose to stop after a rest.
    Finished(CycleTally),
    /// A prompt was cancelled mid-engine; records already written stand.
    Cancelled(CycleTally),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LengthChoice {
    Short,
    Long,
    Minutes(u32),
    Keep,
    Invalid,
}

fn parse_length_choice(input: &str) -> LengthChoice {
    let input = input.trim();
    if input.is_empty() {
        return LengthChoice::Keep;
    }
    if input.eq_ignore_ascii_case("s") {
        return LengthChoice::Short;
    }
    if input.eq_ignore_ascii_case("d") {
        return LengthChoice::Long;
    }
    match input.parse::<u32>() {
        Ok(m) if m > 0 => LengthChoice::Minutes(m),
        _ => LengthChoice::Invalid,
    }
}

/// Cap a measured duration at 120% of the nominal length, absorbing
/// scheduling slack without letting a suspended machine inflate the totals.
#[must_use]
pub fn clamp_duration(measured_secs: u64, nominal_secs: u64) -> u64 {
    measured_secs.min(nominal_secs + nominal_secs / 5)
}

/// A double-length pomodoro counts twice.
#[must_use]
pub fn cycle_increment(work_minutes: u32) -> u32 {
    work_minutes / 25
}

fn elapsed_secs(start: OffsetDateTime, stop: OffsetDateTime) -> u64 {
    let secs = (stop - start).whole_seconds();
    u64::try_from(secs).unwrap_or(0)
}

enum Settled {
    Ready,
    Cancelled,
}

async fn settle_params(
    console: &mut Console,
    cfg: &CycleConfig,
    work_minutes: &mut u32,
    endpoint: &mut String,
) -> anyhow::Result<Settled> {
    let q1 = format!(
        "Single ({} min) or double ({} min) Pomodoro? [S/D/minutes, Enter keeps {} min] ",
        cfg.short_minutes, cfg.long_minutes, work_minutes
    );
    loop {
        match console.prompt(&q1).await? {
            Line::Cancelled => return Ok(Settled::Cancelled),
            Line::Entry(input) => match parse_length_choice(&input) {
                LengthChoice::Keep => break,
                LengthChoice::Short => {
                    *work_minutes = cfg.short_minutes;
                    break;
                }
                LengthChoice::Long => {
                    *work_minutes = cfg.long_minutes;
                    break;
                }
                LengthChoice::Minutes(m) => {
                    *work_minutes = m;
                    break;
                }
                LengthChoice::Invalid => {
                    println!("You typed the wrong key - please try again");
                }
            },
        }
    }

    let q2 = format!(
        "Endpoint for this Pomodoro (default \"{endpoint}\"). Enter starts the countdown: "
    );
    match console.prompt(&q2).await? {
        Line::Cancelled => Ok(Settled::Cancelled),
        Line::Entry(input) => {
            if !input.is_empty() {
                *endpoint = input;
            }
            Ok(Settled::Ready)
        }
    }
}

pub async fn run_cycles(
    console: &mut Console,
    cfg: &CycleConfig,
    ui: &UiConfig,
    log: &SessionLog,
    task: &Task,
) -> anyhow::Result<CycleOutcome> {
    // Identifiers are assigned at startup, before any task can reach here.
    let tdid = task.tdid.clone().unwrap_or_default();

    let mut tally = CycleTally::empty();
    let mut work_minutes = cfg.long_minutes;
    let mut endpoint = "Not specified".to_owned();
    let mut skip_settle = false;

    println!("{task}");
    loop {
        if !skip_settle {
            match settle_params(console, cfg, &mut work_minutes, &mut endpoint).await? {
                Settled::Ready => {}
                Settled::Cancelled => return Ok(CycleOutcome::Cancelled(tally)),
            }
        }
        skip_settle = false;

        println!("Now working on: {}", task.text);
        let nominal = u64::from(work_minutes) * 60;
        let start = OffsetDateTime::now_utc();
        let work = term::countdown("Working", nominal).await?;
        if work == WaitOutcome::Interrupted {
            println!("Interrupting");
            continue;
        }
        let stop = OffsetDateTime::now_utc();
        let duration = clamp_duration(elapsed_secs(start, stop), nominal);
        log.append(&CycleRecord {
            tdid: tdid.clone(),
            start,
            stop,
            duration_secs: duration,
            endpoint: endpoint.clone(),
        })?;
        tally.cycles += cycle_increment(work_minutes);
        tally.worked_secs += duration;
        term::notify(ui.bell, "Finished Pomodoro, rest now.");

        let another = match console
            .prompt("Run another Pomodoro for the same To-Do after the break? [Y/n] ")
            .await?
        {
            Line::Cancelled => return Ok(CycleOutcome::Cancelled(tally)),
            Line::Entry(input) => !input.eq_ignore_ascii_case("n"),
        };
        let mut completion = Completion::Paused;
        if !another {
            completion = match console
                .prompt("Is the To-Do fully complete (y), or just done for today (N)? [y/N] ")
                .await?
            {
                Line::Cancelled => return Ok(CycleOutcome::Cancelled(tally)),
                Line::Entry(input) if input.eq_ignore_ascii_case("y") => Completion::Done,
                Line::Entry(_) => Completion::Paused,
            };
        }

        println!("Rest now");
        let rest_nominal = u64::from(cfg.rest_minutes) * 60;
        let rest_start = OffsetDateTime::now_utc();
        let rest = term::countdown("Resting", rest_nominal).await?;
        let rest_stop = OffsetDateTime::now_utc();
        let rest_duration = clamp_duration(elapsed_secs(rest_start, rest_stop), rest_nominal);
        // The break is logged even when cut short.
        log.append(&CycleRecord::rest(rest_start, rest_stop, rest_duration))?;

        if rest == WaitOutcome::Interrupted {
            // Straight back to work with the same parameters; the pending
            // continue/complete answers no longer apply.
            skip_settle = true;
            continue;
        }
        term::notify(ui.bell, "Finished rest, work now.");

        if !another {
            println!("Pomodoro cycle complete, back to selection.");
            tally.completion = completion;
            return Ok(CycleOutcome::Finished(tally));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_capped_at_120_percent() {
        let nominal = 25 * 60;
        assert_eq!(clamp_duration(1400, nominal), 1400);
        assert_eq!(clamp_duration(1500, nominal), 1500);
        assert_eq!(clamp_duration(1800, nominal), 1800);
        assert_eq!(clamp_duration(1801, nominal), 1800);
        assert_eq!(clamp_duration(86_400, nominal), 1800);
    }

    #[test]
    fn double_length_counts_double() {
        assert_eq!(cycle_increment(25), 1);
        assert_eq!(cycle_increment(50), 2);
        assert_eq!(cycle_increment(30), 1);
        assert_eq!(cycle_increment(10), 0);
    }

    #[test]
    fn length_choice_parsing() {
        assert_eq!(parse_length_choice(""), LengthChoice::Keep);
        assert_eq!(parse_length_choice("s"), LengthChoice::Short);
        assert_eq!(parse_length_choice("D"), LengthChoice::Long);
        assert_eq!(parse_length_choice("40"), LengthChoice::Minutes(40));
        assert_eq!(parse_length_choice("0"), LengthChoice::Invalid);
        assert_eq!(parse_length_choice("q"), LengthChoice::Invalid);
    }

    #[test]
    fn elapsed_never_goes_negative() {
        let a = OffsetDateTime::UNIX_EPOCH;
        let b = a + time::Duration::seconds(90);
        assert_eq!(elapsed_secs(a, b), 90);
        assert_eq!(elapsed_secs(b, a), 0);
    }
}
