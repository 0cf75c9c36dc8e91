#![forbid(unsafe_code)]

//! The "today" subset of the master collection.
//!
//! The subset is a list of tdids, never task copies, so reconciliation always
//! hits the master collection directly. The set operations are pure; the
//! interactive wrappers print the enumerated option pool, collect a
//! comma-separated selection, and re-prompt on anything unparsable or out of
//! range.

use std::collections::BTreeSet;
use std::io;
use std::io::Write as _;

use crate::term::{Console, Line, rule};
use crate::todo::model::{self, Task};

/// Priority code marking a task as deferred.
const DEFERRED: char = 'F';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Empty,
    Indices(BTreeSet<usize>),
    Invalid,
}

#[must_use]
pub fn parse_selection(input: &str) -> Selection {
    if input.trim().is_empty() {
        return Selection::Empty;
    }
    let mut indices = BTreeSet::new();
    for part in input.split(',') {
        match part.trim().parse::<usize>() {
            Ok(i) => {
                indices.insert(i);
            }
            Err(_) => return Selection::Invalid,
        }
    }
    Selection::Indices(indices)
}

/// Tasks eligible for today: neither completed nor deferred.
#[must_use]
pub fn initial(master: &[Task]) -> Vec<String> {
    master
        .iter()
        .filter(|t| !t.completed && t.priority != Some(DEFERRED))
        .filter_map(|t| t.tdid.clone())
        .collect()
}

/// Broaden options: master tasks not already in the subset.
#[must_use]
pub fn candidate_pool(master: &[Task], subset: &[String]) -> Vec<String> {
    master
        .iter()
        .filter_map(|t| t.tdid.clone())
        .filter(|id| !subset.contains(id))
        .collect()
}

#[must_use]
pub fn narrow(subset: &[String], remove: &BTreeSet<usize>) -> Vec<String> {
    subset
        .iter()
        .enumerate()
        .filter(|(i, _)| !remove.contains(i))
        .map(|(_, id)| id.clone())
        .collect()
}

#[must_use]
pub fn broaden(subset: &[String], pool: &[String], pick: &BTreeSet<usize>) -> Vec<String> {
    let mut out = subset.to_vec();
    out.extend(
        pool.iter()
            .enumerate()
            .filter(|(i, _)| pick.contains(i))
            .map(|(_, id)| id.clone()),
    );
    out
}

/// Print the enumerated option pool between rules.
pub fn render_pool(
    mut out: impl io::Write,
    master: &[Task],
    ids: &[String],
    width: usize,
) -> io::Result<()> {
    writeln!(out, "{}", rule(width))?;
    writeln!(out, "List of options:")?;
    for (i, id) in ids.iter().enumerate() {
        if let Some(task) = model::find(master, id) {
            writeln!(out, "[{i}] - {task}")?;
        }
    }
    writeln!(out, "{}", rule(width))?;
    Ok(())
}

async fn collect_indices(
    console: &mut Console,
    question: &str,
    len: usize,
) -> anyhow::Result<Option<Selection>> {
    loop {
        match console.prompt(question).await? {
            Line::Cancelled => return Ok(None),
            Line::Entry(input) => match parse_selection(&input) {
                Selection::Empty => return Ok(Some(Selection::Empty)),
                Selection::Indices(indices) => {
                    if indices.iter().any(|&i| i >= len) {
                        println!("Incorrect selection, please try again");
                        continue;
                    }
                    return Ok(Some(Selection::Indices(indices)));
                }
                Selection::Invalid => {
                    println!("Incorrect selection, please try again");
                }
            },
        }
    }
}

/// Remove tasks from the subset by position. `None` means the prompt was
/// cancelled and the caller should take the shutdown path.
pub async fn narrow_interactive(
    console: &mut Console,
    master: &[Task],
    subset: Vec<String>,
    width: usize,
) -> anyhow::Result<Option<Vec<String>>> {
    render_pool(io::stdout().lock(), master, &subset, width)?;
    let q = "To remove any To-Dos from this list, enter a comma-separated \
             list of numbers (Enter keeps all): ";
    match collect_indices(console, q, subset.len()).await? {
        None => Ok(None),
        Some(Selection::Empty) => Ok(Some(subset)),
        Some(Selection::Indices(indices)) => {
            for &i in &indices {
                if let Some(task) = model::find(master, &subset[i]) {
                    println!("You selected: {task}");
                }
            }
            Ok(Some(narrow(&subset, &indices)))
        }
        Some(Selection::Invalid) => Ok(Some(subset)),
    }
}

/// Append tasks from the master collection to the subset by pool position.
pub async fn broaden_interactive(
    console: &mut Console,
    master: &[Task],
    subset: Vec<String>,
    width: usize,
) -> anyhow::Result<Option<Vec<String>>> {
    let pool = candidate_pool(master, &subset);
    if pool.is_empty() {
        println!("No further To-Dos to add.");
        return Ok(Some(subset));
    }

    {
        let mut out = io::stdout().lock();
        writeln!(out, "Current To-Dos are:")?;
        for id in &subset {
            if let Some(task) = model::find(master, id) {
                writeln!(out, " *  {task}")?;
            }
        }
        render_pool(&mut out, master, &pool, width)?;
    }

    let q = "To add any To-Dos to today's list, enter a comma-separated \
             list of numbers (Enter adds none): ";
    match collect_indices(console, q, pool.len()).await? {
        None => Ok(None),
        Some(Selection::Empty) => Ok(Some(subset)),
        Some(Selection::Indices(indices)) => {
            for &i in &indices {
                if let Some(task) = model::find(master, &pool[i]) {
                    println!("You selected: {task}");
                }
            }
            Ok(Some(broaden(&subset, &pool, &indices)))
        }
        Some(Selection::Invalid) => Ok(Some(subset)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(text: &str, tdid: &str) -> Task {
        let mut t = Task::new(text);
        t.tdid = Some(tdid.to_owned());
        t
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn selection_parsing() {
        assert_eq!(parse_selection(""), Selection::Empty);
        assert_eq!(parse_selection("  "), Selection::Empty);
        assert_eq!(
            parse_selection("1,3"),
            Selection::Indices(BTreeSet::from([1, 3]))
        );
        assert_eq!(
            parse_selection("2, 2, 0"),
            Selection::Indices(BTreeSet::from([0, 2]))
        );
        assert_eq!(parse_selection("x"), Selection::Invalid);
        assert_eq!(parse_selection("1,,2"), Selection::Invalid);
        assert_eq!(parse_selection("-1"), Selection::Invalid);
    }

    #[test]
    fn initial_excludes_completed_and_deferred() {
        let mut done = task("done", "P_2026-01-01_0");
        done.completed = true;
        let mut future = task("someday", "P_2026-01-01_1");
        future.priority = Some('F');
        let open = task("open", "P_2026-01-01_2");

        let master = vec![done, future, open];
        assert_eq!(initial(&master), ids(&["P_2026-01-01_2"]));
    }

    #[test]
    fn narrow_removes_selected_positions() {
        let subset = ids(&["t0", "t1", "t2"]);
        assert_eq!(
            narrow(&subset, &BTreeSet::from([0, 2])),
            ids(&["t1"])
        );
        assert_eq!(narrow(&subset, &BTreeSet::new()), subset);
    }

    #[test]
    fn broaden_appends_from_the_pool() {
        let master = vec![task("a", "t0"), task("b", "t1"), task("c", "t2")];
        let subset = ids(&["t0"]);
        let pool = candidate_pool(&master, &subset);
        assert_eq!(pool, ids(&["t1", "t2"]));

        let grown = broaden(&subset, &pool, &BTreeSet::from([0]));
        assert_eq!(grown, ids(&["t0", "t1"]));
    }

    #[test]
    fn pool_rendering_is_enumerated_between_rules() {
        let master = vec![task("water plants", "t0")];
        let mut buf = Vec::new();
        render_pool(&mut buf, &master, &ids(&["t0"]), 10).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "##########");
        assert_eq!(lines[1], "List of options:");
        assert!(lines[2].starts_with("[0] - water plants"));
        assert_eq!(lines[3], "##########");
    }
}
