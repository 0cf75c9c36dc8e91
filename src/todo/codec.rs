#![forbid(unsafe_code)]

//! Line codec for the todo.txt task format.
//!
//! One task per line: `x <completion-date>? (P)? <creation-date>? <text>`
//! followed by `+project`, `@context` and `key:value` tokens. Parsing is
//! lenient and infallible per line; any token that fits no marker is text.

use time::Date;
use time::macros::format_description;

use crate::todo::model::Task;

const DATE_FMT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

const TDID_TAG: &str = "tdid";

#[must_use]
pub fn format_date(date: Date) -> String {
    date.format(&DATE_FMT)
        .unwrap_or_else(|_| date.to_string())
}

fn parse_date(token: &str) -> Option<Date> {
    Date::parse(token, &DATE_FMT).ok()
}

fn parse_priority(token: &str) -> Option<char> {
    let bytes = token.as_bytes();
    if bytes.len() == 3 && bytes[0] == b'(' && bytes[2] == b')' && bytes[1].is_ascii_uppercase() {
        Some(bytes[1] as char)
    } else {
        None
    }
}

fn parse_tag(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once(':')?;
    if key.is_empty() || value.is_empty() {
        return None;
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((key, value))
}

#[must_use]
pub fn parse_line(line: &str) -> Task {
    let mut task = Task::new("");
    let mut tokens = line.split_whitespace().peekable();

    if tokens.peek().copied() == Some("x") {
        task.completed = true;
        tokens.next();
    }

    // Header: priority and the leading dates may appear in either order.
    // Completed tasks carry up to two dates (completion, then creation),
    // open tasks at most one (creation).
    let max_dates = if task.completed { 2 } else { 1 };
    let mut dates: Vec<Date> = Vec::new();
    while let Some(&tok) = tokens.peek() {
        if task.priority.is_none()
            && let Some(p) = parse_priority(tok)
        {
            task.priority = Some(p);
            tokens.next();
            continue;
        }
        if dates.len() < max_dates
            && let Some(d) = parse_date(tok)
        {
            dates.push(d);
            tokens.next();
            continue;
        }
        break;
    }
    match (task.completed, dates.len()) {
        (true, 2) => {
            task.completion_date = Some(dates[0]);
            task.creation_date = Some(dates[1]);
        }
        (true, 1) => task.completion_date = Some(dates[0]),
        (false, 1) => task.creation_date = Some(dates[0]),
        _ => {}
    }

    let mut words: Vec<&str> = Vec::new();
    for tok in tokens {
        if let Some(label) = tok.strip_prefix('+')
            && !label.is_empty()
        {
            task.projects.insert(label.to_owned());
        } else if let Some(label) = tok.strip_prefix('@')
            && !label.is_empty()
        {
            task.contexts.insert(label.to_owned());
        } else if let Some((key, value)) = parse_tag(tok) {
            if key == TDID_TAG {
                task.tdid = Some(value.to_owned());
            } else {
                task.tags.insert(key.to_owned(), value.to_owned());
            }
        } else {
            words.push(tok);
        }
    }
    task.text = words.join(" ");
    task
}

#[must_use]
pub fn encode_line(task: &Task) -> String {
    let mut parts: Vec<String> = Vec::new();
    if task.completed {
        parts.push("x".to_owned());
        if let Some(d) = task.completion_date {
            parts.push(format_date(d));
        }
    }
    if let Some(p) = task.priority {
        parts.push(format!("({p})"));
    }
    if let Some(d) = task.creation_date {
        parts.push(format_date(d));
    }
    if !task.text.is_empty() {
        parts.push(task.text.clone());
    }
    for p in &task.projects {
        parts.push(format!("+{p}"));
    }
    for c in &task.contexts {
        parts.push(format!("@{c}"));
    }
    for (key, value) in &task.tags {
        parts.push(format!("{key}:{value}"));
    }
    if let Some(id) = &task.tdid {
        parts.push(format!("{TDID_TAG}:{id}"));
    }
    parts.join(" ")
}

#[must_use]
pub fn parse_document(input: &str) -> Vec<Task> {
    input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(parse_line)
        .collect()
}

#[must_use]
pub fn encode_document(tasks: &[Task]) -> String {
    let mut out = String::new();
    for task in tasks {
        out.push_str(&encode_line(task));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_a_full_line() {
        let task = parse_line(
            "x 2026-08-07 (A) 2026-08-01 file the report +work @office Pmd:4 tdid:P_2026-08-01_0",
        );
        assert!(task.completed);
        assert_eq!(task.completion_date, Some(date!(2026 - 08 - 07)));
        assert_eq!(task.creation_date, Some(date!(2026 - 08 - 01)));
        assert_eq!(task.priority, Some('A'));
        assert_eq!(task.text, "file the report");
        assert!(task.projects.contains("work"));
        assert!(task.contexts.contains("office"));
        assert_eq!(task.tags.get("Pmd").map(String::as_str), Some("4"));
        assert_eq!(task.tdid.as_deref(), Some("P_2026-08-01_0"));
    }

    #[test]
    fn plain_text_is_just_a_task() {
        let task = parse_line("water the plants");
        assert!(!task.completed);
        assert_eq!(task.text, "water the plants");
        assert!(task.priority.is_none());
        assert!(task.tdid.is_none());
    }

    #[test]
    fn single_date_is_creation_unless_completed() {
        let open = parse_line("2026-08-01 draft agenda");
        assert_eq!(open.creation_date, Some(date!(2026 - 08 - 01)));
        assert!(open.completion_date.is_none());

        let done = parse_line("x 2026-08-07 draft agenda");
        assert_eq!(done.completion_date, Some(date!(2026 - 08 - 07)));
        assert!(done.creation_date.is_none());
    }

    #[test]
    fn priority_after_completion_marker() {
        let task = parse_line("x (B) tidy desk");
        assert!(task.completed);
        assert_eq!(task.priority, Some('B'));
        assert_eq!(task.text, "tidy desk");
    }

    #[test]
    fn lowercase_parens_stay_text() {
        let task = parse_line("(a) not a priority");
        assert!(task.priority.is_none());
        assert_eq!(task.text, "(a) not a priority");
    }

    #[test]
    fn canonical_lines_round_trip() {
        let lines = [
            "(R) water the plants tdid:P_2026-08-01_2",
            "x 2026-08-07 (A) 2026-08-01 file report +work Pmd:4 Ttotal:6000 tdid:P_2026-08-01_0",
            "call the bank @phone",
        ];
        for line in lines {
            assert_eq!(encode_line(&parse_line(line)), line);
        }
    }

    #[test]
    fn document_skips_blank_lines() {
        let tasks = parse_document("one\n\n  \ntwo\n");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].text, "two");
    }

    #[test]
    fn encode_document_is_one_line_per_task() {
        let tasks = parse_document("one\ntwo\n");
        assert_eq!(encode_document(&tasks), "one\ntwo\n");
    }
}
