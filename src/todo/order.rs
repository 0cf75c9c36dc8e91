#![forbid(unsafe_code)]

//! Canonical ordering of the master collection.
//!
//! Completion state first (incomplete before completed), then priority
//! (routine `R` outranks every lettered priority, letters sort A before B,
//! no priority last), then identifier ascending. Identifiers embed their
//! assignment date, so the tiebreak puts the oldest tasks first. Call after
//! any structural change and before every persisted write.

use std::cmp::Ordering;

use crate::todo::model::Task;

pub fn canonical_sort(tasks: &mut [Task]) {
    tasks.sort_by(compare);
}

#[must_use]
pub fn compare(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| priority_rank(a.priority).cmp(&priority_rank(b.priority)))
        .then_with(|| a.tdid.cmp(&b.tdid))
}

fn priority_rank(priority: Option<char>) -> (u8, char) {
    match priority {
        Some('R') => (0, ' '),
        Some(p) => (1, p),
        None => (2, ' '),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(text: &str, priority: Option<char>, completed: bool, tdid: &str) -> Task {
        let mut t = Task::new(text);
        t.priority = priority;
        t.completed = completed;
        t.tdid = Some(tdid.to_owned());
        t
    }

    #[test]
    fn completed_tasks_sort_last() {
        let mut tasks = vec![
            task("done", Some('A'), true, "P_2026-01-01_0"),
            task("open", None, false, "P_2026-01-02_0"),
        ];
        canonical_sort(&mut tasks);
        assert_eq!(tasks[0].text, "open");
        assert_eq!(tasks[1].text, "done");
    }

    #[test]
    fn routine_outranks_letters_and_none_sorts_after_them() {
        let mut tasks = vec![
            task("none", None, false, "P_2026-01-01_0"),
            task("b", Some('B'), false, "P_2026-01-01_1"),
            task("routine", Some('R'), false, "P_2026-01-01_2"),
            task("a", Some('A'), false, "P_2026-01-01_3"),
        ];
        canonical_sort(&mut tasks);
        let order: Vec<&str> = tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(order, vec!["routine", "a", "b", "none"]);
    }

    #[test]
    fn identifier_breaks_ties_oldest_first() {
        let mut tasks = vec![
            task("newer", Some('A'), false, "P_2026-08-07_0"),
            task("older", Some('A'), false, "P_2026-01-01_4"),
        ];
        canonical_sort(&mut tasks);
        assert_eq!(tasks[0].text, "older");
    }

    #[test]
    fn compare_is_a_total_order() {
        let tasks = [
            task("a", Some('R'), false, "P_2026-01-01_0"),
            task("b", Some('A'), false, "P_2026-01-01_1"),
            task("c", None, false, "P_2026-01-01_2"),
            task("d", Some('A'), true, "P_2026-01-01_3"),
        ];
        for x in &tasks {
            assert_eq!(compare(x, x), Ordering::Equal);
            for y in &tasks {
                assert_eq!(compare(x, y), compare(y, x).reverse());
            }
        }
    }
}
