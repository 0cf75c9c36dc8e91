#![forbid(unsafe_code)]

//! Identifier assignment for tasks.
//!
//! Identifiers (`tdid` in the persisted file) are the collection's primary
//! key: `P_<assignment-date>_<n>` where `n` counts the tasks that were still
//! unidentified on that run, in their original relative order. An identifier
//! is assigned once and never touched again.

use time::Date;

use crate::todo::codec::format_date;
use crate::todo::model::Task;

pub fn assign_ids(tasks: &mut [Task], today: Date) {
    let stamp = format_date(today);
    let mut next = 0usize;
    for task in tasks.iter_mut() {
        if task.tdid.is_some() {
            continue;
        }
        task.tdid = Some(format!("P_{stamp}_{next}"));
        next += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn ids(tasks: &[Task]) -> Vec<Option<String>> {
        tasks.iter().map(|t| t.tdid.clone()).collect()
    }

    #[test]
    fn unidentified_tasks_get_sequential_ids() {
        let mut tasks = vec![Task::new("a"), Task::new("b"), Task::new("c")];
        assign_ids(&mut tasks, date!(2026 - 08 - 07));
        assert_eq!(
            ids(&tasks),
            vec![
                Some("P_2026-08-07_0".to_owned()),
                Some("P_2026-08-07_1".to_owned()),
                Some("P_2026-08-07_2".to_owned()),
            ]
        );
    }

    #[test]
    fn existing_ids_and_order_are_preserved() {
        let mut old = Task::new("old");
        old.tdid = Some("P_2026-01-01_0".to_owned());
        let mut tasks = vec![Task::new("new one"), old, Task::new("new two")];

        assign_ids(&mut tasks, date!(2026 - 08 - 07));

        assert_eq!(tasks[0].tdid.as_deref(), Some("P_2026-08-07_0"));
        assert_eq!(tasks[1].tdid.as_deref(), Some("P_2026-01-01_0"));
        assert_eq!(tasks[2].tdid.as_deref(), Some("P_2026-08-07_1"));
        assert_eq!(tasks[0].text, "new one");
        assert_eq!(tasks[2].text, "new two");
    }

    #[test]
    fn assignment_is_idempotent() {
        let mut tasks = vec![Task::new("a"), Task::new("b")];
        assign_ids(&mut tasks, date!(2026 - 08 - 07));
        let first = ids(&tasks);

        assign_ids(&mut tasks, date!(2026 - 08 - 08));
        assert_eq!(ids(&tasks), first);
        assert!(tasks.iter().all(|t| t.tdid.is_some()));
    }
}
