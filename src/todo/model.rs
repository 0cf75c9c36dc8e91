#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use time::Date;

/// Tag key holding the cumulative pomodoro count.
pub const TAG_POMODOROS: &str = "Pmd";
/// Tag key holding the cumulative work seconds.
pub const TAG_TOTAL_SECONDS: &str = "Ttotal";

/// One entry of the todo.txt collection.
///
/// `tdid` is the primary key: assigned once by [`crate::todo::id::assign_ids`]
/// and never changed afterwards. `Pmd` and `Ttotal` live in `tags` as decimal
/// text so the persisted file stays plain todo.txt; the typed accessors below
/// treat an absent tag as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub text: String,
    pub priority: Option<char>,
    pub projects: BTreeSet<String>,
    pub contexts: BTreeSet<String>,
    pub completed: bool,
    pub completion_date: Option<Date>,
    pub creation_date: Option<Date>,
    pub tdid: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl Task {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: None,
            projects: BTreeSet::new(),
            contexts: BTreeSet::new(),
            completed: false,
            completion_date: None,
            creation_date: None,
            tdid: None,
            tags: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn pomodoro_count(&self) -> u64 {
        self.tag_number(TAG_POMODOROS)
    }

    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        self.tag_number(TAG_TOTAL_SECONDS)
    }

    /// Add one cycle-engine invocation's contribution to the cumulative tags.
    pub fn add_cycle_contribution(&mut self, cycles: u64, seconds: u64) {
        let pomos = self.pomodoro_count() + cycles;
        let total = self.total_seconds() + seconds;
        self.tags.insert(TAG_POMODOROS.to_owned(), pomos.to_string());
        self.tags
            .insert(TAG_TOTAL_SECONDS.to_owned(), total.to_string());
    }

    fn tag_number(&self, key: &str) -> u64 {
        self.tags
            .get(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::todo::codec::encode_line(self))
    }
}

#[must_use]
pub fn by_completion(tasks: &[Task], completed: bool) -> Vec<&Task> {
    tasks.iter().filter(|t| t.completed == completed).collect()
}

#[must_use]
pub fn find<'a>(tasks: &'a [Task], tdid: &str) -> Option<&'a Task> {
    tasks.iter().find(|t| t.tdid.as_deref() == Some(tdid))
}

#[must_use]
pub fn find_mut<'a>(tasks: &'a mut [Task], tdid: &str) -> Option<&'a mut Task> {
    tasks.iter_mut().find(|t| t.tdid.as_deref() == Some(tdid))
}
