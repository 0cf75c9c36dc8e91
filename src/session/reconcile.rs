#![forbid(unsafe_code)]

//! Folding a cycle-engine tally back into a task.

use time::Date;

use crate::session::cycle::Completion;
use crate::todo::model::Task;

/// Apply one invocation's outcome. A zero-valued contribution never creates
/// the `Pmd`/`Ttotal` tags out of nothing.
pub fn update_todo(
    task: &mut Task,
    completion: Completion,
    cycles: u32,
    worked_secs: u64,
    today: Date,
) {
    if completion == Completion::Done {
        task.completed = true;
        task.completion_date = Some(today);
    }
    if cycles > 0 && worked_secs > 0 {
        task.add_cycle_contribution(u64::from(cycles), worked_secs);
    }
}
