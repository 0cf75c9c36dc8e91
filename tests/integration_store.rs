use pomotodo::session::cycle::Completion;
use pomotodo::session::reconcile;
use pomotodo::session::store::{LoadSource, TodoStore};
use pomotodo::todo::{id, model, order};

use time::macros::{date, datetime};

fn store(dir: &std::path::Path) -> TodoStore {
    TodoStore::new(dir.join("todo.txt"), dir.join("todo.txt.tmp"))
}

#[test]
fn no_work_session_only_reorders_the_file() {
    let td = tempfile::tempdir().expect("tempdir");
    let s = store(td.path());
    std::fs::write(
        s.primary(),
        "x 2026-08-01 already finished tdid:P_2026-07-01_0\n\
         (F) someday maybe\n\
         (A) urgent thing\n",
    )
    .expect("write fixture");

    // Startup: load, backup, identify, sort, checkpoint.
    let (mut tasks, source) = s.load().expect("load");
    assert_eq!(source, LoadSource::Primary);
    let backup = s
        .backup_primary(datetime!(2026-08-07 10:00:00 UTC))
        .expect("backup")
        .expect("primary existed");
    assert!(backup.exists());

    id::assign_ids(&mut tasks, date!(2026 - 08 - 07));
    order::canonical_sort(&mut tasks);
    s.checkpoint(&tasks).expect("checkpoint");
    assert!(s.temp().exists());

    // Shutdown without running any cycles.
    order::canonical_sort(&mut tasks);
    s.commit(&tasks).expect("commit");

    assert!(!s.temp().exists());
    let raw = std::fs::read_to_string(s.primary()).expect("read primary");
    let lines: Vec<&str> = raw.lines().collect();
    assert_eq!(lines.len(), 3);
    // Incomplete before completed; A before F; every task identified.
    assert!(lines[0].starts_with("(A) urgent thing"));
    assert!(lines[1].starts_with("(F) someday maybe"));
    assert!(lines[2].starts_with("x 2026-08-01 already finished"));
    assert!(lines.iter().all(|l| l.contains("tdid:P_")));
}

#[test]
fn startup_recovers_from_the_checkpoint() {
    let td = tempfile::tempdir().expect("tempdir");
    let s = store(td.path());
    std::fs::write(s.primary(), "original state tdid:P_2026-08-01_0\n").expect("write");

    // A previous run checkpointed newer state and then died.
    let (mut tasks, _) = s.load().expect("load");
    tasks[0].add_cycle_contribution(1, 1500);
    s.checkpoint(&tasks).expect("checkpoint");

    let s2 = store(td.path());
    let (recovered, source) = s2.load().expect("reload");
    assert_eq!(source, LoadSource::Recovered);
    assert_eq!(recovered[0].pomodoro_count(), 1);
    assert_eq!(recovered[0].total_seconds(), 1500);
}

#[test]
fn cycle_results_survive_a_full_persistence_round_trip() {
    let td = tempfile::tempdir().expect("tempdir");
    let s = store(td.path());
    std::fs::write(s.primary(), "(A) write the report tdid:P_2026-08-01_0\n").expect("write");

    // First session: one double pomodoro, task paused.
    let (mut tasks, _) = s.load().expect("load");
    let task = model::find_mut(&mut tasks, "P_2026-08-01_0").expect("task");
    reconcile::update_todo(task, Completion::Paused, 2, 3000, date!(2026 - 08 - 07));
    order::canonical_sort(&mut tasks);
    s.commit(&tasks).expect("commit");

    // Second session: one more pomodoro, task completed.
    let (mut tasks, source) = s.load().expect("reload");
    assert_eq!(source, LoadSource::Primary);
    let task = model::find_mut(&mut tasks, "P_2026-08-01_0").expect("task");
    assert_eq!(task.pomodoro_count(), 2);
    reconcile::update_todo(task, Completion::Done, 1, 1500, date!(2026 - 08 - 08));
    order::canonical_sort(&mut tasks);
    s.commit(&tasks).expect("commit");

    let raw = std::fs::read_to_string(s.primary()).expect("read primary");
    assert_eq!(
        raw,
        "x 2026-08-08 (A) write the report Pmd:3 Ttotal:4500 tdid:P_2026-08-01_0\n"
    );
}
