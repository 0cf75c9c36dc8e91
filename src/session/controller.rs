#![forbid(unsafe_code)]

//! Top-level session loop: menu, edit sub-menu, restart, stats, exit.
//!
//! Cancelling any menu-level prompt is read as "finish for the day" and takes
//! the same orderly shutdown path as the explicit exit option.

use std::io;
use std::io::Write as _;
use std::path::PathBuf;

use time::OffsetDateTime;

use crate::config::Config;
use crate::output::table::Table;
use crate::session::cycle::{self, Completion, CycleOutcome};
use crate::session::log::SessionLog;
use crate::session::reconcile;
use crate::session::store::{LoadSource, TodoStore};
use crate::session::subset;
use crate::term::{Console, Line, rule};
use crate::todo::codec::format_date;
use crate::todo::model::{self, Task};
use crate::todo::{id, order};

#[derive(Debug, Clone)]
pub struct SessionPaths {
    pub todo: PathBuf,
    pub temp: PathBuf,
    pub log: PathBuf,
}

const MENU_OPTIONS: [(&str, &str); 4] = [
    ("E", "Edit today's To-Do list"),
    ("R", "Re-start for the day"),
    ("S", "Show stats"),
    ("F", "Finish for the day - leave"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum MenuChoice {
    Task(usize),
    Edit,
    Restart,
    Stats,
    Exit,
}

fn parse_menu(input: &str, today_len: usize) -> Option<MenuChoice> {
    let s = input.trim();
    let s = if s.is_empty() { "0" } else { s };
    match s.to_ascii_uppercase().as_str() {
        "E" => Some(MenuChoice::Edit),
        "R" => Some(MenuChoice::Restart),
        "S" => Some(MenuChoice::Stats),
        "F" => Some(MenuChoice::Exit),
        other => other
            .parse::<usize>()
            .ok()
            .filter(|i| *i < today_len)
            .map(MenuChoice::Task),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditFlow {
    Back,
    Cancelled,
}

pub struct Session {
    cfg: Config,
    store: TodoStore,
    log: SessionLog,
    console: Console,
    master: Vec<Task>,
    today: Vec<String>,
    done: Vec<String>,
    pomos_done: u32,
    secs_today: u64,
}

pub async fn run(cfg: Config, paths: SessionPaths) -> anyhow::Result<()> {
    let store = TodoStore::new(paths.todo, paths.temp);
    let log = SessionLog::new(paths.log);

    let (mut master, source) = store.load()?;
    if source == LoadSource::Recovered {
        println!(
            "Recovered unsaved To-Dos from {} (previous run did not finish).",
            store.temp().display()
        );
    }
    let now = OffsetDateTime::now_utc();
    if let Some(backup) = store.backup_primary(now)? {
        println!("Previous todo file kept as {}.", backup.display());
    }
    id::assign_ids(&mut master, now.date());
    order::canonical_sort(&mut master);
    store.checkpoint(&master)?;

    let width = cfg.ui.rule_width;
    print_overview(&master, width)?;

    let today = subset::initial(&master);
    let mut session = Session {
        cfg,
        store,
        log,
        console: Console::new(),
        master,
        today,
        done: Vec::new(),
        pomos_done: 0,
        secs_today: 0,
    };

    match subset::narrow_interactive(
        &mut session.console,
        &session.master,
        session.today.clone(),
        width,
    )
    .await?
    {
        Some(today) => session.today = today,
        None => return session.shutdown(),
    }

    session.main_loop().await
}

impl Session {
    async fn main_loop(&mut self) -> anyhow::Result<()> {
        loop {
            match self.menu().await? {
                MenuChoice::Task(i) => {
                    let tdid = self.today[i].clone();
                    self.run_task(&tdid).await?;
                }
                MenuChoice::Edit => {
                    let flow = self.edit_menu().await?;
                    self.store.checkpoint(&self.master)?;
                    if flow == EditFlow::Cancelled {
                        break;
                    }
                }
                MenuChoice::Restart => {
                    if !self.restart().await? {
                        break;
                    }
                }
                MenuChoice::Stats => println!("Stats are not available yet."),
                MenuChoice::Exit => break,
            }
        }
        self.shutdown()
    }

    async fn menu(&mut self) -> anyhow::Result<MenuChoice> {
        let width = self.cfg.ui.rule_width;
        {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", rule(width))?;
            writeln!(out, "Today's list of To-Dos:")?;
            for (i, tdid) in self.today.iter().enumerate() {
                if let Some(task) = model::find(&self.master, tdid) {
                    writeln!(out, "[{i}] - {task}")?;
                }
            }
            for (key, label) in MENU_OPTIONS {
                writeln!(out, "[{key}] - {label}")?;
            }
            writeln!(out, "{}", rule(width))?;
        }

        let q = format!(
            "Select a To-Do number (0-{}) or an option letter [Enter = 0]: ",
            self.today.len().saturating_sub(1)
        );
        loop {
            match self.console.prompt(&q).await? {
                Line::Cancelled => return Ok(MenuChoice::Exit),
                Line::Entry(input) => {
                    if let Some(choice) = parse_menu(&input, self.today.len()) {
                        return Ok(choice);
                    }
                    println!("Incorrect selection, please try again");
                }
            }
        }
    }

    async fn run_task(&mut self, tdid: &str) -> anyhow::Result<()> {
        let Some(task) = model::find(&self.master, tdid).cloned() else {
            return Ok(());
        };

        let outcome = cycle::run_cycles(
            &mut self.console,
            &self.cfg.cycle,
            &self.cfg.ui,
            &self.log,
            &task,
        )
        .await?;
        let (tally, cancelled) = match outcome {
            CycleOutcome::Finished(t) => (t, false),
            CycleOutcome::Cancelled(t) => (t, true),
        };

        self.pomos_done += tally.cycles;
        self.secs_today += tally.worked_secs;
        let today_date = OffsetDateTime::now_utc().date();
        if let Some(t) = model::find_mut(&mut self.master, tdid) {
            reconcile::update_todo(t, tally.completion, tally.cycles, tally.worked_secs, today_date);
        }
        order::canonical_sort(&mut self.master);
        self.store.checkpoint(&self.master)?;

        if tally.completion == Completion::Done {
            if let Some(t) = model::find(&self.master, tdid) {
                println!("You just finished:\n {t}\nWell done!");
            }
            self.today.retain(|id| id != tdid);
            self.done.push(tdid.to_owned());
        }
        if cancelled {
            println!("Interrupted - back to the selection list.");
        }
        self.feedback();
        Ok(())
    }

    async fn edit_menu(&mut self) -> anyhow::Result<EditFlow> {
        let width = self.cfg.ui.rule_width;
        loop {
            {
                let mut out = io::stdout().lock();
                writeln!(out, "{}", rule(width))?;
                writeln!(out, "[B] - Broaden today's list (add To-Dos)")?;
                writeln!(out, "[N] - Narrow today's list (remove To-Dos)")?;
                writeln!(out, "[P] - Change a To-Do's priority")?;
                writeln!(out, "[A] - Add a new To-Do")?;
                writeln!(out, "[E] - Edit an existing To-Do")?;
                writeln!(out, "[Q] - Back to the main menu")?;
                writeln!(out, "{}", rule(width))?;
            }
            match self
                .console
                .prompt("Choose an edit action [B/N/P/A/E, Enter goes back]: ")
                .await?
            {
                Line::Cancelled => return Ok(EditFlow::Cancelled),
                Line::Entry(input) => match input.to_ascii_uppercase().as_str() {
                    "" | "Q" => return Ok(EditFlow::Back),
                    "B" => {
                        match subset::broaden_interactive(
                            &mut self.console,
                            &self.master,
                            self.today.clone(),
                            width,
                        )
                        .await?
                        {
                            Some(today) => self.today = today,
                            None => return Ok(EditFlow::Cancelled),
                        }
                    }
                    "N" => {
                        match subset::narrow_interactive(
                            &mut self.console,
                            &self.master,
                            self.today.clone(),
                            width,
                        )
                        .await?
                        {
                            Some(today) => self.today = today,
                            None => return Ok(EditFlow::Cancelled),
                        }
                    }
                    "P" => {
                        if !self.change_priority().await? {
                            return Ok(EditFlow::Cancelled);
                        }
                    }
                    "A" => {
                        if !self.add_task().await? {
                            return Ok(EditFlow::Cancelled);
                        }
                    }
                    "E" => println!("not implemented yet"),
                    _ => println!("Incorrect selection, please try again"),
                },
            }
        }
    }

    /// Returns false when the user cancelled out of the flow.
    async fn change_priority(&mut self) -> anyhow::Result<bool> {
        let width = self.cfg.ui.rule_width;
        let pool: Vec<String> = self
            .master
            .iter()
            .filter(|t| !t.completed)
            .filter_map(|t| t.tdid.clone())
            .collect();
        if pool.is_empty() {
            println!("No open To-Dos to reprioritise.");
            return Ok(true);
        }
        subset::render_pool(io::stdout().lock(), &self.master, &pool, width)?;

        let picked = loop {
            match self
                .console
                .prompt("Which To-Do? (number, Enter goes back): ")
                .await?
            {
                Line::Cancelled => return Ok(false),
                Line::Entry(input) => {
                    if input.is_empty() {
                        return Ok(true);
                    }
                    match input.parse::<usize>() {
                        Ok(i) if i < pool.len() => break pool[i].clone(),
                        _ => println!("Incorrect selection, please try again"),
                    }
                }
            }
        };

        let priority = loop {
            match self
                .console
                .prompt("New priority letter (A-Z, '-' clears): ")
                .await?
            {
                Line::Cancelled => return Ok(false),
                Line::Entry(input) => {
                    if input == "-" {
                        break None;
                    }
                    let mut chars = input.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) if c.is_ascii_alphabetic() => {
                            break Some(c.to_ascii_uppercase());
                        }
                        _ => println!("Incorrect selection, please try again"),
                    }
                }
            }
        };

        if let Some(task) = model::find_mut(&mut self.master, &picked) {
            task.priority = priority;
            println!("Updated: {task}");
        }
        order::canonical_sort(&mut self.master);
        Ok(true)
    }

    /// Returns false when the user cancelled out of the flow.
    async fn add_task(&mut self) -> anyhow::Result<bool> {
        let text = loop {
            match self.console.prompt("New To-Do text: ").await? {
                Line::Cancelled => return Ok(false),
                Line::Entry(input) if input.is_empty() => {
                    println!("The To-Do text must not be empty");
                }
                Line::Entry(input) => break input,
            }
        };

        let priority = loop {
            match self
                .console
                .prompt("Priority letter (A-Z, Enter for none): ")
                .await?
            {
                Line::Cancelled => return Ok(false),
                Line::Entry(input) => {
                    if input.is_empty() {
                        break None;
                    }
                    let mut chars = input.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) if c.is_ascii_alphabetic() => {
                            break Some(c.to_ascii_uppercase());
                        }
                        _ => println!("Incorrect selection, please try again"),
                    }
                }
            }
        };

        let projects = match self
            .console
            .prompt("Projects, comma-separated (Enter for none): ")
            .await?
        {
            Line::Cancelled => return Ok(false),
            Line::Entry(input) => input
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
        };

        let add_to_today = match self
            .console
            .prompt("Add it to today's list? [y/N] ")
            .await?
        {
            Line::Cancelled => return Ok(false),
            Line::Entry(input) => input.eq_ignore_ascii_case("y"),
        };

        let today_date = OffsetDateTime::now_utc().date();
        let mut task = Task::new(text);
        task.priority = priority;
        task.projects = projects;
        task.creation_date = Some(today_date);
        self.master.push(task);
        id::assign_ids(&mut self.master, today_date);
        let new_id = self.master.last().and_then(|t| t.tdid.clone());
        order::canonical_sort(&mut self.master);

        if let Some(tdid) = new_id {
            if let Some(task) = model::find(&self.master, &tdid) {
                println!("Added: {task}");
            }
            if add_to_today {
                self.today.push(tdid);
            }
        }
        Ok(true)
    }

    /// Returns false when the user cancelled out of the flow.
    async fn restart(&mut self) -> anyhow::Result<bool> {
        self.done.clear();
        self.pomos_done = 0;
        self.secs_today = 0;
        match subset::broaden_interactive(
            &mut self.console,
            &self.master,
            self.today.clone(),
            self.cfg.ui.rule_width,
        )
        .await?
        {
            Some(today) => {
                self.today = today;
                self.feedback();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn feedback(&self) {
        let width = self.cfg.ui.rule_width;
        println!("{}", rule(width));
        if self.pomos_done > 0 && self.secs_today > 0 {
            println!(
                "So far you finished {} Pomodoros and worked for {} seconds.",
                self.pomos_done, self.secs_today
            );
        }
        if !self.done.is_empty() {
            println!("You completed {} To-Dos today:", self.done.len());
            for (i, tdid) in self.done.iter().enumerate() {
                if let Some(task) = model::find(&self.master, tdid) {
                    println!("{i} - {task}");
                }
            }
        }
        if !self.today.is_empty() {
            println!("The remaining To-Dos for today are:");
            for (i, tdid) in self.today.iter().enumerate() {
                if let Some(task) = model::find(&self.master, tdid) {
                    println!("{i} - {task}");
                }
            }
        }
        println!("{}", rule(width));
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        order::canonical_sort(&mut self.master);
        self.store.commit(&self.master)?;
        println!("That's it for today!");
        Ok(())
    }
}

fn print_overview(master: &[Task], width: usize) -> anyhow::Result<()> {
    println!("{}", rule(width));
    if master.is_empty() {
        println!("The To-Do list is empty.");
    } else {
        let mut t = Table::new(["TDID", "PRI", "TASK", "PMD", "TIME", "COMPLETED"]);
        for task in master {
            t.row([
                task.tdid.clone().unwrap_or_default(),
                task.priority.map_or_else(|| "-".to_owned(), |p| p.to_string()),
                task.text.clone(),
                task.pomodoro_count().to_string(),
                task.total_seconds().to_string(),
                task.completion_date.map(format_date).unwrap_or_default(),
            ]);
        }
        t.print()?;
    }
    println!("{}", rule(width));
    Ok(())
}
