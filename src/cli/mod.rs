#![forbid(unsafe_code)]

use std::process::ExitCode;

use clap::{CommandFactory as _, Parser, Subcommand};

use crate::config;
use crate::session::controller::{self, SessionPaths};

#[derive(Debug, Parser)]
#[command(
    name = "pomotodo",
    version,
    about = "Pomodoro timer for a todo.txt task list"
)]
pub struct Cli {
    /// Override the todo file (the checkpoint file becomes <FILE>.tmp)
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

pub async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.cmd {
        None => cmd_session(cli.file).await,
        Some(Commands::Completion(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "pomotodo", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Config(args)) => cmd_config(&args),
        Some(Commands::Version) => {
            println!("pomotodo {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_config(args: &ConfigArgs) -> anyhow::Result<ExitCode> {
    match &args.cmd {
        ConfigCmd::List => {
            print!("{}", config::list_resolved_toml()?);
        }
        ConfigCmd::Get(get) => match config::get_value_string(&get.key)? {
            Some(v) => println!("{v}"),
            None => {
                eprintln!("unknown config key '{}'", get.key);
                return Ok(ExitCode::from(1));
            }
        },
        ConfigCmd::Set(set) => {
            config::set_value_string(&set.key, &set.value)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_session(file_override: Option<String>) -> anyhow::Result<ExitCode> {
    let (cfg, _paths) = config::load()?;

    let (todo, temp) = match file_override {
        Some(file) => {
            let temp = format!("{file}.tmp");
            (file, temp)
        }
        None => (cfg.files.todo.clone(), cfg.files.temp.clone()),
    };
    let paths = SessionPaths {
        todo: config::expand_path(&todo)?,
        temp: config::expand_path(&temp)?,
        log: config::expand_path(&cfg.files.log)?,
    };

    controller::run(cfg, paths).await?;
    Ok(ExitCode::SUCCESS)
}
