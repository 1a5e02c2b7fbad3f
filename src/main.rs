use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pandrive::common::format::format_create_time;
use pandrive::engine::flatten::FsLister;
use pandrive::engine::{Command, Engine, Outcome};
use pandrive::output::{finish_spinner_error, finish_spinner_success, spinner, transfer_summary};
use pandrive::remote::{DriveItem, HttpDrive};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pandrive")]
#[command(about = "Browse and upload to your cloud drive from the terminal")]
struct Cli {
    /// Access token (overrides config file and PANDRIVE_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Remote folder to operate in, e.g. "docs/2024" (default: root)
    #[arg(long, global = true)]
    dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a remote folder
    Ls,
    /// Upload files and/or directories into a remote folder
    Upload {
        #[arg(required = true, help = "Local files or directories")]
        paths: Vec<PathBuf>,
    },
    /// Create a remote folder
    Mkdir { name: String },
    /// Delete a file or folder by name
    Rm { name: String },
    /// Resolve a direct download link for one file
    Link { name: String },
    /// Generate a combined link artifact for several files
    Links {
        #[arg(required = true, help = "File names in the remote folder")]
        names: Vec<String>,
        /// Path prefix the service should embed in the artifact
        #[arg(long)]
        target: String,
    },
    /// Interactive browsing session
    Browse,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = pandrive::load_config()?;
    if let Some(token) = &cli.token {
        config.token = token.clone();
    }

    let remote = Arc::new(HttpDrive::new(&config));
    let mut engine = Engine::new(remote, Arc::new(FsLister), config.transfer);

    let sp = spinner("Connecting...");
    match engine
        .dispatch(Command::Connect {
            token: config.token.clone(),
        })
        .await
    {
        Ok(Outcome::Connected { count, .. }) => {
            finish_spinner_success(&sp, &format!("Connected ({count} items at root)"));
        }
        Ok(other) => {
            finish_spinner_error(&sp, "Connection failed");
            anyhow::bail!("connect produced an unexpected outcome: {other:?}");
        }
        Err(err) => {
            finish_spinner_error(&sp, "Connection failed");
            return Err(err);
        }
    }

    // Walk into --dir before running the actual command.
    if let Some(dir) = &cli.dir {
        for segment in dir.split('/').filter(|s| !s.is_empty()) {
            engine
                .dispatch(Command::Enter {
                    name: segment.to_string(),
                })
                .await
                .context(format!("Cannot open remote folder '{dir}'"))?;
        }
    }

    match cli.command {
        Commands::Ls => {
            let outcome = engine.dispatch(Command::Refresh).await?;
            render(&engine, outcome);
        }
        Commands::Upload { paths } => {
            let outcome = engine.dispatch(Command::Upload { paths }).await?;
            render(&engine, outcome);
        }
        Commands::Mkdir { name } => {
            let outcome = engine.dispatch(Command::Mkdir { name }).await?;
            render(&engine, outcome);
        }
        Commands::Rm { name } => {
            let outcome = engine.dispatch(Command::Delete { name }).await?;
            render(&engine, outcome);
        }
        Commands::Link { name } => {
            let outcome = engine.dispatch(Command::DirectLink { name }).await?;
            render(&engine, outcome);
        }
        Commands::Links { names, target } => {
            let outcome = engine
                .dispatch(Command::AggregateLinks {
                    names,
                    target_path: target,
                })
                .await?;
            render(&engine, outcome);
        }
        Commands::Browse => browse(&mut engine).await?,
    }

    Ok(())
}

fn render(engine: &Engine, outcome: Outcome) {
    match outcome {
        Outcome::Connected { path, count } => {
            println!("Connected at {path} ({count} items)");
        }
        Outcome::Listing { path, items } => {
            println!("{path}");
            if items.is_empty() {
                println!("  (empty)");
            }
            for item in &items {
                print_item(item);
            }
        }
        Outcome::UploadedOne { name, fid } => {
            println!("Uploaded '{name}' (id {fid})");
        }
        Outcome::Uploaded { .. } => {
            println!("{}", transfer_summary(&engine.progress().snapshot()));
        }
        Outcome::Created { name } => println!("Created folder '{name}'"),
        Outcome::Deleted { name } => println!("Deleted '{name}'"),
        Outcome::Link { name, url } => println!("{name}\n{url}"),
        Outcome::Aggregated { result } => {
            println!("{}", pandrive::engine::aggregate::render_summary(&result));
        }
    }
}

fn print_item(item: &DriveItem) {
    let kind = if item.is_container { "dir " } else { "file" };
    let time = format_create_time(&item.create_time_digits);
    println!("  {kind}  {:<40} {:>10}  {time}", item.name, item.size_display);
}

const BROWSE_HELP: &str = "commands: ls | cd <name> | up | put <path> | mkdir <name> | \
rm <name> | link <name> | refresh | quit";

async fn browse(engine: &mut Engine) -> Result<()> {
    println!("{BROWSE_HELP}");
    let stdin = std::io::stdin();
    loop {
        print!("{}> ", engine.path());
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else { continue };
        let rest = words.collect::<Vec<_>>().join(" ");

        let command = match verb {
            "quit" | "exit" | "q" => return Ok(()),
            "help" => {
                println!("{BROWSE_HELP}");
                continue;
            }
            "ls" | "refresh" => Command::Refresh,
            "cd" => Command::Enter { name: rest },
            "up" => Command::Leave,
            "put" => Command::Upload {
                paths: vec![PathBuf::from(rest)],
            },
            "mkdir" => Command::Mkdir { name: rest },
            "rm" => Command::Delete { name: rest },
            "link" => Command::DirectLink { name: rest },
            _ => {
                println!("unknown command '{verb}', try `help`");
                continue;
            }
        };

        match engine.dispatch(command).await {
            Ok(outcome) => render(engine, outcome),
            Err(err) => println!("Error: {err:#}"),
        }
    }
}
