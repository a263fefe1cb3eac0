//! Stickies CLI - sticky notes from the terminal
//!
//! Talks to the same storage gateway as the web app.

mod cli;
mod commands;
mod error;


use std::io;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::{Session, StdoutClipboard, TerminalNotifier};
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::share::run_share;
use crate::commands::show::run_show;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "stickies_cli=warn"
        .parse()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();
    let mut out = io::stdout();

    let Some(command) = cli.command else {
        // Quick capture mode: stickies "my note"
        if cli.note.is_empty() {
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
        let session = Session::from_env()?;
        return run_add(&session, &cli.note, "yellow", None, &TerminalNotifier, &mut out).await;
    };

    let session = Session::from_env()?;
    match command {
        Commands::Add {
            content,
            color,
            image,
        } => {
            run_add(
                &session,
                &content,
                &color,
                image.as_deref(),
                &TerminalNotifier,
                &mut out,
            )
            .await?;
        }
        Commands::List { limit, json } => run_list(&session, limit, json, &mut out).await?,
        Commands::Show { id, json } => run_show(&session, &id, json, &mut out).await?,
        Commands::Delete { id } => run_delete(&session, &id, &TerminalNotifier, &mut out).await?,
        Commands::Share { id } => {
            run_share(&session, &id, &StdoutClipboard, &TerminalNotifier).await?;
        }
    }

    Ok(())
}
