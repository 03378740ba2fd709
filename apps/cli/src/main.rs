use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{CampaignApp, Records, SessionStore, SupabaseClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;
mod shell;

use commands::{Command, CommandError, HELP};
use shell::{Flow, Shell};

#[derive(Parser, Debug)]
#[command(name = "campaign", about = "Gerenciador de campanhas de RPG de mesa")]
struct Args {
    /// Settings file with flat string keys.
    #[arg(long, default_value = "campaign.toml")]
    config: PathBuf,
    #[arg(long)]
    supabase_url: Option<String>,
    #[arg(long)]
    anon_key: Option<String>,
    /// Neither restore nor persist the signed-in session.
    #[arg(long)]
    no_session_cache: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings(&args.config);
    settings.apply_overrides(args.supabase_url, args.anon_key, args.no_session_cache);
    let (url, anon_key) = settings.remote()?;

    let client = Arc::new(
        SupabaseClient::new(url, anon_key).context("failed to configure Supabase client")?,
    );
    let session = Arc::new(SessionStore::new(client.clone(), settings.session_cache()));
    let app = CampaignApp::new(session, Records::new(client));
    let mut shell = Shell::new(app, Box::new(ask_on_stdin))
        .with_progress(Box::new(|app: &CampaignApp| println!("{}", render::root(app))));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build backend runtime")?;

    println!("{}", render::LOADING);
    runtime.block_on(shell.start());
    info!(supabase_url = %url, "cli: ready");
    println!("{}", render::root(shell.app()));

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush().context("failed to flush stdout")?;
        line.clear();
        if stdin.lock().read_line(&mut line).context("failed to read stdin")? == 0 {
            break;
        }

        let command = match commands::parse(&line) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        if command == Command::Help {
            println!("{HELP}");
            continue;
        }

        match runtime.block_on(shell.execute(command)) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(err) => println!("{err}"),
        }
        println!("{}", render::root(shell.app()));
    }

    Ok(())
}

fn ask_on_stdin(prompt: &str) -> bool {
    print!("{prompt} [s/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    )
}
