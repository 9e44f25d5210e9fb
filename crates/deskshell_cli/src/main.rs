//! CLI driver for the shell core.
//!
//! # Responsibility
//! - Wire the SQLite store and demo panels into a `Shell`.
//! - Walk the requested views and print each rendered screen.
//!
//! Usage: `deskshell_cli [--config <json>] [--db <path>] [--name <user>] [views...]`

mod panels;

use clap::Parser;
use deskshell_core::{
    init_from_config, ContentFrame, Screen, Shell, ShellConfig, ShellServices, SqliteShellStore,
    UserProfile,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

const DB_FILE_NAME: &str = "deskshell.sqlite3";
const LOAD_WAIT: Duration = Duration::from_secs(2);

/// Walks the shell through a list of views and prints each screen.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON shell config; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// SQLite database file; falls back to the config, then the temp dir.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Profile name saved when onboarding is still pending.
    #[arg(long)]
    name: Option<String>,
    /// View tokens to visit in order.
    views: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("deskshell: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };
    if let Err(err) = init_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    let db_path = args
        .db
        .clone()
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME));
    let store = Arc::new(SqliteShellStore::open(&db_path)?);
    log::info!(
        "event=cli_start module=cli status=ok db={}",
        db_path.display()
    );

    let services = ShellServices::new(store.clone(), store.clone()).with_flags(store.clone());
    let mut shell = Shell::start(&config, panels::demo_registry()?, services).await?;
    print_screen(&shell);

    if shell.should_show_onboarding() {
        let Some(name) = args.name.as_deref() else {
            println!("onboarding required; rerun with --name <user>");
            return Ok(());
        };
        store.save_profile(&UserProfile::new(name))?;
        if !shell.complete_onboarding().await {
            return Err("onboarding did not complete".into());
        }
        print_screen(&shell);
    }

    for token in &args.views {
        if let Err(err) = shell.navigate_token(token) {
            println!("skip {token}: {err}");
            continue;
        }
        settle_loading(&mut shell).await;
        print_screen(&shell);
    }
    Ok(())
}

/// Applies queued events until the current view stops showing the loading
/// placeholder or the wait runs out.
async fn settle_loading(shell: &mut Shell) {
    shell.pump();
    while is_loading(shell) {
        match tokio::time::timeout(LOAD_WAIT, shell.next_event()).await {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                log::warn!(
                    "event=cli_wait module=cli status=timeout view={}",
                    shell.current()
                );
                return;
            }
        }
    }
}

fn is_loading(shell: &Shell) -> bool {
    matches!(
        shell.render().workspace().map(|frame| &frame.content),
        Some(ContentFrame::Loading(_))
    )
}

fn print_screen(shell: &Shell) {
    match shell.render() {
        Screen::Onboarding => println!("[onboarding]"),
        Screen::Workspace(frame) => {
            println!("[{}] {}", frame.current, frame.content.text());
            if let Some(chrome) = &frame.chrome {
                let sidebar: Vec<&str> = chrome.sidebar.iter().map(|view| view.as_str()).collect();
                println!(
                    "  sidebar: {} (user={}, alpha={})",
                    sidebar.join(" "),
                    chrome.user_name.as_deref().unwrap_or("-"),
                    chrome.alpha_enabled
                );
            }
            println!(
                "  background {} visible={}: {}",
                frame.background.view, frame.background.visible, frame.background.body
            );
        }
    }
}
