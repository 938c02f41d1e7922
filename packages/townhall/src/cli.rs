use anyhow::{Context, Result};
use std::io::IsTerminal;
use tracing::info;

use townhall_state::{Action, Route};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::store::Store;
use crate::tui;

/// `townhall list`: print the dashboard rows once and exit.
pub async fn list_command(config: &ClientConfig, json: bool) -> Result<()> {
    let api = ApiClient::new(config)?;
    let sessions = api
        .list_sessions()
        .await
        .with_context(|| format!("Failed to list sessions from {}", api.api_url()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
    } else if sessions.is_empty() {
        println!("No sessions.");
    } else {
        println!(
            "{:<12} {:<32} {:<16} {:>11} {:>10} {}",
            "ID", "TOPIC", "ANSWERER", "QUESTIONERS", "ANSWERED", "STATUS"
        );
        println!("{}", "-".repeat(96));
        for row in &sessions {
            let t = &row.totals;
            let status = if row.session.locked { "locked" } else { "open" };
            println!(
                "{:<12} {:<32} {:<16} {:>11} {:>10} {}",
                row.session.session_id,
                truncate(&row.session.name, 32),
                truncate(&row.answerer.name, 16),
                t.questioners,
                format!("{}/{}", t.answered_questions, t.questions),
                status
            );
        }
        println!("\n{} session(s)", sessions.len());
    }

    Ok(())
}

/// Open the terminal UI. `initial` is the first action to dispatch (a
/// create/join/rejoin from the command line); the dashboard otherwise.
pub async fn run_interactive(config: &ClientConfig, initial: Option<Action>) -> Result<()> {
    if !std::io::stdout().is_terminal() {
        anyhow::bail!("townhall needs an interactive terminal (try `townhall list`)");
    }

    let api = ApiClient::new(config)?;
    info!(api_url = api.api_url(), "starting terminal UI");

    let mut store = Store::new(api, tokio::runtime::Handle::current());
    boot(&mut store, initial);

    let tick = config.tick;
    // The UI loop blocks on terminal input; keep it off the async workers
    // so effect tasks keep making progress.
    let result = tokio::task::block_in_place(|| {
        let mut terminal = ratatui::init();
        let result = tui::run(&mut terminal, &mut store, tick);
        ratatui::restore();
        result
    });

    info!("terminal UI closed");
    result
}

/// Load the dashboard, then run the command-line action on top of it so the
/// list is populated when the user backs out of the session.
fn boot(store: &mut Store, initial: Option<Action>) {
    store.dispatch(Action::Navigate(Route::Dashboard));
    if let Some(action) = initial {
        store.dispatch(action);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
