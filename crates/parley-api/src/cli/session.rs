//! Session management CLI commands: new, sidebar, history, pin, archive, delete.

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;

use parley_types::error::SessionError;
use parley_types::llm::MessageRole;
use parley_types::session::SessionSummary;

use crate::state::AppState;

/// Start a new session and print its ID.
pub async fn new_session(state: &AppState, json: bool) -> Result<()> {
    let session = state.sessions.create_session().await;

    if json {
        println!("{}", serde_json::json!({"session_id": session.session_id}));
    } else {
        println!(
            "  {} New session {}",
            style("✓").green().bold(),
            style(&session.session_id).cyan()
        );
    }
    Ok(())
}

/// Print the sidebar lists.
///
/// # Examples
///
/// ```bash
/// parley sessions
/// parley sessions --json
/// ```
pub async fn list_sessions(state: &AppState, json: bool) -> Result<()> {
    let sidebar = state.sessions.sidebar().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sidebar)?);
        return Ok(());
    }

    if sidebar.recent.is_empty() && sidebar.pinned.is_empty() && sidebar.archived.is_empty() {
        println!();
        println!(
            "  {} No sessions yet. Start one with: {}",
            style("i").blue().bold(),
            style("parley chat \"hello\"").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("List").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Session").fg(Color::White),
    ]);

    let sections: [(&str, Color, &[SessionSummary]); 3] = [
        ("pinned", Color::Yellow, &sidebar.pinned),
        ("recent", Color::Green, &sidebar.recent),
        ("archived", Color::DarkGrey, &sidebar.archived),
    ];

    for (label, color, entries) in sections {
        for entry in entries {
            table.add_row(vec![
                Cell::new(label).fg(color),
                Cell::new(&entry.title).fg(Color::Cyan),
                Cell::new(&entry.session_id).fg(Color::DarkGrey),
            ]);
        }
    }

    println!();
    println!("{table}");
    println!(
        "  {} store",
        style(state.store_backend()).bold()
    );
    println!();

    Ok(())
}

/// Print a session's conversation.
pub async fn show_history(state: &AppState, session_id: &str, json: bool) -> Result<()> {
    let messages = state
        .sessions
        .history(session_id)
        .await
        .with_context(|| format!("Session '{session_id}' not found"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    println!();
    for message in &messages {
        let role = style(message.role.to_string());
        let label = match message.role {
            MessageRole::System => role.dim(),
            MessageRole::User => role.green().bold(),
            MessageRole::Assistant => role.cyan().bold(),
        };
        println!("  {label}");
        println!("  {}", message.content);
        println!();
    }

    Ok(())
}

/// Toggle the pinned flag.
pub async fn toggle_pin(state: &AppState, session_id: &str, json: bool) -> Result<()> {
    let is_pinned = state
        .sessions
        .toggle_pin(session_id)
        .await
        .map_err(|e| not_found_context(e, session_id))?;

    if json {
        println!("{}", serde_json::json!({"status": "success", "is_pinned": is_pinned}));
    } else {
        let verb = if is_pinned { "pinned" } else { "unpinned" };
        println!("  {} Session {verb}.", style("✓").green().bold());
    }
    Ok(())
}

/// Toggle the archived flag.
pub async fn toggle_archive(state: &AppState, session_id: &str, json: bool) -> Result<()> {
    let is_archived = state
        .sessions
        .toggle_archive(session_id)
        .await
        .map_err(|e| not_found_context(e, session_id))?;

    if json {
        println!("{}", serde_json::json!({"status": "success", "is_archived": is_archived}));
    } else {
        let verb = if is_archived { "archived" } else { "restored" };
        println!("  {} Session {verb}.", style("✓").green().bold());
    }
    Ok(())
}

/// Delete a session, confirming first unless `force` or `json`.
pub async fn delete_session(
    state: &AppState,
    session_id: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete session '{}'?",
                style(session_id).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.sessions.delete(session_id).await?;

    if json {
        println!("{}", serde_json::json!({"status": "success"}));
    } else {
        println!("  {} Session deleted.", style("✓").red().bold());
    }
    Ok(())
}

fn not_found_context(err: SessionError, session_id: &str) -> anyhow::Error {
    match err {
        SessionError::NotFound => anyhow::anyhow!("Session '{session_id}' not found"),
        other => other.into(),
    }
}
