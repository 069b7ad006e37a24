//! One-shot chat from the command line.

use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::state::AppState;

/// Send one message and print the reply.
///
/// # Examples
///
/// ```bash
/// parley chat "hello"
/// parley chat "and then?" --session 0192...
/// ```
pub async fn send_message(
    state: &AppState,
    message: &str,
    session_id: Option<&str>,
    json: bool,
) -> Result<()> {
    if message.trim().is_empty() {
        anyhow::bail!("Message cannot be empty");
    }

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        spinner.set_message("Thinking...");
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    };

    let result = state.sessions.run_turn(session_id, message).await;

    spinner.finish_and_clear();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "session_id": result.session_id,
                "reply": result.reply,
                "offline": result.outcome.is_offline(),
            }))?
        );
        return Ok(());
    }

    println!();
    println!("  {}", result.reply);
    println!();
    if result.outcome.is_offline() {
        println!("  {}", style("(offline reply: the model backend is unavailable)").yellow());
    }
    println!(
        "  {} {}",
        style("session").dim(),
        style(&result.session_id).cyan()
    );
    println!();

    Ok(())
}
