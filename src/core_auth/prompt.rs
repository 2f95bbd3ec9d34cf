use anyhow::{Context, Result};

/// Reads the password from the terminal without echoing it.
pub async fn prompt_password(prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || rpassword::prompt_password(prompt))
        .await
        .context("Password prompt task failed")?
        .context("Failed to read password")
}
