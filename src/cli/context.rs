use std::io::{BufRead, IsTerminal, Write};

use crate::client::ApiClient;
use crate::config::load_config;
use crate::error::RagchatError;

use super::output::OutputMode;

/// Everything a command needs: a configured client and how to print.
#[derive(Debug)]
pub struct CliContext {
    pub client: ApiClient,
    pub mode: OutputMode,
    pub is_tty: bool,
}

impl CliContext {
    pub fn load(config_path: Option<&str>, json: bool) -> Result<Self, RagchatError> {
        let config = load_config(config_path)?;
        tracing::debug!(base_url = %config.base_url, session = %config.session, "using config");
        Ok(Self {
            client: ApiClient::from_config(&config)?,
            mode: OutputMode::from_flag(json),
            is_tty: std::io::stdout().is_terminal(),
        })
    }
}

/// Prompt on stderr and read one line from stdin.
pub fn read_secret(prompt: &str) -> Result<String, RagchatError> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let secret = trim_line_ending(&line);
    if secret.is_empty() {
        return Err(RagchatError::InvalidRequest("password must not be empty".into()));
    }
    Ok(secret.to_string())
}

fn trim_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}
