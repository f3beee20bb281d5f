use colored::Colorize;
use serde::Serialize;

use crate::error::RagchatError;
use crate::types::{format_file_size, Document, QueryResponse, SessionStatus, UploadResponse, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    Json,
}

impl OutputMode {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Pretty
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn label(text: &str, is_tty: bool) -> String {
    if is_tty {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

pub fn print_message(message: &str, mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(&serde_json::json!({ "message": message })),
        OutputMode::Pretty => println!("{message}"),
    }
}

pub fn print_user(user: &User, mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => print_json(user),
        OutputMode::Pretty => {
            println!("{} {}", label("Logged in as", is_tty), user.display_name());
            if !user.email.is_empty() {
                println!("{} {}", label("Email:", is_tty), user.email);
            }
        }
    }
}

pub fn print_session_status(status: &SessionStatus, mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => print_json(status),
        OutputMode::Pretty => {
            let state = match (status.authenticated, is_tty) {
                (true, true) => "logged in".green().to_string(),
                (true, false) => "logged in".to_string(),
                (false, true) => "logged out".yellow().to_string(),
                (false, false) => "logged out".to_string(),
            };
            println!("{} {} ({})", label("Session", is_tty), status.session, state);
            if let Some(saved_at) = status.saved_at {
                println!("{} {}", label("Credentials saved:", is_tty), saved_at.to_rfc3339());
            }
        }
    }
}

pub fn print_upload(result: &UploadResponse, mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => print_json(result),
        OutputMode::Pretty => {
            println!(
                "{} {} file(s), {} chunk(s)",
                label("Ingested", is_tty),
                result.files.len(),
                result.chunks
            );
            for file in &result.files {
                println!("  {file}");
            }
        }
    }
}

pub fn print_query(result: &QueryResponse, mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => print_json(result),
        OutputMode::Pretty => {
            if let Some(answer) = &result.answer {
                println!("{answer}");
                if !result.citations.is_empty() {
                    println!();
                    println!("{}", label("Sources:", is_tty));
                    for c in &result.citations {
                        let source = c.source.as_deref().unwrap_or("unknown");
                        match c.page {
                            Some(page) => println!("  [{}] {source}, page {page}", c.index),
                            None => println!("  [{}] {source}", c.index),
                        }
                    }
                }
                return;
            }
            for (i, chunk) in result.results.iter().enumerate() {
                let header = format!("[{}] score {:.2}", i + 1, chunk.score);
                if is_tty {
                    println!("{}", header.dimmed());
                } else {
                    println!("{header}");
                }
                println!("{}", chunk.content);
                println!();
            }
        }
    }
}

pub fn print_documents(documents: &[Document], mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => print_json(&serde_json::json!({ "documents": documents })),
        OutputMode::Pretty => {
            if documents.is_empty() {
                println!("No documents uploaded yet.");
                return;
            }
            for doc in documents {
                let title = if is_tty {
                    doc.title.bold().to_string()
                } else {
                    doc.title.clone()
                };
                println!(
                    "{:>6}  {}  {} • {}",
                    doc.id,
                    title,
                    format_file_size(doc.file_size),
                    doc.upload_date.format("%Y-%m-%d %H:%M")
                );
            }
        }
    }
}

pub fn print_error(err: &RagchatError, mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(&err.to_json()),
        OutputMode::Pretty => eprintln!("Error: {err}"),
    }
}
