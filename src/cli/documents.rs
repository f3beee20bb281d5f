use std::path::PathBuf;

use crate::error::RagchatError;

use super::context::CliContext;
use super::output::{print_documents, print_message, print_upload};

pub async fn run_upload(
    ctx: &CliContext,
    files: &[PathBuf],
    source: Option<&str>,
) -> Result<(), RagchatError> {
    let result = ctx.client.upload(files, source).await?;
    print_upload(&result, ctx.mode, ctx.is_tty);
    Ok(())
}

pub async fn run_list(ctx: &CliContext) -> Result<(), RagchatError> {
    let documents = ctx.client.list_documents().await?;
    print_documents(&documents, ctx.mode, ctx.is_tty);
    Ok(())
}

pub async fn run_delete(ctx: &CliContext, id: u64) -> Result<(), RagchatError> {
    ctx.client.delete_document(id).await?;
    print_message(&format!("Deleted document {id}"), ctx.mode);
    Ok(())
}
