use crate::error::RagchatError;
use crate::types::QueryRequest;

use super::context::CliContext;
use super::output::print_query;

pub struct QueryOptions {
    pub top_k: u32,
    pub temperature: f64,
    pub generate: bool,
    pub source: Option<String>,
}

fn build_request(text: &str, options: QueryOptions) -> QueryRequest {
    QueryRequest {
        query: text.to_string(),
        top_k: options.top_k,
        generate: options.generate,
        temperature: options.temperature,
        source: options.source.filter(|s| !s.is_empty()),
    }
}

pub async fn run_query(
    ctx: &CliContext,
    text: &str,
    options: QueryOptions,
) -> Result<(), RagchatError> {
    let request = build_request(text, options);
    let result = ctx.client.query(&request).await?;
    print_query(&result, ctx.mode, ctx.is_tty);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_maps_options() {
        let req = build_request(
            "what is in the handbook?",
            QueryOptions {
                top_k: 8,
                temperature: 0.2,
                generate: false,
                source: Some("handbook".into()),
            },
        );
        assert_eq!(req.top_k, 8);
        assert!(!req.generate);
        assert_eq!(req.source.as_deref(), Some("handbook"));
    }

    #[test]
    fn empty_source_is_dropped() {
        let req = build_request(
            "q",
            QueryOptions {
                top_k: 4,
                temperature: 0.7,
                generate: true,
                source: Some(String::new()),
            },
        );
        assert!(req.source.is_none());
    }
}
