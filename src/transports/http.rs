use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::Url;

use crate::error::RagchatError;
use crate::request::{ApiResponse, MultipartPart, RequestBody, RequestDescriptor};
use crate::transport::HttpTransport;

/// HTTP transport backed by a shared `reqwest::Client`.
///
/// Request paths are resolved relative to the base URL, so
/// `auth/me/` against `https://host/api/` targets `https://host/api/auth/me/`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Create a new transport.
    ///
    /// Rejects cleartext `http://` URLs to non-loopback hosts unless
    /// `allow_http` is `true`.
    pub fn new(base_url: &str, timeout: Duration, allow_http: bool) -> Result<Self, RagchatError> {
        let mut url = Url::parse(base_url).map_err(|e| {
            RagchatError::InvalidRequest(format!("Invalid base URL '{base_url}': {e}"))
        })?;

        match url.scheme() {
            "https" => {}
            "http" if allow_http || is_loopback(&url) => {}
            "http" => {
                return Err(RagchatError::InvalidRequest(format!(
                    "Cleartext HTTP is not allowed for '{base_url}'. \
                     Use https:// or set \"allowHttp\": true in the config."
                )));
            }
            scheme => {
                return Err(RagchatError::InvalidRequest(format!(
                    "Unsupported URL scheme '{scheme}' in '{base_url}'"
                )));
            }
        }

        // Without the trailing slash `join` would replace the last segment.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ragchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RagchatError::NetworkFailure(Box::new(e)))?;

        Ok(Self {
            client,
            base_url: url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url, RagchatError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RagchatError::InvalidRequest(format!("Invalid request path '{path}': {e}")))
    }
}

fn is_loopback(url: &Url) -> bool {
    matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]")
    )
}

fn build_form(parts: &[MultipartPart]) -> Result<Form, RagchatError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            MultipartPart::Text { name, value } => form.text(name.clone(), value.clone()),
            MultipartPart::File {
                name,
                file_name,
                content,
                mime,
            } => {
                let mut file_part = Part::bytes(content.clone()).file_name(file_name.clone());
                if let Some(mime) = mime {
                    file_part = file_part.mime_str(mime).map_err(|e| {
                        RagchatError::InvalidRequest(format!(
                            "Invalid content type '{mime}' for {file_name}: {e}"
                        ))
                    })?;
                }
                form.part(name.clone(), file_part)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: &RequestDescriptor,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, RagchatError> {
        let url = self.url_for(&request.path)?;
        let mut http_req = self.client.request(request.method.clone(), url);

        for (key, value) in &request.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                RagchatError::InvalidRequest(format!("Invalid header name '{key}': {e}"))
            })?;
            // The session bearer is the only Authorization sent.
            if bearer.is_some() && name == AUTHORIZATION {
                continue;
            }
            let val = HeaderValue::from_str(value).map_err(|e| {
                RagchatError::InvalidRequest(format!("Invalid header value for '{key}': {e}"))
            })?;
            http_req = http_req.header(name, val);
        }

        if let Some(token) = bearer {
            http_req = http_req.bearer_auth(token);
        }

        http_req = match &request.body {
            RequestBody::Empty => http_req,
            RequestBody::Json(value) => http_req.json(value),
            RequestBody::Multipart(parts) => http_req.multipart(build_form(parts)?),
        };

        let response = http_req
            .send()
            .await
            .map_err(|e| RagchatError::NetworkFailure(Box::new(e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RagchatError::NetworkFailure(Box::new(e)))?;

        Ok(ApiResponse { status, body })
    }
}
