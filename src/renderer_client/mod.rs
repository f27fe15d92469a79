//! HTTP client for the external certificate renderer. The core only owns the
//! data contract; layout and templating live on the other side.

use serde::Serialize;
use uuid::Uuid;

/// Metadata payload the renderer consumes. Callers must have confirmed
/// eligibility before building one of these.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateData {
    pub student_name: String,
    pub course_name: String,
    /// Human-readable date, e.g. "August 28, 2026".
    pub completion_date: String,
    /// Fresh per request; a display nonce, not a persisted credential.
    pub certificate_id: Uuid,
    pub completion_percentage: f64,
    /// Course length in minutes.
    pub course_duration: i32,
}

#[derive(Clone, Debug)]
pub struct RendererClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RendererClient {
    /// Create a new client with the given base URL (e.g. "http://localhost:9090").
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        let base_url_str = base_url.into();
        tracing::debug!(base_url = %base_url_str, "creating RendererClient");
        Ok(RendererClient {
            base_url: base_url_str.trim_end_matches('/').to_string(),
            api_key: None,
            client,
        })
    }

    /// Return a client with the provided API key set (Bearer)
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn auth_header(&self) -> Option<(String, String)> {
        self.api_key
            .as_ref()
            .map(|k| ("Authorization".to_string(), format!("Bearer {}", k)))
    }

    /// POST /v1/certificates/render — returns the rendered document bytes.
    #[tracing::instrument(level = "debug", skip(self, data))]
    pub async fn render_certificate(&self, data: &CertificateData) -> anyhow::Result<Vec<u8>> {
        let url = self.url("/v1/certificates/render");
        tracing::debug!(%url, certificate_id = %data.certificate_id, "POST render certificate");
        let mut req = self.client.post(&url).json(data);
        if let Some((k, v)) = self.auth_header() {
            req = req.header(&k, &v);
        }
        let resp = req.send().await?;
        let ok = resp.error_for_status()?;
        let bytes = ok.bytes().await?;
        Ok(bytes.to_vec())
    }
}
