//! HTTP client for the Azure Text-to-Speech REST API.
//!
//! A synthesis request is an HTTP POST to the configured regional endpoint:
//!
//! - URL: `https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
//! - Authentication: `Ocp-Apim-Subscription-Key` header
//! - Content-Type: `application/ssml+xml`
//! - Output format: `X-Microsoft-OutputFormat` header
//!
//! On success the response body is raw audio bytes. The outcome is modeled
//! as an explicit tagged result ([`SynthesisResponse`]) instead of letting
//! callers branch on status codes: a non-success status becomes
//! `RemoteError` with the diagnostic body, and a request that never got a
//! response becomes `TransportError`.
//!
//! The [`Synthesizer`] trait is the seam the conversion workflow talks
//! through, so tests can substitute a scripted implementation without any
//! network access.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::core::voices::OUTPUT_FORMAT;

/// HTTP header carrying the subscription key.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// HTTP header selecting the audio output format.
pub const OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";

/// User-Agent header value for synthesis requests.
const USER_AGENT: &str = "ttsvault";

/// Upper bound on one synthesis request. No retry after it elapses.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Builds the regional synthesis endpoint URL.
pub fn tts_rest_url(region: &str) -> String {
    format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1")
}

/// Outcome of one synthesis request.
#[derive(Debug, Clone)]
pub enum SynthesisResponse {
    /// The service returned audio bytes.
    Success(Bytes),
    /// The service answered with a non-success status and diagnostic body.
    RemoteError { status: u16, body: String },
    /// The request failed below HTTP: timeout, DNS, connection refused.
    TransportError(String),
}

/// Submits SSML documents to a synthesis service.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Sends `ssml` to `endpoint` authenticated with `api_key` and waits
    /// for the outcome. Never retries.
    async fn synthesize(&self, endpoint: &str, api_key: &str, ssml: &str) -> SynthesisResponse;
}

/// Real HTTP implementation backed by a pooled `reqwest` client.
pub struct HttpSynthesizer {
    client: reqwest::Client,
}

impl HttpSynthesizer {
    /// Creates a synthesizer with the fixed request timeout.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Builds the POST request with endpoint URL, headers, and SSML body.
    fn build_request(&self, endpoint: &str, api_key: &str, ssml: &str) -> reqwest::RequestBuilder {
        self.client
            .post(endpoint)
            .header(SUBSCRIPTION_KEY_HEADER, api_key)
            .header("Content-Type", "application/ssml+xml")
            .header(OUTPUT_FORMAT_HEADER, OUTPUT_FORMAT)
            .header("User-Agent", USER_AGENT)
            .body(ssml.to_string())
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, endpoint: &str, api_key: &str, ssml: &str) -> SynthesisResponse {
        debug!("submitting synthesis request to {endpoint}");

        let response = match self.build_request(endpoint, api_key, ssml).send().await {
            Ok(response) => response,
            Err(e) => return SynthesisResponse::TransportError(e.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            match response.bytes().await {
                Ok(audio) => SynthesisResponse::Success(audio),
                Err(e) => SynthesisResponse::TransportError(e.to_string()),
            }
        } else {
            let body = response.text().await.unwrap_or_default();
            SynthesisResponse::RemoteError {
                status: status.as_u16(),
                body,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tts_rest_url() {
        assert_eq!(
            tts_rest_url("northcentralus"),
            "https://northcentralus.tts.speech.microsoft.com/cognitiveservices/v1"
        );
        assert_eq!(
            tts_rest_url("westeurope"),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );
    }

    #[test]
    fn test_build_request_url_and_method() {
        let synth = HttpSynthesizer::new().unwrap();
        let request = synth
            .build_request(&tts_rest_url("eastus"), "test-key", "<speak/>")
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://eastus.tts.speech.microsoft.com/cognitiveservices/v1"
        );
        assert_eq!(request.method(), reqwest::Method::POST);
    }

    #[test]
    fn test_build_request_headers() {
        let synth = HttpSynthesizer::new().unwrap();
        let request = synth
            .build_request(&tts_rest_url("eastus"), "test-key", "<speak/>")
            .build()
            .unwrap();

        let headers = request.headers();
        assert_eq!(
            headers.get(SUBSCRIPTION_KEY_HEADER).unwrap().to_str().unwrap(),
            "test-key"
        );
        assert_eq!(
            headers.get("content-type").unwrap().to_str().unwrap(),
            "application/ssml+xml"
        );
        assert_eq!(
            headers.get(OUTPUT_FORMAT_HEADER).unwrap().to_str().unwrap(),
            OUTPUT_FORMAT
        );
        assert_eq!(
            headers.get("user-agent").unwrap().to_str().unwrap(),
            USER_AGENT
        );
    }

    #[test]
    fn test_build_request_body_is_ssml() {
        let synth = HttpSynthesizer::new().unwrap();
        let ssml = "<speak version='1.0'>hello</speak>";
        let request = synth
            .build_request(&tts_rest_url("eastus"), "key", ssml)
            .build()
            .unwrap();

        let body = request.body().unwrap().as_bytes().unwrap();
        assert_eq!(std::str::from_utf8(body).unwrap(), ssml);
    }
}
