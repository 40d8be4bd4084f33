//! Endpoint adapters: how each inference route is called and how its answer
//! is normalized into a [`DiagnosticResult`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capabilities::http::{HttpMethod, HttpRequest, ValidatedUrl};
use crate::config::ServerUrl;
use crate::error::DiagnosticError;
use crate::media::MediaHandle;
use crate::multipart;

pub const FILE_FIELD: &str = "file";
pub const NO_PEST_RISK_TEXT: &str = "No prediction returned from the server.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    DiseaseImage,
    PestImage,
    PestQuery,
    PestRisk,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [
        Endpoint::DiseaseImage,
        Endpoint::PestImage,
        Endpoint::PestQuery,
        Endpoint::PestRisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::DiseaseImage => "disease_image",
            Endpoint::PestImage => "pest_image",
            Endpoint::PestQuery => "pest_query",
            Endpoint::PestRisk => "pest_risk",
        }
    }

    /// Image screens submit a `MediaHandle`; the others submit typed text.
    pub fn accepts_media(&self) -> bool {
        matches!(self, Endpoint::DiseaseImage | Endpoint::PestImage)
    }

    pub fn adapter(&self) -> &'static dyn EndpointAdapter {
        match self {
            Endpoint::DiseaseImage => &DiseaseImageAdapter,
            Endpoint::PestImage => &PestImageAdapter,
            Endpoint::PestQuery => &PestQueryAdapter,
            Endpoint::PestRisk => &PestRiskAdapter,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SubmissionInput<'a> {
    Media(&'a MediaHandle),
    Query(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DiagnosticResult {
    Disease {
        predicted_label: String,
        explanation: String,
    },
    PestImage {
        predicted_label: String,
        explanation: String,
        control: String,
    },
    PestLookup {
        pest_name: String,
        pesticide: String,
        ai_explanation: String,
        image_url: Option<String>,
    },
    PestRisk {
        plant_name: String,
        risk: String,
    },
}

impl DiagnosticResult {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            DiagnosticResult::Disease { .. } => Endpoint::DiseaseImage,
            DiagnosticResult::PestImage { .. } => Endpoint::PestImage,
            DiagnosticResult::PestLookup { .. } => Endpoint::PestQuery,
            DiagnosticResult::PestRisk { .. } => Endpoint::PestRisk,
        }
    }

    /// Sets the found image location on a pest lookup; other variants are
    /// returned unchanged.
    #[must_use]
    pub fn with_image_url(self, url: String) -> Self {
        match self {
            DiagnosticResult::PestLookup {
                pest_name,
                pesticide,
                ai_explanation,
                ..
            } => DiagnosticResult::PestLookup {
                pest_name,
                pesticide,
                ai_explanation,
                image_url: Some(url),
            },
            other => other,
        }
    }
}

/// Wire format of one inference route.
pub trait EndpointAdapter: Sync {
    fn endpoint(&self) -> Endpoint;

    fn build_request(
        &self,
        server: &ServerUrl,
        input: SubmissionInput<'_>,
    ) -> Result<HttpRequest, DiagnosticError>;

    /// Parses a 2xx body. `query` is the text that was submitted, if any.
    fn parse_body(
        &self,
        body: &[u8],
        query: Option<&str>,
    ) -> Result<DiagnosticResult, DiagnosticError>;

    /// Best-effort secondary request issued after a successful parse.
    fn follow_up(&self, _server: &ServerUrl, _result: &DiagnosticResult) -> Option<HttpRequest> {
        None
    }
}

fn request_error(err: impl fmt::Display) -> DiagnosticError {
    DiagnosticError::invalid_request(err.to_string())
}

fn json_error(err: &serde_json::Error) -> DiagnosticError {
    DiagnosticError::malformed(format!("response is not valid JSON: {err}"))
}

fn url_for(server: &ServerUrl, segments: &[&str]) -> Result<ValidatedUrl, DiagnosticError> {
    ValidatedUrl::from_url(&server.endpoint_url(segments)).map_err(request_error)
}

fn expect_media<'a>(
    endpoint: Endpoint,
    input: SubmissionInput<'a>,
) -> Result<&'a MediaHandle, DiagnosticError> {
    match input {
        SubmissionInput::Media(media) => Ok(media),
        SubmissionInput::Query(_) => Err(DiagnosticError::invalid_request(format!(
            "{endpoint} expects an image"
        ))),
    }
}

fn expect_query<'a>(
    endpoint: Endpoint,
    input: SubmissionInput<'a>,
) -> Result<&'a str, DiagnosticError> {
    match input {
        SubmissionInput::Query(query) => Ok(query),
        SubmissionInput::Media(_) => Err(DiagnosticError::invalid_request(format!(
            "{endpoint} expects a text query"
        ))),
    }
}

fn upload(
    url: ValidatedUrl,
    filename: &str,
    media: &MediaHandle,
) -> Result<HttpRequest, DiagnosticError> {
    let (content_type, bytes) = multipart::encode_media(FILE_FIELD, filename, media)
        .map_err(request_error)?
        .into_parts();

    HttpRequest::new(HttpMethod::Post, url)
        .with_body(&content_type, bytes)
        .map_err(request_error)
}

/// Field values are shown verbatim, empty or not; only an absent field is
/// malformed.
fn required(value: Option<String>, field: &str) -> Result<String, DiagnosticError> {
    value.ok_or_else(|| DiagnosticError::malformed(format!("missing {field}")))
}

// --- Disease diagnosis from image ---

pub struct DiseaseImageAdapter;

#[derive(Deserialize)]
struct DiseaseResponse {
    status: Option<String>,
    message: Option<String>,
    disease_prediction: Option<DiseasePrediction>,
}

#[derive(Deserialize)]
struct DiseasePrediction {
    predicted: Option<String>,
    explanation: Option<String>,
}

impl EndpointAdapter for DiseaseImageAdapter {
    fn endpoint(&self) -> Endpoint {
        Endpoint::DiseaseImage
    }

    fn build_request(
        &self,
        server: &ServerUrl,
        input: SubmissionInput<'_>,
    ) -> Result<HttpRequest, DiagnosticError> {
        let media = expect_media(self.endpoint(), input)?;
        upload(url_for(server, &["upload", "plant-image"])?, "plant-image.jpg", media)
    }

    fn parse_body(
        &self,
        body: &[u8],
        _query: Option<&str>,
    ) -> Result<DiagnosticResult, DiagnosticError> {
        let response: DiseaseResponse = serde_json::from_slice(body).map_err(|e| json_error(&e))?;

        match response.status.as_deref() {
            Some("success") => {}
            status => {
                let mut reason = match status {
                    Some(s) => format!("prediction status was '{s}'"),
                    None => "missing status".to_string(),
                };
                if let Some(message) = response.message.filter(|m| !m.is_empty()) {
                    reason.push_str(": ");
                    reason.push_str(&message);
                }
                return Err(DiagnosticError::malformed(reason));
            }
        }

        let prediction = response
            .disease_prediction
            .ok_or_else(|| DiagnosticError::malformed("missing disease_prediction"))?;

        Ok(DiagnosticResult::Disease {
            predicted_label: required(prediction.predicted, "disease_prediction.predicted")?,
            explanation: prediction.explanation.unwrap_or_default(),
        })
    }
}

// --- Pest diagnosis from image ---

pub struct PestImageAdapter;

#[derive(Deserialize)]
struct PestDetectionResponse {
    pest_detection: Option<PestDetection>,
}

#[derive(Deserialize)]
struct PestDetection {
    predicted_class: Option<String>,
    explanation: Option<String>,
    control: Option<String>,
}

impl EndpointAdapter for PestImageAdapter {
    fn endpoint(&self) -> Endpoint {
        Endpoint::PestImage
    }

    fn build_request(
        &self,
        server: &ServerUrl,
        input: SubmissionInput<'_>,
    ) -> Result<HttpRequest, DiagnosticError> {
        let media = expect_media(self.endpoint(), input)?;
        upload(url_for(server, &["upload-pest-image", ""])?, "pest-image.jpg", media)
    }

    fn parse_body(
        &self,
        body: &[u8],
        _query: Option<&str>,
    ) -> Result<DiagnosticResult, DiagnosticError> {
        let response: PestDetectionResponse =
            serde_json::from_slice(body).map_err(|e| json_error(&e))?;
        let detection = response
            .pest_detection
            .ok_or_else(|| DiagnosticError::malformed("missing pest_detection"))?;

        Ok(DiagnosticResult::PestImage {
            predicted_label: required(detection.predicted_class, "pest_detection.predicted_class")?,
            explanation: detection.explanation.unwrap_or_default(),
            control: detection.control.unwrap_or_default(),
        })
    }
}

// --- Pest lookup from free text ---

pub struct PestQueryAdapter;

#[derive(Serialize)]
struct PestQueryBody<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct PestLookupResponse {
    pest_name: Option<String>,
    pesticide: Option<String>,
    ai_response: Option<String>,
}

impl EndpointAdapter for PestQueryAdapter {
    fn endpoint(&self) -> Endpoint {
        Endpoint::PestQuery
    }

    fn build_request(
        &self,
        server: &ServerUrl,
        input: SubmissionInput<'_>,
    ) -> Result<HttpRequest, DiagnosticError> {
        let query = expect_query(self.endpoint(), input)?;
        if query.trim().is_empty() {
            return Err(DiagnosticError::empty_query("a pest query"));
        }

        let url = url_for(server, &["retrieve_pest_data"])?;
        HttpRequest::new(HttpMethod::Post, url)
            .with_json(&PestQueryBody { query })
            .map_err(request_error)
    }

    fn parse_body(
        &self,
        body: &[u8],
        _query: Option<&str>,
    ) -> Result<DiagnosticResult, DiagnosticError> {
        let response: PestLookupResponse =
            serde_json::from_slice(body).map_err(|e| json_error(&e))?;

        Ok(DiagnosticResult::PestLookup {
            pest_name: required(response.pest_name, "pest_name")?,
            pesticide: required(response.pesticide, "pesticide")?,
            ai_explanation: response.ai_response.unwrap_or_default(),
            image_url: None,
        })
    }

    fn follow_up(&self, server: &ServerUrl, result: &DiagnosticResult) -> Option<HttpRequest> {
        let DiagnosticResult::PestLookup { pest_name, .. } = result else {
            return None;
        };
        if pest_name.is_empty() {
            return None;
        }

        match url_for(server, &["get_pest_image", pest_name.as_str()]) {
            Ok(url) => Some(HttpRequest::new(HttpMethod::Get, url)),
            Err(e) => {
                debug!(error = %e, "skipping pest image lookup");
                None
            }
        }
    }
}

// --- Pest risk by plant name ---

pub struct PestRiskAdapter;

#[derive(Deserialize)]
struct PestRiskResponse {
    pest_risk: Option<String>,
}

impl EndpointAdapter for PestRiskAdapter {
    fn endpoint(&self) -> Endpoint {
        Endpoint::PestRisk
    }

    fn build_request(
        &self,
        server: &ServerUrl,
        input: SubmissionInput<'_>,
    ) -> Result<HttpRequest, DiagnosticError> {
        let plant_name = expect_query(self.endpoint(), input)?;
        if plant_name.trim().is_empty() {
            return Err(DiagnosticError::empty_query("a plant name"));
        }

        let url = url_for(server, &["predict", plant_name])?;
        HttpRequest::new(HttpMethod::Get, url)
            .with_header("Accept", "application/json")
            .map_err(request_error)
    }

    fn parse_body(
        &self,
        body: &[u8],
        query: Option<&str>,
    ) -> Result<DiagnosticResult, DiagnosticError> {
        let response: PestRiskResponse =
            serde_json::from_slice(body).map_err(|e| json_error(&e))?;

        let risk = response
            .pest_risk
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| NO_PEST_RISK_TEXT.to_string());

        Ok(DiagnosticResult::PestRisk {
            plant_name: query.map(str::trim).unwrap_or_default().to_string(),
            risk,
        })
    }
}
