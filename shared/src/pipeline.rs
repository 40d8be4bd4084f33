//! Per-screen submission state machine.
//!
//! `Idle -> Submitting -> Succeeded | Failed`, with at most one request in
//! flight. Responses are matched by [`RequestId`]; anything else is stale.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::capabilities::http::{HttpRequest, HttpResult};
use crate::config::ServerUrl;
use crate::endpoint::{DiagnosticResult, Endpoint, SubmissionInput};
use crate::error::DiagnosticError;
use crate::media::{MediaHandle, MediaId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    pub fn now() -> Self {
        Self(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
                .unwrap_or_default(),
        )
    }

    pub fn elapsed_ms(&self) -> u64 {
        Self::now().0.saturating_sub(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestPhase {
    AwaitingResponse,
    /// Main response parsed; waiting on the best-effort image lookup.
    FetchingImage {
        partial: DiagnosticResult,
        image_url: String,
    },
}

/// One submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRequest {
    pub id: RequestId,
    pub endpoint: Endpoint,
    pub media_id: Option<MediaId>,
    pub query: Option<String>,
    pub started_at: UnixTimeMs,
    pub phase: RequestPhase,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    #[default]
    Idle,
    Submitting(DiagnosticRequest),
    Succeeded(DiagnosticResult),
    Failed(DiagnosticError),
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Submitting(_) => "submitting",
            PipelineState::Succeeded(_) => "succeeded",
            PipelineState::Failed(_) => "failed",
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, PipelineState::Submitting(_))
    }

    pub fn result(&self) -> Option<&DiagnosticResult> {
        match self {
            PipelineState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DiagnosticError> {
        match self {
            PipelineState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// What the caller must do after [`DiagnosticPipeline::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Send `http` and route the answer back with `request_id`.
    Dispatch {
        request_id: RequestId,
        http: HttpRequest,
    },
    /// A request is already in flight.
    Ignored,
    /// Validation failed before any network call; state is now `Failed`.
    Rejected(DiagnosticError),
}

/// What the caller must do after a response is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// State moved to `Succeeded` or `Failed`.
    Settled,
    /// Send the image lookup and route its answer to `complete_image_lookup`.
    ImageLookup {
        request_id: RequestId,
        http: HttpRequest,
    },
    /// Not the request this pipeline is waiting for.
    Stale,
    /// The media was replaced while the request was in flight.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct DiagnosticPipeline {
    endpoint: Endpoint,
    media: Option<MediaHandle>,
    query: String,
    state: PipelineState,
}

impl DiagnosticPipeline {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            media: None,
            query: String::new(),
            state: PipelineState::Idle,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn media(&self) -> Option<&MediaHandle> {
        self.media.as_ref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Holds `media`, dropping any previous handle and clearing a previous
    /// result or error. An in-flight request keeps running but its answer
    /// will be discarded.
    pub fn accept_media(&mut self, media: MediaHandle) {
        debug!(
            endpoint = %self.endpoint,
            media_id = %media.id(),
            source = media.source().as_str(),
            "media acquired"
        );
        self.media = Some(media);

        if !self.state.is_submitting() {
            self.state = PipelineState::Idle;
        }
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
    }

    /// Records a failed capture or pick. Returns false when the failure was
    /// swallowed because a submission is outstanding.
    pub fn fail_acquisition(&mut self, err: DiagnosticError) -> bool {
        if self.state.is_submitting() {
            warn!(
                endpoint = %self.endpoint,
                error_kind = err.kind().code(),
                "acquisition failed during submission, ignoring"
            );
            return false;
        }

        warn!(endpoint = %self.endpoint, error_kind = err.kind().code(), %err, "acquisition failed");
        self.state = PipelineState::Failed(err);
        true
    }

    #[instrument(skip(self, server), fields(endpoint = %self.endpoint, state = self.state.name()))]
    pub fn submit(&mut self, server: Option<&ServerUrl>) -> SubmitOutcome {
        if self.state.is_submitting() {
            debug!("submission already in flight, ignoring");
            return SubmitOutcome::Ignored;
        }

        match self.prepare(server) {
            Ok((http, media_id, query)) => {
                let request = DiagnosticRequest {
                    id: RequestId::new(),
                    endpoint: self.endpoint,
                    media_id,
                    query,
                    started_at: UnixTimeMs::now(),
                    phase: RequestPhase::AwaitingResponse,
                };
                let request_id = request.id;

                info!(
                    %request_id,
                    method = http.method().as_str(),
                    body_len = http.body().len(),
                    "submitting diagnostic request"
                );
                self.state = PipelineState::Submitting(request);

                SubmitOutcome::Dispatch { request_id, http }
            }
            Err(err) => {
                warn!(error_kind = err.kind().code(), %err, "submission rejected");
                self.state = PipelineState::Failed(err.clone());
                SubmitOutcome::Rejected(err)
            }
        }
    }

    fn prepare(
        &self,
        server: Option<&ServerUrl>,
    ) -> Result<(HttpRequest, Option<MediaId>, Option<String>), DiagnosticError> {
        let adapter = self.endpoint.adapter();

        if self.endpoint.accepts_media() {
            let media = self.media.as_ref().ok_or(DiagnosticError::NoMediaSelected)?;
            let server = server.ok_or_else(no_server)?;
            let http = adapter.build_request(server, SubmissionInput::Media(media))?;
            Ok((http, Some(media.id()), None))
        } else {
            let server = server.ok_or_else(no_server)?;
            let http = adapter.build_request(server, SubmissionInput::Query(&self.query))?;
            Ok((http, None, Some(self.query.clone())))
        }
    }

    /// Applies the answer to the main request.
    #[instrument(skip(self, result, server), fields(endpoint = %self.endpoint))]
    pub fn complete(
        &mut self,
        request_id: RequestId,
        result: HttpResult,
        server: Option<&ServerUrl>,
    ) -> Completion {
        let request = match &self.state {
            PipelineState::Submitting(request)
                if request.id == request_id
                    && request.phase == RequestPhase::AwaitingResponse =>
            {
                request.clone()
            }
            _ => {
                debug!(%request_id, state = self.state.name(), "stale response ignored");
                return Completion::Stale;
            }
        };

        let current_media = self.media.as_ref().map(MediaHandle::id);
        if request.media_id.is_some() && request.media_id != current_media {
            info!(%request_id, "media replaced during submission, discarding response");
            self.state = PipelineState::Idle;
            return Completion::Discarded;
        }

        let elapsed_ms = request.started_at.elapsed_ms();
        let parsed = match result {
            Err(err) => Err(DiagnosticError::transport(err.to_string())),
            Ok(response) if !response.is_success() => Err(DiagnosticError::ServiceError {
                status: response.status(),
                body: response.body_text(),
            }),
            Ok(response) => self
                .endpoint
                .adapter()
                .parse_body(response.body(), request.query.as_deref()),
        };

        match parsed {
            Ok(result) => {
                let lookup = server.and_then(|s| self.endpoint.adapter().follow_up(s, &result));
                if let Some(http) = lookup {
                    debug!(%request_id, url = http.url().as_str(), "probing pest image");
                    self.state = PipelineState::Submitting(DiagnosticRequest {
                        phase: RequestPhase::FetchingImage {
                            partial: result,
                            image_url: http.url().as_str().to_string(),
                        },
                        ..request
                    });
                    return Completion::ImageLookup { request_id, http };
                }

                info!(%request_id, elapsed_ms, "diagnosis succeeded");
                self.state = PipelineState::Succeeded(result);
            }
            Err(err) => {
                warn!(%request_id, elapsed_ms, error_kind = err.kind().code(), %err, "diagnosis failed");
                self.state = PipelineState::Failed(err);
            }
        }

        Completion::Settled
    }

    /// Applies the image lookup answer. Never fails the pipeline: an
    /// unreachable image only leaves `image_url` empty.
    #[instrument(skip(self, result), fields(endpoint = %self.endpoint))]
    pub fn complete_image_lookup(
        &mut self,
        request_id: RequestId,
        result: HttpResult,
    ) -> Completion {
        let (partial, image_url) = match &self.state {
            PipelineState::Submitting(DiagnosticRequest {
                id,
                phase: RequestPhase::FetchingImage { partial, image_url },
                ..
            }) if *id == request_id => (partial.clone(), image_url.clone()),
            _ => {
                debug!(%request_id, state = self.state.name(), "stale image lookup ignored");
                return Completion::Stale;
            }
        };

        let result = match result {
            Ok(response) if response.is_success() => partial.with_image_url(image_url),
            Ok(response) => {
                warn!(%request_id, status = response.status(), "no image found for pest");
                partial
            }
            Err(err) => {
                warn!(%request_id, error = %err, "pest image lookup failed");
                partial
            }
        };

        info!(%request_id, "diagnosis succeeded");
        self.state = PipelineState::Succeeded(result);
        Completion::Settled
    }
}

fn no_server() -> DiagnosticError {
    DiagnosticError::invalid_request("no server address configured")
}
