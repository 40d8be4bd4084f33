#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod gate;
pub mod media;
pub mod model;
pub mod multipart;
pub mod pipeline;
pub mod presenter;
pub mod text;
pub mod weather;

pub use app::{App, NavLabels, ViewModel};
pub use capabilities::{Capabilities, Effect};
pub use config::{AppConfig, ConfigError, ServerUrl};
pub use crux_core::App as CruxApp;
pub use endpoint::{DiagnosticResult, Endpoint, EndpointAdapter, SubmissionInput};
pub use error::{DiagnosticError, ErrorKind, MediaCapability};
pub use event::Event;
pub use gate::{CapabilityGate, PermissionState};
pub use media::{MediaHandle, MediaId, SourceKind};
pub use model::{DiagnosticScreen, Model, ScreenInstance};
pub use pipeline::{
    Completion, DiagnosticPipeline, DiagnosticRequest, PipelineState, RequestId, RequestPhase,
    SubmitOutcome,
};
pub use presenter::{present, PresentedState, ResultField, ResultView, ScreenView};
pub use text::{Language, StaticTextProvider, TextProvider};
pub use weather::{WeatherReport, WeatherState};
