//! Pure projections from model state to what the shell draws.

use serde::{Deserialize, Serialize};

use crate::endpoint::{DiagnosticResult, Endpoint};
use crate::gate::PermissionState;
use crate::model::DiagnosticScreen;
use crate::pipeline::PipelineState;
use crate::text::{Language, TextProvider};
use crate::weather::{WeatherReport, WeatherState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultField {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultView {
    pub fields: Vec<ResultField>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentedState {
    pub is_loading: bool,
    pub error_text: Option<String>,
    pub result: Option<ResultView>,
}

pub fn present(state: &PipelineState, text: &dyn TextProvider) -> PresentedState {
    match state {
        PipelineState::Idle => PresentedState::default(),
        PipelineState::Submitting(_) => PresentedState {
            is_loading: true,
            ..PresentedState::default()
        },
        PipelineState::Succeeded(result) => PresentedState {
            result: Some(result_view(result, text)),
            ..PresentedState::default()
        },
        PipelineState::Failed(err) => PresentedState {
            error_text: Some(err.to_string()),
            ..PresentedState::default()
        },
    }
}

fn field(text: &dyn TextProvider, key: &str, value: &str) -> ResultField {
    ResultField {
        label: text.text(key).to_string(),
        value: value.to_string(),
    }
}

fn result_view(result: &DiagnosticResult, text: &dyn TextProvider) -> ResultView {
    match result {
        DiagnosticResult::Disease {
            predicted_label,
            explanation,
        } => ResultView {
            fields: vec![
                field(text, "diseaseIdentified", predicted_label),
                field(text, "explanation", explanation),
            ],
            image_url: None,
        },
        DiagnosticResult::PestImage {
            predicted_label,
            explanation,
            control,
        } => ResultView {
            fields: vec![
                field(text, "pestIdentified", predicted_label),
                field(text, "explanation", explanation),
                field(text, "controlMeasures", control),
            ],
            image_url: None,
        },
        DiagnosticResult::PestLookup {
            pest_name,
            pesticide,
            ai_explanation,
            image_url,
        } => {
            let mut fields = vec![
                field(text, "pestIdentified", pest_name),
                field(text, "recommendedPesticide", pesticide),
            ];
            if !ai_explanation.is_empty() {
                fields.push(field(text, "aiExplanation", ai_explanation));
            }
            ResultView {
                fields,
                image_url: image_url.clone(),
            }
        }
        DiagnosticResult::PestRisk { plant_name, risk } => ResultView {
            fields: vec![
                field(text, "plantName", plant_name),
                field(text, "pestRisk", risk),
            ],
            image_url: None,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraView {
    pub permission: PermissionState,
    pub requesting_permission: bool,
    pub visible: bool,
    pub can_capture: bool,
    pub status_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenView {
    pub endpoint: Endpoint,
    pub title: String,
    /// Locally held image, shown before and after a result exists.
    pub preview_uri: Option<String>,
    pub camera: Option<CameraView>,
    pub query: String,
    pub can_submit: bool,
    pub submit_label: Option<String>,
    pub state: PresentedState,
}

fn title_key(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::DiseaseImage => "diseaseCheckup",
        Endpoint::PestImage => "pestCheckup",
        Endpoint::PestQuery => "pestSolution",
        Endpoint::PestRisk => "pestPrediction",
    }
}

pub fn screen_view(screen: &DiagnosticScreen, text: &dyn TextProvider) -> ScreenView {
    let endpoint = screen.endpoint();
    let state = present(screen.pipeline.state(), text);

    let camera = endpoint.accepts_media().then(|| {
        let permission = screen.gate.current();
        let status_key = match permission {
            PermissionState::Unknown if screen.gate.is_requesting() => Some("requestingPermission"),
            PermissionState::Denied => Some("noCameraAccess"),
            _ => None,
        };
        CameraView {
            permission,
            requesting_permission: screen.gate.is_requesting(),
            visible: screen.camera_visible,
            can_capture: screen.camera_visible
                && screen.gate.capture_allowed()
                && !screen.acquisition_pending,
            status_text: status_key.map(|key| text.text(key).to_string()),
        }
    });

    let has_input = if endpoint.accepts_media() {
        screen.pipeline.media().is_some()
    } else {
        !screen.pipeline.query().trim().is_empty()
    };

    ScreenView {
        endpoint,
        title: text.text(title_key(endpoint)).to_string(),
        preview_uri: screen.pipeline.media().map(|m| m.uri().to_string()),
        camera,
        query: screen.pipeline.query().to_string(),
        can_submit: has_input && !state.is_loading,
        submit_label: state
            .is_loading
            .then(|| text.text("processing").to_string()),
        state,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCard {
    pub city: String,
    pub temperature: String,
    pub description: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind_speed: String,
    pub rain_chance: String,
    pub temp_min: String,
    pub temp_max: String,
    pub pressure: String,
    pub wind_direction: String,
    pub clouds: String,
    pub timestamp: String,
    pub fetch_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherView {
    pub is_loading: bool,
    pub loading_text: Option<String>,
    pub error_text: Option<String>,
    pub report: Option<WeatherCard>,
}

fn celsius(value: f64) -> String {
    format!("{}°C", value.round())
}

#[allow(clippy::cast_possible_truncation)]
fn weather_card(report: &WeatherReport) -> WeatherCard {
    WeatherCard {
        city: report.city.clone(),
        temperature: celsius(report.temp),
        description: report.weather_description.clone(),
        feels_like: celsius(report.feels_like),
        humidity: format!("{}%", report.humidity),
        wind_speed: format!("{} m/s", report.wind_speed),
        rain_chance: format!("{}%", report.rain_chance),
        temp_min: celsius(report.temp_min),
        temp_max: celsius(report.temp_max),
        pressure: format!("{} hPa", report.pressure),
        wind_direction: format!("{}°", report.wind_direction),
        clouds: format!("{}%", report.clouds),
        timestamp: report.timestamp.clone(),
        fetch_time: report.fetch_time.round() as i64,
    }
}

pub fn weather_view(state: &WeatherState, text: &dyn TextProvider) -> WeatherView {
    match state {
        WeatherState::NotLoaded => WeatherView::default(),
        WeatherState::Loading => WeatherView {
            is_loading: true,
            loading_text: Some(text.text("loadingWeather").to_string()),
            ..WeatherView::default()
        },
        WeatherState::Loaded(report) => WeatherView {
            report: Some(weather_card(report)),
            ..WeatherView::default()
        },
        WeatherState::Failed(message) => WeatherView {
            error_text: Some(message.clone()),
            ..WeatherView::default()
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageOption {
    pub code: String,
    pub label: String,
    pub selected: bool,
}

pub fn language_options(selected: Language) -> Vec<LanguageOption> {
    Language::ALL
        .into_iter()
        .map(|lang| LanguageOption {
            code: lang.code().to_string(),
            label: lang.label().to_string(),
            selected: lang == selected,
        })
        .collect()
}
