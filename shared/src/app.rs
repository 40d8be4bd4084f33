use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capabilities::camera::{
    CameraError, CameraOutput, CameraResult, CaptureConfig, GalleryPickConfig,
};
use crate::capabilities::http::{self, HttpRequest};
use crate::capabilities::Capabilities;
use crate::endpoint::Endpoint;
use crate::error::{DiagnosticError, MediaCapability};
use crate::event::Event;
use crate::gate::PermissionState;
use crate::media::{MediaHandle, SourceKind};
use crate::model::{Model, ScreenInstance};
use crate::pipeline::{Completion, RequestId, SubmitOutcome};
use crate::presenter::{
    language_options, screen_view, weather_view, LanguageOption, ScreenView, WeatherView,
};
use crate::text::{StaticTextProvider, TextProvider};
use crate::weather::{self, WeatherState, WEATHER_FAILED_TEXT};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLabels {
    pub weather_info: String,
    pub disease_checkup: String,
    pub pest_checkup: String,
    pub pest_solution: String,
    pub pest_prediction: String,
    pub select_language: String,
    pub close: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub app_title: String,
    pub language: String,
    pub languages: Vec<LanguageOption>,
    pub nav: NavLabels,
    pub disease: ScreenView,
    pub pest_image: ScreenView,
    pub pest_lookup: ScreenView,
    pub pest_risk: ScreenView,
    pub weather: WeatherView,
}

#[derive(Default)]
pub struct App;

impl App {
    fn mount_screen(endpoint: Endpoint, model: &mut Model, caps: &Capabilities) {
        let screen = model.screen_mut(endpoint);
        if screen.mounted {
            debug!(%endpoint, "screen already mounted");
            return;
        }

        screen.reset();
        screen.mounted = true;

        if endpoint.accepts_media() && screen.gate.on_mount() {
            let instance = screen.instance;
            caps.camera.request_permission(move |result| Event::CameraPermissionResolved {
                endpoint,
                instance,
                result: Box::new(result),
            });
        }
    }

    fn unmount_screen(endpoint: Endpoint, model: &mut Model, caps: &Capabilities) {
        let screen = model.screen_mut(endpoint);
        if !screen.mounted {
            return;
        }

        if screen.camera_visible {
            caps.camera.release();
        }
        if screen.pipeline.state().is_submitting() {
            info!(%endpoint, "screen left with a request in flight, its answer will be dropped");
        }
        screen.reset();
    }

    fn resolve_camera_permission(
        endpoint: Endpoint,
        instance: ScreenInstance,
        result: CameraResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let screen = model.screen_mut(endpoint);
        if !screen.is_current(instance) || !screen.gate.is_requesting() {
            debug!(%endpoint, "stale camera permission answer");
            return;
        }

        let state = match result {
            Ok(CameraOutput::PermissionStatus(status)) => screen.gate.resolve(status),
            Ok(other) => {
                warn!(%endpoint, ?other, "unexpected answer to permission request");
                screen.gate.resolve_failed()
            }
            Err(e) => {
                warn!(%endpoint, error = %e, "camera permission request failed");
                screen.gate.resolve_failed()
            }
        };

        info!(%endpoint, ?state, "camera permission resolved");
        if state != PermissionState::Granted && screen.camera_visible {
            screen.camera_visible = false;
            caps.camera.release();
        }
    }

    fn complete_capture(
        endpoint: Endpoint,
        instance: ScreenInstance,
        source: SourceKind,
        result: CameraResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let screen = model.screen_mut(endpoint);
        if !screen.is_current(instance) || !screen.acquisition_pending {
            debug!(%endpoint, %instance, "stale capture result");
            return;
        }
        screen.acquisition_pending = false;

        let image = match result {
            Ok(CameraOutput::Photo(image)) => image,
            Ok(CameraOutput::Cancelled) | Err(CameraError::Cancelled) => {
                debug!(%endpoint, source = source.as_str(), "acquisition cancelled");
                return;
            }
            Ok(CameraOutput::PermissionStatus(_)) => {
                screen
                    .pipeline
                    .fail_acquisition(DiagnosticError::capture("no image returned"));
                return;
            }
            Err(e) => {
                let err = if e.is_permission_error() {
                    DiagnosticError::PermissionDenied(match source {
                        SourceKind::Camera => MediaCapability::Camera,
                        SourceKind::Gallery => MediaCapability::Gallery,
                    })
                } else {
                    DiagnosticError::capture(e.to_string())
                };
                screen.pipeline.fail_acquisition(err);
                return;
            }
        };

        match MediaHandle::from_capture(image, source) {
            Ok(handle) => {
                screen.pipeline.accept_media(handle);
                if screen.camera_visible {
                    screen.camera_visible = false;
                    caps.camera.release();
                }
            }
            Err(err) => {
                screen.pipeline.fail_acquisition(err);
            }
        }
    }

    fn dispatch_diagnosis(
        endpoint: Endpoint,
        request_id: RequestId,
        request: HttpRequest,
        caps: &Capabilities,
    ) {
        http::send(&caps.http, request, move |result| Event::DiagnosisResponse {
            endpoint,
            request_id,
            result: Box::new(result),
        });
    }

    fn dispatch_image_lookup(
        endpoint: Endpoint,
        request_id: RequestId,
        request: HttpRequest,
        caps: &Capabilities,
    ) {
        http::send(&caps.http, request, move |result| Event::PestImageResponse {
            endpoint,
            request_id,
            result: Box::new(result),
        });
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        if event.is_user_initiated() {
            debug!(event = event_name, "user action");
        }

        match event {
            Event::Noop => return,

            Event::Configure(config) => {
                info!(
                    server_configured = config.server_url.is_some(),
                    language = config.default_language.code(),
                    "core configured"
                );
                model.language = config.default_language;
                model.config = config;
            }

            Event::LanguageSelected(language) => {
                model.language = language;
            }

            Event::ScreenMounted(endpoint) => Self::mount_screen(endpoint, model, caps),

            Event::ScreenUnmounted(endpoint) => Self::unmount_screen(endpoint, model, caps),

            Event::CameraPermissionRequested(endpoint) => {
                let screen = model.screen_mut(endpoint);
                if !screen.mounted || !endpoint.accepts_media() {
                    return;
                }
                if screen.gate.begin_request() {
                    let instance = screen.instance;
                    caps.camera.request_permission(move |result| {
                        Event::CameraPermissionResolved {
                            endpoint,
                            instance,
                            result: Box::new(result),
                        }
                    });
                }
            }

            Event::CameraPermissionResolved {
                endpoint,
                instance,
                result,
            } => {
                Self::resolve_camera_permission(endpoint, instance, *result, model, caps);
            }

            Event::CameraOpened(endpoint) => {
                let screen = model.screen_mut(endpoint);
                if !screen.mounted || !endpoint.accepts_media() || screen.camera_visible {
                    return;
                }
                if !screen.gate.capture_allowed() {
                    debug!(%endpoint, "camera not granted, preview stays closed");
                    return;
                }
                screen.camera_visible = true;
            }

            Event::CameraClosed(endpoint) => {
                let screen = model.screen_mut(endpoint);
                if !screen.camera_visible {
                    return;
                }
                screen.camera_visible = false;
                caps.camera.release();
            }

            Event::CapturePhotoRequested(endpoint) => {
                let screen = model.screen_mut(endpoint);
                if !screen.mounted || !screen.camera_visible || !screen.gate.capture_allowed() {
                    debug!(%endpoint, "capture unavailable");
                    return;
                }
                if screen.acquisition_pending {
                    debug!(%endpoint, "acquisition already pending");
                    return;
                }
                screen.acquisition_pending = true;
                let instance = screen.instance;
                caps.camera
                    .capture_photo(CaptureConfig::default(), move |result| Event::CaptureCompleted {
                        endpoint,
                        instance,
                        result: Box::new(result),
                    });
            }

            Event::CaptureCompleted {
                endpoint,
                instance,
                result,
            } => {
                Self::complete_capture(endpoint, instance, SourceKind::Camera, *result, model, caps);
            }

            Event::GalleryPickRequested(endpoint) => {
                let screen = model.screen_mut(endpoint);
                if !screen.mounted || !endpoint.accepts_media() {
                    return;
                }
                if screen.acquisition_pending {
                    debug!(%endpoint, "acquisition already pending");
                    return;
                }
                screen.acquisition_pending = true;
                let instance = screen.instance;
                caps.camera.request_gallery_permission(move |result| {
                    Event::GalleryPermissionResolved {
                        endpoint,
                        instance,
                        result: Box::new(result),
                    }
                });
            }

            Event::GalleryPermissionResolved {
                endpoint,
                instance,
                result,
            } => {
                let screen = model.screen_mut(endpoint);
                if !screen.is_current(instance) || !screen.acquisition_pending {
                    debug!(%endpoint, "stale gallery permission answer");
                    return;
                }

                match *result {
                    Ok(CameraOutput::PermissionStatus(status)) if status.is_granted() => {
                        caps.camera.pick_from_gallery(GalleryPickConfig::default(), move |result| {
                            Event::GalleryPickCompleted {
                                endpoint,
                                instance,
                                result: Box::new(result),
                            }
                        });
                        return;
                    }
                    other => {
                        debug!(%endpoint, ?other, "gallery access refused");
                        screen.acquisition_pending = false;
                        screen
                            .pipeline
                            .fail_acquisition(DiagnosticError::PermissionDenied(
                                MediaCapability::Gallery,
                            ));
                    }
                }
            }

            Event::GalleryPickCompleted {
                endpoint,
                instance,
                result,
            } => {
                Self::complete_capture(endpoint, instance, SourceKind::Gallery, *result, model, caps);
            }

            Event::QueryChanged { endpoint, text } => {
                let screen = model.screen_mut(endpoint);
                if !screen.mounted || endpoint.accepts_media() {
                    return;
                }
                screen.pipeline.set_query(text);
            }

            Event::SubmitRequested(endpoint) => {
                let server = model.config.server_url.clone();
                let screen = model.screen_mut(endpoint);
                if !screen.mounted {
                    debug!(%endpoint, "submit on unmounted screen");
                    return;
                }

                match screen.pipeline.submit(server.as_ref()) {
                    SubmitOutcome::Dispatch { request_id, http } => {
                        Self::dispatch_diagnosis(endpoint, request_id, http, caps);
                    }
                    SubmitOutcome::Ignored => return,
                    SubmitOutcome::Rejected(_) => {}
                }
            }

            Event::DiagnosisResponse {
                endpoint,
                request_id,
                result,
            } => {
                let server = model.config.server_url.clone();
                let screen = model.screen_mut(endpoint);
                if !screen.mounted {
                    debug!(%endpoint, %request_id, "response for unmounted screen dropped");
                    return;
                }

                match screen.pipeline.complete(request_id, *result, server.as_ref()) {
                    Completion::ImageLookup { request_id, http } => {
                        Self::dispatch_image_lookup(endpoint, request_id, http, caps);
                    }
                    Completion::Settled | Completion::Discarded => {}
                    Completion::Stale => return,
                }
            }

            Event::PestImageResponse {
                endpoint,
                request_id,
                result,
            } => {
                let screen = model.screen_mut(endpoint);
                if !screen.mounted {
                    return;
                }
                if screen.pipeline.complete_image_lookup(request_id, *result) == Completion::Stale {
                    return;
                }
            }

            Event::WeatherScreenMounted => {
                if model.weather == WeatherState::Loading {
                    debug!("weather fetch already in flight");
                    return;
                }

                let request = model
                    .config
                    .server_url
                    .as_ref()
                    .and_then(weather::fetch_request);

                match request {
                    Some(request) => {
                        model.weather = WeatherState::Loading;
                        http::send(&caps.http, request, |result| {
                            Event::WeatherResponse(Box::new(result))
                        });
                    }
                    None => {
                        warn!("no server address configured for weather");
                        model.weather = WeatherState::Failed(WEATHER_FAILED_TEXT.to_string());
                    }
                }
            }

            Event::WeatherResponse(result) => {
                if model.weather != WeatherState::Loading {
                    debug!("stale weather response");
                    return;
                }
                model.weather = weather::apply_response(*result);
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let text = StaticTextProvider::new(model.language);
        let label = |key: &str| text.text(key).to_string();

        ViewModel {
            app_title: label("appTitle"),
            language: model.language.code().to_string(),
            languages: language_options(model.language),
            nav: NavLabels {
                weather_info: label("weatherInfo"),
                disease_checkup: label("diseaseCheckup"),
                pest_checkup: label("pestCheckup"),
                pest_solution: label("pestSolution"),
                pest_prediction: label("pestPrediction"),
                select_language: label("selectLanguage"),
                close: label("close"),
            },
            disease: screen_view(&model.disease, &text),
            pest_image: screen_view(&model.pest_image, &text),
            pest_lookup: screen_view(&model.pest_lookup, &text),
            pest_risk: screen_view(&model.pest_risk, &text),
            weather: weather_view(&model.weather, &text),
        }
    }
}
