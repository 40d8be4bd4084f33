#![allow(dead_code)]

use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::HttpRequest;
use shared::capabilities::{
    CameraOperation, CameraOutput, CapturedImage, HttpResponse, HttpResult, PermissionStatus,
};
use shared::{
    App, AppConfig, DiagnosticRequest, Effect, Endpoint, Event, Model, PipelineState, RequestId,
    RequestPhase, ServerUrl,
};

pub const SERVER: &str = "http://10.0.2.2:8000";

pub const LEAF_BLIGHT: &str = r#"{"status":"success","message":"Image processed","disease_prediction":{"predicted":"Leaf Blight","explanation":"Fungal lesions on the leaf surface"}}"#;

pub fn configured() -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let config = AppConfig::new(ServerUrl::parse(SERVER).expect("valid server url"));
    app.update(Event::Configure(config), &mut model);
    (app, model)
}

pub fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpRequest>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn camera_requests(effects: Vec<Effect>) -> Vec<Request<CameraOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Camera(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn renders(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::Render(_)))
        .count()
}

/// Header lookup on an outgoing request, ignoring case.
pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

pub fn response(status: u16, body: &str) -> HttpResult {
    Ok(HttpResponse::new(status, body.as_bytes().to_vec()))
}

pub fn leaf_photo(tag: u8) -> CapturedImage {
    CapturedImage::new(
        format!("file:///data/camera/leaf-{tag}.jpg"),
        vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, tag, tag, tag],
        1080,
        1440,
    )
}

/// Feeds every event produced by resolving a shell request back into the app
/// and returns the effects they raised.
pub fn apply_events(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    events: Vec<Event>,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    for event in events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

/// The request a screen is currently waiting on.
pub fn in_flight(model: &Model, endpoint: Endpoint) -> DiagnosticRequest {
    match model.screen(endpoint).pipeline.state() {
        PipelineState::Submitting(request) => request.clone(),
        other => panic!("{endpoint} has nothing in flight: {other:?}"),
    }
}

/// Delivers the answer to a main diagnosis request, as the HTTP capability
/// would once the shell responds.
pub fn deliver(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    endpoint: Endpoint,
    request_id: RequestId,
    result: HttpResult,
) -> Vec<Effect> {
    let event = Event::DiagnosisResponse {
        endpoint,
        request_id,
        result: Box::new(result),
    };
    app.update(event, model).effects
}

/// Answers whatever the screen is waiting on: the main request or the
/// follow-up image lookup.
pub fn respond(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    endpoint: Endpoint,
    result: HttpResult,
) -> Vec<Effect> {
    let request = in_flight(model, endpoint);
    match request.phase {
        RequestPhase::AwaitingResponse => deliver(app, model, endpoint, request.id, result),
        RequestPhase::FetchingImage { .. } => {
            let event = Event::PestImageResponse {
                endpoint,
                request_id: request.id,
                result: Box::new(result),
            };
            app.update(event, model).effects
        }
    }
}

pub fn respond_weather(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    result: HttpResult,
) -> Vec<Effect> {
    app.update(Event::WeatherResponse(Box::new(result)), model)
        .effects
}

pub fn resolve_camera(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    request: &mut Request<CameraOperation>,
    output: CameraOutput,
) -> Vec<Effect> {
    let update = app.resolve(request, Ok(output)).expect("camera request resolves");
    apply_events(app, model, update.events)
}

/// Mounts an image screen and grants the camera permission it asks for.
pub fn mount_with_camera(app: &AppTester<App, Effect>, model: &mut Model, endpoint: Endpoint) {
    let update = app.update(Event::ScreenMounted(endpoint), model);
    let mut requests = camera_requests(update.effects);
    assert_eq!(requests.len(), 1, "mount issues exactly one permission request");
    assert_eq!(requests[0].operation, CameraOperation::RequestPermission);

    resolve_camera(
        app,
        model,
        &mut requests[0],
        CameraOutput::PermissionStatus(PermissionStatus::Granted),
    );
}

/// Opens the preview, captures a photo and hands the shell a JPEG.
pub fn capture(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    endpoint: Endpoint,
    tag: u8,
) -> Vec<Effect> {
    app.update(Event::CameraOpened(endpoint), model);
    let update = app.update(Event::CapturePhotoRequested(endpoint), model);
    let mut requests = camera_requests(update.effects);
    assert_eq!(requests.len(), 1);
    resolve_camera(app, model, &mut requests[0], CameraOutput::Photo(leaf_photo(tag)))
}
