pub mod camera;
pub mod http;

pub use self::camera::{
    Camera, CameraError, CameraFacing, CameraOperation, CameraOutput, CameraResult,
    CapturedImage, CaptureConfig, GalleryPickConfig, PermissionStatus,
};
pub use self::http::{
    HttpCapability, HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpResult,
};

// Crux's built-in Render covers view refreshes; nothing custom is needed.
pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::event::Event;

/// Field types are spelled out so the generated `Effect` variants read
/// `Render`, `Http` and `Camera`.
#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub camera: Camera<Event>,
}
