use serde::{Deserialize, Serialize};

use crate::capabilities::camera::CameraResult;
use crate::capabilities::http::HttpResult;
use crate::config::AppConfig;
use crate::endpoint::Endpoint;
use crate::model::ScreenInstance;
use crate::pipeline::RequestId;
use crate::text::Language;

// --- Event enum: shell results boxed to keep the enum small ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    Noop,
    Configure(AppConfig),
    LanguageSelected(Language),

    // Screen lifecycle
    ScreenMounted(Endpoint),
    ScreenUnmounted(Endpoint),
    WeatherScreenMounted,

    // Camera gate
    CameraPermissionRequested(Endpoint),
    CameraPermissionResolved {
        endpoint: Endpoint,
        instance: ScreenInstance,
        result: Box<CameraResult>,
    },

    // Media acquisition
    CameraOpened(Endpoint),
    CameraClosed(Endpoint),
    CapturePhotoRequested(Endpoint),
    CaptureCompleted {
        endpoint: Endpoint,
        instance: ScreenInstance,
        result: Box<CameraResult>,
    },
    GalleryPickRequested(Endpoint),
    GalleryPermissionResolved {
        endpoint: Endpoint,
        instance: ScreenInstance,
        result: Box<CameraResult>,
    },
    GalleryPickCompleted {
        endpoint: Endpoint,
        instance: ScreenInstance,
        result: Box<CameraResult>,
    },

    // Submission
    QueryChanged {
        endpoint: Endpoint,
        text: String,
    },
    SubmitRequested(Endpoint),
    DiagnosisResponse {
        endpoint: Endpoint,
        request_id: RequestId,
        result: Box<HttpResult>,
    },
    PestImageResponse {
        endpoint: Endpoint,
        request_id: RequestId,
        result: Box<HttpResult>,
    },

    WeatherResponse(Box<HttpResult>),
}

impl Event {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::LanguageSelected(_) => "language_selected",
            Self::ScreenMounted(_) => "screen_mounted",
            Self::ScreenUnmounted(_) => "screen_unmounted",
            Self::WeatherScreenMounted => "weather_screen_mounted",
            Self::CameraPermissionRequested(_) => "camera_permission_requested",
            Self::CameraPermissionResolved { .. } => "camera_permission_resolved",
            Self::CameraOpened(_) => "camera_opened",
            Self::CameraClosed(_) => "camera_closed",
            Self::CapturePhotoRequested(_) => "capture_photo_requested",
            Self::CaptureCompleted { .. } => "capture_completed",
            Self::GalleryPickRequested(_) => "gallery_pick_requested",
            Self::GalleryPermissionResolved { .. } => "gallery_permission_resolved",
            Self::GalleryPickCompleted { .. } => "gallery_pick_completed",
            Self::QueryChanged { .. } => "query_changed",
            Self::SubmitRequested(_) => "submit_requested",
            Self::DiagnosisResponse { .. } => "diagnosis_response",
            Self::PestImageResponse { .. } => "pest_image_response",
            Self::WeatherResponse(_) => "weather_response",
        }
    }

    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::LanguageSelected(_)
                | Self::CameraPermissionRequested(_)
                | Self::CameraOpened(_)
                | Self::CameraClosed(_)
                | Self::CapturePhotoRequested(_)
                | Self::GalleryPickRequested(_)
                | Self::QueryChanged { .. }
                | Self::SubmitRequested(_)
        )
    }

    /// The diagnostic screen this event belongs to, if any.
    pub const fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Self::ScreenMounted(endpoint)
            | Self::ScreenUnmounted(endpoint)
            | Self::CameraPermissionRequested(endpoint)
            | Self::CameraPermissionResolved { endpoint, .. }
            | Self::CameraOpened(endpoint)
            | Self::CameraClosed(endpoint)
            | Self::CapturePhotoRequested(endpoint)
            | Self::CaptureCompleted { endpoint, .. }
            | Self::GalleryPickRequested(endpoint)
            | Self::GalleryPermissionResolved { endpoint, .. }
            | Self::GalleryPickCompleted { endpoint, .. }
            | Self::QueryChanged { endpoint, .. }
            | Self::SubmitRequested(endpoint)
            | Self::DiagnosisResponse { endpoint, .. }
            | Self::PestImageResponse { endpoint, .. } => Some(*endpoint),
            Self::Noop
            | Self::Configure(_)
            | Self::LanguageSelected(_)
            | Self::WeatherScreenMounted
            | Self::WeatherResponse(_) => None,
        }
    }
}
