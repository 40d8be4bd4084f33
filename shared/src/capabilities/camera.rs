use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_IMAGE_SIZE_BYTES: usize = 20 * 1024 * 1024;
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Camera and photo library access, executed by the shell.
#[derive(Clone)]
pub struct Camera<E> {
    context: CapabilityContext<CameraOperation, E>,
}

impl<Ev> Capability<Ev> for Camera<Ev> {
    type Operation = CameraOperation;
    type MappedSelf<MappedEv> = Camera<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Camera::new(self.context.map_event(f))
    }
}

impl<E> Camera<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<CameraOperation, E>) -> Self {
        Self { context }
    }

    pub fn request_permission<F>(&self, callback: F)
    where
        F: FnOnce(CameraResult) -> E + Send + 'static,
    {
        self.request(CameraOperation::RequestPermission, callback);
    }

    pub fn request_gallery_permission<F>(&self, callback: F)
    where
        F: FnOnce(CameraResult) -> E + Send + 'static,
    {
        self.request(CameraOperation::RequestGalleryPermission, callback);
    }

    pub fn capture_photo<F>(&self, config: CaptureConfig, callback: F)
    where
        F: FnOnce(CameraResult) -> E + Send + 'static,
    {
        let config = config.validated();
        self.request(CameraOperation::CapturePhoto { config }, callback);
    }

    pub fn pick_from_gallery<F>(&self, config: GalleryPickConfig, callback: F)
    where
        F: FnOnce(CameraResult) -> E + Send + 'static,
    {
        let config = config.validated();
        self.request(CameraOperation::PickFromGallery { config }, callback);
    }

    /// Tells the shell to stop the preview stream. No response is expected.
    pub fn release(&self) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(CameraOperation::ReleaseCamera).await;
        });
    }

    fn request<F>(&self, operation: CameraOperation, callback: F)
    where
        F: FnOnce(CameraResult) -> E + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CameraOperation {
    RequestPermission,
    RequestGalleryPermission,
    CapturePhoto { config: CaptureConfig },
    PickFromGallery { config: GalleryPickConfig },
    ReleaseCamera,
}

impl Operation for CameraOperation {
    type Output = CameraResult;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraFacing {
    Front,
    #[default]
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Heic,
    WebP,
}

impl ImageFormat {
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        if data.len() < 12 {
            return None;
        }

        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }

        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        if &data[4..8] == b"ftyp" {
            let brand = &data[8..12];
            if brand == b"heic" || brand == b"heix" || brand == b"mif1" {
                return Some(ImageFormat::Heic);
            }
        }

        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureConfig {
    pub facing: CameraFacing,
    pub quality: u8,
    pub max_file_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            facing: CameraFacing::Back,
            quality: MAX_JPEG_QUALITY,
            max_file_size: MAX_IMAGE_SIZE_BYTES,
        }
    }
}

impl CaptureConfig {
    pub fn validated(mut self) -> Self {
        self.quality = self.quality.min(MAX_JPEG_QUALITY);
        self.max_file_size = self.max_file_size.min(MAX_IMAGE_SIZE_BYTES);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GalleryPickConfig {
    pub allow_editing: bool,
    pub quality: u8,
    pub max_file_size: usize,
}

impl Default for GalleryPickConfig {
    fn default() -> Self {
        Self {
            allow_editing: true,
            quality: MAX_JPEG_QUALITY,
            max_file_size: MAX_IMAGE_SIZE_BYTES,
        }
    }
}

impl GalleryPickConfig {
    pub fn validated(mut self) -> Self {
        self.quality = self.quality.min(MAX_JPEG_QUALITY);
        self.max_file_size = self.max_file_size.min(MAX_IMAGE_SIZE_BYTES);
        self
    }
}

/// OS-level answer to a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
    DeniedPermanently,
    Restricted,
    NotDetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// An image handed back by the shell: where it lives on the device plus its
/// encoded bytes.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapturedImage {
    uri: String,
    #[serde(with = "serde_bytes")]
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl CapturedImage {
    pub fn new(uri: impl Into<String>, data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            uri: uri.into(),
            data,
            width,
            height,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.uri, self.data)
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("uri_len", &self.uri.len())
            .field("data_len", &self.data.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CameraOutput {
    PermissionStatus(PermissionStatus),
    Photo(CapturedImage),
    Cancelled,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("camera permission denied permanently - user must enable in settings")]
    PermissionDeniedPermanently,

    #[error("camera unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("capture failed: {reason}")]
    CaptureFailed { reason: String },

    #[error("capture cancelled by user")]
    Cancelled,

    #[error("operation cancelled - another operation in progress")]
    Busy,

    #[error("app in background - camera access not allowed")]
    BackgroundRestricted,

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CameraError {
    pub fn is_permission_error(&self) -> bool {
        matches!(
            self,
            CameraError::PermissionDenied | CameraError::PermissionDeniedPermanently
        )
    }
}

pub type CameraResult = Result<CameraOutput, CameraError>;
