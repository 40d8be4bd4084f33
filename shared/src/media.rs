use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::capabilities::camera::{CapturedImage, ImageFormat, MAX_IMAGE_SIZE_BYTES};
use crate::error::DiagnosticError;

pub const MEDIA_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(Uuid);

impl MediaId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MediaId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Camera,
    Gallery,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Camera => "camera",
            SourceKind::Gallery => "gallery",
        }
    }
}

/// One acquired image. Never mutated after construction; a new acquisition
/// produces a new handle with a fresh id.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHandle {
    id: MediaId,
    uri: String,
    source: SourceKind,
    #[serde(with = "serde_bytes")]
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl MediaHandle {
    /// Normalizes a shell capture into a handle, rejecting empty locators,
    /// empty payloads and oversized images.
    pub fn from_capture(image: CapturedImage, source: SourceKind) -> Result<Self, DiagnosticError> {
        if image.uri().trim().is_empty() {
            return Err(DiagnosticError::capture("no image location returned"));
        }

        if image.data().is_empty() {
            return Err(DiagnosticError::capture("image is empty"));
        }

        if image.data().len() > MAX_IMAGE_SIZE_BYTES {
            return Err(DiagnosticError::capture(format!(
                "image exceeds {} MiB",
                MAX_IMAGE_SIZE_BYTES / (1024 * 1024)
            )));
        }

        match ImageFormat::from_magic_bytes(image.data()) {
            Some(ImageFormat::Jpeg) => {}
            other => warn!(
                source = source.as_str(),
                detected = ?other,
                "acquired image is not a jpeg, uploading as-is"
            ),
        }

        let (width, height) = (image.width(), image.height());
        let (uri, data) = image.into_parts();

        Ok(Self {
            id: MediaId::new(),
            uri,
            source,
            data,
            width,
            height,
        })
    }

    pub fn id(&self) -> MediaId {
        self.id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn mime_type(&self) -> &'static str {
        MEDIA_MIME_TYPE
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaHandle")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("data", &format_args!("[{} bytes]", self.data.len()))
            .finish_non_exhaustive()
    }
}
