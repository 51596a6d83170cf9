//! Trip image handling.
//!
//! Newly selected files get an ephemeral preview handle from a
//! [`PreviewRegistry`]. The handle is an RAII guard: it is released when the
//! asset is removed, when the manager is torn down, or when it is dropped,
//! whichever happens first, and never twice.

mod preview;

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::AssetError;

pub use preview::{PreviewHandle, PreviewRegistry, TrackingPreviewRegistry};

pub const DEFAULT_IMAGE_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/gif"];

/// An image binary held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    name: String,
    content_type: String,
    bytes: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Reads a local file, inferring its content type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, AssetError> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();
        let bytes = fs::read(path).map_err(|err| AssetError::Unreadable {
            name: name.clone(),
            reason: err.to_string(),
        })?;
        let content_type = content_type_for(path).unwrap_or("application/octet-stream");
        Ok(Self::new(name, content_type, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.size())
            .finish()
    }
}

pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOrigin {
    New,
    Existing,
}

/// Source of binaries for images that were stored before the wizard opened.
pub trait AssetFetcher {
    fn fetch(&self, source: &str) -> Result<ImageFile, AssetError>;
}

#[derive(Debug)]
pub struct ImageAsset {
    file: Option<ImageFile>,
    preview: Option<PreviewHandle>,
    origin: AssetOrigin,
    source: Option<String>,
}

impl ImageAsset {
    /// A newly selected file without a preview handle.
    pub fn detached(file: ImageFile) -> Self {
        Self {
            file: Some(file),
            preview: None,
            origin: AssetOrigin::New,
            source: None,
        }
    }

    /// An image already stored for the trip; the binary is fetched lazily.
    pub fn existing(source: impl Into<String>) -> Self {
        Self {
            file: None,
            preview: None,
            origin: AssetOrigin::Existing,
            source: Some(source.into()),
        }
    }

    pub fn origin(&self) -> AssetOrigin {
        self.origin
    }

    pub fn is_new(&self) -> bool {
        self.origin == AssetOrigin::New
    }

    pub fn file(&self) -> Option<&ImageFile> {
        self.file.as_ref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    pub fn label(&self) -> String {
        match (&self.file, &self.source) {
            (Some(file), _) => file.name().to_string(),
            (None, Some(source)) => source.clone(),
            (None, None) => "image".to_string(),
        }
    }

    fn release_preview(&mut self) {
        if let Some(mut handle) = self.preview.take() {
            handle.release();
        }
    }
}

pub struct ImageAssetManager {
    assets: Vec<ImageAsset>,
    registry: Arc<dyn PreviewRegistry>,
    allowed_types: Vec<String>,
}

impl fmt::Debug for ImageAssetManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAssetManager")
            .field("assets", &self.assets)
            .field("allowed_types", &self.allowed_types)
            .finish()
    }
}

impl ImageAssetManager {
    pub fn new(registry: Arc<dyn PreviewRegistry>, allowed_types: Vec<String>) -> Self {
        Self {
            assets: Vec::new(),
            registry,
            allowed_types,
        }
    }

    pub fn with_default_types(registry: Arc<dyn PreviewRegistry>) -> Self {
        Self::new(
            registry,
            DEFAULT_IMAGE_TYPES.iter().map(|t| t.to_string()).collect(),
        )
    }

    pub fn assets(&self) -> &[ImageAsset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Appends each acceptable file as a new asset with a preview handle.
    ///
    /// Rejected files are returned; they never abort the rest of the batch.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = ImageFile>) -> Vec<AssetError> {
        let mut rejected = Vec::new();
        for file in files {
            if let Err(err) = self.check(&file) {
                warn!(error = %err, "image skipped");
                rejected.push(err);
                continue;
            }
            let preview = PreviewHandle::create(Arc::clone(&self.registry), &file);
            debug!(name = file.name(), size = file.size(), preview = preview.key(), "image attached");
            self.assets.push(ImageAsset {
                file: Some(file),
                preview: Some(preview),
                origin: AssetOrigin::New,
                source: None,
            });
        }
        rejected
    }

    pub fn add_existing(&mut self, source: impl Into<String>) {
        self.assets.push(ImageAsset::existing(source));
    }

    /// Removes the asset at `index`, releasing its preview. Returns `false` when
    /// nothing lives at that position.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.assets.len() {
            return false;
        }
        let mut asset = self.assets.remove(index);
        asset.release_preview();
        debug!(index, label = %asset.label(), "image removed");
        true
    }

    /// Releases every outstanding preview and forgets all assets.
    pub fn release_all(&mut self) {
        for asset in &mut self.assets {
            asset.release_preview();
        }
        self.assets.clear();
    }

    /// Fetches binaries for existing assets that do not have one yet.
    pub fn materialize_existing(&mut self, fetcher: &dyn AssetFetcher) -> Vec<AssetError> {
        let mut failures = Vec::new();
        for asset in self.assets.iter_mut().filter(|asset| asset.file.is_none()) {
            let Some(source) = asset.source.as_deref() else {
                continue;
            };
            match fetcher.fetch(source) {
                Ok(file) if file.size() > 0 => asset.file = Some(file),
                Ok(_) => failures.push(AssetError::Empty(source.to_string())),
                Err(err) => failures.push(err),
            }
        }
        for failure in &failures {
            warn!(error = %failure, "existing image could not be materialized");
        }
        failures
    }

    /// Binaries of every asset that has one, in display order.
    pub fn file_backed(&self) -> Vec<ImageFile> {
        self.assets
            .iter()
            .filter_map(|asset| asset.file.clone())
            .collect()
    }

    fn check(&self, file: &ImageFile) -> Result<(), AssetError> {
        if file.size() == 0 {
            return Err(AssetError::Empty(file.name().to_string()));
        }
        let supported = self
            .allowed_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(file.content_type()));
        if !supported {
            return Err(AssetError::Unsupported {
                name: file.name().to_string(),
                content_type: file.content_type().to_string(),
            });
        }
        Ok(())
    }
}
