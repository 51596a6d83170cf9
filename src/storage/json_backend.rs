use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    assets::{AssetFetcher, ImageFile},
    config::{tmp_path, write_atomic},
    domain::InitialTripData,
    errors::{AssetError, StorageError, SubmissionError},
    payload::TripPayload,
    wizard::TripSink,
};

use super::Result;

pub const PAYLOAD_FILE: &str = "payload.json";
const IMAGES_DIR: &str = "images";
const ENTRY_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Writes every accepted submission into its own directory under `root`.
///
/// Each entry holds `payload.json` plus the image bytes under `images/`.
/// Stored images are prefixed with their 1-based position, so equal file
/// names never collide; the payload records each one in `stored_as`.
#[derive(Debug, Clone)]
pub struct JsonOutbox {
    root: PathBuf,
    last_entry: Option<PathBuf>,
    closed: bool,
}

impl JsonOutbox {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            last_entry: None,
            closed: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory written by the most recent successful save.
    pub fn last_entry(&self) -> Option<&Path> {
        self.last_entry.as_deref()
    }

    /// Whether the wizard has reported that it closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn write(&self, payload: &TripPayload) -> Result<PathBuf> {
        for image in &payload.images {
            check_file_name(&image.file_name)?;
        }
        let entry = self.root.join(format!(
            "{}-{}-{}",
            canonical_name(&payload.name),
            Utc::now().format(ENTRY_TIMESTAMP_FORMAT),
            Uuid::new_v4().simple()
        ));
        let images_dir = entry.join(IMAGES_DIR);
        fs::create_dir_all(&images_dir)?;

        let mut stored = payload.clone();
        for (index, image) in stored.images.iter_mut().enumerate() {
            let name = format!("{:02}-{}", index + 1, image.file_name);
            let path = images_dir.join(&name);
            write_atomic(&path, image.file.bytes())?;
            debug!(path = %path.display(), size = image.size, "image written");
            image.stored_as = Some(format!("{IMAGES_DIR}/{name}"));
        }

        let json = serde_json::to_string_pretty(&stored)?;
        let path = entry.join(PAYLOAD_FILE);
        let tmp = tmp_path(&path);
        write_atomic(&tmp, json.as_bytes())?;
        fs::rename(&tmp, &path)?;
        Ok(entry)
    }

    /// Entry directories that contain a finished payload, oldest name first.
    pub fn entries(&self) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() && path.join(PAYLOAD_FILE).is_file() {
                entries.push(path);
            }
        }
        entries.sort();
        Ok(entries)
    }

    pub fn read_payload(entry: &Path) -> Result<serde_json::Value> {
        let data = fs::read_to_string(entry.join(PAYLOAD_FILE))?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl TripSink for JsonOutbox {
    fn on_save(&mut self, payload: &TripPayload) -> std::result::Result<(), SubmissionError> {
        let entry = self.write(payload)?;
        info!(entry = %entry.display(), "trip written to outbox");
        self.last_entry = Some(entry);
        Ok(())
    }

    fn on_close(&mut self) {
        debug!(root = %self.root.display(), "outbox notified of wizard close");
        self.closed = true;
    }
}

/// Reads pre-fill data for edit and reactivate sessions.
pub fn load_initial_data(path: &Path) -> Result<InitialTripData> {
    if !path.exists() {
        return Err(StorageError::NotFound(path.to_path_buf()));
    }
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Resolves existing image references as local paths.
///
/// Relative references are taken from `base`, which is normally the directory
/// of the trip file they came from. A `file://` prefix is accepted.
#[derive(Debug, Clone, Default)]
pub struct FsAssetFetcher {
    base: Option<PathBuf>,
}

impl FsAssetFetcher {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let raw = Path::new(source.strip_prefix("file://").unwrap_or(source));
        match &self.base {
            Some(base) if raw.is_relative() => base.join(raw),
            _ => raw.to_path_buf(),
        }
    }
}

impl AssetFetcher for FsAssetFetcher {
    fn fetch(&self, source: &str) -> std::result::Result<ImageFile, AssetError> {
        let path = self.resolve(source);
        if !path.is_file() {
            return Err(AssetError::Unreadable {
                name: source.to_string(),
                reason: "no such file".into(),
            });
        }
        ImageFile::from_path(&path)
    }
}

fn check_file_name(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if plain {
        Ok(())
    } else {
        Err(StorageError::InvalidFileName(name.to_string()))
    }
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "trip".into()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TripDraft, WizardMode};
    use crate::payload::PayloadBuilder;
    use tempfile::TempDir;

    fn payload(name: &str) -> TripPayload {
        let draft = TripDraft {
            name: name.into(),
            description: "Coastal walk".into(),
            ..TripDraft::default()
        };
        PayloadBuilder::build(
            &draft,
            &[],
            None,
            WizardMode::Create,
            vec![ImageFile::new("cliff.png", "image/png", vec![9, 9, 9])],
        )
    }

    #[test]
    fn canonical_name_sanitizes() {
        assert_eq!(canonical_name("Cinque Terre!"), "cinque_terre_");
        assert_eq!(canonical_name("  "), "trip");
    }

    #[test]
    fn save_writes_payload_and_images() {
        let temp = TempDir::new().unwrap();
        let mut outbox = JsonOutbox::new(temp.path().join("outbox")).unwrap();
        outbox.on_save(&payload("Cliff Path")).unwrap();

        let entry = outbox.last_entry().unwrap().to_path_buf();
        assert!(entry
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("cliff_path-"));
        assert_eq!(
            fs::read(entry.join("images").join("01-cliff.png")).unwrap(),
            vec![9, 9, 9]
        );
        let json = JsonOutbox::read_payload(&entry).unwrap();
        assert_eq!(json["name"], "Cliff Path");
        assert_eq!(json["images"][0]["size"], 3);
        assert_eq!(json["images"][0]["file_name"], "cliff.png");
        assert_eq!(json["images"][0]["stored_as"], "images/01-cliff.png");
        assert!(!tmp_path(&entry.join(PAYLOAD_FILE)).exists());
        assert_eq!(outbox.entries().unwrap(), vec![entry]);
    }

    #[test]
    fn images_with_the_same_name_are_kept_apart() {
        let temp = TempDir::new().unwrap();
        let outbox = JsonOutbox::new(temp.path().to_path_buf()).unwrap();
        let payload = PayloadBuilder::build(
            &TripDraft::default(),
            &[],
            None,
            WizardMode::Create,
            vec![
                ImageFile::new("cover.jpg", "image/jpeg", vec![1]),
                ImageFile::new("cover.jpg", "image/jpeg", vec![2, 2]),
            ],
        );
        let entry = outbox.write(&payload).unwrap();

        let images = entry.join("images");
        assert_eq!(fs::read(images.join("01-cover.jpg")).unwrap(), vec![1]);
        assert_eq!(fs::read(images.join("02-cover.jpg")).unwrap(), vec![2, 2]);
        assert_eq!(fs::read_dir(&images).unwrap().count(), 2);
        let json = JsonOutbox::read_payload(&entry).unwrap();
        assert_eq!(json["images"][1]["stored_as"], "images/02-cover.jpg");
    }

    #[test]
    fn image_names_with_path_separators_are_refused() {
        let temp = TempDir::new().unwrap();
        let outbox = JsonOutbox::new(temp.path().join("outbox")).unwrap();
        for name in ["../escape.png", "nested/cover.png", "c:\\cover.png", ".."] {
            let payload = PayloadBuilder::build(
                &TripDraft::default(),
                &[],
                None,
                WizardMode::Create,
                vec![ImageFile::new(name, "image/png", vec![1])],
            );
            assert!(matches!(
                outbox.write(&payload),
                Err(StorageError::InvalidFileName(rejected)) if rejected == name
            ));
        }
        assert!(outbox.entries().unwrap().is_empty());
        assert!(!temp.path().join("escape.png").exists());
    }

    #[test]
    fn close_is_recorded() {
        let temp = TempDir::new().unwrap();
        let mut outbox = JsonOutbox::new(temp.path().to_path_buf()).unwrap();
        assert!(!outbox.is_closed());
        outbox.on_close();
        assert!(outbox.is_closed());
    }

    #[test]
    fn missing_trip_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let err = load_initial_data(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn trip_file_is_parsed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("trip.json");
        fs::write(
            &path,
            r#"{"name":"Dolomites","season":"summer","images":["a.jpg"],"timelines":[]}"#,
        )
        .unwrap();
        let data = load_initial_data(&path).unwrap();
        assert_eq!(data.name, "Dolomites");
        assert_eq!(data.images, vec!["a.jpg".to_string()]);
    }

    #[test]
    fn fetcher_resolves_relative_to_base() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.jpg"), [1, 2]).unwrap();
        let fetcher = FsAssetFetcher::new(Some(temp.path().to_path_buf()));

        let file = fetcher.fetch("a.jpg").unwrap();
        assert_eq!(file.content_type(), "image/jpeg");
        assert_eq!(file.size(), 2);
        assert!(matches!(
            fetcher.fetch("missing.jpg"),
            Err(AssetError::Unreadable { .. })
        ));
    }
}
