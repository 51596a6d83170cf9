mod common;

use std::{fs, sync::Arc};

use common::{create_wizard, fill_basic, fill_itinerary, initial_trip, options};
use tempfile::TempDir;
use trip_composer::{
    assets::TrackingPreviewRegistry,
    config::{Config, ConfigManager},
    storage::{load_initial_data, FsAssetFetcher, JsonOutbox, PAYLOAD_FILE},
    StepOutcome, WizardController, WizardMode,
};

#[test]
fn accepted_trip_lands_in_the_configured_outbox() {
    let temp = TempDir::new().unwrap();
    let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
    let config = Config {
        outbox_dir: Some(temp.path().join("sent")),
        ..Config::default()
    };
    manager.save(&config).unwrap();
    let config = manager.load().unwrap();

    let mut outbox = JsonOutbox::new(manager.outbox_dir(&config)).unwrap();
    let registry = Arc::new(TrackingPreviewRegistry::new());
    let mut wizard = create_wizard(&registry);
    fill_basic(&mut wizard);
    wizard.advance().unwrap();
    fill_itinerary(&mut wizard);

    assert!(matches!(
        wizard.advance_with(&mut outbox).unwrap(),
        StepOutcome::Saved(_)
    ));
    assert!(outbox.is_closed());

    let entries = outbox.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].starts_with(temp.path().join("sent")));
    let json = JsonOutbox::read_payload(&entries[0]).unwrap();
    assert_eq!(json["name"], "Amalfi Coast");
    assert_eq!(json["season"], "summer");
    assert_eq!(json["start_date"], "2026-06-01");
    assert_eq!(json["timelines"][1]["sections"][0]["time"], "10:30");
    assert!(entries[0].join("images").join("01-positano.jpg").is_file());
    assert_eq!(json["images"][0]["file_name"], "positano.jpg");
    assert_eq!(json["images"][0]["stored_as"], "images/01-positano.jpg");
}

#[test]
fn edit_session_reads_trip_file_and_local_images() {
    let temp = TempDir::new().unwrap();
    let trip_path = temp.path().join("trip.json");
    fs::write(
        &trip_path,
        serde_json::to_string_pretty(&initial_trip(2)).unwrap(),
    )
    .unwrap();
    fs::write(temp.path().join("colosseum.jpg"), [7u8; 12]).unwrap();

    let initial = load_initial_data(&trip_path).unwrap();
    let mut wizard = WizardController::open(
        WizardMode::Edit,
        Some(initial),
        options(),
        Arc::new(TrackingPreviewRegistry::new()),
    )
    .with_asset_fetcher(Box::new(FsAssetFetcher::new(Some(
        temp.path().to_path_buf(),
    ))));

    let mut outbox = JsonOutbox::new(temp.path().join("outbox")).unwrap();
    wizard.advance().unwrap();
    assert!(matches!(
        wizard.advance_with(&mut outbox).unwrap(),
        StepOutcome::Saved(_)
    ));

    let entry = outbox.last_entry().unwrap();
    assert!(entry.join(PAYLOAD_FILE).is_file());
    assert_eq!(
        fs::read(entry.join("images").join("01-colosseum.jpg")).unwrap(),
        vec![7u8; 12]
    );
}
