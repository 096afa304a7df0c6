use std::sync::Arc;

use game_sync::config::{
    ConfigPaths, ConfigStore, ConfigUpdateEvent, Credentials, ExclusionRecord, MappingRecord,
    bootstrap,
};
use game_sync::domain::{JUST_CHATTING, detect_game};
use platforms_api::client::{DEFAULT_TIMEOUT, default_client};
use process_utils::ProcessSnapshot;

#[tokio::test]
async fn bootstrap_then_edit_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ConfigPaths::new(dir.path());
    let client = default_client(DEFAULT_TIMEOUT).unwrap();
    bootstrap(&paths, &client, None).await.unwrap();

    let store = Arc::new(ConfigStore::open(paths.clone()));
    let mut updates = store.subscribe();

    store.upsert_game("Chess", "chess.exe", Some("Chess")).unwrap();
    store.upsert_game("Valorant", "VALORANT.exe", None).unwrap();
    assert!(store.remove_game("Chess").unwrap());
    assert!(!store.remove_game("Chess").unwrap());

    let mut saw_removal = false;
    while let Ok(event) = updates.try_recv() {
        saw_removal |= event == ConfigUpdateEvent::GameRemoved {
            game: "Chess".to_string(),
        };
    }
    assert!(saw_removal);

    // A fresh store sees the persisted edits.
    let reopened = ConfigStore::open(paths.clone());
    let snapshot = reopened.snapshot();
    assert_eq!(snapshot.games().keys().collect::<Vec<_>>(), vec!["Valorant"]);
    assert_eq!(snapshot.category_for("Valorant"), JUST_CHATTING);

    // Default exclusions are active.
    let processes: ProcessSnapshot = ["explorer.exe", "valorant.exe"].into_iter().collect();
    assert_eq!(
        detect_game(&processes, snapshot.games(), &snapshot.exclusions),
        "Valorant"
    );
}

#[test]
fn malformed_mapping_reads_as_empty_until_fixed() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ConfigPaths::new(dir.path());
    std::fs::write(&paths.mapping, "{ not json").unwrap();

    let store = ConfigStore::open(paths.clone());
    assert!(store.snapshot().games().is_empty());
    assert!(store.upsert_game("Chess", "chess.exe", None).is_err());
    assert_eq!(std::fs::read_to_string(&paths.mapping).unwrap(), "{ not json");

    let mut fixed = MappingRecord::default();
    fixed.games.insert("Chess", "chess.exe");
    fixed.write(&paths.mapping).unwrap();
    ExclusionRecord::defaults().write(&paths.exclusions).unwrap();

    let snapshot = store.reload();
    assert_eq!(snapshot.generation, 2);
    assert_eq!(snapshot.games().get("Chess"), Some("chess.exe"));
    assert!(snapshot.exclusions.is_excluded("SVCHOST.EXE"));
}

#[test]
fn credentials_from_file_and_environment() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ConfigPaths::new(dir.path());
    std::fs::write(
        &paths.credentials,
        "[twitch]\nclient_id = \"file-id\"\naccess_token = \"file-token\"\nstreamer_id = \"42\"\n",
    )
    .unwrap();

    let credentials = Credentials::load_with(&paths.credentials, |key| {
        (key == "TWITCH_ACCESS_TOKEN").then(|| "env-token".to_string())
    })
    .unwrap();
    assert_eq!(credentials.client_id, "file-id");
    assert_eq!(credentials.access_token, "env-token");
    assert_eq!(credentials.to_helix().broadcaster_id, "42");
}
