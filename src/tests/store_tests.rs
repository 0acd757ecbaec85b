#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    use crate::config::Settings;
    use crate::store::{
        HIGH_SCORE_KEY, JsonFileStore, KeyValueStore, MemoryStore, Persistence, SETTINGS_KEY,
        StoreError,
    };
    use crate::tests::test_utils::FailingStore;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("coins").expect("memory get"), None);

        store.set("coins", json!(12)).expect("memory set");
        assert_eq!(store.get("coins").expect("memory get"), Some(json!(12)));
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nested").join("store.json");

        let mut store = JsonFileStore::open(&path).expect("missing file opens empty");
        assert_eq!(store.get(HIGH_SCORE_KEY).expect("get"), None);
        store.set(HIGH_SCORE_KEY, json!(3_200)).expect("set");
        assert!(path.exists());

        let reopened = JsonFileStore::open(&path).expect("store reopens");
        assert_eq!(reopened.path(), path.as_path());
        assert_eq!(reopened.get(HIGH_SCORE_KEY).expect("get"), Some(json!(3_200)));
    }

    #[test]
    fn test_json_file_store_rejects_garbage() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let path = temp_dir.path().join("store.json");
        fs::write(&path, "not json at all").expect("Failed to write store");

        match JsonFileStore::open(&path) {
            Err(StoreError::Json(_)) => {}
            Ok(_) => panic!("Expected error when opening a corrupt store"),
            Err(e) => panic!("Unexpected error type: {e:?}"),
        }
    }

    #[test]
    fn test_json_file_store_empty_file() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let path = temp_dir.path().join("store.json");
        fs::write(&path, "  \n").expect("Failed to write store");

        let store = JsonFileStore::open(&path).expect("blank file opens empty");
        assert_eq!(store.get("coins").expect("get"), None);
    }

    #[test]
    fn test_persistence_reads_legacy_strings() {
        let mut store = MemoryStore::new();
        store.set(HIGH_SCORE_KEY, json!("4100")).expect("memory set");
        store
            .set(
                SETTINGS_KEY,
                json!(r#"{"audio":{"muted":true},"display":{"zoom_level":1.5}}"#),
            )
            .expect("memory set");
        let persistence = Persistence::new(Box::new(store));

        assert_eq!(persistence.load::<u32>(HIGH_SCORE_KEY), Some(4_100));
        let settings: Settings = persistence.load(SETTINGS_KEY).expect("settings decode");
        assert!(settings.audio.muted);
        assert!((settings.display.zoom_level - 1.5).abs() < f32::EPSILON);
        assert!((settings.audio.combo_volume - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_persistence_ignores_unreadable_values() {
        let mut store = MemoryStore::new();
        store.set(HIGH_SCORE_KEY, json!("lots")).expect("memory set");
        let persistence = Persistence::new(Box::new(store));

        assert_eq!(persistence.load::<u32>(HIGH_SCORE_KEY), None);
        assert_eq!(persistence.load_or(HIGH_SCORE_KEY, 7u32), 7);
    }

    #[test]
    fn test_persistence_swallows_store_failures() {
        let mut persistence = Persistence::new(Box::new(FailingStore));

        assert!(!persistence.save(HIGH_SCORE_KEY, &10u32));
        assert_eq!(persistence.load::<u32>(HIGH_SCORE_KEY), None);
    }

    #[test]
    fn test_persistence_save_then_load() {
        let mut persistence = Persistence::default();
        assert!(persistence.save("bestCombo", &4u32));
        assert_eq!(persistence.load::<u32>("bestCombo"), Some(4));
    }
}
