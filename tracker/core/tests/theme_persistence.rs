//! Theme preference persistence tests
//!
//! The theme controller over a file-backed store, across "restarts".

use std::sync::Arc;

use pretty_assertions::assert_eq;

use tracker_core::{
    FilePreferenceStore, PreferenceStore, ThemeController, ThemePreference, DARK_MODE_KEY,
    USE_SYSTEM_THEME_KEY,
};

async fn open(path: &std::path::Path) -> ThemeController<FilePreferenceStore> {
    ThemeController::new(Arc::new(FilePreferenceStore::open(path).await.unwrap()))
}

#[tokio::test]
async fn test_fresh_install_follows_system() {
    let dir = tempfile::tempdir().unwrap();
    let theme = open(&dir.path().join("preferences.toml")).await;

    let pref = theme.preference();
    assert_eq!(pref, ThemePreference::default());
    assert!(pref.is_dark(true));
    assert!(!pref.is_dark(false));
}

#[tokio::test]
async fn test_choice_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.toml");

    {
        let theme = open(&path).await;
        theme.set_dark_mode(true).await.unwrap();
    }

    let theme = open(&path).await;
    assert_eq!(
        theme.preference(),
        ThemePreference {
            dark_mode: true,
            use_system_theme: false,
        }
    );
    assert!(theme.preference().is_dark(false));

    theme.enable_system_theme().await.unwrap();
    drop(theme);

    let store = FilePreferenceStore::open(&path).await.unwrap();
    let values = store.watch().borrow().clone();
    assert_eq!(values.get(USE_SYSTEM_THEME_KEY), Some(&true));
    assert_eq!(values.get(DARK_MODE_KEY), Some(&true));
}

#[tokio::test]
async fn test_write_failure_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let parent = dir.path().join("task-tracker");
    let store = FilePreferenceStore::open(parent.join("preferences.toml"))
        .await
        .unwrap();
    let theme = ThemeController::new(Arc::new(store));

    // A plain file where the directory should be makes every write fail
    tokio::fs::write(&parent, "").await.unwrap();

    theme.set_dark_mode(true).await.unwrap();
    assert_eq!(theme.preference(), ThemePreference::default());
}
