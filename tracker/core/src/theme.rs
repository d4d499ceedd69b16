//! Theme Controller
//!
//! Exposes the user's theme preference from a [`PreferenceStore`] and writes
//! changes back to it.
//!
//! `use_system_theme` takes precedence: while it is set, `dark_mode` is
//! remembered but ignored, and the surface follows the platform theme.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::observable::StateCell;
use crate::preferences::{PreferenceMap, PreferenceStore, DARK_MODE_KEY, USE_SYSTEM_THEME_KEY};
use crate::scope::ControllerScope;

/// Default for `dark_mode` when never written
pub const DEFAULT_DARK_MODE: bool = false;
/// Default for `use_system_theme` when never written
pub const DEFAULT_USE_SYSTEM_THEME: bool = true;

/// Resolved theme preference
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemePreference {
    /// Explicit choice, used only when `use_system_theme` is false
    pub dark_mode: bool,
    /// Follow the platform theme
    pub use_system_theme: bool,
}

impl Default for ThemePreference {
    fn default() -> Self {
        Self {
            dark_mode: DEFAULT_DARK_MODE,
            use_system_theme: DEFAULT_USE_SYSTEM_THEME,
        }
    }
}

impl ThemePreference {
    /// Read from a store snapshot, filling in defaults
    #[must_use]
    pub fn from_map(map: &PreferenceMap) -> Self {
        Self {
            dark_mode: map.get(DARK_MODE_KEY).copied().unwrap_or(DEFAULT_DARK_MODE),
            use_system_theme: map
                .get(USE_SYSTEM_THEME_KEY)
                .copied()
                .unwrap_or(DEFAULT_USE_SYSTEM_THEME),
        }
    }

    /// Whether to render dark, given the platform's current theme
    #[must_use]
    pub fn is_dark(&self, system_is_dark: bool) -> bool {
        if self.use_system_theme {
            system_is_dark
        } else {
            self.dark_mode
        }
    }
}

struct ThemeInner<P> {
    store: Arc<P>,
    dark_mode: StateCell<bool>,
    use_system_theme: StateCell<bool>,
}

impl<P: PreferenceStore + 'static> ThemeInner<P> {
    fn publish(&self, map: &PreferenceMap) {
        let pref = ThemePreference::from_map(map);
        if self.dark_mode.get() != pref.dark_mode {
            self.dark_mode.set(pref.dark_mode);
        }
        if self.use_system_theme.get() != pref.use_system_theme {
            self.use_system_theme.set(pref.use_system_theme);
        }
    }

    async fn write(&self, updates: &[(&str, bool)]) {
        match self.store.edit(updates).await {
            Ok(()) => {
                tracing::debug!(?updates, "Theme preference saved");
                let snapshot = self.store.watch().borrow().clone();
                self.publish(&snapshot);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to save theme preference"),
        }
    }
}

/// Controller for the light/dark/system theme choice
pub struct ThemeController<P> {
    inner: Arc<ThemeInner<P>>,
    scope: ControllerScope,
}

impl<P: PreferenceStore + 'static> ThemeController<P> {
    /// Create a controller over `store`
    ///
    /// The current stored values are published immediately; a background
    /// task keeps the state current with later writes, including writes
    /// made by other holders of the store.
    pub fn new(store: Arc<P>) -> Self {
        let mut rx = store.watch();
        let initial = ThemePreference::from_map(&rx.borrow_and_update());

        let inner = Arc::new(ThemeInner {
            store,
            dark_mode: StateCell::new(initial.dark_mode),
            use_system_theme: StateCell::new(initial.use_system_theme),
        });

        let scope = ControllerScope::new();
        let forward = Arc::clone(&inner);
        scope.spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                forward.publish(&snapshot);
            }
        });

        Self { inner, scope }
    }

    /// Subscribe to the explicit dark-mode flag
    pub fn dark_mode(&self) -> watch::Receiver<bool> {
        self.inner.dark_mode.subscribe()
    }

    /// Subscribe to the follow-system flag
    pub fn use_system_theme(&self) -> watch::Receiver<bool> {
        self.inner.use_system_theme.subscribe()
    }

    /// Current preference
    #[must_use]
    pub fn preference(&self) -> ThemePreference {
        ThemePreference {
            dark_mode: self.inner.dark_mode.get(),
            use_system_theme: self.inner.use_system_theme.get(),
        }
    }

    /// Choose light or dark explicitly, leaving system mode
    pub fn set_dark_mode(&self, is_dark: bool) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        self.scope.spawn(async move {
            inner
                .write(&[(DARK_MODE_KEY, is_dark), (USE_SYSTEM_THEME_KEY, false)])
                .await;
        })
    }

    /// Follow the platform theme; the explicit choice is kept for later
    pub fn enable_system_theme(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        self.scope.spawn(async move {
            inner.write(&[(USE_SYSTEM_THEME_KEY, true)]).await;
        })
    }
}
