pub const DEFAULT_THEME: &str = "default";
pub const THEMES: [&str; 3] = [DEFAULT_THEME, "dark", "blue"];

/// Body class for a theme; the default theme has none.
pub fn theme_class(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() || name == DEFAULT_THEME {
        None
    } else {
        Some(format!("theme-{name}"))
    }
}

/// Keeps the chosen theme in `localStorage` and mirrors it as a class on
/// `<body>`.
#[derive(Clone, Debug)]
pub struct ThemeManager {
    storage_key: String,
}

impl ThemeManager {
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
        }
    }

    /// Applies the stored theme, if any, and returns its name.
    pub fn restore(&self) -> String {
        let theme = storage()
            .and_then(|s| s.get_item(&self.storage_key).ok().flatten())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_THEME.to_string());
        apply(&theme);
        theme
    }

    pub fn change(&self, theme: &str) {
        apply(theme);
        match storage() {
            Some(s) => {
                if s.set_item(&self.storage_key, theme).is_err() {
                    log::warn!("could not persist theme `{theme}`");
                }
            }
            None => log::warn!("localStorage unavailable, theme `{theme}` not persisted"),
        }
    }
}

fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

fn apply(theme: &str) {
    let Some(body) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
    else {
        return;
    };
    body.set_class_name("");
    if let Some(class) = theme_class(theme) {
        let _ = body.class_list().add_1(&class);
    }
}
