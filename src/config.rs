use serde::Deserialize;
use wasm_bindgen::JsValue;

use crate::markdown::MarkdownFlavor;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: u32,
    pub columns: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 30,
            columns: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DotConfig {
    pub dot_size: u32,
    pub dot_color: String,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            dot_size: 2,
            dot_color: "#ccc".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub index_url: String,
    pub content_dir: String,
    pub grid: GridConfig,
    pub dots: DotConfig,
    pub theme_storage_key: String,
    pub resize_debounce_ms: u32,
    pub markdown: MarkdownFlavor,
    pub log_level: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            index_url: "/data/posts/index.json".to_string(),
            content_dir: "/data/posts/".to_string(),
            grid: GridConfig::default(),
            dots: DotConfig::default(),
            theme_storage_key: "sidekick-theme".to_string(),
            resize_debounce_ms: 100,
            markdown: MarkdownFlavor::default(),
            log_level: "info".to_string(),
        }
    }
}

impl SiteConfig {
    /// Reads `window.notebookConfig` if the page defines it. Missing fields
    /// take their defaults; an unreadable object falls back to the defaults
    /// entirely.
    pub fn from_window() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let raw = js_sys::Reflect::get(&window, &JsValue::from_str("notebookConfig"))
            .unwrap_or(JsValue::UNDEFINED);
        if raw.is_undefined() || raw.is_null() {
            return Self::default();
        }
        match serde_wasm_bindgen::from_value::<SiteConfig>(raw) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring window.notebookConfig: {e}");
                Self::default()
            }
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
