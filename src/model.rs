use serde::{Deserialize, Deserializer};
use std::fmt;

pub const DEFAULT_STROKE_COLOR: &str = "#888";
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub const DEFAULT_DASH_PATTERN: &str = "5,5";

/// Join key between posts, connections and rendered elements. The index may
/// use either JSON strings or integers; both normalize to the same text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D>(deserializer: D) -> Result<PostId, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => PostId(s),
            Raw::Int(n) => PostId(n.to_string()),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Grid,
    Task,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Sparse visual overrides. Every field is optional; consumers substitute
/// their own fallback when one is absent.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStyles {
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub font_size: Option<String>,
    #[serde(default, deserialize_with = "deserialize_font_weight")]
    pub font_weight: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub padding: Option<String>,
    #[serde(default)]
    pub circle_color: Option<String>,
}

// `fontWeight` shows up both as `"bold"` and as `700` in hand-written indexes.
fn deserialize_font_weight<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    #[serde(rename = "type")]
    pub kind: PostType,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub styles: PostStyles,
    #[serde(default = "default_show_content")]
    pub show_content: bool,
}

fn default_show_content() -> bool {
    true
}

impl Post {
    /// Link target for the rendered anchor. Posts without an external URL
    /// get an in-page fragment so the anchor stays focusable.
    pub fn href(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("#post-{}", self.id),
        }
    }

    /// Whether a click should be intercepted and routed to the viewer.
    pub fn opens_in_viewer(&self) -> bool {
        self.show_content
    }
}

/// The `dashed` field of a connection. Authors have written it as a
/// dash-array string, a single length, or a plain flag.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DashPattern {
    Flag(bool),
    Length(f64),
    Pattern(String),
}

impl DashPattern {
    pub fn dash_array(&self) -> Option<String> {
        match self {
            DashPattern::Flag(true) => Some(DEFAULT_DASH_PATTERN.to_string()),
            DashPattern::Flag(false) => None,
            DashPattern::Length(n) => Some(n.to_string()),
            DashPattern::Pattern(p) if p.trim().is_empty() => None,
            DashPattern::Pattern(p) => Some(p.trim().to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Connection {
    pub from: PostId,
    pub to: PostId,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub dashed: Option<DashPattern>,
}

impl Connection {
    pub fn key(&self) -> String {
        format!("{}-{}", self.from, self.to)
    }
}

/// The raw index document. Both collections are optional on the wire.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PostIndex {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}
