//! Pure view models for the grid tiles and task rows. Every style field
//! falls back to a fixed default, so a tile never carries a partial style.

use crate::config::GridConfig;
use crate::layout::GridPlacement;
use crate::model::{Post, PostId, PostStyles, PostType};
use crate::store::PostStore;

const INHERIT: &str = "inherit";
const TRANSPARENT: &str = "transparent";
const NO_PADDING: &str = "0";
pub const DEFAULT_CIRCLE_COLOR: &str = "#ccc";

/// DOM id for a grid tile, used to find its bounding box later.
pub fn grid_element_id(id: &PostId) -> String {
    format!("grid-post-{}", id)
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub color: String,
    pub font_size: String,
    pub font_weight: String,
}

impl TextStyle {
    pub fn from_styles(styles: &PostStyles) -> Self {
        let or_inherit = |value: &Option<String>| value.clone().unwrap_or_else(|| INHERIT.into());
        Self {
            font_family: or_inherit(&styles.font),
            color: or_inherit(&styles.color),
            font_size: or_inherit(&styles.font_size),
            font_weight: or_inherit(&styles.font_weight),
        }
    }

    pub fn css(&self) -> String {
        format!(
            "font-family: {}; color: {}; font-size: {}; font-weight: {};",
            self.font_family, self.color, self.font_size, self.font_weight
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridItem {
    pub post: Post,
    pub element_id: String,
    pub placement: GridPlacement,
    pub text: TextStyle,
    pub background_color: String,
    pub padding: String,
}

impl GridItem {
    pub fn new(post: &Post, grid: &GridConfig) -> Option<Self> {
        let Some(placement) = GridPlacement::for_post(post, grid) else {
            log::warn!("grid post {} has no position or size, not placed", post.id);
            return None;
        };
        Some(Self {
            element_id: grid_element_id(&post.id),
            placement,
            text: TextStyle::from_styles(&post.styles),
            background_color: post
                .styles
                .background_color
                .clone()
                .unwrap_or_else(|| TRANSPARENT.into()),
            padding: post
                .styles
                .padding
                .clone()
                .unwrap_or_else(|| NO_PADDING.into()),
            post: post.clone(),
        })
    }

    pub fn css(&self) -> String {
        format!(
            "{} {} background-color: {}; padding: {}; z-index: 1;",
            self.placement.css(),
            self.text.css(),
            self.background_color,
            self.padding
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskRow {
    pub post: Post,
    pub circle_color: String,
    pub text: TextStyle,
}

impl TaskRow {
    pub fn new(post: &Post) -> Self {
        Self {
            circle_color: post
                .styles
                .circle_color
                .clone()
                .unwrap_or_else(|| DEFAULT_CIRCLE_COLOR.into()),
            text: TextStyle::from_styles(&post.styles),
            post: post.clone(),
        }
    }

    pub fn marker_css(&self) -> String {
        format!("border-color: {};", self.circle_color)
    }
}

pub fn grid_items(store: &PostStore, grid: &GridConfig) -> Vec<GridItem> {
    store
        .by_type(PostType::Grid)
        .filter_map(|post| GridItem::new(post, grid))
        .collect()
}

/// Builds the task rows from scratch; callers replace their previous rows
/// with the result instead of appending to them.
pub fn task_rows(store: &PostStore) -> Vec<TaskRow> {
    store.by_type(PostType::Task).map(TaskRow::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r##"{
        "posts": [
            {"id": 1, "type": "grid", "title": "Styled",
             "position": {"x": 3, "y": 4}, "size": {"width": 5, "height": 2},
             "styles": {"font": "'Caveat', cursive", "color": "#2a6496",
                        "backgroundColor": "#fff8", "padding": "4px"}},
            {"id": 2, "type": "grid", "title": "Plain",
             "position": {"x": 1, "y": 1}, "size": {"width": 1, "height": 1}},
            {"id": 3, "type": "task", "title": "Read",
             "styles": {"circleColor": "#e91e63", "fontWeight": "bold"}},
            {"id": 4, "type": "task", "title": "Write"}
        ],
        "connections": []
    }"##;

    #[test]
    fn grid_items_follow_styles_and_fallbacks() {
        let store = PostStore::from_json(INDEX).unwrap();
        let items = grid_items(&store, &GridConfig::default());
        assert_eq!(items.len(), 2);

        let styled = &items[0];
        assert_eq!(styled.element_id, "grid-post-1");
        assert_eq!(styled.text.font_family, "'Caveat', cursive");
        assert_eq!(styled.text.font_size, "inherit");
        assert_eq!(styled.background_color, "#fff8");
        assert_eq!(styled.padding, "4px");
        assert!(styled.css().starts_with("grid-column-start: 3; grid-column-end: 8;"));

        let plain = &items[1];
        assert_eq!(plain.text, TextStyle::from_styles(&PostStyles::default()));
        assert_eq!(plain.background_color, "transparent");
        assert_eq!(plain.padding, "0");
    }

    #[test]
    fn task_rows_in_index_order_with_marker_fallback() {
        let store = PostStore::from_json(INDEX).unwrap();
        let rows = task_rows(&store);
        let titles: Vec<_> = rows.iter().map(|r| r.post.title.as_str()).collect();
        assert_eq!(titles, ["Read", "Write"]);
        assert_eq!(rows[0].marker_css(), "border-color: #e91e63;");
        assert_eq!(rows[0].text.font_weight, "bold");
        assert_eq!(rows[1].circle_color, DEFAULT_CIRCLE_COLOR);
    }

    #[test]
    fn rebuilding_rows_does_not_accumulate() {
        let store = PostStore::from_json(INDEX).unwrap();
        let first = task_rows(&store);
        let second = task_rows(&store);
        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn unplaceable_grid_post_leaves_the_rest_intact() {
        let store = PostStore::from_json(
            r#"{"posts": [
                {"id": "lost", "type": "grid", "title": "No geometry", "size": {"width": 2, "height": 2}},
                {"id": "kept", "type": "grid", "title": "Placed",
                 "position": {"x": 4, "y": 4}, "size": {"width": 2, "height": 2}},
                {"id": "t1", "type": "task", "title": "Still here"},
                {"id": "t2", "type": "task", "title": "Me too"}
            ],
            "connections": [{"from": "kept", "to": "lost"}]}"#,
        )
        .unwrap();

        let items = grid_items(&store, &GridConfig::default());
        let placed: Vec<_> = items.iter().map(|i| i.post.id.as_str()).collect();
        assert_eq!(placed, ["kept"]);
        assert_eq!(task_rows(&store).len(), 2);
        assert_eq!(store.connections().len(), 1);
    }

    #[test]
    fn empty_store_renders_nothing() {
        let store = PostStore::default();
        assert!(grid_items(&store, &GridConfig::default()).is_empty());
        assert!(task_rows(&store).is_empty());
    }
}
