//! Geometry for the dotted grid: where each grid post sits, and where the
//! connector lines between posts run.

use std::collections::HashMap;

use crate::config::GridConfig;
use crate::model::{Connection, Post, PostId, DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Resolves a rendered grid post to its current bounding box.
pub trait BoundsLookup {
    fn bounds_by_id(&self, id: &PostId) -> Option<Rect>;
}

impl BoundsLookup for HashMap<PostId, Rect> {
    fn bounds_by_id(&self, id: &PostId) -> Option<Rect> {
        self.get(id).copied()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub key: String,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub color: String,
    pub width: f64,
    pub dash_array: Option<String>,
}

/// One line per connection whose endpoints both resolve, running between the
/// endpoint centers relative to `container`'s origin. Unresolved connections
/// are skipped.
pub fn compute_lines<L: BoundsLookup + ?Sized>(
    connections: &[Connection],
    container: Rect,
    lookup: &L,
) -> Vec<Line> {
    connections
        .iter()
        .filter_map(|connection| {
            let (Some(from), Some(to)) = (
                lookup.bounds_by_id(&connection.from),
                lookup.bounds_by_id(&connection.to),
            ) else {
                log::debug!("skipping unresolved connection {}", connection.key());
                return None;
            };
            let (x1, y1) = from.center();
            let (x2, y2) = to.center();
            Some(Line {
                key: connection.key(),
                x1: x1 - container.left,
                y1: y1 - container.top,
                x2: x2 - container.left,
                y2: y2 - container.top,
                color: connection
                    .color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_STROKE_COLOR.to_string()),
                width: connection.width.unwrap_or(DEFAULT_STROKE_WIDTH),
                dash_array: connection.dashed.as_ref().and_then(|d| d.dash_array()),
            })
        })
        .collect()
}

/// A grid post's cell span as CSS grid lines: columns `[column_start,
/// column_end)` and rows `[row_start, row_end)`, all 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridPlacement {
    pub column_start: u32,
    pub column_end: u32,
    pub row_start: u32,
    pub row_end: u32,
}

impl GridPlacement {
    /// Places `post` on `grid`, clamping anything that would spill past the
    /// grid edge. Returns `None` for posts without geometry.
    pub fn for_post(post: &Post, grid: &GridConfig) -> Option<Self> {
        let (position, size) = (post.position?, post.size?);
        let (column_start, column_end) = clamp_span(position.x, size.width, grid.columns);
        let (row_start, row_end) = clamp_span(position.y, size.height, grid.rows);
        let placement = Self {
            column_start,
            column_end,
            row_start,
            row_end,
        };
        let requested = Self {
            column_start: position.x,
            column_end: position.x.saturating_add(size.width),
            row_start: position.y,
            row_end: position.y.saturating_add(size.height),
        };
        if placement != requested {
            log::warn!(
                "grid post {} does not fit a {}x{} grid, clamped to columns {}..{} rows {}..{}",
                post.id,
                grid.columns,
                grid.rows,
                column_start,
                column_end,
                row_start,
                row_end
            );
        }
        Some(placement)
    }

    pub fn css(&self) -> String {
        format!(
            "grid-column-start: {}; grid-column-end: {}; grid-row-start: {}; grid-row-end: {};",
            self.column_start, self.column_end, self.row_start, self.row_end
        )
    }
}

fn clamp_span(start: u32, len: u32, cells: u32) -> (u32, u32) {
    let cells = cells.max(1);
    let start = start.clamp(1, cells);
    let len = len.clamp(1, cells + 1 - start);
    (start, start + len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DashPattern, Position, PostStyles, PostType, Size};

    fn connection(from: &str, to: &str) -> Connection {
        Connection {
            from: PostId::new(from),
            to: PostId::new(to),
            color: None,
            width: None,
            dashed: None,
        }
    }

    fn fixture() -> HashMap<PostId, Rect> {
        HashMap::from([
            (PostId::new("a"), Rect::new(110.0, 220.0, 40.0, 20.0)),
            (PostId::new("b"), Rect::new(300.0, 100.0, 100.0, 50.0)),
        ])
    }

    #[test]
    fn lines_run_between_centers_relative_to_container() {
        let container = Rect::new(100.0, 50.0, 600.0, 600.0);
        let lines = compute_lines(&[connection("a", "b")], container, &fixture());
        assert_eq!(
            lines,
            vec![Line {
                key: "a-b".to_string(),
                x1: 30.0,
                y1: 180.0,
                x2: 250.0,
                y2: 75.0,
                color: DEFAULT_STROKE_COLOR.to_string(),
                width: DEFAULT_STROKE_WIDTH,
                dash_array: None,
            }]
        );
    }

    #[test]
    fn unresolved_connections_are_skipped() {
        let connections = [
            connection("a", "b"),
            connection("a", "ghost"),
            connection("nobody", "b"),
        ];
        let lines = compute_lines(&connections, Rect::default(), &fixture());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].key, "a-b");
    }

    #[test]
    fn empty_inputs_give_no_lines() {
        let lines = compute_lines(&[], Rect::default(), &HashMap::new());
        assert!(lines.is_empty());
    }

    #[test]
    fn recomputation_replaces_rather_than_accumulates() {
        let connections = [connection("a", "b")];
        let mut bounds = fixture();
        let first = compute_lines(&connections, Rect::default(), &bounds);
        bounds.insert(PostId::new("a"), Rect::new(0.0, 0.0, 10.0, 10.0));
        let second = compute_lines(&connections, Rect::default(), &bounds);
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!((second[0].x1, second[0].y1), (5.0, 5.0));
    }

    #[test]
    fn overrides_are_carried() {
        let mut styled = connection("a", "b");
        styled.color = Some("#f00".to_string());
        styled.width = Some(3.5);
        styled.dashed = Some(DashPattern::Pattern("2,4".to_string()));
        let lines = compute_lines(&[styled], Rect::default(), &fixture());
        assert_eq!(lines[0].color, "#f00");
        assert_eq!(lines[0].width, 3.5);
        assert_eq!(lines[0].dash_array.as_deref(), Some("2,4"));
    }

    fn grid_post(x: u32, y: u32, width: u32, height: u32) -> Post {
        Post {
            id: PostId::new("g"),
            kind: PostType::Grid,
            title: "G".to_string(),
            url: None,
            file: None,
            position: Some(Position { x, y }),
            size: Some(Size { width, height }),
            styles: PostStyles::default(),
            show_content: true,
        }
    }

    #[test]
    fn placement_spans_position_to_position_plus_size() {
        let grid = GridConfig::default();
        for (x, y, w, h) in [(1, 1, 1, 1), (5, 7, 4, 2), (27, 1, 4, 30), (1, 30, 30, 1)] {
            let placement = GridPlacement::for_post(&grid_post(x, y, w, h), &grid).unwrap();
            assert_eq!(
                placement,
                GridPlacement {
                    column_start: x,
                    column_end: x + w,
                    row_start: y,
                    row_end: y + h,
                }
            );
        }
    }

    #[test]
    fn out_of_bounds_placement_is_clamped() {
        let grid = GridConfig::default();
        let placement = GridPlacement::for_post(&grid_post(29, 0, 5, 0), &grid).unwrap();
        assert_eq!(
            placement,
            GridPlacement {
                column_start: 29,
                column_end: 31,
                row_start: 1,
                row_end: 2,
            }
        );
        let far = GridPlacement::for_post(&grid_post(90, 90, 2, 2), &grid).unwrap();
        assert_eq!((far.column_start, far.column_end), (30, 31));
    }

    #[test]
    fn placement_css() {
        let placement = GridPlacement::for_post(&grid_post(2, 3, 4, 5), &GridConfig::default())
            .unwrap();
        assert_eq!(
            placement.css(),
            "grid-column-start: 2; grid-column-end: 6; grid-row-start: 3; grid-row-end: 8;"
        );
    }
}
