use euclid::default::{Point2D, Vector2D};
use serde::{Deserialize, Serialize};

pub type ScrollOffset = Vector2D<f32>;

/// Metrics of a monospace editing surface.
///
/// Text flows like `white-space: pre-wrap` with `word-wrap: break-word`: `\n` starts a new
/// row, and when `wrap_columns` is set a row that is full continues on the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurfaceLayout {
    pub char_width: f32,
    pub line_height: f32,
    pub padding_left: f32,
    pub padding_top: f32,
    pub wrap_columns: Option<usize>,
}

impl std::default::Default for SurfaceLayout {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
            padding_left: 16.0,
            padding_top: 16.0,
            wrap_columns: None,
        }
    }
}

impl SurfaceLayout {
    /// Row and column of the caret placed before the `offset`-th character.
    pub fn visual_position(&self, content: &str, offset: usize) -> (usize, usize) {
        let wrap = self.wrap_columns.filter(|columns| *columns > 0);
        let mut row = 0;
        let mut column = 0;
        for c in content.chars().take(offset) {
            if c == '\n' {
                row += 1;
                column = 0;
                continue;
            }
            if wrap == Some(column) {
                row += 1;
                column = 0;
            }
            column += 1;
        }
        (row, column)
    }

    pub fn offset_to_point(&self, content: &str, offset: usize, scroll: ScrollOffset) -> Point2D<f32> {
        let (row, column) = self.visual_position(content, offset);
        Point2D::new(
            self.padding_left + column as f32 * self.char_width,
            self.padding_top + row as f32 * self.line_height,
        ) - scroll
    }
}

/// The layout together with the surface's current scroll offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub layout: SurfaceLayout,
    pub scroll: ScrollOffset,
}

impl Surface {
    pub fn new(layout: SurfaceLayout) -> Self {
        Self {
            layout,
            scroll: ScrollOffset::zero(),
        }
    }

    pub fn point_at(&self, content: &str, offset: usize) -> Point2D<f32> {
        self.layout.offset_to_point(content, offset, self.scroll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> SurfaceLayout {
        SurfaceLayout {
            char_width: 10.0,
            line_height: 20.0,
            padding_left: 5.0,
            padding_top: 3.0,
            wrap_columns: None,
        }
    }

    #[test]
    fn it_should_follow_hard_line_breaks() {
        let layout = layout();
        assert_eq!(layout.visual_position("ab\ncd", 0), (0, 0));
        assert_eq!(layout.visual_position("ab\ncd", 2), (0, 2));
        assert_eq!(layout.visual_position("ab\ncd", 3), (1, 0));
        assert_eq!(layout.visual_position("ab\ncd", 5), (1, 2));
        // past the end stays at the end
        assert_eq!(layout.visual_position("ab\ncd", 50), (1, 2));
    }

    #[test]
    fn it_should_soft_wrap_full_rows() {
        let layout = SurfaceLayout {
            wrap_columns: Some(3),
            ..layout()
        };
        assert_eq!(layout.visual_position("abcdefg", 3), (0, 3));
        assert_eq!(layout.visual_position("abcdefg", 4), (1, 1));
        assert_eq!(layout.visual_position("abcdefg", 7), (2, 1));
    }

    #[test]
    fn it_should_subtract_scroll_offset() {
        let mut surface = Surface::new(layout());
        assert_eq!(surface.point_at("ab\ncd", 4), Point2D::new(15.0, 23.0));

        surface.scroll = ScrollOffset::new(5.0, 20.0);
        assert_eq!(surface.point_at("ab\ncd", 4), Point2D::new(10.0, 3.0));
        // same inputs, same answer
        assert_eq!(surface.point_at("ab\ncd", 4), surface.point_at("ab\ncd", 4));
    }
}
