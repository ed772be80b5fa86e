use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub list_area: Rect,
    pub detail_area: Rect,
    pub input_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions required for the application
    /// Height: list (3) + input box (3) + status (1)
    pub const MIN_WIDTH: u16 = 40;
    pub const MIN_HEIGHT: u16 = 8;

    /// Detail pane is dropped below this inner width
    const SPLIT_MIN_WIDTH: u16 = 70;

    pub fn calculate(size: Rect) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        // Content, input box (borders + one line), status line
        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(inner_area);

        let detail_percent = if inner_area.width >= Self::SPLIT_MIN_WIDTH { 40 } else { 0 };
        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(100 - detail_percent),
                Constraint::Percentage(detail_percent),
            ])
            .split(vertical[0]);

        Self {
            inner_area,
            list_area: horizontal[0],
            detail_area: horizontal[1],
            input_area: vertical[1],
            status_area: vertical[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_terminal_gets_detail_pane() {
        let layout = Layout::calculate(Rect::new(0, 0, 120, 30));
        assert!(layout.detail_area.width > 0);
        assert_eq!(layout.status_area.height, 1);
        assert_eq!(layout.input_area.height, 3);
        assert_eq!(layout.list_area.width + layout.detail_area.width, layout.inner_area.width);
    }

    #[test]
    fn narrow_terminal_shows_list_only() {
        let layout = Layout::calculate(Rect::new(0, 0, 50, 20));
        assert_eq!(layout.detail_area.width, 0);
        assert_eq!(layout.list_area.width, layout.inner_area.width);
    }
}
