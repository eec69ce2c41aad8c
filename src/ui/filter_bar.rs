use crate::app::App;
use crate::feed::{ItemKind, KindFilter};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::items::kind_color;

/// One filter-bar entry: key hint, label, count, enabled.
pub(super) struct FilterEntry {
    pub key: char,
    pub filter: KindFilter,
    pub label: &'static str,
    pub count: usize,
    pub enabled: bool,
}

pub(super) fn filter_entries(app: &App) -> Vec<FilterEntry> {
    let counts = app.counts();
    let mut entries = vec![FilterEntry {
        key: 'a',
        filter: KindFilter::All,
        label: "All",
        count: app.total_items(),
        enabled: true,
    }];
    for (i, kind) in ItemKind::ALL.iter().enumerate() {
        let count = counts.get(kind).copied().unwrap_or(0);
        entries.push(FilterEntry {
            key: char::from(b'1' + i as u8),
            filter: KindFilter::Only(*kind),
            label: kind.plural(),
            count,
            enabled: count > 0,
        });
    }
    entries
}

/// Render the filter bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let mut spans = Vec::new();
    for entry in filter_entries(app) {
        let active = entry.filter == app.filter;
        let color = match entry.filter {
            KindFilter::All => Color::White,
            KindFilter::Only(kind) => kind_color(kind),
        };
        let style = if active {
            Style::default()
                .bg(color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else if entry.enabled {
            Style::default().fg(color)
        } else {
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT)
        };

        spans.push(Span::styled(
            format!(" [{}] {} {} ", entry.key, entry.label, entry.count),
            style,
        ));
        spans.push(Span::raw(" "));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::feed::{ChannelMetadata, FeedItem, FeedSnapshot};

    fn item(id: &str, kind: ItemKind) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            raw_title: String::new(),
            raw_description_html: String::new(),
            link: String::new(),
            clean_title: String::new(),
            published_at: None,
            kind,
            image_url: None,
            grade: None,
            shared_by: None,
            breadcrumbs: Vec::new(),
            target_route: None,
            location_path: Vec::new(),
            area_id: None,
            area_name: None,
            clean_description: String::new(),
            video_ids: Vec::new(),
        }
    }

    #[test]
    fn test_entries_disable_empty_kinds() {
        let mut app = App::new(&Config::default()).unwrap();
        app.begin_load(false);
        app.apply_loaded(
            app.current_area_id(),
            Ok(FeedSnapshot {
                channel: ChannelMetadata::default(),
                items: vec![item("a", ItemKind::Photo), item("b", ItemKind::Photo)],
            }),
        );

        let entries = filter_entries(&app);
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0].count, 2);
        assert!(entries[0].enabled);

        let photos = &entries[2];
        assert_eq!(photos.key, '2');
        assert_eq!(photos.label, "Photos");
        assert_eq!(photos.count, 2);
        assert!(photos.enabled);

        assert!(!entries[1].enabled);
        assert!(!entries[3].enabled);
    }
}
