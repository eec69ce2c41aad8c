use crate::app::App;
use crate::util::strip_control_chars;
use chrono::{DateTime, Local, TimeZone};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::fmt;

use super::items::format_short_date;

const HEADER_TITLE: &str = "Latest Updates";

/// `Tue, Oct 14, 6:00 PM` style timestamp.
pub fn format_updated<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    date.format("%a, %b %-d, %-I:%M %p").to_string()
}

/// Summary line: item count, date range and channel build time.
fn meta_line(app: &App) -> String {
    let Some(snapshot) = &app.snapshot else {
        return if app.is_loading() {
            "Loading feed...".to_string()
        } else {
            String::new()
        };
    };

    let mut parts = Vec::new();
    if !snapshot.items.is_empty() {
        parts.push(format!("{} items", snapshot.items.len()));
    }
    if let Some(range) = snapshot.date_range() {
        parts.push(format!(
            "{} – {}",
            format_short_date(range.oldest),
            format_short_date(range.newest)
        ));
    }
    if let Some(updated) = snapshot.channel.last_build_date {
        parts.push(format!(
            "Updated {}",
            format_updated(&updated.with_timezone(&Local))
        ));
    }
    parts.join(" · ")
}

/// Render the header
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let mut title_spans = vec![Span::styled(
        HEADER_TITLE,
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(current) = app.current_area() {
        title_spans.push(Span::raw("  "));
        title_spans.push(Span::styled(
            format!(" {} ", strip_control_chars(&current.name)),
            Style::default().bg(Color::Green).fg(Color::Black),
        ));
    }

    let channel = app
        .snapshot
        .as_ref()
        .map(|s| strip_control_chars(&s.channel.title).into_owned())
        .unwrap_or_default();

    let lines = vec![
        Line::from(title_spans),
        Line::from(Span::styled(meta_line(app), Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(channel),
    );
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::feed::{ChannelMetadata, FeedItem, FeedSnapshot, ItemKind};
    use chrono::Utc;

    #[test]
    fn test_format_updated() {
        let date = Utc.with_ymd_and_hms(2025, 10, 14, 18, 0, 0).unwrap();
        assert_eq!(format_updated(&date), "Tue, Oct 14, 6:00 PM");
    }

    fn item(id: &str, day: u32) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            raw_title: String::new(),
            raw_description_html: String::new(),
            link: String::new(),
            clean_title: String::new(),
            published_at: Utc.with_ymd_and_hms(2025, 10, day, 9, 0, 0).single(),
            kind: ItemKind::Comment,
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
    fn test_meta_line_count_and_range() {
        let mut app = App::new(&Config::default()).unwrap();
        assert_eq!(meta_line(&app), "");

        app.begin_load(false);
        assert_eq!(meta_line(&app), "Loading feed...");

        app.apply_loaded(
            app.current_area_id(),
            Ok(FeedSnapshot {
                channel: ChannelMetadata::default(),
                items: vec![item("a", 14), item("b", 3)],
            }),
        );
        assert_eq!(meta_line(&app), "2 items · Oct 3 – Oct 14");
    }
}
