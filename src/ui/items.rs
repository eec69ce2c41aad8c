use crate::app::App;
use crate::feed::{FeedItem, ItemKind};
use crate::util::{strip_control_chars, truncate_to_width, wrap_lines};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

const YOUTUBE_EMBED_PREFIX: &str = "https://www.youtube.com/embed/";

/// Formats a publish time relative to `now`: `Nm ago`, `Nh ago`, `Nd ago`,
/// then `Mon D` from a week out.
pub fn format_relative_time(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(published) = published else {
        return String::new();
    };

    let diff = (now - published).num_seconds();

    // Future dates (clock skew)
    if diff < 0 {
        return "0m ago".to_string();
    }
    if diff < 3600 {
        return format!("{}m ago", diff / 60);
    }
    if diff < 86400 {
        return format!("{}h ago", diff / 3600);
    }
    if diff < 604800 {
        return format!("{}d ago", diff / 86400);
    }
    format_short_date(published)
}

/// `Oct 3` style date.
pub fn format_short_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d").to_string()
}

pub(super) fn kind_color(kind: ItemKind) -> Color {
    match kind {
        ItemKind::Comment => Color::Green,
        ItemKind::Photo => Color::Yellow,
        ItemKind::Route => Color::LightBlue,
        ItemKind::Area => Color::Magenta,
        ItemKind::Update => Color::Gray,
    }
}

/// Location line: `Lower Gorge › Tan & Handsome 5.10b`.
///
/// Only items with a target route carry one.
fn location_line(item: &FeedItem) -> Option<String> {
    let target = item.target_route.as_ref()?;
    let mut parts: Vec<&str> = item.location_path.iter().map(|c| c.name.as_str()).collect();
    parts.push(&target.name);
    let mut line = parts.join(" › ");
    if let Some(grade) = &item.grade {
        line.push(' ');
        line.push_str(grade);
    }
    Some(line)
}

/// Lines for one item at `width` columns.
pub(super) fn item_lines(
    item: &FeedItem,
    expanded: bool,
    collapsed_lines: usize,
    width: usize,
    now: DateTime<Utc>,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let dim = Style::default().fg(Color::DarkGray);

    // Header: kind label and relative time
    let mut header = vec![Span::styled(
        item.kind.label().to_string(),
        Style::default()
            .fg(kind_color(item.kind))
            .add_modifier(Modifier::BOLD),
    )];
    let time = format_relative_time(item.published_at, now);
    if !time.is_empty() {
        header.push(Span::styled(format!("  {}", time), dim));
    }
    lines.push(Line::from(header));

    if let Some(location) = location_line(item) {
        let location = strip_control_chars(&location);
        lines.push(Line::from(Span::styled(
            truncate_to_width(&location, width).into_owned(),
            Style::default().fg(Color::Cyan),
        )));
    }

    let title = strip_control_chars(item.display_title());
    for line in wrap_lines(&title, width) {
        lines.push(Line::from(Span::styled(
            line,
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }

    if item.kind == ItemKind::Photo {
        if let Some(image) = &item.image_url {
            let image = strip_control_chars(image);
            lines.push(Line::from(Span::styled(
                truncate_to_width(&format!("Image: {}", image), width).into_owned(),
                dim,
            )));
        }
    }

    let description = strip_control_chars(&item.clean_description);
    let wrapped = wrap_lines(&description, width);
    if expanded || wrapped.len() <= collapsed_lines {
        let truncatable = wrapped.len() > collapsed_lines;
        lines.extend(wrapped.into_iter().map(Line::from));
        if truncatable {
            lines.push(Line::from(Span::styled("▴ show less", dim)));
        }
    } else {
        lines.extend(wrapped.into_iter().take(collapsed_lines).map(Line::from));
        lines.push(Line::from(Span::styled("▾ show more", dim)));
    }

    for id in &item.video_ids {
        lines.push(Line::from(Span::styled(
            format!("Video: {}{}", YOUTUBE_EMBED_PREFIX, id),
            Style::default().fg(Color::Red),
        )));
    }

    if let Some(shared_by) = &item.shared_by {
        let shared_by = strip_control_chars(shared_by);
        lines.push(Line::from(Span::styled(
            truncate_to_width(&format!("Shared by {}", shared_by), width).into_owned(),
            dim,
        )));
    }

    lines.push(Line::default());
    lines
}

/// Render the item list
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    // Borders plus the highlight symbol
    let width = area.width.saturating_sub(4) as usize;
    let now = Utc::now();

    let items: Vec<ListItem> = app
        .visible_items()
        .into_iter()
        .map(|item| {
            let lines = item_lines(
                item,
                app.is_expanded(item),
                app.collapsed_lines,
                width,
                now,
            );
            ListItem::new(lines)
        })
        .collect();

    let title = match app.current_area() {
        Some(area) => format!("Activity - {}", strip_control_chars(&area.name)),
        None => "Activity".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if items.is_empty() {
        let message = if app.total_items() == 0 {
            "No activity in this feed"
        } else {
            "No items match this filter"
        };
        f.render_widget(List::new(vec![ListItem::new(message)]).block(block), area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Rgb(40, 40, 48)))
        .highlight_symbol("▌ ");

    let mut state = ListState::default()
        .with_offset(app.list_offset)
        .with_selected(Some(app.selected_item));
    f.render_stateful_widget(list, area, &mut state);
    app.list_offset = state.offset();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Breadcrumb, CrumbKind};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 14, 12, 0, 0).unwrap()
    }

    fn crumb(name: &str, kind: CrumbKind) -> Breadcrumb {
        Breadcrumb {
            name: name.to_string(),
            url: format!("https://www.mountainproject.com/x/{}", name.len()),
            kind,
            grade: None,
        }
    }

    fn item() -> FeedItem {
        FeedItem {
            id: "1".to_string(),
            raw_title: "raw".to_string(),
            raw_description_html: String::new(),
            link: String::new(),
            clean_title: "Great finish".to_string(),
            published_at: Some(now() - Duration::minutes(5)),
            kind: ItemKind::Comment,
            image_url: None,
            grade: Some("5.10b".to_string()),
            shared_by: Some("Jane Doe".to_string()),
            breadcrumbs: Vec::new(),
            target_route: Some(crumb("Tan & Handsome", CrumbKind::Route)),
            location_path: vec![crumb("Lower Gorge", CrumbKind::Area)],
            area_id: None,
            area_name: None,
            clean_description: "one two three four five six".to_string(),
            video_ids: vec!["dQw4w9WgXcQ".to_string()],
        }
    }

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = now();
        assert_eq!(format_relative_time(None, now), "");
        assert_eq!(format_relative_time(Some(now - Duration::seconds(30)), now), "0m ago");
        assert_eq!(format_relative_time(Some(now - Duration::minutes(59)), now), "59m ago");
        assert_eq!(format_relative_time(Some(now - Duration::hours(5)), now), "5h ago");
        assert_eq!(format_relative_time(Some(now - Duration::days(6)), now), "6d ago");
        assert_eq!(format_relative_time(Some(now - Duration::days(11)), now), "Oct 3");
        assert_eq!(format_relative_time(Some(now + Duration::hours(1)), now), "0m ago");
    }

    #[test]
    fn test_item_lines_collapsed() {
        let lines = item_lines(&item(), false, 1, 10, now());
        assert_eq!(
            text(&lines),
            vec![
                "Comment  5m ago",
                "Lower Gor…",
                "Great",
                "finish",
                "one two",
                "▾ show more",
                "Video: https://www.youtube.com/embed/dQw4w9WgXcQ",
                "Shared by…",
                "",
            ]
        );
    }

    #[test]
    fn test_item_lines_expanded() {
        let lines = item_lines(&item(), true, 1, 40, now());
        let text = text(&lines);
        assert_eq!(text[1], "Lower Gorge › Tan & Handsome 5.10b");
        assert!(text.contains(&"one two three four five six".to_string()));
        assert!(!text.iter().any(|l| l.contains("show")));
    }

    #[test]
    fn test_no_location_without_target_route() {
        let mut item = item();
        item.target_route = None;
        let lines = item_lines(&item, false, 3, 40, now());
        assert!(!text(&lines).iter().any(|l| l.contains("Lower Gorge")));
    }

    #[test]
    fn test_control_chars_stripped() {
        let mut item = item();
        item.clean_title = "Evil\x1b[31m title".to_string();
        let lines = item_lines(&item, false, 3, 40, now());
        assert!(text(&lines).contains(&"Evil title".to_string()));
    }
}
