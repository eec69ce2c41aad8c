//! Render functions for the TUI.

use crate::app::App;
use crate::util::strip_control_chars;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{filter_bar, header, items, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 50;
pub(super) const MIN_HEIGHT: u16 = 12;

const HEADER_HEIGHT: u16 = 4;

/// Main render function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // At truly minimal dimensions nothing meaningful fits
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    // An error with a snapshot still on screen gets a one-line banner.
    let banner_height = u16::from(app.error.is_some() && app.snapshot.is_some());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(1),
            Constraint::Length(banner_height),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    header::render(f, app, chunks[0]);
    filter_bar::render(f, app, chunks[1]);
    if let Some(error) = &app.error {
        if banner_height > 0 {
            let text = format!("Refresh failed: {}", strip_control_chars(error));
            f.render_widget(
                Paragraph::new(text).style(Style::default().fg(Color::Red)),
                chunks[2],
            );
        }
    }

    if app.snapshot.is_some() {
        items::render(f, app, chunks[3]);
    } else if let Some(error) = app.error.clone() {
        render_error(f, &error, chunks[3]);
    } else {
        render_loading(f, chunks[3]);
    }

    status::render(f, app, chunks[4]);
}

/// Shown when the first load for an area fails.
fn render_error(f: &mut Frame, message: &str, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "Unable to load feed",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(strip_control_chars(message).into_owned()),
        Line::default(),
        Line::from("Press r to try again."),
        Line::from(Span::styled(
            "If the problem persists, check your internet connection or try again later.",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn render_loading(f: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new("Loading feed...")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}
