//! Keyboard input handling.

use crate::app::{App, AppEvent};
use crate::feed::{ItemKind, KindFilter};
use crate::util::validate_link_for_open;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::request_feed;
use super::Action;

/// Filter selected by a key: `a` for all, `1`-`5` for one kind in filter-bar order.
pub(super) fn filter_for_key(c: char) -> Option<KindFilter> {
    match c {
        'a' => Some(KindFilter::All),
        '1'..='5' => {
            let index = c.to_digit(10)? as usize - 1;
            ItemKind::ALL.get(index).copied().map(KindFilter::Only)
        }
        _ => None,
    }
}

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(Action::Quit),
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('g') | KeyCode::Home => app.nav_first(),
        KeyCode::Char('G') | KeyCode::End => app.nav_last(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_expanded(),
        KeyCode::Tab => {
            if app.next_area() {
                if let Some(area) = app.current_area() {
                    app.set_status(format!("Area: {}", area.name));
                }
                request_feed(app, event_tx, false);
            } else {
                app.set_status("Only one area configured");
            }
        }
        KeyCode::Char('r') => {
            if app.is_loading() {
                app.set_status("Already refreshing");
            } else {
                request_feed(app, event_tx, true);
            }
        }
        KeyCode::Char('o') => open_selected(app),
        KeyCode::Char(c) => {
            if let Some(filter) = filter_for_key(c) {
                app.set_filter(filter);
            }
        }
        _ => {}
    }

    Ok(Action::Continue)
}

/// Opens the selected item's link in the system browser.
fn open_selected(app: &mut App) {
    let Some(link) = app.selected().map(|item| item.link.clone()) else {
        return;
    };

    // Feed links are untrusted: only absolute http(s) URLs reach the browser.
    match validate_link_for_open(&link) {
        Ok(url) => {
            if let Err(e) = open::that(url.as_str()) {
                app.set_status(format!("Failed to open browser: {}", e));
            } else {
                app.set_status("Opening in browser...");
            }
        }
        Err(e) => app.set_status(e.to_string()),
    }
}
