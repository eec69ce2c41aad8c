use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub(super) const SPINNER_FRAMES: usize = SPINNER.len();

const KEY_HINTS: &str = "[j/k]move [Enter]expand [a,1-5]filter [Tab]area [r]efresh [o]pen [q]uit";

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // Status bar needs at least 1 char width to be meaningful
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if app.is_loading() {
        let frame = SPINNER[app.spinner_frame % SPINNER_FRAMES];
        Cow::Owned(format!("{} Refreshing feed...", frame))
    } else if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        Cow::Borrowed(KEY_HINTS)
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
