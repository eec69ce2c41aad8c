//! Background task event handling.

use crate::app::{App, AppEvent};

/// Applies a background event to the application state.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::FeedLoaded { area_id, result } => {
            let failed = result.is_err();
            app.apply_loaded(area_id, result);
            if failed && area_id == app.current_area_id() && app.snapshot.is_some() {
                app.set_status("Refresh failed, showing previous feed");
            }
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.set_status(format!("Internal error in {task}"));
        }
    }
}
