//! Background feed loading shared by the event loop and input handlers.

use crate::app::{App, AppEvent};
use crate::feed::load_feed;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs `future`, turning a panic into `Err(message)`.
///
/// A panicking spawned task would otherwise vanish and leave its area
/// marked pending forever.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

/// Loads the selected area's feed in the background if [`App::begin_load`]
/// allows it. The result arrives as [`AppEvent::FeedLoaded`].
pub(super) fn request_feed(app: &mut App, event_tx: &mpsc::Sender<AppEvent>, force: bool) {
    let Some(query) = app.begin_load(force) else {
        return;
    };

    let client = app.http_client.clone();
    let settings = Arc::clone(&app.fetch_settings);
    let extractor = Arc::clone(&app.extractor);
    let tx = event_tx.clone();
    let area_id = query.area_id;

    tracing::debug!(area_id, force, "Spawning feed load");

    tokio::spawn(async move {
        let outcome = catch_task_panic(async {
            load_feed(&client, &settings, &query, &extractor)
                .await
                .map_err(|e| e.to_string())
        })
        .await;

        let event = match outcome {
            Ok(result) => AppEvent::FeedLoaded { area_id, result },
            Err(panic_msg) => {
                tracing::error!(task = "feed_load", area_id, error = %panic_msg, "Background task panicked");
                // Still report the area so it leaves the pending set.
                let _ = tx
                    .send(AppEvent::TaskPanicked {
                        task: "feed_load",
                        error: panic_msg.clone(),
                    })
                    .await;
                AppEvent::FeedLoaded {
                    area_id,
                    result: Err(format!("Internal error: {panic_msg}")),
                }
            }
        };

        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, event = "FeedLoaded", "Channel send failed (receiver dropped)");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_ok() {
        let result = catch_task_panic(async { 42 }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_catch_task_panic_message() {
        let result: Result<(), String> = catch_task_panic(async { panic!("boom") }).await;
        assert_eq!(result, Err("boom".to_string()));
    }
}
