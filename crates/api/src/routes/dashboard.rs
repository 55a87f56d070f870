//! Dashboard endpoints: a one-off summary and a live event stream.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use domain::models::DashboardSummary;
use domain::services::AggregationView;
use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_dashboard_stream_opened;

/// SSE event carrying a full [`DashboardSummary`].
pub const SNAPSHOT_EVENT: &str = "snapshot";

/// SSE event sent once when the feed stops; no further events follow.
pub const STOPPED_EVENT: &str = "stopped";

/// Current aggregation.
///
/// GET /dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let mut view = AggregationView::subscribe(state.gateway.store().as_ref()).await?;
    Ok(Json(view.current()))
}

/// Live aggregation: the current summary, then one per change.
///
/// GET /dashboard/stream
pub async fn stream_dashboard(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let mut view = AggregationView::subscribe(state.gateway.store().as_ref()).await?;
    let initial = view.current();
    debug!(confirmations = initial.total(), "Dashboard stream opened");
    record_dashboard_stream_opened();

    let updates = stream::unfold(view, |mut view| async move {
        view.next().await.map(|summary| (summary, view))
    });

    let events = stream::once(async move { initial })
        .chain(updates)
        .map(|summary| Ok::<_, Infallible>(snapshot_event(&summary)))
        .chain(stream::once(async {
            Ok::<_, Infallible>(
                Event::default()
                    .event(STOPPED_EVENT)
                    .data("Dashboard stopped loading"),
            )
        }));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn snapshot_event(summary: &DashboardSummary) -> Event {
    match Event::default().event(SNAPSHOT_EVENT).json_data(summary) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Failed to serialize dashboard summary");
            Event::default().event(SNAPSHOT_EVENT).comment("serialization failed")
        }
    }
}
