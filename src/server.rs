use std::{convert::Infallible, path::Path};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use futures_util::stream::{self, Stream, StreamExt};
use log::info;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::scanner::Scanner;

#[derive(Clone)]
pub struct AppState {
    scanner: Scanner,
}

/// Build the application: `/api` endpoints plus static files from `static_dir`.
pub fn router(scanner: Scanner, static_dir: impl AsRef<Path>) -> Router {
    let api = Router::new()
        .route("/scanProgress", get(scan_progress))
        .route("/scanData", get(scan_data))
        .with_state(AppState { scanner });

    let static_svc = ServeDir::new(static_dir.as_ref()).append_index_html_on_directories(true);

    Router::new()
        .nest("/api", api)
        .fallback_service(static_svc)
        .layer(CorsLayer::permissive())
}

pub async fn serve(bind: &str, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("Server running at http://{}", bind);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Event stream: a greeting, then everything the hub publishes until the client goes away.
async fn scan_progress(
    State(app): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (greeting, subscription) = app.scanner.connect_progress().await;

    let greeting = stream::once(async move { Ok(Event::default().data(greeting)) });
    // The subscription lives inside the stream; dropping the stream on disconnect unsubscribes.
    let updates = stream::unfold(subscription, |mut sub| async move {
        let json = sub.recv().await?;
        Some((Ok(Event::default().data(json)), sub))
    });

    Sse::new(greeting.chain(updates)).keep_alive(KeepAlive::default())
}

async fn scan_data(State(app): State<AppState>) -> Response {
    match app.scanner.finished().await {
        Some(snapshot) => (StatusCode::OK, Json(snapshot.payload(None))).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
