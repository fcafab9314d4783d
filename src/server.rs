//! Request-handler entry point: one run per request.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{error, info};

use crate::runner::Runner;
use crate::schedule::SCRAPE_PATH;

#[derive(Debug, Serialize)]
struct SuccessBody {
    success: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub fn router(runner: Runner) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(SCRAPE_PATH, get(scrape_handler).post(scrape_handler))
        .with_state(runner)
}

pub async fn serve(runner: Runner, bind: &str) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {}", bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on http://{}{}", addr, SCRAPE_PATH);
    axum::serve(listener, router(runner))
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn scrape_handler(
    State(runner): State<Runner>,
) -> Result<Json<SuccessBody>, (StatusCode, Json<ErrorBody>)> {
    // Detached: a dropped connection must not stop the run between the test
    // row's insert and its delete.
    let handle = tokio::spawn(async move { runner.run().await });
    match handle.await {
        Ok(Ok(_)) => Ok(Json(SuccessBody { success: true })),
        Ok(Err(e)) => {
            error!("Scraping failed ({}): {}", e.kind().as_str(), e);
            Err(internal_error(e.to_string()))
        }
        Err(e) => {
            error!("Scrape task failed: {}", e);
            Err(internal_error(format!("scrape task failed: {}", e)))
        }
    }
}

fn internal_error(message: String) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: message }),
    )
}
