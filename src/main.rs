//! Answers Scraper — Binary Entrypoint
//! Boots the Axum HTTP server exposing `GET /api/questions`.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    answers_scraper::init_tracing();

    let router = answers_scraper::app()
        .await
        .map_err(shuttle_runtime::Error::Custom)?;

    Ok(router.into())
}
