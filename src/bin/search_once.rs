//! One-shot search: runs the pipeline for a term and prints the questions as JSON.
//!
//! Usage: `search_once [term]` (reads the same config/env as the server).

use anyhow::Context;
use answers_scraper::{AppConfig, QueryService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    answers_scraper::init_tracing();

    let term = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let cfg = AppConfig::load_default()?;
    let service = QueryService::from_config(&cfg).context("building feed client")?;

    let questions = service
        .search(&term)
        .await
        .with_context(|| format!("searching for {term:?}"))?;

    println!("{}", serde_json::to_string_pretty(&questions)?);
    eprintln!("search-once done: {} question(s)", questions.len());
    Ok(())
}
