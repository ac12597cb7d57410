/*
 * Responsibility
 * - tokio runtime startup
 * - app::run() call (no logic here)
 */
use anyhow::Result;

mod app;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
