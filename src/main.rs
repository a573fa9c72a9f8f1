mod app;
mod config;
mod i18n;
mod model;
mod services;
mod theme;
mod ui;
mod widgets;

use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() -> Result<()> {
    // The terminal belongs to the UI, so logs only go to a file when asked for.
    let Ok(path) = std::env::var("FIELD_NEW_LOG") else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {path}"))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn main() -> Result<()> {
    init_tracing()?;
    let cfg = config::load_config()?;
    let page = std::env::args()
        .nth(1)
        .or_else(|| cfg.page.clone())
        .ok_or_else(|| anyhow!("usage: field-new <page-url | entity=NAME[&type=TYPE]>"))?;
    let page = config::PageParams::parse(&page)?;
    tracing::info!(entity = %page.entity, base_url = %cfg.base_url, "field-new starting");
    ui::run(cfg, page)
}
