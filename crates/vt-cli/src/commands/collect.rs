//! Collect command: downloads raw lock events from the vendor API.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use vt_remote::{Client, CollectOptions, RequestTemplate, parse_device_url};

use super::util::{read_text, write_json};
use crate::Config;

#[derive(Debug, Args)]
pub struct CollectArgs {
    /// URL of the lock's events page on the vendor website.
    pub event_page_url: String,

    /// Number of pages to collect.
    pub pages: u32,

    /// Index of the first page to collect (1-based).
    #[arg(short, long, default_value_t = 1)]
    pub start: u32,

    /// Seconds to wait between requests.
    #[arg(short, long, default_value_t = 1)]
    pub delay: u64,

    /// Captured events request [default: config `request_template`].
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Output file [default: <rundata>/lockdata.json].
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suppress output.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Deserialize)]
struct CookieFile {
    session_cookie: String,
}

pub fn run<W: Write>(writer: &mut W, args: &CollectArgs, config: &Config) -> Result<usize> {
    let options = CollectOptions {
        start: args.start,
        pages: args.pages,
        delay_secs: args.delay,
    };
    options.validate()?;

    let session_cookie = session_cookie(config)?;
    let device = parse_device_url(&args.event_page_url)?;
    let template_path = args.template.as_ref().unwrap_or(&config.request_template);
    let template = RequestTemplate::from_json(&read_text(template_path)?)
        .with_context(|| format!("invalid request template {}", template_path.display()))?;
    tracing::info!(url = %template.url, ?device, "collecting events");

    let client = Client::new(template, session_cookie).context("failed to create API client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.rundata_path("lockdata.json"));

    let mut events = Vec::new();
    let mut next_page = args.start;
    let mut progress_error = None;
    let result = runtime.block_on(client.collect(&device, options, |page| {
        if !args.quiet && progress_error.is_none() {
            let line = writeln!(writer, "Page {}: {}", page.number, page.status)
                .and_then(|()| writer.flush());
            progress_error = line.err();
        }
        next_page = page.number.saturating_add(1);
        events.extend(page.events);
    }));

    if let Err(err) = result {
        if events.is_empty() {
            return Err(err).context("failed to collect events");
        }
        write_json(&output, &events)?;
        return Err(err).context(format!(
            "failed to collect page {next_page}; saved {} events to {}, resume with --start {next_page}",
            events.len(),
            output.display()
        ));
    }
    if let Some(err) = progress_error {
        return Err(err).context("failed to report progress");
    }

    write_json(&output, &events)?;
    Ok(events.len())
}

/// Session cookie from config, falling back to `<rundata>/cookies.json`.
fn session_cookie(config: &Config) -> Result<String> {
    if let Some(cookie) = config.session_cookie.as_deref().filter(|c| !c.trim().is_empty()) {
        return Ok(cookie.to_string());
    }
    let path = config.rundata_path("cookies.json");
    load_cookie_file(&path).with_context(|| {
        format!(
            "no session cookie found; set VT_SESSION_COOKIE or save {{\"session_cookie\": \"...\"}} to {}",
            path.display()
        )
    })
}

fn load_cookie_file(path: &Path) -> Result<String> {
    let file: CookieFile = serde_json::from_str(&read_text(path)?)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(file.session_cookie)
}
