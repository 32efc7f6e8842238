//! Auth command: logs in to the vendor web app and saves the session cookie.

use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;

use vt_remote::{Authenticator, Credentials, RequestTemplate};

use super::util::{read_text, write_json};
use crate::Config;

#[derive(Debug, Args)]
pub struct AuthArgs {
    /// Account email [default: config `email`, else prompted].
    #[arg(short, long)]
    pub email: Option<String>,

    /// Output file [default: <rundata>/cookies.json].
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// The file `vt collect` reads the session cookie from.
#[derive(Debug, Serialize)]
struct CookieFile<'a> {
    session_cookie: &'a str,
}

pub fn run<W: Write>(writer: &mut W, args: &AuthArgs, config: &Config) -> Result<PathBuf> {
    let preauth = load_template(&config.preauth_template)?;
    let auth = load_template(&config.auth_template)?;
    let credentials = credentials(args, config)?;
    tracing::info!(email = %credentials.email, url = %auth.url, "logging in");

    let authenticator = Authenticator::new().context("failed to create API client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let session_cookie = runtime
        .block_on(authenticator.login(&preauth, &auth, &credentials))
        .context("login failed")?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.rundata_path("cookies.json"));
    write_json(
        &output,
        &CookieFile {
            session_cookie: &session_cookie,
        },
    )?;
    writeln!(
        writer,
        "Success! Saved the session cookie to {}. You can now run `vt collect`.",
        output.display()
    )?;
    Ok(output)
}

fn load_template(path: &Path) -> Result<RequestTemplate> {
    RequestTemplate::from_json(&read_text(path)?)
        .with_context(|| format!("invalid request template {}", path.display()))
}

/// Email from the flag or config, password from config (`VT_PASSWORD`);
/// whatever is missing is prompted for.
fn credentials(args: &AuthArgs, config: &Config) -> Result<Credentials> {
    let email = match args.email.clone().or_else(|| config.email.clone()) {
        Some(email) => email,
        None => prompt_line("Email: ")?,
    };
    let password = match config.password.clone() {
        Some(password) => password,
        None => prompt_password()?,
    };

    if email.trim().is_empty() {
        bail!("email must not be empty");
    }
    if password.is_empty() {
        bail!("password must not be empty");
    }
    Ok(Credentials {
        email: email.trim().to_string(),
        password,
    })
}

fn prompt_line(prompt: &str) -> Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt}")?;
    stderr.flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn prompt_password() -> Result<String> {
    if io::stdin().is_terminal() {
        return rpassword::prompt_password("Password: ").context("failed to read password");
    }
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read password from stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
