//! Rendering for every command: a human layout, tab-separated rows, or JSON.
//!
//! The mode comes from `--format` (or the hidden `--json`), then the `FORMAT`
//! environment variable, and finally falls back to pretty on a terminal and
//! text when stdout is piped.

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use tembo_core::ArchiveError;

const RULE: &str = "------------------------------------------------------------------------";
const KEY_WIDTH: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Headed sections with aligned fields.
    Pretty,
    /// One tab-separated row per record.
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputMode {
    fn from_env_value(value: &str) -> Option<Self> {
        Self::from_str(value.trim(), true).ok()
    }
}

fn pick_mode(
    flag: Option<OutputMode>,
    json: bool,
    env: Option<&str>,
    stdout_is_tty: bool,
) -> OutputMode {
    flag.or_else(|| json.then_some(OutputMode::Json))
        .or_else(|| env.and_then(OutputMode::from_env_value))
        .unwrap_or(if stdout_is_tty {
            OutputMode::Pretty
        } else {
            OutputMode::Text
        })
}

pub fn resolve_output_mode(flag: Option<OutputMode>, json: bool) -> OutputMode {
    let env = std::env::var("FORMAT").ok();
    pick_mode(flag, json, env.as_deref(), io::stdout().is_terminal())
}

/// Heading line followed by a full-width rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}\n{RULE}")
}

/// `key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{key}:");
    writeln!(w, "{label:<KEY_WIDTH$} {}", value.as_ref())
}

/// Write `value` to stdout. JSON is derived from `Serialize`; the other two
/// modes use the command's own renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match mode {
        OutputMode::Json => {
            let body = serde_json::to_string_pretty(value)?;
            writeln!(out, "{body}")?;
        }
        OutputMode::Text => text(value, &mut out)?,
        OutputMode::Pretty => pretty(value, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

/// Archive failure as shown to the user.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(rename = "error_code")]
    pub code: &'static str,
    #[serde(rename = "suggestion", skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl From<&ArchiveError> for CliError {
    fn from(err: &ArchiveError) -> Self {
        let code = err.code();
        Self {
            message: err.to_string(),
            code: code.code(),
            hint: code.hint(),
        }
    }
}

fn write_error(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        let body = serde_json::to_string_pretty(&serde_json::json!({ "error": error }))?;
        writeln!(w, "{body}")?;
        return Ok(());
    }
    writeln!(w, "error: {} [{}]", error.message, error.code)?;
    if let Some(hint) = error.hint {
        writeln!(w, "  hint: {hint}")?;
    }
    Ok(())
}

/// Print `err` on stderr and return the error the command exits with.
pub fn fail(mode: OutputMode, err: &ArchiveError) -> anyhow::Error {
    let mut stderr = io::stderr().lock();
    match write_error(&mut stderr, mode, &CliError::from(err)) {
        Ok(()) => anyhow::anyhow!("{}", err.code()),
        Err(write_err) => write_err,
    }
}
