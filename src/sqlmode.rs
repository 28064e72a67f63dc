//! Session SQL-mode management and the version comparison that gates it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::SqlClient;
use crate::error::StewardError;
use crate::sanitize::quote;

/// What to do with the listed modes relative to the current session mode set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlModeAction {
    /// Append modes not already present.
    Add,
    /// Drop the listed modes if present.
    Remove,
    /// Replace the session mode set entirely.
    Set,
}

/// One declarative SQL-mode adjustment, optionally gated on a minimum server
/// version. On older servers the directive is skipped, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlModeDirective {
    pub action: SqlModeAction,
    pub modes: Vec<String>,
    #[serde(default)]
    pub min_version: Option<String>,
}

/// Compare two server version strings segment by segment.
///
/// Build metadata after the first `-`, `+`, or `~` is ignored, so
/// `10.6.12-MariaDB-log` compares as `10.6.12`. Missing segments count as
/// zero: `8.0` equals `8.0.0`.
#[must_use]
pub fn version_compare(left: &str, right: &str) -> Ordering {
    fn segments(version: &str) -> Vec<u64> {
        let core = version
            .split(['-', '+', '~'])
            .next()
            .unwrap_or_default();
        core.split('.')
            .map(|seg| seg.trim().parse::<u64>().unwrap_or(0))
            .collect()
    }

    let a = segments(left);
    let b = segments(right);
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

/// Compose the next session mode string from the current one.
///
/// Mode names compare case-insensitively; the canonical uppercase spelling of
/// the requested modes is what gets written.
#[must_use]
pub fn compose_sql_mode(current: &str, action: SqlModeAction, modes: &[String]) -> String {
    let mut parts: Vec<String> = current
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();

    match action {
        SqlModeAction::Set => {
            parts = modes.iter().map(|m| m.to_ascii_uppercase()).collect();
        }
        SqlModeAction::Add => {
            for mode in modes {
                if !parts.iter().any(|p| p.eq_ignore_ascii_case(mode)) {
                    parts.push(mode.to_ascii_uppercase());
                }
            }
        }
        SqlModeAction::Remove => {
            parts.retain(|part| !modes.iter().any(|m| m.eq_ignore_ascii_case(part)));
        }
    }
    parts.join(",")
}

/// Read the current session SQL mode.
pub(crate) async fn read_sql_mode<C: SqlClient + ?Sized>(
    client: &mut C,
) -> Result<String, StewardError> {
    let result = client.query("SELECT @@SESSION.sql_mode", &[]).await?;
    Ok(result
        .scalar()
        .and_then(|value| value.as_text())
        .unwrap_or_default()
        .to_string())
}

/// Apply one directive against a live client. Returns whether a statement was
/// issued; a version-gated directive on an older server is a clean no-op.
pub(crate) async fn apply_directive<C: SqlClient + ?Sized>(
    client: &mut C,
    server_version: &str,
    directive: &SqlModeDirective,
) -> Result<bool, StewardError> {
    if let Some(min) = &directive.min_version
        && version_compare(server_version, min) == Ordering::Less
    {
        debug!(
            server_version,
            min_version = %min,
            "skipping sql_mode directive, server too old"
        );
        return Ok(false);
    }

    let next = match directive.action {
        SqlModeAction::Set => compose_sql_mode("", SqlModeAction::Set, &directive.modes),
        action => {
            let current = read_sql_mode(client).await?;
            compose_sql_mode(&current, action, &directive.modes)
        }
    };
    client
        .execute(&format!("SET SESSION sql_mode = {}", quote(&next, false)), &[])
        .await?;
    Ok(true)
}
