//! Availability and status reporting.
//!
//! Both entry points are best-effort: engine failures make the server look
//! unavailable or cut the report short, they never reach the caller.

use std::fmt;

use chrono::{DateTime, Utc};

use searchbridge_core::{AccessMode, Index, Metrics, Result, ServerAuth};

use crate::backend::{SERVER_INFO_ERROR, TypesenseBackend};

/// Shown in place of a creation date for an index without a collection.
pub const NOT_CREATED: &str = "Collection not yet created. Add one or more fields to the index \
     and configure the Typesense Schema processor to create the collection.";

/// Shown in place of a zero document count.
pub const NO_DOCUMENTS: &str = "no documents have been indexed";

/// Date format of collection creation times.
const CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

const BYTE_UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

// ============================================================================
// Report model
// ============================================================================

/// Severity attached to a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Healthy.
    Ok,
    /// Unhealthy.
    Error,
}

/// Value of a status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusInfo {
    /// Nothing to show.
    Empty,
    /// A single value.
    Text(String),
    /// A bulleted list.
    List(Vec<String>),
}

/// One labeled line of the status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Label.
    pub label: String,
    /// Value.
    pub info: StatusInfo,
    /// Optional severity.
    pub status: Option<StatusLevel>,
}

impl StatusEntry {
    fn text(label: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            info: StatusInfo::Text(info.into()),
            status: None,
        }
    }
}

/// Ordered status lines; `degraded` when an engine call failed part way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// Lines in display order.
    pub entries: Vec<StatusEntry>,
    /// Whether probing stopped early.
    pub degraded: bool,
}

impl StatusReport {
    /// Find a line by label.
    pub fn entry(&self, label: &str) -> Option<&StatusEntry> {
        self.entries.iter().find(|e| e.label == label)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let marker = match entry.status {
                Some(StatusLevel::Ok) => " [ok]",
                Some(StatusLevel::Error) => " [error]",
                None => "",
            };
            match &entry.info {
                StatusInfo::Empty => writeln!(f, "{}:{marker}", entry.label)?,
                StatusInfo::Text(text) => writeln!(f, "{}: {text}{marker}", entry.label)?,
                StatusInfo::List(items) => {
                    writeln!(f, "{}:{marker}", entry.label)?;
                    for item in items {
                        writeln!(f, "  - {item}")?;
                    }
                }
            }
        }
        if self.degraded {
            writeln!(f, "(report incomplete: {SERVER_INFO_ERROR})")?;
        }
        Ok(())
    }
}

// ============================================================================
// Backend hooks
// ============================================================================

impl TypesenseBackend {
    /// Whether the server reports an operational state. Never fails.
    pub async fn is_available(&self) -> bool {
        let Some(read) = self.credentials(AccessMode::ReadOnly) else {
            return false;
        };
        match self.engine().retrieve_debug(&read).await {
            Ok(debug) => debug.state != 0,
            Err(e) => {
                log::debug!("Typesense unavailable: {e}");
                false
            }
        }
    }

    /// Per-index collection details followed by server health, version and metrics.
    pub async fn view_settings(&self, indexes: &[Index]) -> StatusReport {
        let mut report = StatusReport::default();

        let Some(read) = self.credentials(AccessMode::ReadOnly) else {
            log::warn!("Typesense credentials incomplete, no status available");
            report.degraded = true;
            return report;
        };

        if let Err(e) = self.collect_entries(&read, indexes, &mut report.entries).await {
            log::error!("{e}");
            self.notifier().error(SERVER_INFO_ERROR);
            report.degraded = true;
        }

        report
    }

    async fn collect_entries(
        &self,
        read: &ServerAuth,
        indexes: &[Index],
        entries: &mut Vec<StatusEntry>,
    ) -> Result<()> {
        for (i, index) in indexes.iter().enumerate() {
            let num = i + 1;
            let name = index.collection_name();
            let collection = self.engine().retrieve_collection(read, &name).await?;

            entries.push(StatusEntry::text(
                format!("Typesense collection {num}: name"),
                name,
            ));

            let (created, documents) = match collection {
                Some(live) => (
                    StatusInfo::Text(format_timestamp(live.created_at)),
                    StatusInfo::Text(if live.num_documents > 0 {
                        format_count(live.num_documents)
                    } else {
                        NO_DOCUMENTS.to_string()
                    }),
                ),
                None => (StatusInfo::Text(NOT_CREATED.to_string()), StatusInfo::Empty),
            };

            entries.push(StatusEntry {
                label: format!("Typesense collection {num}: created"),
                info: created,
                status: None,
            });
            entries.push(StatusEntry {
                label: format!("Typesense collection {num}: documents"),
                info: documents,
                status: None,
            });
        }

        let health = self.engine().retrieve_health(read).await?;
        entries.push(StatusEntry {
            label: "Typesense server health".to_string(),
            info: StatusInfo::Text(if health.ok { "OK" } else { "Down or unavailable" }.to_string()),
            status: Some(if health.ok {
                StatusLevel::Ok
            } else {
                StatusLevel::Error
            }),
        });

        let debug = self.engine().retrieve_debug(read).await?;
        entries.push(StatusEntry::text("Typesense server version", debug.version));

        let metrics = self.engine().retrieve_metrics(read).await?;
        entries.push(StatusEntry {
            label: "Typesense server metrics".to_string(),
            info: format_metrics(&metrics),
            status: None,
        });

        Ok(())
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Render metrics as `Label: value` lines, or `Unavailable` when there are none.
pub fn format_metrics(metrics: &Metrics) -> StatusInfo {
    if metrics.is_empty() {
        return StatusInfo::Text("Unavailable".to_string());
    }
    StatusInfo::List(
        metrics
            .iter()
            .map(|(name, value)| format_metric(name, *value))
            .collect(),
    )
}

/// `system_memory_used_bytes` = 2048 becomes `System memory used bytes: 2 KB`.
pub fn format_metric(name: &str, value: f64) -> String {
    let label = capitalize_first(&name.replace('_', " "));

    let mut rendered = format_number(value);
    if name.contains("percentage") {
        rendered.push('%');
    }
    if name.contains("bytes") {
        rendered = format_bytes(value);
    }

    format!("{label}: {rendered}")
}

/// Human-readable size in 1024 steps, at most two decimals.
pub fn format_bytes(bytes: f64) -> String {
    if bytes.abs() < 1024.0 {
        return if bytes == 1.0 {
            "1 byte".to_string()
        } else {
            format!("{} bytes", format_number(bytes))
        };
    }

    let mut size = bytes / 1024.0;
    let mut unit = 0;
    while round2(size).abs() >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{} {}", format_number(size), BYTE_UNITS[unit])
}

/// Thousands-separated integer, e.g. `1,234,567`.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Unix seconds as `YYYY-MM-DDTHH:MM:SS+0000`.
pub fn format_timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.format(CREATED_FORMAT).to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Up to two decimals, trailing zeros dropped.
fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", round2(value));
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================
