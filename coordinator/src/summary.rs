//! Summary image rendering.
//!
//! After each committed refresh the coordinator hands a [`SummarySnapshot`]
//! to a [`SummaryRenderer`]. The production renderer writes an SVG card to
//! disk; the API serves that file back as-is.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use countrycache_common::{format_iso, now, Timestamp};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Content type of the rendered summary.
pub const SUMMARY_CONTENT_TYPE: &str = "image/svg+xml";

/// Number of countries listed on the summary.
pub const SUMMARY_TOP_N: u32 = 5;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 600;

/// Errors raised while rendering.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One line of the top list.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub name: String,
    pub estimated_gdp: Option<f64>,
}

/// Cache state captured right after a commit.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarySnapshot {
    pub total_countries: u64,
    pub last_refreshed_at: Timestamp,
    pub top: Vec<SummaryEntry>,
}

/// Renders the post-refresh summary.
#[async_trait]
pub trait SummaryRenderer: Send + Sync {
    /// Render and publish `snapshot`, replacing any previous summary.
    async fn render(&self, snapshot: &SummarySnapshot) -> Result<(), SummaryError>;
}

/// Writes the summary as an SVG file.
#[derive(Debug, Clone)]
pub struct SvgSummaryRenderer {
    path: PathBuf,
}

impl SvgSummaryRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // Sibling file so the final rename stays on one filesystem.
    fn staging_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "summary.svg".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()))
    }
}

#[async_trait]
impl SummaryRenderer for SvgSummaryRenderer {
    #[instrument(skip(self, snapshot), fields(path = %self.path.display()))]
    async fn render(&self, snapshot: &SummarySnapshot) -> Result<(), SummaryError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }

        let svg = render_svg(snapshot, now());
        let staging = self.staging_path();
        fs::write(&staging, svg.as_bytes()).await?;
        if let Err(err) = fs::rename(&staging, &self.path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }

        debug!(bytes = svg.len(), "Summary image written");
        Ok(())
    }
}

/// Build the SVG document for a snapshot.
pub fn render_svg(snapshot: &SummarySnapshot, generated_at: Timestamp) -> String {
    let mut svg = String::with_capacity(2048);

    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    let _ = writeln!(svg, r##"  <rect width="100%" height="100%" fill="#ffffff"/>"##);
    let _ = writeln!(svg, r##"  <g fill="#222222" font-family="sans-serif">"##);
    let _ = writeln!(
        svg,
        r#"    <text x="40" y="64" font-size="36" font-weight="bold">Country Cache Summary</text>"#
    );
    let _ = writeln!(
        svg,
        r#"    <text x="40" y="110" font-size="20">Last refresh: {}</text>"#,
        format_iso(&snapshot.last_refreshed_at)
    );
    let _ = writeln!(
        svg,
        r#"    <text x="40" y="140" font-size="20">Total countries: {}</text>"#,
        snapshot.total_countries
    );
    let _ = writeln!(
        svg,
        r#"    <text x="40" y="190" font-size="24">Top {SUMMARY_TOP_N} Countries by estimated_gdp</text>"#
    );

    for (idx, entry) in snapshot.top.iter().enumerate() {
        let gdp = entry
            .estimated_gdp
            .map(group_thousands)
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(
            svg,
            r#"    <text x="60" y="{}" font-size="18">{}. {} - {}</text>"#,
            230 + idx * 34,
            idx + 1,
            escape_xml(&entry.name),
            gdp
        );
    }

    let _ = writeln!(
        svg,
        r#"    <text x="40" y="{}" font-size="14">Generated at {}</text>"#,
        HEIGHT - 30,
        format_iso(&generated_at)
    );
    svg.push_str("  </g>\n</svg>\n");
    svg
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Group digits in threes, keeping at most three fraction digits.
fn group_thousands(value: f64) -> String {
    let formatted = format!("{:.3}", value.abs());
    let (int_part, frac_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    if value < 0.0 {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn snapshot() -> SummarySnapshot {
        SummarySnapshot {
            total_countries: 250,
            last_refreshed_at: DateTime::from_timestamp_millis(1_729_339_200_123).unwrap(),
            top: vec![
                SummaryEntry {
                    name: "Wakanda".to_string(),
                    estimated_gdp: Some(150_000_000.0),
                },
                SummaryEntry {
                    name: "Trinidad & Tobago".to_string(),
                    estimated_gdp: Some(1234.5),
                },
            ],
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(150_000_000.0), "150,000,000");
        assert_eq!(group_thousands(1234567.891), "1,234,567.891");
        assert_eq!(group_thousands(1234.5), "1,234.5");
    }

    #[test]
    fn test_svg_contents() {
        let svg = render_svg(&snapshot(), snapshot().last_refreshed_at);

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Country Cache Summary"));
        assert!(svg.contains("Last refresh: 2024-10-19T12:00:00.123Z"));
        assert!(svg.contains("Total countries: 250"));
        assert!(svg.contains("1. Wakanda - 150,000,000"));
        assert!(svg.contains("2. Trinidad &amp; Tobago - 1,234.5"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[tokio::test]
    async fn test_render_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("summary.svg");
        let renderer = SvgSummaryRenderer::new(&path);

        renderer.render(&snapshot()).await.unwrap();
        let mut second = snapshot();
        second.total_countries = 3;
        renderer.render(&second).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Total countries: 3"));
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn test_render_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let renderer = SvgSummaryRenderer::new(blocker.join("summary.svg"));

        let result = renderer.render(&snapshot()).await;

        assert!(matches!(result, Err(SummaryError::Io(_))));
    }
}
