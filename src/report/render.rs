//! Report rendering
//!
//! Text output lists only releases correlated with a milestone; the JSON
//! output carries every release candidate.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::types::RepositoryReport;

/// Reports ordered by repository name
fn by_name(reports: &[RepositoryReport]) -> Vec<&RepositoryReport> {
    let mut sorted: Vec<&RepositoryReport> = reports.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

/// Write the human-readable report
pub fn render_text<W: Write>(reports: &[RepositoryReport], out: &mut W) -> Result<()> {
    writeln!(out, "Found {} repositories", reports.len())?;

    for report in by_name(reports) {
        for release in report.matched_releases() {
            writeln!(
                out,
                "New {} release: {} ({})",
                report.name,
                release.name,
                release.created_at.format("%Y-%m-%d")
            )?;
            if let Some(url) = release.milestone_url() {
                writeln!(out, "Release Notes: {url}")?;
            }
            if let Some(url) = &release.download_url {
                writeln!(out, "Download: {url}")?;
            }
            writeln!(out)?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonRelease<'a> {
    name: &'a str,
    created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone_state: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_url: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonRepository<'a> {
    repository: &'a str,
    releases: Vec<JsonRelease<'a>>,
}

/// Write the structured report as pretty-printed JSON
pub fn render_json<W: Write>(reports: &[RepositoryReport], out: &mut W) -> Result<()> {
    let document: Vec<JsonRepository<'_>> = by_name(reports)
        .into_iter()
        .map(|report| JsonRepository {
            repository: &report.name,
            releases: report
                .releases
                .iter()
                .map(|release| JsonRelease {
                    name: &release.name,
                    created_at: release.created_at.to_rfc3339(),
                    milestone_url: release.milestone_url(),
                    milestone_state: release.milestone_state(),
                    download_url: release.download_url.as_deref(),
                })
                .collect(),
        })
        .collect();

    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)?;
    Ok(())
}
