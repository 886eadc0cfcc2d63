//! Run artifacts: diff images, JSON and HTML reports, and the console summary.

use anyhow::Context as _;
use convergence::{FinalReport, IterationSummary, RunStatus};
use log::{info, warn};
use std::fs::{self, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const RULE: &str = "======================================================================";

pub fn reference_file_name(component: &str) -> String {
    format!("{component}-reference.png")
}

pub fn candidate_file_name(component: &str, iteration: u32) -> String {
    format!("{component}-storybook-iter{iteration}.png")
}

pub fn diff_file_name(component: &str, iteration: u32) -> String {
    format!("{component}-diff-iter{iteration}.png")
}

/// Best-effort write of a diagnostic image.
pub fn save_snapshot(path: &Path, bytes: &[u8]) {
    match fs::write(path, bytes) {
        Ok(()) => info!("saved {}", path.display()),
        Err(err) => warn!("could not save {}: {err}", path.display()),
    }
}

/// Files produced by [`ReportWriter::write`].
#[derive(Clone, Debug, Default)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub html: PathBuf,
    pub diffs: Vec<PathBuf>,
}

/// Writes reports for finished runs into one directory.
#[derive(Clone, Debug)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write diff PNGs, `{component}-report.json` and `{component}-report.html`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or any file cannot be written.
    pub fn write(&self, report: &FinalReport) -> anyhow::Result<ReportPaths> {
        create_dir_all(&self.output_dir)
            .with_context(|| format!("creating {}", self.output_dir.display()))?;

        let mut diffs = Vec::with_capacity(report.iterations.len());
        for iteration in &report.iterations {
            let path = self
                .output_dir
                .join(diff_file_name(&report.component, iteration.index));
            let png = iteration
                .diff_raster
                .encode_png()
                .with_context(|| format!("encoding diff for iteration {}", iteration.index))?;
            fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
            diffs.push(path);
        }

        let json = self
            .output_dir
            .join(format!("{}-report.json", report.component));
        let body = serde_json::to_vec_pretty(report)?;
        fs::write(&json, body).with_context(|| format!("writing {}", json.display()))?;

        let html = self
            .output_dir
            .join(format!("{}-report.html", report.component));
        fs::write(&html, render_html(report))
            .with_context(|| format!("writing {}", html.display()))?;

        info!("report written to {}", html.display());
        Ok(ReportPaths { json, html, diffs })
    }
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Pending => "Pending",
        RunStatus::Running => "Running",
        RunStatus::Converged => "Converged",
        RunStatus::Exhausted => "Exhausted",
        RunStatus::Aborted => "Aborted",
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn percent(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_owned(), |value| format!("{:.2}%", value * 100.0))
}

/// Self-contained HTML page for `report`; images are linked by file name
/// relative to the report.
pub fn render_html(report: &FinalReport) -> String {
    let component = escape_html(&report.component);
    let class = if report.converged() { "pass" } else { "fail" };
    let header = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Visual Parity Report: {component}</title>
  <style>
    body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 0; padding: 20px; background: #f5f5f5; }}
    .header {{ background: white; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
    .summary {{ display: flex; gap: 20px; margin-top: 20px; }}
    .stat {{ flex: 1; padding: 15px; background: #f9f9f9; border-radius: 4px; }}
    .stat-value {{ font-size: 28px; font-weight: bold; }}
    .stat-label {{ color: #666; font-size: 14px; }}
    .pass {{ color: #22c55e; }}
    .fail {{ color: #ef4444; }}
    .result-card {{ background: white; border-radius: 8px; padding: 15px; margin-bottom: 20px; }}
    .result-images {{ display: grid; grid-template-columns: repeat(3, 1fr); gap: 10px; }}
    .result-image img {{ width: 100%; border: 1px solid #ddd; }}
    .image-label {{ text-align: center; font-size: 12px; color: #666; }}
    code {{ background: #f0f0f0; padding: 2px 4px; border-radius: 3px; }}
  </style>
</head>
<body>
  <div class="header">
    <h1>Visual Parity Report: {component}</h1>
    <p>Design <code>{design}</code>: {reason}</p>
    <div class="summary">
      <div class="stat"><div class="stat-value {class}">{status}</div><div class="stat-label">Status</div></div>
      <div class="stat"><div class="stat-value">{final_diff}</div><div class="stat-label">Final difference</div></div>
      <div class="stat"><div class="stat-value">{run} / {cap}</div><div class="stat-label">Iterations</div></div>
      <div class="stat"><div class="stat-value">{threshold}</div><div class="stat-label">Threshold</div></div>
    </div>
  </div>
"#,
        design = escape_html(&report.design),
        reason = escape_html(&report.reason),
        status = status_label(report.status),
        final_diff = percent(report.final_diff_ratio),
        run = report.iterations_run,
        cap = report.iteration_cap,
        threshold = percent(Some(report.match_threshold)),
    );

    let cards: String = report
        .iterations
        .iter()
        .map(|iteration| render_iteration(&report.component, iteration))
        .collect();

    format!("{header}{cards}</body>\n</html>\n")
}

fn render_iteration(component: &str, iteration: &IterationSummary) -> String {
    let class = if iteration.matched { "pass" } else { "fail" };
    let size_note = if iteration.reference_size == iteration.candidate_size {
        String::new()
    } else {
        format!(
            " (reference {}x{}, candidate {}x{}, compared {}x{})",
            iteration.reference_size.width,
            iteration.reference_size.height,
            iteration.candidate_size.width,
            iteration.candidate_size.height,
            iteration.overlap_width,
            iteration.overlap_height
        )
    };
    let card = format!(
        r#"  <div class="result-card">
    <h2>Iteration {index} <span class="{class}">{diff}</span>{size_note}</h2>
    <div class="result-images">
      <div class="result-image"><img src="{reference}" alt="Reference"><div class="image-label">Reference</div></div>
      <div class="result-image"><img src="{candidate}" alt="Candidate"><div class="image-label">Candidate</div></div>
      <div class="result-image"><img src="{diff_image}" alt="Difference"><div class="image-label">Difference</div></div>
    </div>
"#,
        index = iteration.index,
        diff = percent(Some(iteration.diff_ratio)),
        reference = escape_html(&reference_file_name(component)),
        candidate = escape_html(&candidate_file_name(component, iteration.index)),
        diff_image = escape_html(&diff_file_name(component, iteration.index)),
    );
    if iteration.corrections_applied.is_empty() {
        return format!("{card}  </div>\n");
    }
    let items: String = iteration
        .corrections_applied
        .iter()
        .map(|correction| {
            format!(
                "      <li><code>{}: {}</code> {}</li>\n",
                escape_html(&correction.property_name),
                escape_html(&correction.property_value),
                escape_html(&correction.rationale)
            )
        })
        .collect();
    format!("{card}    <ul>\n{items}    </ul>\n  </div>\n")
}

/// Plain-text outcome for the console.
///
/// # Errors
///
/// Propagates write failures on `out`.
pub fn write_summary<W: Write>(
    out: &mut W,
    report: &FinalReport,
    paths: Option<&ReportPaths>,
) -> io::Result<()> {
    writeln!(out, "\n{RULE}")?;
    match report.status {
        RunStatus::Converged => writeln!(
            out,
            "Validation complete: {} matches design {}",
            report.component, report.design
        )?,
        RunStatus::Exhausted => writeln!(
            out,
            "Validation incomplete after {} iterations; manual review recommended",
            report.iterations_run
        )?,
        _ => writeln!(out, "Validation aborted: {}", report.reason)?,
    }
    writeln!(out, "   Final difference: {}", percent(report.final_diff_ratio))?;
    writeln!(
        out,
        "   Iterations: {} / {}",
        report.iterations_run, report.iteration_cap
    )?;
    for iteration in &report.iterations {
        writeln!(
            out,
            "   #{}: {} ({} corrections)",
            iteration.index,
            percent(Some(iteration.diff_ratio)),
            iteration.corrections_applied.len()
        )?;
    }
    writeln!(out, "{RULE}")?;
    if let Some(paths) = paths {
        writeln!(out, "Report: {}", paths.html.display())?;
    }
    Ok(())
}
