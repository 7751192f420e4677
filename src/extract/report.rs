//! Self-contained HTML report of the dose-response plot grid.

use crate::utils::create_parent_dir;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use indoc::formatdoc;
use log::warn;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Converted plots, cell line -> (compound -> PNG path).
pub type PlotGrid = BTreeMap<String, BTreeMap<String, PathBuf>>;

/// Background of cell lines without a color.
pub const DEFAULT_CELL_COLOR: &str = "#FFFFFF";

const STYLE: &str = "\
        body { font-family: Arial, sans-serif; margin: 20px; background: #fff; }
        h1 { color: #333; text-align: center; margin-bottom: 5px; }
        h2 { color: #666; text-align: center; font-weight: normal; margin-top: 0; }
        table { border-collapse: collapse; margin: 20px auto; background: white; }
        th, td { border: 1px solid #ccc; padding: 5px; text-align: center; vertical-align: middle; }
        th { background-color: #2E7D32; color: white; font-size: 11px; padding: 8px 5px; max-width: 120px; }
        th .compound-id { font-weight: bold; display: block; }
        th .compound-name { font-weight: normal; font-size: 10px; display: block; margin-top: 2px; }
        th.cell-line-header { background-color: #1565C0; min-width: 80px; }
        td.cell-line { font-weight: bold; font-size: 12px; }
        td img { width: 160px; height: auto; display: block; }
        .caption { text-align: center; color: #666; font-size: 12px; margin-top: 10px; }";

/// Escape text for HTML content and attribute values.
///
/// ## Examples
///
/// ```rust
/// use ccsp::extract::report::escape_html;
///
/// assert_eq!(escape_html("<b>A&B</b>"), "&lt;b&gt;A&amp;B&lt;/b&gt;");
/// assert_eq!(escape_html("\"x\"'"), "&quot;x&quot;&#39;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Read an image as a base64 data URI, or `None` if it can't be read.
pub fn image_data_uri(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(format!("data:image/png;base64,{}", STANDARD.encode(bytes))),
        Err(e) => {
            warn!("Could not read plot {path:?}: {e}");
            None
        }
    }
}

/// Render the plot grid as an HTML page.
///
/// Cell lines are rows (alphabetical) and compounds are columns, in the given order.
/// Missing plots are shown as `-`.
pub fn render_html(
    grid: &PlotGrid,
    compounds: &[String],
    compound_names: &BTreeMap<String, String>,
    cell_colors: &BTreeMap<String, String>,
) -> String {
    let headers = compounds
        .iter()
        .map(|compound| {
            let id = format!(r#"<span class="compound-id">{}</span>"#, escape_html(compound));
            match compound_names.get(compound).filter(|name| !name.is_empty()) {
                Some(name) => format!(
                    r#"            <th>{id}<span class="compound-name">{}</span></th>"#,
                    escape_html(name)
                ),
                None => format!("            <th>{id}</th>"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let rows = grid
        .iter()
        .map(|(cell_line, plots)| {
            let color = cell_colors.get(cell_line).map(String::as_str).unwrap_or(DEFAULT_CELL_COLOR);
            let mut row = vec![
                "        <tr>".to_string(),
                format!(
                    r#"            <td class="cell-line" style="background-color: {};">{}</td>"#,
                    escape_html(color),
                    escape_html(cell_line)
                ),
            ];
            for compound in compounds {
                let cell = plots.get(compound).and_then(|path| image_data_uri(path));
                row.push(match cell {
                    Some(uri) => format!(
                        r#"            <td><img src="{uri}" alt="{}"></td>"#,
                        escape_html(&format!("{compound}_{cell_line}"))
                    ),
                    None => "            <td>-</td>".to_string(),
                });
            }
            row.push("        </tr>".to_string());
            row.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let caption = format!(
        "{} test compounds × {} cell lines (% Inhibition plots only)",
        compounds.len(),
        grid.len()
    );

    formatdoc!(
        r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>IC50 Plots - % Inhibition</title>
            <style>
        {STYLE}
            </style>
        </head>
        <body>
            <h1>IC50 Dose-Response Curves (% Inhibition)</h1>
            <h2>CCSP Screening Data</h2>
            <table>
                <tr>
                    <th class="cell-line-header">Cell Line</th>
        {headers}
                </tr>
        {rows}
            </table>
            <p class="caption">{caption}</p>
        </body>
        </html>
        "#
    )
}

/// Render the plot grid and write it to an HTML file.
pub fn write_html<P>(
    path: &P,
    grid: &PlotGrid,
    compounds: &[String],
    compound_names: &BTreeMap<String, String>,
    cell_colors: &BTreeMap<String, String>,
) -> Result<(), Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    create_parent_dir(path)?;
    let html = render_html(grid, compounds, compound_names, cell_colors);
    std::fs::write(path, html).wrap_err_with(|| eyre!("Failed to write report: {path:?}"))?;
    Ok(())
}
