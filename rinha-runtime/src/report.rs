//! Summary artifacts of a finished run.
use rinha::core::{CheckSummary, Endpoint, Summary};
use serde::Serialize;
use std::fmt::Write;

#[derive(Serialize)]
struct JsonReport<'a> {
    endpoints: &'a Summary,
    checks: &'a CheckSummary,
}

/// Machine-readable summary, printed to stdout at the end of a run.
pub fn render_json(summary: &Summary, checks: &CheckSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        endpoints: summary,
        checks,
    })
}

/// Static HTML page with the per-endpoint latency table.
pub fn render_html(summary: &Summary) -> String {
    let mut rows = String::new();
    for endpoint in Endpoint::ALL {
        let s = summary.get(endpoint);
        // Writing into a String cannot fail.
        let _ = write!(
            rows,
            r#"
      <tr>
        <td>{}</td>
        <td>{:.2}</td>
        <td>{:.2}</td>
        <td>{:.2}</td>
        <td>{:.2}</td>
      </tr>"#,
            endpoint.route(),
            s.avg,
            s.min,
            s.max,
            s.p95,
        );
    }

    format!(
        r#"<html>
  <head>
    <meta charset="utf-8">
    <title>Offline Dashboard Report</title>
    <style>
      body {{ font-family: Arial, sans-serif; margin: 20px; }}
      h1 {{ color: #333; }}
      table {{ width: 600px; border-collapse: collapse; }}
      th, td {{ border: 1px solid #ccc; padding: 8px; text-align: left; }}
      th {{ background-color: #eee; }}
    </style>
  </head>
  <body>
    <h1>Custom Offline Dashboard Report</h1>
    <h2>Metrics Grouped by Endpoint</h2>
    <table>
      <tr>
        <th>Endpoint</th>
        <th>Avg Duration (ms)</th>
        <th>Min Duration (ms)</th>
        <th>Max Duration (ms)</th>
        <th>p(95) (ms)</th>
      </tr>{rows}
    </table>
  </body>
</html>
"#
    )
}
