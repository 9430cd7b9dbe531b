//! Server-rendered HTML for the form surface and the API reference.

use crate::features::{FeatureVector, FEATURE_ORDER};

const STYLE: &str = r#"
      body {
        font-family: Arial, sans-serif;
        margin: 0;
        padding: 0;
        display: flex;
        justify-content: center;
        align-items: center;
        min-height: 100vh;
        background-color: #f5f5f5;
      }
      .container {
        background: white;
        padding: 32px;
        border-radius: 12px;
        box-shadow: 0 4px 12px rgba(0,0,0,0.1);
        width: 100%;
        max-width: 500px;
      }
      h2 { text-align: center; margin-bottom: 20px; }
      label { display:block; margin-top: 12px; font-weight: 600; }
      input { width: 100%; padding: 8px; box-sizing: border-box; }
      button {
        margin-top: 20px;
        padding: 10px 16px;
        width: 100%;
        background: #007BFF;
        color: white;
        border: none;
        border-radius: 6px;
        font-size: 16px;
        cursor: pointer;
      }
      button:hover { background: #0056b3; }
      .result { margin-top: 24px; font-size: 18px; font-weight: 700; text-align: center; }
      .error { margin-top: 24px; color: #a40000; }
      .error pre { white-space: pre-wrap; }
      table { border-collapse: collapse; width: 100%; }
      td, th { text-align: left; padding: 4px 8px; border-bottom: 1px solid #ddd; }
      p { text-align: center; margin-top: 16px; }
"#;

/// What to show under the form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    Blank,
    Prediction(f64),
    Error { kind: String, message: String },
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n  <head>\n    <meta charset=\"utf-8\">\n    <title>{title}</title>\n    <style>{STYLE}    </style>\n  </head>\n  <body>\n    <div class=\"container\">\n{body}    </div>\n  </body>\n</html>\n"
    )
}

/// The prediction form. `submitted` holds the raw pairs of a POST so every
/// field can be echoed back exactly as typed.
pub fn render_predict_page(submitted: Option<&[(String, String)]>, outcome: &FormOutcome) -> String {
    let mut inputs = String::new();
    for name in FEATURE_ORDER {
        let value = submitted
            .and_then(|fields| fields.iter().find(|(k, _)| k == name))
            .map(|(_, v)| format!(" value=\"{}\"", escape_html(v)))
            .unwrap_or_default();
        inputs.push_str(&format!(
            "        <label for=\"{name}\">{name}</label>\n        <input type=\"number\" step=\"any\" name=\"{name}\" id=\"{name}\"{value} required>\n        <br/>\n"
        ));
    }

    let outcome_html = match outcome {
        FormOutcome::Blank => String::new(),
        FormOutcome::Prediction(value) => {
            format!("      <div class=\"result\">Prediction: {}</div>\n", value)
        }
        FormOutcome::Error { kind, message } => format!(
            "      <div class=\"error\">\n        <h3>Error</h3>\n        <pre>{}: {}</pre>\n      </div>\n",
            escape_html(kind),
            escape_html(message)
        ),
    };

    let body = format!(
        "      <h2>Predict BPM</h2>\n      <form method=\"post\" action=\"/predict\">\n{inputs}        <button type=\"submit\">Predict</button>\n      </form>\n{outcome_html}      <p><a href=\"/docs\">API Docs</a></p>\n"
    );
    page("BPM Predictor", &body)
}

const ENDPOINTS: [(&str, &str, &str); 7] = [
    ("GET", "/", "Greeting"),
    ("GET", "/health", "Liveness check"),
    ("GET", "/debug", "Feature order and loaded model details"),
    ("GET", "/predict", "HTML prediction form"),
    ("POST", "/predict", "Form-encoded features, HTML result"),
    ("POST", "/predict_json", "JSON features, returns {\"prediction\": number}"),
    ("GET", "/docs", "This page"),
];

pub fn render_docs_page() -> String {
    let rows: String = ENDPOINTS
        .iter()
        .map(|(method, path, what)| {
            format!(
                "        <tr><td>{}</td><td><code>{}</code></td><td>{}</td></tr>\n",
                method,
                path,
                escape_html(what)
            )
        })
        .collect();

    let fields: String = FEATURE_ORDER
        .iter()
        .map(|name| format!("        <li><code>{}</code></li>\n", name))
        .collect();

    let example = serde_json::to_string_pretty(&FeatureVector::example()).unwrap_or_default();

    let body = format!(
        "      <h2>BPM Predictor API</h2>\n      <table>\n        <tr><th>Method</th><th>Path</th><th></th></tr>\n{rows}      </table>\n      <h3>Features</h3>\n      <p>All fields are required numbers, in this order:</p>\n      <ol>\n{fields}      </ol>\n      <h3>Example request</h3>\n      <pre>POST /predict_json\nContent-Type: application/json\n\n{}</pre>\n      <p><a href=\"/predict\">Prediction form</a></p>\n",
        escape_html(&example)
    );
    page("BPM Predictor API", &body)
}
