//! HTML rendering for the single-page form.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::data::domain;
use crate::inference::{PatientForm, Posterior};
use crate::training::RiskModel;

/// Outcome of the last submission, if any.
pub enum Outcome<'a> {
    Blank,
    Success(&'a Posterior),
    Failure(&'a str),
}

const STYLE: &str = "body{font-family:sans-serif;margin:0;display:flex}\
aside{background:#f0f2f6;padding:1.5rem;min-width:14rem;min-height:100vh}\
main{max-width:46rem;margin:0 auto;padding:2rem}\
label{display:block;margin-top:.8rem}select{width:100%;padding:.3rem}\
button{margin-top:1.2rem;padding:.5rem 1rem}\
.ok{background:#dff5e1;padding:.8rem;margin-top:1rem}\
.err{background:#fde2e1;padding:.8rem;margin-top:1rem}\
table{border-collapse:collapse;margin-top:.5rem}td,th{border:1px solid #ccc;padding:.3rem .8rem}";

/// Render the full page: sidebar with model info, the form, and the outcome.
pub fn render(model: &RiskModel, form: &PatientForm, outcome: Outcome<'_>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!doctype html><html lang=\"fr\"><head><meta charset=\"utf-8\">");
    html.push_str("<title>🫀 Risque Cardiaque</title>");
    let _ = write!(html, "<style>{STYLE}</style></head><body>");

    let _ = write!(
        html,
        "<aside><h2>ℹ️ Modèle</h2><p><strong>Accuracy (ensemble de test)</strong> : <code>{:.2}%</code></p>\
         <p><small>{} · {} lignes d'entraînement · {}</small></p></aside>",
        model.accuracy() * 100.0,
        text(model.id.as_str()),
        model.lineage.n_train,
        text(&model.config.estimator.to_string()),
    );

    html.push_str("<main><h1>🫀 Prédiction du Risque Cardiaque avec un Réseau Bayésien</h1>");
    html.push_str("<form method=\"post\" action=\"/predict\"><h3>🧾 Informations du patient</h3>");
    for spec in domain::risk_factors() {
        let selected = form.label(spec.name);
        let _ = write!(
            html,
            "<label>{}<select name=\"{}\">",
            text(spec.prompt),
            attr(spec.name)
        );
        for option in spec.options {
            let mark = if selected == Some(*option) { " selected" } else { "" };
            let _ = write!(
                html,
                "<option value=\"{}\"{mark}>{}</option>",
                attr(option),
                text(option)
            );
        }
        html.push_str("</select></label>");
    }
    html.push_str("<button type=\"submit\">🧠 Prédire le Risque</button></form>");

    match outcome {
        Outcome::Blank => {}
        Outcome::Success(posterior) => {
            html.push_str("<div class=\"ok\">✅ Inférence réalisée avec succès</div>");
            html.push_str("<h3>📊 Probabilité de Risque Cardiaque</h3>");
            let _ = write!(
                html,
                "<table><tr><th>{}</th><th>p</th></tr>",
                text(&posterior.variable)
            );
            for row in &posterior.rounded(4).rows {
                let _ = write!(
                    html,
                    "<tr><td>{} ({})</td><td>{:.4}</td></tr>",
                    text(&row.state),
                    row.code,
                    row.probability
                );
            }
            html.push_str("</table>");
        }
        Outcome::Failure(message) => {
            let _ = write!(html, "<div class=\"err\">⚠️ {}</div>", text(message));
        }
    }

    html.push_str("</main></body></html>");
    html
}
