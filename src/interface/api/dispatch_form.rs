//! Operator form for dispatching outbound calls

use super::state::{AppState, FormDefaults};
use crate::domain::dispatch::{DispatchError, DispatchRequest};
use crate::domain::DomainError;
use crate::infrastructure::call_metrics;
use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    Form,
};
use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchForm {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub transfer_to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BannerKind {
    Info,
    Success,
    Warning,
    Error,
}

impl BannerKind {
    fn class(self) -> &'static str {
        match self {
            BannerKind::Info => "info",
            BannerKind::Success => "success",
            BannerKind::Warning => "warning",
            BannerKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
struct Banner {
    kind: BannerKind,
    message: String,
    details: Vec<(&'static str, String)>,
}

impl Banner {
    fn new(kind: BannerKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Attach command output. Empty output is not shown.
    fn with_detail(mut self, label: &'static str, text: &str) -> Self {
        if !text.trim().is_empty() {
            self.details.push((label, text.to_string()));
        }
        self
    }
}

/// `GET /`
pub async fn show_form(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.form_defaults, &[]))
}

/// `POST /dispatch`
pub async fn submit_dispatch(
    State(state): State<AppState>,
    Form(form): Form<DispatchForm>,
) -> (StatusCode, Html<String>) {
    let values = FormDefaults {
        phone_number: form.phone_number.clone(),
        transfer_to: form.transfer_to.clone(),
    };

    let request = match DispatchRequest::from_form(&form.phone_number, &form.transfer_to) {
        Ok(request) => request,
        Err(e) => {
            warn!("rejected dispatch form: {}", e);
            let banner = Banner::new(BannerKind::Error, validation_message(e));
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_page(&values, &[banner])),
            );
        }
    };

    let mut banners = vec![Banner::new(
        BannerKind::Info,
        format!("Dispatching call to {}...", request.phone_number()),
    )];
    info!("dispatching call to {}", request.phone_number());

    match state.dispatcher.dispatch(&request).await {
        Ok(receipt) => {
            call_metrics::record_dispatch(true);
            banners.push(
                Banner::new(BannerKind::Success, "Call dispatched successfully!")
                    .with_detail("Output", &receipt.stdout),
            );
            if !receipt.stderr.trim().is_empty() {
                banners.push(
                    Banner::new(BannerKind::Warning, "Dispatch reported warnings")
                        .with_detail("Warnings", &receipt.stderr),
                );
            }
        }
        Err(e) => {
            call_metrics::record_dispatch(false);
            error!("dispatch failed: {}", e);
            banners.push(failure_banner(e, &state.dispatcher.program()));
        }
    }

    (StatusCode::OK, Html(render_page(&values, &banners)))
}

fn validation_message(e: DomainError) -> String {
    let DomainError::ValidationError(message) = e;
    message
}

fn failure_banner(e: DispatchError, program: &str) -> Banner {
    match e {
        DispatchError::CommandFailed { stdout, stderr, .. } => {
            Banner::new(BannerKind::Error, "Failed to dispatch call")
                .with_detail("Error output", &stderr)
                .with_detail("Output", &stdout)
        }
        DispatchError::NotFound(_) => Banner::new(
            BannerKind::Error,
            format!(
                "Dispatch CLI ({}) not found. Please ensure it's installed and in your system's PATH.",
                program
            ),
        ),
        other => Banner::new(
            BannerKind::Error,
            format!("An unexpected error occurred: {}", other),
        ),
    }
}

fn render_banner(banner: &Banner) -> String {
    let details = banner
        .details
        .iter()
        .map(|(label, text)| {
            format!(
                r#"<div class="detail"><span class="label">{label}</span><pre>{text}</pre></div>"#,
                label = label,
                text = html_escape(text),
            )
        })
        .collect::<String>();

    format!(
        r#"<div class="banner {class}"><p>{message}</p>{details}</div>"#,
        class = banner.kind.class(),
        message = html_escape(&banner.message),
        details = details,
    )
}

fn render_page(values: &FormDefaults, banners: &[Banner]) -> String {
    let banners = banners.iter().map(render_banner).collect::<String>();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Outbound Caller</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 640px; margin: 2rem auto; padding: 0 1rem; }}
label {{ display: block; margin-top: 1rem; font-weight: 600; }}
input {{ width: 100%; padding: 0.5rem; font-size: 1rem; }}
button {{ margin-top: 1.5rem; padding: 0.6rem 1.2rem; font-size: 1rem; }}
.banner {{ margin-top: 1rem; border-radius: 6px; padding: 0.5rem 1rem; }}
.info {{ background: #e0f2fe; }}
.success {{ background: #dcfce7; }}
.warning {{ background: #fef9c3; }}
.error {{ background: #fee2e2; }}
.label {{ font-weight: 600; font-size: 0.8rem; }}
pre {{ white-space: pre-wrap; }}
</style>
</head>
<body>
<h1>Outbound Caller</h1>
<form method="post" action="/dispatch">
<label for="phone_number">Phone Number to Call</label>
<input id="phone_number" name="phone_number" value="{phone_number}">
<label for="transfer_to">Transfer To (Human Agent)</label>
<input id="transfer_to" name="transfer_to" value="{transfer_to}">
<button type="submit">Dispatch Call</button>
</form>
{banners}
</body>
</html>"#,
        phone_number = html_escape(&values.phone_number),
        transfer_to = html_escape(&values.transfer_to),
        banners = banners,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
