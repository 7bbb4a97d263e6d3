//! Process-level observability shared by the storefront and admin binaries.
//!
//! - Sentry: WARN/ERROR tracing events become Sentry events, INFO/DEBUG become
//!   breadcrumbs
//! - Logs: JSON on Fly.io (`FLY_APP_NAME` set), human-readable text locally

use std::borrow::Cow;
use std::time::Duration;

use axum::http::{Request, Response};
use sentry::integrations::tracing as sentry_tracing;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, MakeSpan, OnResponse, TraceLayer};
use tracing::{Span, field::Empty};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sentry settings read from each binary's configuration.
#[derive(Debug, Clone)]
pub struct SentrySettings<'a> {
    /// `sentry::release_name!()` of the calling binary
    pub release: Option<Cow<'static, str>>,
    pub dsn: Option<&'a str>,
    pub environment: Option<&'a str>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

/// Initialize Sentry error tracking. Keep the guard alive for the process.
#[must_use]
pub fn init_sentry(settings: SentrySettings<'_>) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.dsn?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: settings.release,
            environment: settings.environment.map(|env| Cow::Owned(env.to_owned())),
            sample_rate: settings.sample_rate,
            traces_sample_rate: settings.traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Map tracing levels to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the global tracing subscriber.
///
/// `default_directives` applies when `RUST_LOG` is not set.
pub fn init_tracing(default_directives: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives.into());

    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

/// Opens the `http_request` span. `request_id` and `user_id` are recorded
/// later by middleware and extractors.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = Empty,
            user_id = Empty,
            status = Empty,
            latency_ms = Empty,
        )
    }
}

/// Records status and latency on the request span.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordResponse;

impl<B> OnResponse<B> for RecordResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        span.record("status", response.status().as_u16());
        span.record(
            "latency_ms",
            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
        );
        DefaultOnResponse::default().on_response(response, latency, span);
    }
}

/// `TraceLayer` used by both binaries.
#[must_use]
pub fn http_trace_layer()
-> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan, DefaultOnRequest, RecordResponse>
{
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_response(RecordResponse)
}
