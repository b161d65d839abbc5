//! Request correlation and tracing bootstrap.
//!
//! Every HTTP request is tagged with a correlation id held in task-local
//! storage, so the error layer can stamp responses without threading the id
//! through every call signature. `init_tracing` wires the global subscriber
//! once per process and bridges legacy `log::` macros into it.

use std::sync::OnceLock;

use log::LevelFilter;
use thiserror::Error;
use tokio::task_local;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    registry,
    util::{SubscriberInitExt, TryInitError},
};
use uuid::Uuid;

use crate::config::AppConfig;

/// Correlation id scoped to one request.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

impl TraceContext {
    /// Mint a fresh correlation id.
    pub fn generate() -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string(),
        }
    }
}

task_local! {
    static CURRENT_TRACE: TraceContext;
}

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("failed to install log bridge: {0}")]
    LogBridge(#[from] log::SetLoggerError),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

static INSTALLED: OnceLock<()> = OnceLock::new();

fn fmt_layer<S>(format: &str) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    match format {
        "pretty" => fmt::layer().pretty().boxed(),
        _ => fmt::layer().json().boxed(),
    }
}

/// Install the global tracing pipeline. Safe to call more than once; only the
/// first call in a process takes effect.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if INSTALLED.set(()).is_err() {
        return Ok(());
    }

    // Bridge first so `log::` macros emitted during startup are not lost.
    // A bridge installed by an embedding test harness is not an error.
    if LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init()
        .is_err()
    {
        tracing::debug!("log bridge already installed, keeping existing logger");
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    registry()
        .with(filter)
        .with(fmt_layer(&config.log_format))
        .try_init()?;

    Ok(())
}

/// Run `future` with `context` visible through [`current_trace_id`].
pub async fn with_trace_context<Fut, R>(context: TraceContext, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    CURRENT_TRACE.scope(context, future).await
}

/// Correlation id of the running request, if inside one.
pub fn current_trace_id() -> Option<String> {
    CURRENT_TRACE.try_with(|ctx| ctx.trace_id.clone()).ok()
}
