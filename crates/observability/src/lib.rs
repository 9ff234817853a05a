//! Tracing/logging setup shared by every binary.

/// Initialize process-wide observability (tracing/logging).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::Json);
}

/// Plain-text variant for local development.
pub fn init_dev() {
    tracing::init(tracing::LogFormat::Text);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
