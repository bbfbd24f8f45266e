//! Observability setup for Bisarx: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
