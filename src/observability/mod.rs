//! Observability infrastructure.
//!
//! Provides structured tracing output in text or JSON form.

pub mod tracing;
