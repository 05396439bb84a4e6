//! Observability utilities: subscriber setup, span timing and event payloads.

mod spans;

pub use spans::{init_tracing, try_init_tracing, SpanTimer, StageSpanAttributes};
