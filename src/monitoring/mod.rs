/*!
 * Monitoring
 * Structured logging setup and trace helpers
 */

pub mod tracer;

pub use tracer::{init_tracing, span_network_wait, WaitSpan};
