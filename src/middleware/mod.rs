//! HTTP middleware chain.
//!
//! Applied outermost first:
//! - [`instrument`]: one server span per request
//! - [`trace_id`]: `X-Trace-ID` response header
//! - [`access_log`]: one structured log line and metric sample per request

pub mod access_log;
pub mod instrument;
pub mod trace_id;

pub use access_log::{access_log, LogContext};
pub use instrument::{RecordStatus, RequestSpan};
pub use trace_id::{propagate_trace_id, TRACE_ID_HEADER};
