//! HTTP middleware components.

pub mod logging;
pub mod metrics;
pub mod rate_limit;
pub mod trace_id;

pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use rate_limit::{analyze_rate_limit_middleware, rate_limit_middleware, ClientRateLimiter};
pub use trace_id::{trace_id, TraceId, TRACE_ID_HEADER};
