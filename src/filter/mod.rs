//! Request/response filter chain.
//!
//! # Data Flow
//! ```text
//! execute(request)
//!     → filter[0] (first registered, outermost)
//!         → filter[1]
//!             → ... → core executor (transport send)
//!         ← filter[1]
//!     ← filter[0] (sees the final response last)
//! ```
//!
//! # Design Decisions
//! - Filters are held as an ordered slice, not as nested closures
//! - `with` copies the slice, so the receiver never changes
//! - A filter may short-circuit by not calling `next`
//! - WebSocket upgrades do not pass through filters

pub mod request_id;
pub mod trace;
pub mod user_agent;

use std::sync::Arc;

use crate::client::executor::Executor;
use crate::error::ClientResult;
use crate::http::{Request, Response};

pub use request_id::AddRequestId;
pub use trace::TraceExchange;
pub use user_agent::AddUserAgent;

/// A middleware stage around request execution.
pub trait Filter: Send + Sync + 'static {
    /// Handle `request`, delegating to the rest of the chain through `next`.
    fn filter(&self, request: Request, next: Next<'_>) -> ClientResult<Response>;
}

/// The remainder of a filter chain.
pub struct Next<'a> {
    filters: &'a [Arc<dyn Filter>],
    core: &'a dyn Executor,
}

impl<'a> Next<'a> {
    pub(crate) fn new(filters: &'a [Arc<dyn Filter>], core: &'a dyn Executor) -> Self {
        Self { filters, core }
    }

    /// Run the rest of the chain.
    pub fn run(self, request: Request) -> ClientResult<Response> {
        match self.filters.split_first() {
            Some((filter, rest)) => filter.filter(request, Next::new(rest, self.core)),
            None => self.core.execute(request),
        }
    }
}

/// A filter built from a closure. See [`filter_fn`].
#[derive(Clone)]
pub struct FnFilter<F> {
    f: F,
}

/// Build a filter from a closure.
///
/// ```
/// use switchyard::filter::filter_fn;
///
/// let tag = filter_fn(|request, next| {
///     let request = request.with_header("x-tag", "1")?;
///     next.run(request)
/// });
/// # let _ = tag;
/// ```
pub fn filter_fn<F>(f: F) -> FnFilter<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> ClientResult<Response> + Send + Sync + 'static,
{
    FnFilter { f }
}

impl<F> Filter for FnFilter<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> ClientResult<Response> + Send + Sync + 'static,
{
    fn filter(&self, request: Request, next: Next<'_>) -> ClientResult<Response> {
        (self.f)(request, next)
    }
}
