use crate::http::error::HttpError;
use crate::http::middleware::{Middleware, Next};
use crate::http::request::RequestContext;
use crate::http::response::Response;
use std::time::Instant;
use tracing::info;

/// Emits one event per routed request with its outcome and latency.
pub struct AccessLogMw;

impl Middleware for AccessLogMw {
    fn handle(&self, ctx: &mut RequestContext, next: Next) -> Result<Response, HttpError> {
        let started = Instant::now();
        let method = ctx.request().method.to_string();
        let path = ctx.request().path.clone();

        let resp = next.run(ctx);

        let status = match &resp {
            Ok(r) => r.status.code_num,
            Err(e) => e.status().code_num,
        };
        info!(
            %method,
            %path,
            status,
            elapsed_us = started.elapsed().as_micros() as u64,
            "request handled"
        );

        resp
    }
}
