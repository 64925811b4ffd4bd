//! Ban filter middleware.
//!
//! Rejects a request with 403 when any address in its `X-Forwarded-For`
//! header is under an active ban. Requests without the header are rejected
//! too. Everything else reaches the inner service untouched.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{HeaderMap, Request, Response, StatusCode};
use chrono::{DateTime, Utc};
use futures_util::future::{ready, Either, Ready};
use tower::{Layer, Service};

use crate::ban::{BanStatus, BanTable};
use crate::config::BanFilterConfig;
use crate::http::forwarded::{candidates, forwarded_for};
use crate::observability::metrics;

/// What the filter decided for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Filter is off; nothing was checked.
    Disabled,
    /// No candidate address is banned.
    Allowed,
    /// `address` is banned until `until`.
    Banned { address: String, until: DateTime<Utc> },
    /// No usable `X-Forwarded-For` header.
    MissingIdentity,
}

impl Verdict {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Verdict::Banned { .. } | Verdict::MissingIdentity)
    }

    fn outcome(&self) -> &'static str {
        match self {
            Verdict::Disabled => "disabled",
            Verdict::Allowed => "forwarded",
            Verdict::Banned { .. } => "banned",
            Verdict::MissingIdentity => "missing_identity",
        }
    }
}

/// Shared filter state: settings plus the live ban table.
#[derive(Debug)]
pub struct BanFilter {
    name: String,
    enabled: bool,
    trim_candidates: bool,
    table: BanTable,
}

impl BanFilter {
    /// Build a filter from its config. Timestamps are not checked here.
    pub fn new(config: &BanFilterConfig) -> Self {
        Self {
            name: config.name.clone(),
            enabled: config.enabled,
            trim_candidates: config.trim_candidates,
            table: BanTable::from_config(config),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &BanTable {
        &self.table
    }

    /// Decide whether a request carrying `headers` may pass.
    pub fn check(&self, headers: &HeaderMap) -> Verdict {
        if !self.enabled {
            return Verdict::Disabled;
        }

        let Some(value) = forwarded_for(headers) else {
            tracing::debug!(filter = %self.name, "Rejecting request without X-Forwarded-For");
            return Verdict::MissingIdentity;
        };

        for candidate in candidates(value, self.trim_candidates) {
            // Ban keys are strings, so a non UTF-8 entry is never banned.
            let Some(address) = candidate else {
                continue;
            };
            match self.table.evaluate(address) {
                BanStatus::Absent => {}
                BanStatus::Active { until } => {
                    tracing::info!(
                        filter = %self.name,
                        client = %address,
                        until = %until,
                        "Rejecting banned client"
                    );
                    return Verdict::Banned {
                        address: address.to_string(),
                        until,
                    };
                }
                BanStatus::Lapsed { expired_at } => {
                    tracing::debug!(
                        filter = %self.name,
                        client = %address,
                        expired_at = %expired_at,
                        "Ban lapsed, removed"
                    );
                    metrics::record_eviction("lapsed", 1);
                    metrics::record_table_size(self.table.len());
                }
                BanStatus::Malformed { raw } => {
                    tracing::warn!(
                        filter = %self.name,
                        client = %address,
                        timestamp = %raw,
                        "Dropping ban with unparsable expiry, use an RFC3339 timestamp"
                    );
                    metrics::record_eviction("malformed", 1);
                    metrics::record_table_size(self.table.len());
                }
            }
        }

        Verdict::Allowed
    }
}

/// Layer that applies [`BanFilterService`].
///
/// Every service produced by the same layer shares one ban table.
#[derive(Clone, Debug)]
pub struct BanFilterLayer {
    filter: Arc<BanFilter>,
}

impl BanFilterLayer {
    pub fn new(config: &BanFilterConfig) -> Self {
        Self::from_filter(Arc::new(BanFilter::new(config)))
    }

    pub fn from_filter(filter: Arc<BanFilter>) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &Arc<BanFilter> {
        &self.filter
    }
}

impl<S> Layer<S> for BanFilterLayer {
    type Service = BanFilterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BanFilterService {
            inner,
            filter: Arc::clone(&self.filter),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BanFilterService<S> {
    inner: S,
    filter: Arc<BanFilter>,
}

impl<S> BanFilterService<S> {
    pub fn filter(&self) -> &Arc<BanFilter> {
        &self.filter
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for BanFilterService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Default,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Either<S::Future, Ready<Result<Self::Response, Self::Error>>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let verdict = self.filter.check(req.headers());
        metrics::record_outcome(self.filter.name(), verdict.outcome());

        if verdict.is_rejected() {
            return Either::Right(ready(Ok(forbidden())));
        }

        Either::Left(self.inner.call(req))
    }
}

fn forbidden<B: Default>() -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::FORBIDDEN;
    response
}
