//! Retrying send loop.
//!
//! One logical call runs entirely on the caller's task. Each attempt replays
//! the retained body, the retryer judges the outcome, and the loop either
//! returns, or drains the response and sleeps before the next attempt. The
//! exchange, the body reads, the drains and the sleep are all raced against
//! the call's [`CallContext`].

use super::core::RpcClient;
use crate::context::CallContext;
use crate::protocol::RpcResponse;
use crate::resilience::Outcome;
use crate::transport::http::{drain_body, PreparedRequest};
use crate::transport::{ResponseHead, TransportError};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

impl RpcClient {
    pub(crate) async fn send<R: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        request: &PreparedRequest,
    ) -> Result<R> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let (response, transport_error) = match self.attempt_once(ctx, request).await {
                Ok(response) => (Some(response), None),
                Err(e) => (None, Some(e)),
            };
            let head = response.as_ref().map(ResponseHead::from_response);

            let decision = self.retryer.check_retry(
                ctx,
                Outcome {
                    response: head.as_ref(),
                    error: transport_error.as_ref(),
                },
                attempt,
            );

            if let Some(e) = &transport_error {
                error!(
                    method = %request.method,
                    url = %request.url,
                    attempt,
                    error = %e,
                    "request failed"
                );
            }

            if !decision.retry {
                return match (response, decision.error) {
                    (Some(response), None) => self.decode(ctx, request, response).await,
                    (response, error) => {
                        let error = error.or(transport_error.map(Error::from));
                        self.give_up(ctx, request, response, error, attempt).await
                    }
                };
            }

            // Read back a little of the body so the connection can be reused.
            if let Some(response) = response {
                drain_body(ctx, response).await;
            }

            let wait = self.retryer.backoff(attempt, head.as_ref());
            debug!(
                attempt,
                status = head.as_ref().map(|h| h.status()),
                wait_ms = wait.as_millis() as u64,
                "retrying request"
            );

            tokio::select! {
                biased;
                err = ctx.done() => {
                    self.transport.close_idle_connections();
                    return Err(err);
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// One HTTP exchange. A context that is already done sends nothing.
    async fn attempt_once(
        &self,
        ctx: &CallContext,
        request: &PreparedRequest,
    ) -> std::result::Result<reqwest::Response, TransportError> {
        tokio::select! {
            biased;
            _ = ctx.done() => Err(TransportError::cancelled(
                request.method.clone(),
                request.url.as_str(),
            )),
            result = self.transport.execute(request) => result,
        }
    }

    async fn decode<R: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        request: &PreparedRequest,
        response: reqwest::Response,
    ) -> Result<R> {
        let body = tokio::select! {
            biased;
            err = ctx.done() => {
                self.transport.close_idle_connections();
                return Err(err);
            }
            body = response.bytes() => body.map_err(|e| {
                TransportError::from_reqwest(
                    &request.method,
                    &request.url,
                    self.transport.max_redirects(),
                    e,
                )
            })?,
        };

        RpcResponse::<R>::from_slice(&body)?.into_result()
    }

    async fn give_up<R>(
        &self,
        ctx: &CallContext,
        request: &PreparedRequest,
        response: Option<reqwest::Response>,
        error: Option<Error>,
        attempts: u32,
    ) -> Result<R> {
        self.transport.close_idle_connections();
        if let Some(response) = response {
            drain_body(ctx, response).await;
        }

        let error = give_up_error(request, error, attempts);
        warn!(
            method = %request.method,
            url = %request.url,
            attempts,
            error = %error,
            "giving up on request"
        );
        Err(error)
    }
}

/// The error a failed call reports.
///
/// The send loop always has one to hand, since an attempt without a response
/// carries its transport error. `GaveUp` is the fallback when neither side
/// supplied an error.
fn give_up_error(request: &PreparedRequest, error: Option<Error>, attempts: u32) -> Error {
    error.unwrap_or_else(|| Error::GaveUp {
        method: request.method.to_string(),
        url: request.url.to_string(),
        attempts,
    })
}
