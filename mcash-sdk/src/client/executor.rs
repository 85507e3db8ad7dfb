//! Request executor with bounded retry on server errors.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{ApiRequest, ApiResponse, ClientError, Transport};

/// Hard cap on attempts per request, the first one included.
pub const MAX_ATTEMPTS: u32 = 10;

/// Executes requests through a [`Transport`], retrying 5xx answers.
///
/// Retries happen back to back without delay. Any 2xx to 4xx status ends the
/// loop and is handed to the caller unchanged; judging success is the
/// caller's job. Connection failures are not retried here.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let response = self.transport.send(request).await?;
            if !response.status.is_server_error() {
                debug!(
                    method = %request.method,
                    url = %request.url,
                    status = %response.status,
                    attempt,
                    "Request completed"
                );
                return Ok(response);
            }

            if attempt >= MAX_ATTEMPTS {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    status = %response.status,
                    attempts = attempt,
                    "Giving up after repeated server errors"
                );
                return Err(ClientError::TransientServer {
                    status: response.status,
                    body: response.body,
                    attempts: attempt,
                });
            }

            warn!(
                method = %request.method,
                url = %request.url,
                status = %response.status,
                attempt,
                "Server error, retrying"
            );
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("max_attempts", &MAX_ATTEMPTS)
            .finish_non_exhaustive()
    }
}
