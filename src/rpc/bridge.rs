// ABOUTME: Dispatches method calls on the bridge endpoint to the command client.
// ABOUTME: Logs every failure before turning it into a response.

use super::message::{EXECUTE, ExecuteArguments, MALFORMED_CALL, MethodCall, Response};
use crate::exec::{ExecError, RemoteCommandClient};
use crate::ssh::{Connector, RusshConnector};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Answers calls made against [`ENDPOINT`](super::ENDPOINT).
pub struct Bridge<C: Connector = RusshConnector> {
    client: RemoteCommandClient<C>,
}

impl<C: Connector> Clone for Bridge<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<C: Connector> Bridge<C> {
    pub fn new(client: RemoteCommandClient<C>) -> Self {
        Self { client }
    }

    pub async fn handle(&self, call: MethodCall, cancel: CancellationToken) -> Response {
        match call.method.as_str() {
            EXECUTE => self.execute(call.arguments, cancel).await,
            other => {
                tracing::debug!("Method not implemented: {}", other);
                Response::NotImplemented {
                    method: other.to_string(),
                }
            }
        }
    }

    async fn execute(&self, arguments: Value, cancel: CancellationToken) -> Response {
        let arguments: ExecuteArguments = match serde_json::from_value(arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                tracing::error!("Malformed execute arguments: {}", e);
                return Response::error(MALFORMED_CALL, format!("invalid arguments: {}", e));
            }
        };

        let request = match arguments.into_request() {
            Ok(request) => request,
            Err(e) => {
                let err = ExecError::from(e);
                tracing::error!("Rejected execute call: {}", err);
                return Response::failure(&err);
            }
        };

        let target = format!("{}@{}:{}", request.username, request.host, request.port);
        match self.client.execute_with_cancel(request, cancel).await {
            Ok(result) => Response::from(result),
            Err(e) => {
                tracing::error!("Remote command on {} failed [{}]: {}", target, e.code(), e);
                Response::failure(&e)
            }
        }
    }
}
