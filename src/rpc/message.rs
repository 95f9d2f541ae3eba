// ABOUTME: Wire schema for the invocation bridge.
// ABOUTME: Method calls in, tagged success/error/not_implemented responses out.

use crate::exec::{CommandResult, ConnectionRequest, ExecError, RequestError};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Name of the endpoint the bridge answers on.
pub const ENDPOINT: &str = "remexec/ssh";

/// The only method the endpoint implements.
pub const EXECUTE: &str = "execute";

/// Code used when a call cannot be decoded at all.
pub const MALFORMED_CALL: &str = "MALFORMED_CALL";

/// A call arriving at the endpoint.
#[derive(Debug, Deserialize)]
pub struct MethodCall {
    /// Opaque correlation id, echoed back in the reply.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Arguments of an `execute` call.
#[derive(Debug, Deserialize)]
pub struct ExecuteArguments {
    pub host: String,
    /// Kept wide so out-of-range values are reported rather than failing to decode.
    pub port: i64,
    pub username: String,
    pub password: SecretString,
    pub command: String,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl ExecuteArguments {
    pub fn into_request(self) -> Result<ConnectionRequest, RequestError> {
        let port = u16::try_from(self.port)
            .ok()
            .filter(|port| *port != 0)
            .ok_or(RequestError::InvalidPort(self.port))?;

        let request = ConnectionRequest {
            host: self.host,
            port,
            username: self.username,
            password: self.password,
            command: self.command,
            timeout: self.timeout,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Outcome of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Success {
        output: String,
        #[serde(skip_serializing_if = "String::is_empty")]
        stderr: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_status: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_signal: Option<String>,
    },
    Error {
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    NotImplemented {
        method: String,
    },
}

impl Response {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn failure(err: &ExecError) -> Self {
        Response::Error {
            code: err.code().as_str().to_string(),
            message: err.to_string(),
            details: Some(format!("{:?}", err)),
        }
    }
}

impl From<CommandResult> for Response {
    fn from(result: CommandResult) -> Self {
        Response::Success {
            output: result.stdout,
            stderr: result.stderr,
            exit_status: result.exit_status,
            exit_signal: result.exit_signal,
        }
    }
}

/// A response tagged with the id of the call it answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub response: Response,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn arguments(port: i64) -> ExecuteArguments {
        serde_json::from_value(json!({
            "host": "10.0.0.5",
            "port": port,
            "username": "ops",
            "password": "correct",
            "command": "echo hello",
        }))
        .unwrap()
    }

    #[test]
    fn arguments_become_a_request() {
        let request = arguments(2222).into_request().unwrap();
        assert_eq!(request.host, "10.0.0.5");
        assert_eq!(request.port, 2222);
        assert_eq!(request.command, "echo hello");
        assert!(request.timeout.is_none());
    }

    #[test]
    fn out_of_range_ports_are_rejected() {
        for port in [0, -1, 65536] {
            assert_eq!(
                arguments(port).into_request().unwrap_err(),
                RequestError::InvalidPort(port)
            );
        }
    }

    #[test]
    fn timeout_accepts_humantime() {
        let args: ExecuteArguments = serde_json::from_value(json!({
            "host": "h", "port": 22, "username": "u", "password": "p",
            "command": "ls", "timeout": "1m 30s",
        }))
        .unwrap();
        assert_eq!(args.timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn success_omits_empty_extras() {
        let reply = Reply {
            id: Some(json!(7)),
            response: Response::from(CommandResult {
                stdout: "hello\n".to_string(),
                ..Default::default()
            }),
        };
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"id": 7, "status": "success", "output": "hello\n"})
        );
    }

    #[test]
    fn failure_carries_code_and_message() {
        let response = Response::failure(&ExecError::Auth("denied".to_string()));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], "AUTH_ERROR");
        assert_eq!(value["message"], "authentication failed: denied");
        assert!(value["details"].is_string());
    }
}
