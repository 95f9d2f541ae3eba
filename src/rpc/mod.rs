// ABOUTME: Request/response bridge in front of the command client.
// ABOUTME: A named endpoint with one method, served as JSON lines.

mod bridge;
mod message;
mod server;

pub use bridge::Bridge;
pub use message::{
    ENDPOINT, EXECUTE, ExecuteArguments, MALFORMED_CALL, MethodCall, Reply, Response,
};
pub use server::serve;
