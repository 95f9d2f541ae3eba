// ABOUTME: Newline-delimited JSON server for the bridge endpoint.
// ABOUTME: Each call runs on its own task; replies are written as they complete.

use super::bridge::Bridge;
use super::message::{MALFORMED_CALL, MethodCall, Reply, Response};
use crate::ssh::Connector;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Serve method calls read from `reader`, one JSON object per line.
///
/// Returns once the input is exhausted (or `shutdown` fires) and every call
/// in flight has been answered. Calls still running when `shutdown` fires are
/// cancelled and answered with `CANCELLED`.
pub async fn serve<C, R, W>(
    bridge: Bridge<C>,
    reader: R,
    mut writer: W,
    shutdown: CancellationToken,
) -> std::io::Result<()>
where
    C: Connector,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Reply>();
    let mut lines = BufReader::new(reader).lines();
    let mut tasks = JoinSet::new();
    let mut reading = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if reading => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => dispatch(&bridge, &line, &shutdown, &tx, &mut tasks),
                None => reading = false,
            },
            Some(reply) = rx.recv() => write_reply(&mut writer, &reply).await?,
            _ = shutdown.cancelled(), if reading => {
                tracing::debug!("Shutdown requested, no longer reading calls");
                reading = false;
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    tracing::warn!("Call task failed: {}", e);
                }
            }
        }

        if !reading && tasks.is_empty() {
            while let Ok(reply) = rx.try_recv() {
                write_reply(&mut writer, &reply).await?;
            }
            break;
        }
    }

    writer.flush().await
}

fn dispatch<C: Connector>(
    bridge: &Bridge<C>,
    line: &str,
    shutdown: &CancellationToken,
    tx: &mpsc::UnboundedSender<Reply>,
    tasks: &mut JoinSet<()>,
) {
    let call: MethodCall = match serde_json::from_str(line) {
        Ok(call) => call,
        Err(e) => {
            tracing::error!("Malformed method call: {}", e);
            let _ = tx.send(Reply {
                id: None,
                response: Response::error(MALFORMED_CALL, format!("malformed call: {}", e)),
            });
            return;
        }
    };

    let bridge = bridge.clone();
    let tx = tx.clone();
    let cancel = shutdown.child_token();
    tasks.spawn(async move {
        let id = call.id.clone();
        let response = bridge.handle(call, cancel).await;
        let _ = tx.send(Reply { id, response });
    });
}

async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, reply: &Reply) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(reply)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}
