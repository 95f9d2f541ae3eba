// ABOUTME: Serve command implementation.
// ABOUTME: Exposes the bridge endpoint over stdin/stdout until EOF or Ctrl-C.

use remexec::config::ClientConfig;
use remexec::error::Result;
use remexec::exec::RemoteCommandClient;
use remexec::rpc::{self, Bridge, ENDPOINT};
use tokio_util::sync::CancellationToken;

pub async fn serve_stdio(config: ClientConfig) -> Result<()> {
    config.validate()?;
    let bridge = Bridge::new(RemoteCommandClient::new(config));

    let shutdown = CancellationToken::new();
    let ctrl_c = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        })
    };

    tracing::info!("Serving {} on stdin/stdout", ENDPOINT);
    let result = rpc::serve(bridge, tokio::io::stdin(), tokio::io::stdout(), shutdown).await;
    ctrl_c.abort();

    result?;
    Ok(())
}
