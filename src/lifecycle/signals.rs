//! OS signal handling.

/// Resolve when the process is asked to stop. Returns the signal name.
#[cfg(unix)]
pub async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot install SIGTERM handler; listening for SIGINT only");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        _ = term.recv() => "SIGTERM",
        name = ctrl_c() => name,
    }
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot install Ctrl+C handler");
        // Without a handler the only way out is an external kill.
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
