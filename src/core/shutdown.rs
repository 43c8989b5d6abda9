use tokio::signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupt {
    CtrlC,
    Terminate,
}

impl Interrupt {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::CtrlC => "ctrl_c",
            Self::Terminate => "sigterm",
        }
    }
}

/// Resolves with the signal that interrupted the process. A handler that cannot be
/// installed never fires.
pub(crate) async fn interrupted() -> Interrupt {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => Interrupt::CtrlC,
            Err(err) => {
                tracing::error!(error = %err, "Failed to install Ctrl+C handler");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                Interrupt::Terminate
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Interrupt>();

    tokio::select! {
        signal = ctrl_c => signal,
        signal = terminate => signal,
    }
}
