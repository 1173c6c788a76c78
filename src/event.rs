use crossterm::event::{Event as CrosstermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
    QuitKey,
}

/// Latched shutdown request shared by the signal and key listeners.
pub struct Shutdown {
    tx: watch::Sender<Option<ShutdownReason>>,
    rx: watch::Receiver<Option<ShutdownReason>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        Shutdown {
            tx,
            rx,
            tasks: Vec::new(),
        }
    }

    /// SIGINT everywhere, SIGTERM on unix.
    pub fn listen_for_signals(&mut self) {
        let tx = self.tx.clone();
        self.tasks.push(tokio::spawn(async move {
            let reason = wait_for_signal().await;
            tracing::info!(?reason, "shutdown requested");
            tx.send_replace(Some(reason));
        }));
    }

    /// `q`, `Esc` or `Ctrl+C` while the terminal preview owns the keyboard.
    pub fn listen_for_keys(&mut self) {
        let tx = self.tx.clone();
        self.tasks.push(tokio::spawn(async move {
            let mut reader = EventStream::new();
            while let Some(event) = reader.next().await {
                match event {
                    Ok(CrosstermEvent::Key(key)) if is_quit_key(&key) => {
                        tracing::info!("quit key pressed");
                        tx.send_replace(Some(ShutdownReason::QuitKey));
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(%err, "terminal input closed");
                        break;
                    }
                }
            }
        }));
    }

    pub fn trigger(&self, reason: ShutdownReason) {
        self.tx.send_replace(Some(reason));
    }

    pub fn requested(&self) -> Option<ShutdownReason> {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested.
    pub async fn wait(&mut self) -> ShutdownReason {
        loop {
            if let Some(reason) = *self.rx.borrow_and_update() {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

impl Drop for Shutdown {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

async fn interrupt() -> ShutdownReason {
    match tokio::signal::ctrl_c().await {
        Ok(()) => ShutdownReason::Interrupt,
        Err(err) => {
            tracing::warn!(%err, "cannot listen for SIGINT");
            std::future::pending().await
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> ShutdownReason {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => tokio::select! {
            reason = interrupt() => reason,
            _ = terminate.recv() => ShutdownReason::Terminate,
        },
        Err(err) => {
            tracing::warn!(%err, "cannot listen for SIGTERM");
            interrupt().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> ShutdownReason {
    interrupt().await
}
