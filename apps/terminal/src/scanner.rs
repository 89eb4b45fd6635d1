//! # Scanner Listener
//!
//! Owns the barcode classifier and feeds it key events from whatever
//! produces them (a serial scanner, a key hook, tests).
//!
//! ```text
//! ┌──────────────┐  KeyEvent   ┌──────────────────────────────┐   code    ┌──────────────┐
//! │ device reader│ ──────────► │       ScannerListener        │ ────────► │ command loop │
//! │ / key hook   │   (mpsc)    │                              │  (mpsc)   │  scan_code() │
//! └──────────────┘             │  BarcodeClassifier           │           └──────────────┘
//!                              │  idle timer (sleep_until)    │
//! ┌──────────────┐ FocusContext│                              │
//! │ front end    │ ──────────► │  guard: focus.should_capture │
//! │ modal/focus  │   (watch)   └──────────────────────────────┘
//! └──────────────┘
//! ```
//!
//! Events are handled strictly in arrival order and codes are emitted in
//! the order their Enter arrived.

use std::sync::Arc;
use std::time::Duration;

use tally_core::{BarcodeClassifier, FocusContext, KeyEvent, KeyInput, ScannerConfig};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Buffered key events before producers wait.
const KEY_CHANNEL_CAPACITY: usize = 256;

/// Buffered codes before the listener waits on the consumer.
const CODE_CHANNEL_CAPACITY: usize = 32;

/// Runs the classifier over incoming key events.
///
/// This should be spawned as a background task.
pub struct ScannerListener {
    classifier: BarcodeClassifier,
    keys_rx: mpsc::Receiver<KeyEvent>,
    focus_rx: watch::Receiver<FocusContext>,
    codes_tx: mpsc::Sender<String>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for feeding and steering the listener.
#[derive(Clone)]
pub struct ScannerHandle {
    keys_tx: mpsc::Sender<KeyEvent>,
    focus_tx: Arc<watch::Sender<FocusContext>>,
    shutdown_tx: mpsc::Sender<()>,
}

impl ScannerHandle {
    /// Sender for key events. Clone it into every producer.
    pub fn keys(&self) -> mpsc::Sender<KeyEvent> {
        self.keys_tx.clone()
    }

    /// Broadcasts the latest focus and modal state.
    pub fn set_focus(&self, focus: FocusContext) {
        debug!(?focus, "Focus changed");
        self.focus_tx.send_replace(focus);
    }

    /// Opens or closes a modal, keeping the focused element.
    pub fn set_modal(&self, open: bool) {
        self.focus_tx.send_modify(|focus| focus.modal_open = open);
    }

    pub fn focus(&self) -> FocusContext {
        *self.focus_tx.borrow()
    }

    /// Asks the listener to stop. A second call is a no-op.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl ScannerListener {
    /// Creates a listener, its handle, and the receiver of scanned codes.
    pub fn new(config: ScannerConfig) -> (Self, ScannerHandle, mpsc::Receiver<String>) {
        let (keys_tx, keys_rx) = mpsc::channel(KEY_CHANNEL_CAPACITY);
        let (focus_tx, focus_rx) = watch::channel(FocusContext::default());
        let (codes_tx, codes_rx) = mpsc::channel(CODE_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let listener = ScannerListener {
            classifier: BarcodeClassifier::new(config),
            keys_rx,
            focus_rx,
            codes_tx,
            shutdown_rx,
        };

        let handle = ScannerHandle {
            keys_tx,
            focus_tx: Arc::new(focus_tx),
            shutdown_tx,
        };

        (listener, handle, codes_rx)
    }

    /// Creates the listener and spawns it.
    pub fn spawn(config: ScannerConfig) -> (ScannerHandle, mpsc::Receiver<String>, JoinHandle<()>) {
        let (listener, handle, codes_rx) = ScannerListener::new(config);
        let task = tokio::spawn(listener.run());
        (handle, codes_rx, task)
    }

    /// Runs the listener loop until shutdown or until every key producer
    /// and the code consumer are gone.
    pub async fn run(mut self) {
        info!("Scanner listener starting");

        loop {
            let deadline = self.classifier.idle_deadline();
            // Placeholder instant for the disabled branch; never awaited.
            let wake_at = deadline
                .map(Instant::from_std)
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                biased;

                _ = self.shutdown_rx.recv() => {
                    info!("Scanner listener shutting down");
                    break;
                }

                event = self.keys_rx.recv() => {
                    let Some(event) = event else {
                        debug!("All key producers closed");
                        break;
                    };
                    let focus = *self.focus_rx.borrow();
                    if let Some(code) = self.classifier.handle(event, &focus) {
                        debug!(code = %code, "Scanned code");
                        if self.codes_tx.send(code).await.is_err() {
                            debug!("Code consumer closed");
                            break;
                        }
                    }
                }

                _ = sleep_until(wake_at), if deadline.is_some() => {
                    if self.classifier.expire(Instant::now().into_std()) {
                        debug!("Partial scan buffer timed out");
                    }
                }
            }
        }

        info!("Scanner listener stopped");
    }
}

/// Streams bytes from a scanner device into key events.
///
/// Serial scanners send the code followed by CR or LF; each byte becomes a
/// key stamped with its read time. Stops at end of stream, on a read error,
/// or when the listener is gone.
pub fn spawn_device_reader<R>(mut reader: R, keys: mpsc::Sender<KeyEvent>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    info!("Scanner device closed");
                    break;
                }
                Ok(n) => {
                    let at = Instant::now().into_std();
                    for &byte in &buf[..n] {
                        let event = KeyEvent::new(KeyInput::from_char(char::from(byte)), at);
                        if keys.send(event).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Scanner device read failed");
                    break;
                }
            }
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::FocusTarget;
    use tokio::time::{sleep, timeout};

    async fn type_keys(keys: &mpsc::Sender<KeyEvent>, text: &str, gap: Duration) {
        for c in text.chars() {
            let event = KeyEvent::new(KeyInput::from_char(c), Instant::now().into_std());
            keys.send(event).await.unwrap();
            sleep(gap).await;
        }
    }

    async fn no_code(codes: &mut mpsc::Receiver<String>) -> bool {
        timeout(Duration::from_secs(1), codes.recv()).await.is_err()
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_burst_emits_code() {
        let (handle, mut codes, _task) = ScannerListener::spawn(ScannerConfig::default());

        type_keys(&handle.keys(), "5901234123457\n", Duration::from_millis(5)).await;

        assert_eq!(codes.recv().await.as_deref(), Some("5901234123457"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_human_typing_is_ignored() {
        let (handle, mut codes, _task) = ScannerListener::spawn(ScannerConfig::default());

        type_keys(&handle.keys(), "5901\n", Duration::from_millis(120)).await;

        assert!(no_code(&mut codes).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_prefix_is_dropped() {
        let (handle, mut codes, _task) = ScannerListener::spawn(ScannerConfig::default());
        let keys = handle.keys();

        type_keys(&keys, "99", Duration::from_millis(5)).await;
        sleep(Duration::from_millis(300)).await;
        type_keys(&keys, "12345678\n", Duration::from_millis(5)).await;

        assert_eq!(codes.recv().await.as_deref(), Some("12345678"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_modal_suppresses_and_reopens() {
        let (handle, mut codes, _task) = ScannerListener::spawn(ScannerConfig::default());

        handle.set_modal(true);
        type_keys(&handle.keys(), "5901234123457\n", Duration::from_millis(5)).await;
        assert!(no_code(&mut codes).await);

        handle.set_modal(false);
        type_keys(&handle.keys(), "5901234123457\n", Duration::from_millis(5)).await;
        assert_eq!(codes.recv().await.as_deref(), Some("5901234123457"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_input_focus_suppresses() {
        let (handle, mut codes, _task) = ScannerListener::spawn(ScannerConfig::default());

        handle.set_focus(FocusContext {
            modal_open: false,
            focused: FocusTarget::TextInput,
        });
        assert_eq!(handle.focus().focused, FocusTarget::TextInput);

        type_keys(&handle.keys(), "5901234123457\n", Duration::from_millis(5)).await;
        assert!(no_code(&mut codes).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_codes_keep_arrival_order() {
        let (handle, mut codes, _task) = ScannerListener::spawn(ScannerConfig::default());

        type_keys(&handle.keys(), "AAAA1\nBBBB2\n", Duration::from_millis(5)).await;

        assert_eq!(codes.recv().await.as_deref(), Some("AAAA1"));
        assert_eq!(codes.recv().await.as_deref(), Some("BBBB2"));
    }

    #[tokio::test]
    async fn test_device_reader_feeds_listener() {
        let (handle, mut codes, _task) = ScannerListener::spawn(ScannerConfig::default());

        let reader = spawn_device_reader(&b"5901234123457\r"[..], handle.keys());
        reader.await.unwrap();

        assert_eq!(codes.recv().await.as_deref(), Some("5901234123457"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        let (handle, _codes, task) = ScannerListener::spawn(ScannerConfig::default());

        handle.shutdown().await;
        task.await.unwrap();
    }
}
