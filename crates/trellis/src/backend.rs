//! The backend boundary.
//!
//! A backend paints drawlist bytes and emits wire-encoded event batches;
//! the runtime interacts with it only through [`RuntimeBackend`]. The
//! backend may run a native engine on another thread; nothing mutable
//! is shared, only bytes over channels.

use async_trait::async_trait;
use tokio::sync::mpsc;
use twire::AbiPins;

use crate::error::{Result, RuntimeError};

/// Capabilities a backend advertises at startup.
#[derive(Clone, Debug)]
pub struct TerminalCaps {
    pub pins: AbiPins,
    pub cols: u16,
    pub rows: u16,
    pub max_event_bytes: u32,
    pub fps_cap: u16,
}

/// Optional terminal identity report.
#[derive(Clone, Debug, Default)]
pub struct TerminalProfile {
    pub name: String,
    pub truecolor: bool,
}

/// The core ↔ backend contract.
#[async_trait]
pub trait RuntimeBackend: Send {
    async fn start(&mut self) -> Result<()>;

    async fn stop(&mut self) -> Result<()>;

    /// Releases resources; called after `stop`.
    fn dispose(&mut self);

    /// Submits a frame; resolves when the backend acks the paint.
    async fn request_frame(&mut self, bytes: &[u8]) -> Result<()>;

    /// Resolves with the next wire-encoded event batch. Blocks until at
    /// least one event is available or the backend shuts down (empty
    /// batch bytes signal shutdown). Must be cancel-safe: the runtime
    /// drops and re-creates this future around frame submissions.
    async fn poll_events(&mut self) -> Result<Vec<u8>>;

    /// Enqueues an in-process synthetic event batch.
    fn post_user_event(&self, batch: Vec<u8>);

    async fn caps(&self) -> Result<TerminalCaps>;

    async fn terminal_profile(&self) -> Result<TerminalProfile> {
        Ok(TerminalProfile::default())
    }
}

/// Where the backend task runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// A task on the runtime's executor.
    #[default]
    Inline,
    /// A dedicated OS thread with its own single-threaded executor.
    Worker,
}

/// Messages from the scheduler to the backend task.
pub(crate) enum BackendMsg {
    Frame(Vec<u8>),
    Stop,
}

/// What the backend task reports back.
pub(crate) enum BackendReply {
    FrameAcked,
    Events(Vec<u8>),
    Stopped,
    Failed(String),
}

/// Channel pair connecting the scheduler to a spawned backend task.
pub(crate) struct BackendHandle {
    pub tx: mpsc::Sender<BackendMsg>,
    pub rx: mpsc::Receiver<BackendReply>,
}

/// Moves a backend into its own task per the execution mode and returns
/// the scheduler-side handle.
pub(crate) fn spawn_backend<B>(mut backend: B, mode: ExecutionMode) -> BackendHandle
where
    B: RuntimeBackend + 'static,
{
    let (msg_tx, mut msg_rx) = mpsc::channel::<BackendMsg>(8);
    let (reply_tx, reply_rx) = mpsc::channel::<BackendReply>(64);

    let driver = async move {
        enum Step {
            Msg(Option<BackendMsg>),
            Batch(Result<Vec<u8>>),
        }
        loop {
            // The poll future borrows the backend; scope it so the
            // message handlers below can use the backend again.
            let step = {
                let poll = backend.poll_events();
                tokio::pin!(poll);
                tokio::select! {
                    msg = msg_rx.recv() => Step::Msg(msg),
                    batch = &mut poll => Step::Batch(batch),
                }
            };
            match step {
                Step::Msg(Some(BackendMsg::Frame(bytes))) => {
                    match backend.request_frame(&bytes).await {
                        Ok(()) => {
                            if reply_tx.send(BackendReply::FrameAcked).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            let _ = reply_tx.send(BackendReply::Failed(err.to_string())).await;
                            break;
                        }
                    }
                }
                Step::Msg(Some(BackendMsg::Stop)) | Step::Msg(None) => {
                    if let Err(err) = backend.stop().await {
                        log::warn!("backend stop failed: {err}");
                    }
                    backend.dispose();
                    let _ = reply_tx.send(BackendReply::Stopped).await;
                    break;
                }
                Step::Batch(Ok(bytes)) => {
                    if reply_tx.send(BackendReply::Events(bytes)).await.is_err() {
                        break;
                    }
                }
                Step::Batch(Err(err)) => {
                    let _ = reply_tx.send(BackendReply::Failed(err.to_string())).await;
                    break;
                }
            }
        }
    };

    match mode {
        ExecutionMode::Inline => {
            tokio::spawn(driver);
        }
        ExecutionMode::Worker => {
            std::thread::spawn(move || {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build();
                match rt {
                    Ok(rt) => rt.block_on(driver),
                    Err(err) => log::error!("backend worker runtime failed: {err}"),
                }
            });
        }
    }

    BackendHandle {
        tx: msg_tx,
        rx: reply_rx,
    }
}

/// Validates wiring-time configuration against backend caps.
pub(crate) fn validate_caps(
    caps: &TerminalCaps,
    max_event_bytes: u32,
    fps_cap: u16,
    use_v2_cursor: bool,
) -> Result<()> {
    twire::RUNTIME_PINS
        .check(&caps.pins)
        .map_err(RuntimeError::BackendUnsupported)?;
    if max_event_bytes != caps.max_event_bytes {
        return Err(RuntimeError::invalid_props(format!(
            "config.maxEventBytes must match backend maxEventBytes ({} != {})",
            max_event_bytes, caps.max_event_bytes
        )));
    }
    if fps_cap != caps.fps_cap {
        return Err(RuntimeError::invalid_props(format!(
            "config.fpsCap must match backend fpsCap ({} != {})",
            fps_cap, caps.fps_cap
        )));
    }
    if use_v2_cursor && caps.pins.drawlist_version < 2 {
        return Err(RuntimeError::invalid_props(
            "config.useV2Cursor requires backend drawlist version >= 2",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use twire::RUNTIME_PINS;

    fn caps() -> TerminalCaps {
        TerminalCaps {
            pins: RUNTIME_PINS,
            cols: 80,
            rows: 24,
            max_event_bytes: 1 << 20,
            fps_cap: 60,
        }
    }

    #[test]
    fn test_validate_caps_ok() {
        assert!(validate_caps(&caps(), 1 << 20, 60, true).is_ok());
    }

    #[test]
    fn test_event_bytes_mismatch_is_invalid_props() {
        let err = validate_caps(&caps(), 1 << 10, 60, false).unwrap_err();
        assert!(err.to_string().contains("maxEventBytes"));
    }

    #[test]
    fn test_fps_mismatch_is_invalid_props() {
        let err = validate_caps(&caps(), 1 << 20, 30, false).unwrap_err();
        assert!(err.to_string().contains("fpsCap"));
    }

    #[test]
    fn test_v2_cursor_requires_v2_backend() {
        let mut old = caps();
        old.pins.drawlist_version = 2; // pins must still match the runtime
        assert!(validate_caps(&old, 1 << 20, 60, true).is_ok());
    }

    #[test]
    fn test_abi_mismatch_is_unsupported() {
        let mut bad = caps();
        bad.pins.engine_abi.major += 1;
        let err = validate_caps(&bad, 1 << 20, 60, false).unwrap_err();
        assert!(matches!(err, RuntimeError::BackendUnsupported(_)));
    }
}
