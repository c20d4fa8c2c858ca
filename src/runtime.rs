//! Runs a `Session` on its own thread. The UI talks to it through a bounded
//! input queue and reads events back without blocking.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::errors::{PanelError, Result};
use crate::session::{CoreEvent, Input, Session};

const INPUT_QUEUE: usize = 64;
const IDLE_WAIT: Duration = Duration::from_secs(1);

pub struct CoreHandle {
    inputs: SyncSender<Input>,
    events: Receiver<CoreEvent>,
    thread: Option<JoinHandle<()>>,
}

/// Start the session loop. `notify` runs whenever new events are queued,
/// typically to wake the UI.
pub fn spawn(mut session: Session, notify: impl Fn() + Send + 'static) -> CoreHandle {
    let (input_tx, input_rx) = mpsc::sync_channel::<Input>(INPUT_QUEUE);
    let (event_tx, event_rx) = mpsc::channel::<CoreEvent>();

    let thread = std::thread::spawn(move || {
        session.start(Instant::now());
        loop {
            session.advance(Instant::now());

            let events = session.take_events();
            if !events.is_empty() {
                for event in events {
                    if event_tx.send(event).is_err() {
                        debug!("event receiver dropped, stopping session");
                        return;
                    }
                }
                notify();
            }

            let wait = session
                .next_deadline()
                .map(|due| due.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_WAIT);
            match input_rx.recv_timeout(wait) {
                Ok(input) => {
                    if !session.handle(input, Instant::now()) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        info!("session loop stopped");
    });

    CoreHandle {
        inputs: input_tx,
        events: event_rx,
        thread: Some(thread),
    }
}

impl CoreHandle {
    /// Queue an input. A full queue drops the input with a warning.
    pub fn send(&self, input: Input) -> Result<()> {
        match self.inputs.try_send(input) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(input)) => {
                warn!(?input, "input queue full, dropping");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(PanelError::ChannelClosed {
                component: "session",
            }),
        }
    }

    /// Every event published since the last call.
    pub fn drain(&self) -> Vec<CoreEvent> {
        self.events.try_iter().collect()
    }

    #[cfg(test)]
    fn recv_timeout(&self, timeout: Duration) -> Option<CoreEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Stop the session and wait for its thread.
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.inputs.send(Input::Shutdown);
            if thread.join().is_err() {
                warn!("session thread panicked");
            }
        }
    }
}

impl Drop for CoreHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
