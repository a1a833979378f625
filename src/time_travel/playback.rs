//! Background ticker driving playback.

use crate::error::Result;
use crossbeam_channel::{bounded, select, tick, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Handle to a running playback ticker. Stops and joins on drop.
pub struct PlaybackTimer {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PlaybackTimer {
    /// Call `on_tick` every `interval` until stopped or until it returns
    /// `false`.
    pub(crate) fn spawn<F>(interval: Duration, mut on_tick: F) -> Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (stop, stopped) = bounded::<()>(0);
        let ticker = tick(interval);

        let handle = thread::Builder::new()
            .name("rewind-playback".to_string())
            .spawn(move || loop {
                select! {
                    // Fires when the sender is dropped.
                    recv(stopped) -> _ => break,
                    recv(ticker) -> _ => {
                        if !on_tick() {
                            break;
                        }
                    }
                }
            })?;

        debug!(?interval, "playback timer started");

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Stop ticking and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    fn shutdown(&mut self) {
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            debug!("playback timer stopped");
        }
    }
}

impl Drop for PlaybackTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
