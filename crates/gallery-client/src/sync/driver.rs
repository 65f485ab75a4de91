//! Background task running a sync strategy.
//!
//! The [`SyncSession`] decides what happens next; the driver performs it.
//! Every strategy call is bounded by the request timeout (plus the
//! strategy's own cadence). A call that overruns, or that a command
//! interrupts, is abandoned and the next cycle starts fresh.

use std::sync::Arc;
use std::time::Duration;

use gallery_core::ImageId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::session::{SessionAction, SessionEvent, SyncSession};
use super::strategy::{Change, SyncStrategy, SyncUpdate};
use crate::cache::LikeCache;
use crate::config::ClientConfig;
use crate::effects::EffectSink;
use crate::error::{ClientError, ClientResult};

/// Messages from the UI to the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCommand {
    /// Replace the set of images on screen
    ShowImages(Vec<ImageId>),
    /// Page shown or hidden
    PageVisible(bool),
    /// Fetch everything again on the next cycle
    Resync,
    Shutdown,
}

/// Handle to a running driver
#[derive(Debug)]
pub struct SyncHandle {
    commands: mpsc::Sender<DriverCommand>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub async fn show_images(&self, image_ids: Vec<ImageId>) -> ClientResult<()> {
        self.send(DriverCommand::ShowImages(image_ids)).await
    }

    pub async fn set_page_visible(&self, visible: bool) -> ClientResult<()> {
        self.send(DriverCommand::PageVisible(visible)).await
    }

    pub async fn resync(&self) -> ClientResult<()> {
        self.send(DriverCommand::Resync).await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the driver and wait for it to release its connections
    pub async fn shutdown(self) {
        // A closed channel means the task is already gone
        let _ = self.commands.send(DriverCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                warn!(error = %e, "Sync driver panicked");
            }
        }
    }

    async fn send(&self, command: DriverCommand) -> ClientResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ClientError::DriverStopped)
    }
}

enum Step {
    Continue(SessionAction),
    Shutdown,
}

/// Runs one strategy for one session
pub struct SyncDriver {
    strategy: Box<dyn SyncStrategy>,
    session: SyncSession,
    cache: Arc<LikeCache>,
    effects: EffectSink,
    visible: Vec<ImageId>,
    request_timeout: Duration,
    retry_delay: Duration,
    backoff: bool,
}

impl SyncDriver {
    pub fn new(
        strategy: Box<dyn SyncStrategy>,
        cache: Arc<LikeCache>,
        effects: EffectSink,
        config: &ClientConfig,
    ) -> Self {
        Self {
            strategy,
            session: SyncSession::new(),
            cache,
            effects,
            visible: Vec::new(),
            request_timeout: config.request_timeout,
            retry_delay: config.poll_interval,
            backoff: false,
        }
    }

    /// Images on screen when the driver starts
    #[must_use]
    pub fn with_visible(mut self, image_ids: Vec<ImageId>) -> Self {
        self.visible = image_ids;
        self
    }

    pub fn spawn(self) -> SyncHandle {
        let (commands, receiver) = mpsc::channel(32);
        let task = tokio::spawn(self.run(receiver));
        SyncHandle { commands, task }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<DriverCommand>) {
        info!(strategy = %self.strategy.kind(), "Sync driver started");

        let mut action = self.session.handle(SessionEvent::Connect);
        loop {
            let step = match action {
                SessionAction::FullResync => self.run_cycle(true, &mut commands).await,
                SessionAction::NextUpdates => self.run_cycle(false, &mut commands).await,
                SessionAction::Stop => {
                    debug!("Sync suspended");
                    self.strategy.suspend().await;
                    Step::Continue(SessionAction::None)
                }
                SessionAction::None => self.wait(&mut commands).await,
            };
            match step {
                Step::Continue(next) => action = next,
                Step::Shutdown => break,
            }
        }

        self.session.handle(SessionEvent::Disconnect);
        self.strategy.suspend().await;
        info!("Sync driver stopped");
    }

    async fn run_cycle(&mut self, full: bool, commands: &mut mpsc::Receiver<DriverCommand>) -> Step {
        let bound = self.request_timeout + self.strategy.cadence();
        let visible = self.visible.clone();
        let strategy = &mut self.strategy;
        let call = async move {
            if full {
                strategy.resync(&visible).await
            } else {
                strategy.next_updates(&visible).await
            }
        };

        let outcome = tokio::select! {
            biased;
            command = commands.recv() => Err(command),
            result = tokio::time::timeout(bound, call) => Ok(result),
        };

        match outcome {
            Ok(Ok(Ok(updates))) => {
                self.backoff = false;
                self.apply(updates);
                Step::Continue(self.session.handle(SessionEvent::SyncCompleted))
            }
            Ok(Ok(Err(e))) => {
                warn!(error = %e, code = e.code(), full, "Sync cycle failed");
                self.backoff = true;
                Step::Continue(self.session.handle(SessionEvent::SyncFailed))
            }
            Ok(Err(_)) => {
                debug!(full, timeout_ms = bound.as_millis() as u64, "Sync cycle timed out");
                Step::Continue(self.session.handle(SessionEvent::SyncFailed))
            }
            Err(command) => {
                debug!(full, "Sync cycle abandoned for a command");
                self.session.handle(SessionEvent::SyncFailed);
                self.on_command(command)
            }
        }
    }

    async fn wait(&mut self, commands: &mut mpsc::Receiver<DriverCommand>) -> Step {
        if !self.session.wants_tick() {
            let command = commands.recv().await;
            return self.on_command(command);
        }
        if !std::mem::take(&mut self.backoff) {
            return Step::Continue(self.session.handle(SessionEvent::Tick));
        }

        tokio::select! {
            biased;
            command = commands.recv() => self.on_command(command),
            () = tokio::time::sleep(self.retry_delay) => {
                Step::Continue(self.session.handle(SessionEvent::Tick))
            }
        }
    }

    fn on_command(&mut self, command: Option<DriverCommand>) -> Step {
        match command {
            None | Some(DriverCommand::Shutdown) => Step::Shutdown,
            Some(DriverCommand::ShowImages(image_ids)) => {
                debug!(images = image_ids.len(), "Visible images changed");
                self.visible = image_ids;
                Step::Continue(self.session.handle(SessionEvent::Invalidate))
            }
            Some(DriverCommand::PageVisible(true)) => {
                Step::Continue(self.session.handle(SessionEvent::Visible))
            }
            Some(DriverCommand::PageVisible(false)) => {
                Step::Continue(self.session.handle(SessionEvent::Hidden))
            }
            Some(DriverCommand::Resync) => {
                Step::Continue(self.session.handle(SessionEvent::Invalidate))
            }
        }
    }

    fn apply(&self, updates: Vec<SyncUpdate>) {
        for update in updates {
            let before = self.cache.display(&update.image_id);
            let applied = match update.change {
                Change::Status(status) => {
                    self.cache
                        .apply_server(&update.image_id, status, update.ticket)
                }
                Change::Count(count) => self.cache.apply_count(&update.image_id, count, update.ticket),
            };
            if !applied {
                continue;
            }

            let after = self.cache.display(&update.image_id);
            if after != before {
                self.effects.updated(&update.image_id, after);
            }
            if update.is_remote_like() {
                self.effects.celebrate(&update.image_id);
            }
        }
    }
}

impl std::fmt::Debug for SyncDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncDriver")
            .field("strategy", &self.strategy.kind())
            .field("session", &self.session)
            .field("visible", &self.visible.len())
            .finish()
    }
}
