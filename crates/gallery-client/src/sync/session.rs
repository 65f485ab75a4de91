//! Sync session state machine.
//!
//! Pure: it decides what the driver does next and performs no I/O.
//!
//! ```text
//! Disconnected --Connect--> Syncing --SyncCompleted/SyncFailed--> Idle --Tick--> Syncing ...
//! ```
//!
//! Hiding the page stops work; showing it again starts with a full resync.
//! Any failed cycle leaves the cache unverified, so the next one is a full
//! resync. For stream strategies that resync is also the reconnect.

/// Where the session is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Disconnected,
    Syncing,
    Idle,
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connect,
    /// The driver is ready for another cycle
    Tick,
    /// The visible image set changed
    Invalidate,
    SyncCompleted,
    SyncFailed,
    Hidden,
    Visible,
    Disconnect,
}

/// What the driver should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Fetch the status of every visible image
    FullResync,
    /// Wait for the strategy's next updates
    NextUpdates,
    /// Stop fetching and release connections
    Stop,
    None,
}

#[derive(Debug, Clone)]
pub struct SyncSession {
    state: SyncState,
    visible: bool,
    resync_due: bool,
    in_resync: bool,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncSession {
    pub fn new() -> Self {
        Self {
            state: SyncState::Disconnected,
            visible: true,
            resync_due: true,
            in_resync: false,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Connected and on screen
    pub fn is_active(&self) -> bool {
        self.visible && self.state != SyncState::Disconnected
    }

    /// Ready to start another cycle
    pub fn wants_tick(&self) -> bool {
        self.is_active() && self.state == SyncState::Idle
    }

    pub fn handle(&mut self, event: SessionEvent) -> SessionAction {
        match event {
            SessionEvent::Connect => {
                if self.state != SyncState::Disconnected {
                    return SessionAction::None;
                }
                self.state = SyncState::Idle;
                self.resync_due = true;
                self.start_cycle()
            }
            SessionEvent::Tick => self.start_cycle(),
            SessionEvent::Invalidate => {
                self.resync_due = true;
                SessionAction::None
            }
            SessionEvent::SyncCompleted => {
                if self.state == SyncState::Syncing {
                    self.state = SyncState::Idle;
                    self.in_resync = false;
                }
                SessionAction::None
            }
            SessionEvent::SyncFailed => {
                if self.state == SyncState::Syncing {
                    self.state = SyncState::Idle;
                    self.resync_due = true;
                    self.in_resync = false;
                }
                SessionAction::None
            }
            SessionEvent::Hidden => {
                if !self.visible {
                    return SessionAction::None;
                }
                self.visible = false;
                if self.state == SyncState::Disconnected {
                    return SessionAction::None;
                }
                self.state = SyncState::Idle;
                self.in_resync = false;
                SessionAction::Stop
            }
            SessionEvent::Visible => {
                if self.visible {
                    return SessionAction::None;
                }
                self.visible = true;
                self.resync_due = true;
                self.start_cycle()
            }
            SessionEvent::Disconnect => {
                let was_connected = self.state != SyncState::Disconnected;
                self.state = SyncState::Disconnected;
                self.in_resync = false;
                if was_connected {
                    SessionAction::Stop
                } else {
                    SessionAction::None
                }
            }
        }
    }

    fn start_cycle(&mut self) -> SessionAction {
        if !self.wants_tick() {
            return SessionAction::None;
        }
        self.state = SyncState::Syncing;
        if self.resync_due {
            self.resync_due = false;
            self.in_resync = true;
            SessionAction::FullResync
        } else {
            SessionAction::NextUpdates
        }
    }
}
