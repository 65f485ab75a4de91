//! Keeping the local cache in step with the server

mod driver;
mod poll;
mod push;
mod session;
mod strategy;
mod subscribe;
#[cfg(test)]
mod test_support;

pub use driver::{DriverCommand, SyncDriver, SyncHandle};
pub use poll::PollStrategy;
pub use push::PushStrategy;
pub use session::{SessionAction, SessionEvent, SyncSession, SyncState};
pub use strategy::{Change, SyncStrategy, SyncUpdate};
pub use subscribe::SubscribeStrategy;

use crate::cache::TicketClock;
use crate::config::{ClientConfig, StrategyKind};
use crate::http::LikesClient;

/// Build the strategy named in the configuration
pub fn build_strategy(
    config: &ClientConfig,
    client: LikesClient,
    clock: TicketClock,
) -> Box<dyn SyncStrategy> {
    match config.strategy {
        StrategyKind::Poll => Box::new(PollStrategy::new(client, clock, config.poll_interval)),
        StrategyKind::Push => Box::new(PushStrategy::new(client, clock, config.poll_interval)),
        StrategyKind::Subscribe => {
            Box::new(SubscribeStrategy::new(client, clock, config.poll_interval))
        }
    }
}
