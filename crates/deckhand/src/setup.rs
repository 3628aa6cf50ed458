//! Bootstrap helpers: the stock handler factory and the log subscriber.

use deckhand_lottery::{LotteryConfig, LotteryHandler};
use deckhand_room::HandlerFactory;
use deckhand_uno::{UnoConfig, UnoHandler};
use tracing_subscriber::EnvFilter;

use crate::DeckhandError;

/// Game key for UNO rooms.
pub const UNO: &str = "uno";

/// Game key for lottery rooms.
pub const LOTTERY: &str = "lottery";

/// A factory with every bundled game registered under its stock config.
///
/// Each room gets a freshly seeded handler from the OS entropy source.
pub fn default_factory() -> Result<HandlerFactory, DeckhandError> {
    factory_with(UnoConfig::default(), LotteryConfig::default())
}

/// Like [`default_factory`], with explicit per-game configuration.
pub fn factory_with(
    uno: UnoConfig,
    lottery: LotteryConfig,
) -> Result<HandlerFactory, DeckhandError> {
    let mut factory = HandlerFactory::new();
    factory
        .register(UNO, move |_room| UnoHandler::new(uno.clone()))?
        .register(LOTTERY, move |_room| LotteryHandler::new(lottery.clone()))?;
    tracing::debug!(games = ?factory.game_keys(), "handler factory ready");
    Ok(factory)
}

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Falls back to `info` when `RUST_LOG` is unset or unparsable. Calling it
/// twice is harmless; the second call leaves the first subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
