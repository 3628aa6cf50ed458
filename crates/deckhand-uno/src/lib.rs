//! UNO for Deckhand.
//!
//! The crate has two layers:
//!
//! - [`rules`]: deck construction, dealing, the first-card rule, the
//!   legality check, card effects and wild-draw-4 adjudication, all as
//!   functions over [`UnoState`].
//! - [`UnoHandler`]: the [`GameHandler`](deckhand_room::GameHandler) that
//!   owns the state, runs the turn policy, the wild-draw-4 challenge and
//!   the UNO call-out protocol, and queues [`UnoEvent`]s for the room.
//!
//! ```rust,ignore
//! let mut factory = HandlerFactory::new();
//! factory.register("uno", |_room| UnoHandler::new(UnoConfig::default()))?;
//! ```

mod card;
mod config;
mod error;
mod events;
mod handler;
pub mod rules;
mod state;

pub use card::{Card, CardId, CardKind, Color};
pub use config::UnoConfig;
pub use error::{ActionError, InvariantViolation};
pub use events::UnoEvent;
pub use handler::{
    AcceptOutcome, CallOutOutcome, ChallengeOutcome, DeclareOutcome,
    DrawOutcome, PlayOutcome, UnoAction, UnoHandler, UnoSuccess,
};
pub use rules::DECK_SIZE;
pub use state::{
    PublicChallenge, PublicPlayer, PublicUno, UnoDeclaration, UnoPublicState,
    UnoState, Wild4Challenge,
};
