//! Interaction state store
//!
//! Holds what the user sees (shaking, loading, question, response) and the
//! actions that mutate it. Render and input code depend on an injected
//! [`OracleStore`] handle; there is no global.

pub mod fallback;
pub mod state;
pub mod store;

pub use fallback::{CLIENT_FALLBACKS, FallbackPool, ORACLE_FALLBACKS};
pub use state::{InteractionState, Mode};
pub use store::{FetchTicket, OracleStore, SubscriptionId};
