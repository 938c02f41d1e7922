//! townhall_state - client state for live Q&A sessions
//!
//! Pure state layer of the townhall client. It has no network or terminal
//! dependencies: reducers take the current state and an [`Action`], mutate
//! the state and return the [`Effect`]s the runtime should perform.
//!
//! ```
//! use townhall_state::{Action, AppState, Effect, SessionAction, reduce};
//! use townhall_state::protocol::ServerMessage;
//!
//! let mut state = AppState::default();
//! let effects = reduce(
//!     &mut state,
//!     SessionAction::Create { topic: "Rust AMA".into(), name: "Ferris".into() }.into(),
//! );
//! assert!(matches!(effects.last(), Some(Effect::CreateSession { .. })));
//!
//! let msg = ServerMessage::parse(r#"{"tag":"SessionLocked"}"#).unwrap();
//! reduce(&mut state, Action::Session(msg.into()));
//! assert!(state.session.locked);
//! ```

pub mod app;
pub mod dashboard;
mod effect;
mod error;
pub mod protocol;
pub mod session;

pub use app::{Action, AppState, Route, reduce};
pub use dashboard::{DashboardAction, DashboardState};
pub use effect::Effect;
pub use error::ProtocolError;
pub use session::{Me, Role, SessionAction, SessionState, SocketStatus};
