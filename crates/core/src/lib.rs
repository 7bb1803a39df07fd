//! Cadence core types: session model, session storage and settings

pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod types;

pub use config::{ApiSettings, Settings};
pub use error::{CoreError, CoreResult};
pub use events::{EndReason, SessionEvent, SessionEvents};
pub use session::{FileSessionStore, MemorySessionStore, SessionManager, SessionStore};
pub use types::{Role, Session, User};
