//! Core type definitions using newtype patterns for type safety.

mod session_id;
mod window;

pub use session_id::{SessionId, SessionIdError};
pub use window::{SearchWindow, PORTAL_DATE_FORMAT};
