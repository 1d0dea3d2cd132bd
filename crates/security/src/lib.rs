//! Security module for Shoplist: PIN authentication and session management.
//!
//! Provides:
//! - **Sessions**: Opaque tokens with sliding 24h expiration
//! - **Auth gate**: Constant-time PIN check and per-request Admit/Deny decisions

pub mod gate;
pub mod session;

pub use gate::{AuthGate, Decision};
pub use session::{DEFAULT_SESSION_TTL_HOURS, SessionStore};
