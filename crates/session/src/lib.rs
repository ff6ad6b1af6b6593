//! `claimdesk-session`: session persistence and the token-refresh guard.
//!
//! **Responsibility:** keep protected views and API calls running on a valid
//! access token, refreshing it transparently (one refresh in flight at a time)
//! and forcing re-authentication when refreshing is impossible.

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod refresh;
pub mod session;
pub mod store;

pub use client::{ApiClient, ClientError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, SessionConfig};
pub use error::{SessionError, StoreError};
pub use guard::{Attempt, SessionGuard, SessionState};
pub use refresh::{HttpTokenRefresher, RefreshError, RefreshedToken, TokenRefresher};
pub use session::Session;
pub use store::{FileSessionStore, InMemorySessionStore, SessionStore};
