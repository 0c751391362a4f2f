//! Discord plumbing: the `ChatPlatform` seam the workflow talks to, its REST
//! implementation, the gateway event stream and the session readiness flag.

pub mod gateway;
pub mod platform;
pub mod rest;
pub mod session;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use platform::{ChatPlatform, PlatformError};
pub use rest::DiscordHttp;
pub use session::{BotIdentity, SessionState};
