//! Portal-facing pipeline stages: session, login, page fetch, extraction,
//! and unit normalization. Everything vendor-specific funnels through
//! `constants`.

mod auth;
mod client;
pub mod constants;
mod extract;
mod normalize;
mod session;

pub use auth::{Authenticator, BrowserLoginStrategy, DirectLoginStrategy, LoginStrategy};
pub use client::PortalClient;
pub use extract::{Extractor, RawFigures};
pub use normalize::{normalize, Normalized, KWH_PER_THERM};
pub use session::Session;
