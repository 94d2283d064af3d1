//! # pathyvo
//!
//! Terminal client for the Pathyvo career-mentoring backend.
//!
//! - [`client`]: typed HTTP client with bearer auth and the 401 sign-out policy
//! - [`view`]: roadmap view controller (derive, gate, mutate, re-fetch)
//! - [`config`] / [`session`]: layered settings and the stored login
//! - [`cli`]: clap commands

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod view;

pub use client::ApiClient;
pub use config::Config;
pub use error::{AppError, ClientError, ConfigError, SessionError};
pub use session::SessionStore;
pub use view::{RoadmapApi, RoadmapView};
