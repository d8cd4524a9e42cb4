//! Bulls and Cows match server library
//!
//! Runs two-player code-breaking matches over a REST interface. Each player
//! picks a secret four-symbol code, then both take turns guessing the
//! other's code until one guess matches exactly.
//!
//! # Architecture
//!
//! - **Core** (`bulls_cows_core`): codes, scoring and the match rules
//! - **Service**: runs commands against stored matches, one at a time per room
//! - **Store**: the repository port and an in-memory adapter with expiry
//! - **Server**: axum routes, request decoding and error mapping
//! - **Config**: defaults, TOML file and environment overrides
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bulls_cows::{
//!     CodeRules, InMemoryMatchStore, MatchService, ServerConfig, router, with_http_policy,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = Arc::new(MatchService::new(
//!     InMemoryMatchStore::default(),
//!     CodeRules::default(),
//! ));
//! let app = with_http_policy(router(service), &ServerConfig::default());
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod error;
mod server;
mod service;
mod store;

// Crate-level exports - Configuration
pub use config::{
    ConfigError, ENV_ADDR, ENV_ALLOWED_HOST, ENV_ALPHABET, ENV_GRACEFUL_TIMEOUT,
    ENV_PURGE_INTERVAL, ENV_REQUEST_TIMEOUT, ENV_ROOM_TTL, MAX_ROOM_TTL_SECS, ServerConfig,
};

// Crate-level exports - Errors
pub use error::{ErrorKind, ServiceError};

// Crate-level exports - Transport
pub use server::{
    API_PREFIX, Acknowledgement, ApiError, CORS_MAX_AGE, CombinationRequest, GuessRequest,
    MAX_USERNAME_CHARS, UsernameRequest, cors_layer, router, status_for, with_http_policy,
};

// Crate-level exports - Service
pub use service::{GameStarted, GuessOutcome, MatchService, MatchView, RoomLocks, RoomTicket};

// Crate-level exports - Storage
pub use store::{DEFAULT_ROOM_TTL_SECS, Field, InMemoryMatchStore, MatchRepository, RepositoryError};

// Crate-level exports - Core game types
pub use bulls_cows_core::{
    Alphabet, CODE_LENGTH, Classification, Code, CodeError, CodeRules, GuessHistory, GuessResult,
    Match, MatchError, MatchSetup, MatchStatus, Player, PlayerId, Players, RoomId, Secrets,
    SymbolMark, evaluate,
};
