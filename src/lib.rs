//! # dpres-dl
//!
//! Traversal and retrieval client library for digital preservation
//! repositories.
//!
//! ## Design Philosophy
//!
//! dpres-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Lazy** - Traversal materializes at most one page ahead of the
//!   consumer, bounding memory and network use for arbitrarily large trees
//! - **Explicit about failure** - A small error taxonomy with a bounded,
//!   configurable retry policy; nothing is swallowed silently
//!
//! ## Quick Start
//!
//! ```no_run
//! use dpres_dl::{Config, CredentialsConfig, Session, descendants, is_asset};
//! use futures::{StreamExt, pin_mut};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         credentials: CredentialsConfig {
//!             username: "archivist".to_string(),
//!             password: "secret".to_string(),
//!             tenant: "museum".to_string(),
//!             server_address: "https://repo.example.org".to_string(),
//!         },
//!         ..Default::default()
//!     };
//!
//!     let session = Session::open(&config).await?;
//!
//!     // Walk the repository root and print the assets
//!     {
//!         let stream = descendants(&session, None);
//!         pin_mut!(stream);
//!         while let Some(entity) = stream.next().await {
//!             let entity = entity?;
//!             if is_asset(&entity) {
//!                 println!("{}  {}", entity.reference, entity.title);
//!             }
//!         }
//!     }
//!
//!     session.close();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Bitstream download with all-or-nothing visibility
pub mod download;
/// Error types
pub mod error;
/// Full metadata retrieval for single entities
pub mod fetcher;
/// Entity predicates for narrowing a traversal stream
pub mod filter;
/// Retry logic with exponential backoff
pub mod retry;
/// Authenticated session handling
pub mod session;
/// Lazy subtree enumeration
pub mod traversal;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, CredentialsConfig, NetworkConfig, QueryConfig, RetryConfig};
pub use download::download;
pub use error::{Error, Result};
pub use fetcher::fetch;
pub use filter::{is_asset, is_folder};
pub use retry::IsRetryable;
pub use session::Session;
pub use traversal::descendants;
pub use types::{ContentInfo, DownloadResult, Entity, EntityKind, EntityRef, FullEntity};
