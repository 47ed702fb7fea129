#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Sysresolv
//!
//! Find out which DNS resolver addresses the host operating system is using.
//!
//! On macOS the resolver list is not kept in a readable file: it lives in the
//! SystemConfiguration dynamic store under `State:/Network/Global/DNS`. This
//! crate opens a session on that store, walks the CoreFoundation objects it
//! returns and reduces them to a list of [`IpAddr`](std::net::IpAddr)s.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! let servers = sysresolv::server_addrs()?;
//! for server in servers {
//!     println!("nameserver {server}");
//! }
//! # Ok::<(), sysresolv::Error>(())
//! ```
//!
//! The same query runs against any [`DynamicStore`], including the
//! in-process [`MemoryStore`]:
//!
//! ```rust
//! use sysresolv::{MemoryStore, ServerAddrsQuery, DNS_STATE_KEY};
//!
//! let store = MemoryStore::with_server_addresses(DNS_STATE_KEY, &["1.1.1.1", "bogus"]);
//! let servers = ServerAddrsQuery::new().run(&store)?;
//! assert_eq!(servers, vec!["1.1.1.1".parse::<std::net::IpAddr>().unwrap()]);
//! # Ok::<(), sysresolv::Error>(())
//! ```
//!
//! ## Features
//!
//! - `async` - `server_addrs_async`, running the query on tokio's blocking pool
//! - `serde-support` - serialization support for [`Value`]

mod error;
mod types;

pub mod dns;
pub mod foreign;
pub mod memory;

pub use error::{Error, Result};
pub use types::Value;

pub use dns::{
    parse_dns_response, server_addrs, ServerAddrsQuery, ServerAddrsQueryBuilder, DEFAULT_CALLER,
    DNS_STATE_KEY, SERVER_ADDRESSES,
};
pub use foreign::{
    Allocator, Borrowed, DynamicStore, ForeignKind, ForeignRuntime, Notify, Owned, SessionOptions,
};
pub use memory::MemoryStore;

#[cfg(feature = "async")]
pub use dns::server_addrs_async;

/// Platform-specific implementation details
#[cfg(target_os = "macos")]
mod macos;

/// Platform-specific types
#[cfg(target_os = "macos")]
pub use macos::SystemStore;
