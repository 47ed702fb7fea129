pub mod query;
pub mod response;

// Re-export main types
pub use query::{ServerAddrsQuery, ServerAddrsQueryBuilder, DEFAULT_CALLER, DNS_STATE_KEY};
pub use response::{parse_dns_response, SERVER_ADDRESSES};

use std::net::IpAddr;

use crate::Result;

/// Get the DNS resolver addresses the system is currently using
///
/// Each call opens its own configuration session, so concurrent calls from
/// different threads do not share any state.
///
/// # Errors
/// Returns an error if the system configuration cannot be read, holds no DNS
/// record, or the record has no server list
pub fn server_addrs() -> Result<Vec<IpAddr>> {
    #[cfg(target_os = "macos")]
    {
        ServerAddrsQuery::new().run(&crate::macos::SystemStore::new())
    }
    #[cfg(not(target_os = "macos"))]
    {
        Err(crate::Error::unsupported_platform("system DNS configuration store"))
    }
}

/// Run [`server_addrs`] on the blocking thread pool of the current tokio runtime
///
/// # Errors
/// Returns the query's own error, or [`Error::Task`](crate::Error::Task) if
/// the blocking task panicked or was cancelled
#[cfg(feature = "async")]
pub async fn server_addrs_async() -> Result<Vec<IpAddr>> {
    tokio::task::spawn_blocking(server_addrs)
        .await
        .map_err(|e| crate::Error::Task(e.to_string()))?
}
