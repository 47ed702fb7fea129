use std::net::IpAddr;

use super::response::parse_dns_response;
use crate::foreign::{convert_record, DynamicStore, Owned, SessionOptions};
use crate::{Error, Result};

/// Name the session is opened under unless configured otherwise
pub const DEFAULT_CALLER: &str = "io.sysresolv.resolver";

/// Dynamic store key holding the global DNS configuration
pub const DNS_STATE_KEY: &str = "State:/Network/Global/DNS";

/// A one-shot query for the resolver addresses in a configuration store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddrsQuery {
    caller: String,
    key: String,
    options: SessionOptions,
}

impl Default for ServerAddrsQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerAddrsQuery {
    /// Create a query for the global DNS configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            caller: DEFAULT_CALLER.to_string(),
            key: DNS_STATE_KEY.to_string(),
            options: SessionOptions::default(),
        }
    }

    /// Create a builder for configuring the query
    #[must_use]
    pub fn builder() -> ServerAddrsQueryBuilder {
        ServerAddrsQueryBuilder::new()
    }

    #[must_use]
    pub fn caller(&self) -> &str {
        &self.caller
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Open a session on `store`, fetch the DNS record and extract its
    /// resolver addresses
    ///
    /// Every reference acquired along the way is released before returning,
    /// whichever stage fails.
    ///
    /// # Errors
    /// Returns the first error from building the request strings, opening
    /// the session, fetching, converting or parsing the record
    pub fn run<S: DynamicStore + ?Sized>(&self, store: &S) -> Result<Vec<IpAddr>> {
        let caller = Owned::text(store, &self.caller)?;
        let key = Owned::text(store, &self.key)?;

        // SAFETY: `caller` and `key` outlive both calls, and each returned
        // ref is owned by us and wrapped exactly once
        let session = unsafe {
            let raw = store.open_session(caller.as_raw(), &self.options)?;
            Owned::from_raw(store, raw)
        };
        log::debug!("opened configuration session as {:?}", self.caller);

        let value = match unsafe { store.copy_value(session.as_raw(), key.as_raw()) } {
            Ok(Some(raw)) => unsafe { Owned::from_raw(store, raw) },
            Ok(None) => return Err(Error::missing_record(&self.key)),
            Err(e) => {
                log::warn!("failed to fetch {:?}: {e}", self.key);
                return Err(e);
            }
        };

        let record = convert_record(value.borrow(), &self.key)?;
        let addrs = parse_dns_response(&record)?;
        log::debug!("{} resolver address(es) under {:?}", addrs.len(), self.key);
        Ok(addrs)
    }
}

/// Builder for configuring a [`ServerAddrsQuery`]
#[derive(Debug, Clone, Default)]
pub struct ServerAddrsQueryBuilder {
    query: ServerAddrsQuery,
}

impl ServerAddrsQueryBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            query: ServerAddrsQuery::new(),
        }
    }

    /// Set the name the session is opened under
    #[must_use]
    pub fn caller(mut self, caller: impl Into<String>) -> Self {
        self.query.caller = caller.into();
        self
    }

    /// Set the store key to read
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.query.key = key.into();
        self
    }

    /// Set the session parameters
    #[must_use]
    pub const fn options(mut self, options: SessionOptions) -> Self {
        self.query.options = options;
        self
    }

    /// Build the query
    #[must_use]
    pub fn build(self) -> ServerAddrsQuery {
        self.query
    }
}
