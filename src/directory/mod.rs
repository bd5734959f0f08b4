pub mod connection;
pub mod dn;
pub mod executor;
pub mod models;

use std::future::Future;

use crate::error::Result;
use crate::status::NativeStatus;

pub use connection::LdapDirectory;
pub use executor::execute;
pub use models::*;

/// A live, authenticated directory session.
///
/// Every call is one operation against the server; implementations never
/// cache and never retry.
pub trait Directory: Send {
    /// Run one search. The server may return more than `size_limit` entries;
    /// [`execute`] enforces the cap.
    fn search(
        &mut self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<Vec<DirectoryEntry>>> + Send;

    /// Ask the server-side account status capability about `dn`.
    fn native_status(&mut self, dn: &str) -> impl Future<Output = NativeStatus> + Send;
}
