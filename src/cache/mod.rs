//! URL-keyed content caching: digest keys, the flat disk store, the
//! fetch worker, and the coordinator that ties them together.

pub mod content;
pub mod key;
pub mod store;
pub mod transport;
pub mod worker;

pub use content::{CacheReport, CacheTicket, CachedContent, ContentCache};
pub use key::ContentKey;
pub use store::{CacheRoot, ContentStore};
pub use transport::{ContentTransport, HttpTransport};
pub use worker::{FetchCallback, FetchTask, FetchWorker};

use std::collections::HashSet;

use url::Url;

/// The distinct URLs named by one cache request.
pub type UrlSet = HashSet<Url>;
