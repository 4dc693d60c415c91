mod builder;
mod delivery;
mod request;
mod source;

pub use builder::{ListingTicket, QueryBuilder, normalize_page};
#[cfg(feature = "http")]
pub use delivery::HttpListingSource;
pub use delivery::DeliveryApi;
pub use request::{QueryRequest, QueryResult, SortBy, SortDirection};
pub use source::{ListingSource, MemorySource, RemotePage, RemoteQuery};
