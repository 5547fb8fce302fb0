//! Anisette data acquisition with endpoint failover
//!
//! Anisette data is the short-lived bundle of device identifiers and a
//! timestamp that vendor device-management APIs require on every request.
//! Public providers are unreliable, so this crate walks an ordered list of
//! candidates and returns the first usable credential.
//!
//! Acquisition flow:
//! 1. `EndpointResolver::resolve()` builds the candidate list from overrides
//!    and built-in defaults
//! 2. `AnisetteFetcher::fetch()` issues one GET per candidate, in order
//! 3. `validate::validate()` rejects non-2xx and non-JSON responses
//! 4. `CredentialRecord::from_document()` extracts the ten required fields
//! 5. First success is returned; otherwise `Error::AllEndpointsFailed` lists
//!    every candidate with its reason
//! 6. Callers attach the result via `CredentialRecord::apply_to()`

pub mod constants;
pub mod endpoint;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod record;
pub mod transport;
pub mod validate;

pub use constants::*;
pub use endpoint::{Endpoint, EndpointOverrides, EndpointResolver, parse_endpoint_list};
pub use error::{EndpointError, Error, Result};
pub use fetcher::AnisetteFetcher;
pub use record::CredentialRecord;
pub use transport::{HttpTransport, RawResponse, Transport};
pub use validate::{compact_body, validate};
