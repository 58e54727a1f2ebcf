//! PubChem REST client

pub mod client;
#[cfg(test)]
pub(crate) mod mock;
pub mod request;
pub mod transport;

pub use client::PubChemClient;
pub use request::{HttpMethod, PubChemRequest, Service};
pub use transport::{HttpTransport, Payload, PubChemTransport};
