//! Collaborator traits
//!
//! This module defines the interfaces equipzone needs from the outside world.
//!
//! - [`Transport`]: Name resolution, zone transfer and signed update exchange
//! - [`RemoteFetch`]: Retrieval of pre-built inventory snapshots

pub mod remote_fetch;
pub mod transport;

pub use remote_fetch::{RemoteFetch, RemoteFetchFactory};
pub use transport::{
    Query, Rcode, Response, Transport, TransportFactory, TsigAlgorithm, TsigKey, UpdateMessage,
    UpdateOp,
};
