// # equipzone-core
//
// Core library for an equipment inventory kept in authoritative DNS zones.
//
// ## Architecture Overview
//
// Every device is published as ordinary resource records: an address record
// naming it, CNAME aliases, PTR records in the reverse zones, and TXT, HINFO
// and LOC records describing its place, model, code and position.
//
// - **GeoCodec** (`geo`): RFC 1876 fixed-point location encoding
// - **RecordProjector** (`record`): Device -> descriptive record set
// - **InventoryBuilder** (`builder`): zone transfers -> sorted Inventory
// - **Reconciler** (`reconcile`): two Device snapshots -> signed mutations
// - **DirectoryService** (`directory`): server resolution and signed transactions
// - **Transport** / **RemoteFetch** (`traits`): collaborators plugged in via the `Registry`
//
// ## Design Principles
//
// 1. **Closed record model**: unknown record kinds are matched and skipped, never guessed at
// 2. **All or nothing builds**: a failed transfer discards the whole inventory
// 3. **Idempotent reconciliation**: re-running only issues the remaining differences
// 4. **Library-First**: the binary is a thin shell over this crate

pub mod builder;
pub mod config;
pub mod device;
pub mod directory;
pub mod error;
pub mod geo;
pub mod inventory;
pub mod reconcile;
pub mod record;
pub mod registry;
pub mod traits;
pub mod transport;

// Re-export core types for convenience
pub use builder::InventoryBuilder;
pub use config::{DirectoryConfig, InventorySourceConfig, ReconcileConfig, TsigConfig, ZoneConfig};
pub use device::Device;
pub use directory::DirectoryService;
pub use error::{Error, Result};
pub use inventory::Inventory;
pub use reconcile::{ReconcileReport, Reconciler, private_zone};
pub use record::{Record, RecordData, RecordProjector, RecordType};
pub use registry::Registry;
pub use traits::{RemoteFetch, RemoteFetchFactory, Transport, TransportFactory, TsigKey};
pub use transport::MemoryTransport;
