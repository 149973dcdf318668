//! Core domain for the Integron activity hub: canonical event types, the
//! in-process event bus, the bounded event buffer, the ingestion pipeline,
//! upstream source adapters, and the SQLite-backed store.

pub mod events;
pub mod session;
pub mod sources;
pub mod store;
pub mod users;
