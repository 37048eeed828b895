// Feather Kernel
//
// Dataset persistence core: one storage contract, a volatile and a durable
// backend, and the startup-time selection between them.

pub mod config;
pub mod context;
pub mod dataset;
pub mod ingest;
