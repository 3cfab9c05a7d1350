//! Sluice Core
//!
//! Core library for provider plugins: the resource model, the provider trait,
//! attribute schemas and the concurrency helpers shared by CRUD handlers.

pub mod mutex_kv;
pub mod provider;
pub mod resource;
pub mod retry;
pub mod schema;
pub mod waiter;
