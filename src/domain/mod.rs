//! Domain layer: core types and the contracts infrastructure implements.
//!
//! # Architecture
//!
//! - [`backend_id`] - Routing key of a cache backend
//! - [`fill_status`] - Tri-state outcome of a cache fill
//! - [`storage_provider`] - Capability contract of a storage backend
//! - [`cache_backend`] - Contract the request path consumes
//! - [`status_store`] - Fill progress bookkeeping
//! - [`fill_job`] - Queue item for asynchronous population
//! - [`fill_worker`] - Background worker that performs fills
//!
//! # Fill Flow
//!
//! 1. A redirect request asks a [`cache_backend::CacheBackend`] for a URL
//! 2. On first sight the backend claims a pending entry and queues a [`fill_job::FillJob`]
//! 3. [`fill_worker::run_fill_worker`] copies the content through a [`storage_provider::StorageProvider`]
//! 4. The outcome lands in the [`status_store::FillStatusStore`], where the next poll sees it

pub mod backend_id;
pub mod cache_backend;
pub mod fill_job;
pub mod fill_status;
pub mod fill_worker;
pub mod status_store;
pub mod storage_provider;
