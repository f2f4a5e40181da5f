//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod api_reference;
pub mod health;
pub mod ping;
pub mod purge;
pub mod redirect;

pub use api_reference::api_reference_handler;
pub use health::health_handler;
pub use ping::ping_handler;
pub use purge::purge_handler;
pub use redirect::redirect_handler;
