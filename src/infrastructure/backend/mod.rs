//! Cache backend implementations.

mod mirror_backend;

pub use mirror_backend::{MirrorBackend, MirrorSettings};
