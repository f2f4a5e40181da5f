//! Storage provider implementations.

mod local_disk;

pub use local_disk::{LocalDiskProvider, ObjectMeta};
