mod base;

pub use base::{ObjectStoreConnector, object_url};
