mod base;
mod none;

pub use base::SourceConnector;
pub use none::NoSource;
