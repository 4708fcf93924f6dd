mod base;

pub use base::DestinationConnector;
