//! Clients of the core-data service.

mod value_descriptor;

pub use value_descriptor::{ValueDescriptor, ValueDescriptorClient, ValueDescriptorRestClient};
