//! Service keys and routes of the core services.

/// Registry key of the core-data service.
pub const CORE_DATA_SERVICE_KEY: &str = "edgex-core-data";

pub const API_VALUE_DESCRIPTOR_ROUTE: &str = "/api/v1/valuedescriptor";

