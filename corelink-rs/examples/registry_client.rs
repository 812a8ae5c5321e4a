//! Example: value descriptor client whose URL comes from a static registry.

use std::time::Duration;

use corelink_rs::{
    Discovery, EndpointParams, RequestContext, ValueDescriptorClient, ValueDescriptorRestClient,
    API_VALUE_DESCRIPTOR_ROUTE, CORE_DATA_SERVICE_KEY,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let monitor = Discovery::new()
        .static_slice(&[(CORE_DATA_SERVICE_KEY, "http://localhost:48080")])
        .build();
    let params = EndpointParams::new(CORE_DATA_SERVICE_KEY, API_VALUE_DESCRIPTOR_ROUTE, "")
        .use_registry(true)
        .interval(Duration::from_secs(5));
    let client = ValueDescriptorRestClient::new(params, monitor);

    let url = client.endpoint().wait_resolved().await;
    println!("core-data at {}", url);

    let ctx = RequestContext::background().with_timeout(Duration::from_secs(3));
    for vd in client.value_descriptors(&ctx).await? {
        println!("  {:<24} {}", vd.name, vd.description);
    }
    Ok(())
}
