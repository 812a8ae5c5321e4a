//! Value descriptors: model, client trait and REST client.

use std::sync::Arc;

use async_trait::async_trait;
use corelink_core::{
    ClientError, Endpoint, EndpointParams, EndpointWatcher, HttpRequest, HttpResponse,
    HttpTransport, HyperTransport, Method, Monitor, RequestContext, WatcherHandle,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::encode_segment;

/// Metadata describing a named reading type. Decodes both camelCase and PascalCase field names.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValueDescriptor {
    #[serde(alias = "Id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(alias = "Created")]
    pub created: i64,
    #[serde(alias = "Description")]
    pub description: String,
    #[serde(alias = "Modified")]
    pub modified: i64,
    #[serde(alias = "Origin")]
    pub origin: i64,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Min", skip_serializing_if = "Value::is_null")]
    pub min: Value,
    #[serde(alias = "Max", skip_serializing_if = "Value::is_null")]
    pub max: Value,
    #[serde(alias = "DefaultValue", skip_serializing_if = "Value::is_null")]
    pub default_value: Value,
    #[serde(rename = "type", alias = "Type")]
    pub kind: String,
    #[serde(alias = "UomLabel")]
    pub uom_label: String,
    #[serde(alias = "Formatting")]
    pub formatting: String,
    #[serde(alias = "Labels")]
    pub labels: Vec<String>,
    #[serde(alias = "MediaType")]
    pub media_type: String,
    #[serde(alias = "FloatEncoding")]
    pub float_encoding: String,
}

/// Operations on the value descriptor resource. Every call takes a context for cancellation.
#[async_trait]
pub trait ValueDescriptorClient: Send + Sync {
    /// All value descriptors.
    async fn value_descriptors(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<ValueDescriptor>, ClientError>;
    async fn value_descriptor(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<ValueDescriptor, ClientError>;
    async fn value_descriptor_for_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<ValueDescriptor, ClientError>;
    async fn value_descriptors_by_label(
        &self,
        ctx: &RequestContext,
        label: &str,
    ) -> Result<Vec<ValueDescriptor>, ClientError>;
    /// Descriptors referenced by the device's profile.
    async fn value_descriptors_for_device(
        &self,
        ctx: &RequestContext,
        device_name: &str,
    ) -> Result<Vec<ValueDescriptor>, ClientError>;
    async fn value_descriptors_for_device_by_id(
        &self,
        ctx: &RequestContext,
        device_id: &str,
    ) -> Result<Vec<ValueDescriptor>, ClientError>;
    async fn value_descriptors_by_uom_label(
        &self,
        ctx: &RequestContext,
        uom_label: &str,
    ) -> Result<Vec<ValueDescriptor>, ClientError>;
    /// Create a descriptor; returns the id assigned by the service.
    async fn add(
        &self,
        ctx: &RequestContext,
        vd: &ValueDescriptor,
    ) -> Result<String, ClientError>;
    async fn update(&self, ctx: &RequestContext, vd: &ValueDescriptor) -> Result<(), ClientError>;
    async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<(), ClientError>;
    async fn delete_by_name(&self, ctx: &RequestContext, name: &str) -> Result<(), ClientError>;
}

/// REST client for value descriptors. In registry mode its URL follows the monitor;
/// otherwise `params.url` is used for the client's whole life.
pub struct ValueDescriptorRestClient {
    service_key: String,
    endpoint: Endpoint,
    transport: Arc<dyn HttpTransport>,
    watcher: Option<WatcherHandle>,
}

impl ValueDescriptorRestClient {
    /// In registry mode this spawns the endpoint watcher, so it must run inside a tokio runtime.
    pub fn new(params: EndpointParams, monitor: Arc<dyn Monitor>) -> Self {
        Self::with_transport(params, monitor, Arc::new(HyperTransport::new()))
    }

    pub fn with_transport(
        params: EndpointParams,
        monitor: Arc<dyn Monitor>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let service_key = params.service_key.clone();
        let (endpoint, watcher) = if params.use_registry {
            let endpoint = Endpoint::seeded(&params.url);
            let handle = EndpointWatcher::spawn(params, monitor, endpoint.clone());
            (endpoint, Some(handle))
        } else {
            (Endpoint::fixed(&params.url), None)
        };
        Self {
            service_key,
            endpoint,
            transport,
            watcher,
        }
    }

    /// URL requests are currently sent to.
    pub fn url(&self) -> String {
        self.endpoint.url()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Stop following the registry; the last resolved URL stays in use.
    pub fn stop_watching(&self) {
        if let Some(watcher) = &self.watcher {
            watcher.stop();
        }
    }

    /// Current URL plus encoded path segments. Fails fast while nothing is resolved.
    fn url_for(&self, segments: &[&str]) -> Result<String, ClientError> {
        let mut url = self.endpoint.url();
        if url.is_empty() {
            return Err(ClientError::Unresolved {
                service_key: self.service_key.clone(),
            });
        }
        for segment in segments {
            url.push('/');
            url.push_str(&encode_segment(segment));
        }
        Ok(url)
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        build: impl FnOnce(String) -> Result<HttpRequest, ClientError> + Send,
        segments: &[&str],
    ) -> Result<HttpResponse, ClientError> {
        ctx.run(async {
            let request = build(self.url_for(segments)?)?;
            self.transport.send(request).await?.error_for_status()
        })
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        segments: &[&str],
    ) -> Result<T, ClientError> {
        self.execute(ctx, |url| Ok(HttpRequest::get(url)), segments)
            .await?
            .json()
    }
}

#[async_trait]
impl ValueDescriptorClient for ValueDescriptorRestClient {
    async fn value_descriptors(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<ValueDescriptor>, ClientError> {
        self.get_json(ctx, &[]).await
    }

    async fn value_descriptor(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<ValueDescriptor, ClientError> {
        self.get_json(ctx, &[id]).await
    }

    async fn value_descriptor_for_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<ValueDescriptor, ClientError> {
        self.get_json(ctx, &["name", name]).await
    }

    async fn value_descriptors_by_label(
        &self,
        ctx: &RequestContext,
        label: &str,
    ) -> Result<Vec<ValueDescriptor>, ClientError> {
        self.get_json(ctx, &["label", label]).await
    }

    async fn value_descriptors_for_device(
        &self,
        ctx: &RequestContext,
        device_name: &str,
    ) -> Result<Vec<ValueDescriptor>, ClientError> {
        self.get_json(ctx, &["devicename", device_name]).await
    }

    async fn value_descriptors_for_device_by_id(
        &self,
        ctx: &RequestContext,
        device_id: &str,
    ) -> Result<Vec<ValueDescriptor>, ClientError> {
        self.get_json(ctx, &["deviceid", device_id]).await
    }

    async fn value_descriptors_by_uom_label(
        &self,
        ctx: &RequestContext,
        uom_label: &str,
    ) -> Result<Vec<ValueDescriptor>, ClientError> {
        self.get_json(ctx, &["uomlabel", uom_label]).await
    }

    async fn add(
        &self,
        ctx: &RequestContext,
        vd: &ValueDescriptor,
    ) -> Result<String, ClientError> {
        let res = self
            .execute(
                ctx,
                |url| HttpRequest::json(Method::POST, url, vd),
                &[],
            )
            .await?;
        Ok(res.text())
    }

    async fn update(&self, ctx: &RequestContext, vd: &ValueDescriptor) -> Result<(), ClientError> {
        self.execute(
            ctx,
            |url| HttpRequest::json(Method::PUT, url, vd),
            &[],
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<(), ClientError> {
        self.execute(ctx, |url| Ok(HttpRequest::delete(url)), &["id", id])
            .await?;
        Ok(())
    }

    async fn delete_by_name(&self, ctx: &RequestContext, name: &str) -> Result<(), ClientError> {
        self.execute(ctx, |url| Ok(HttpRequest::delete(url)), &["name", name])
            .await?;
        Ok(())
    }
}
