//! [`ResourceEnvironment`] backed by HTTP fetches.

use crate::descriptor::{ResourceDescriptor, ResourceHandle};
use crate::environment::ResourceEnvironment;
use crate::error::EnvironmentError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A fetched resource body, kept for as long as the resource stays attached.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    /// The descriptor the asset was fetched for.
    pub descriptor: ResourceDescriptor,
    /// The `Content-Type` reported by the server, if any.
    pub content_type: Option<String>,
    /// The response body.
    pub body: Vec<u8>,
}

/// Environment that fetches every injected resource over HTTP.
///
/// A resource counts as loaded once its body has been downloaded with a 2xx
/// status. The body is kept as an attached asset until the resource is detached.
pub struct HttpEnvironment {
    client: reqwest::Client,
    assets: Mutex<HashMap<ResourceHandle, FetchedAsset>>,
}

impl core::fmt::Debug for HttpEnvironment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpEnvironment")
            .field("assets", &self.assets.lock().len())
            .finish_non_exhaustive()
    }
}

impl Default for HttpEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpEnvironment {
    /// Creates an environment with a default HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Creates an environment using the given HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            assets: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the asset fetched for `handle`, if it is still attached.
    #[must_use]
    pub fn asset(&self, handle: &ResourceHandle) -> Option<FetchedAsset> {
        self.assets.lock().get(handle).cloned()
    }

    /// Returns the number of attached assets.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.assets.lock().len()
    }
}

#[async_trait]
impl ResourceEnvironment for HttpEnvironment {
    async fn inject(&self, descriptor: &ResourceDescriptor) -> Result<(), EnvironmentError> {
        let response = self
            .client
            .get(descriptor.locator().clone())
            .send()
            .await
            .map_err(|err| EnvironmentError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnvironmentError::Status {
                status: status.as_u16(),
                locator: descriptor.locator().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|err| EnvironmentError::Network(err.to_string()))?
            .to_vec();

        tracing::debug!(
            resource = %descriptor.name(),
            kind = %descriptor.kind(),
            bytes = body.len(),
            "fetched external resource"
        );

        self.assets.lock().insert(
            descriptor.identity().clone(),
            FetchedAsset {
                descriptor: descriptor.clone(),
                content_type,
                body,
            },
        );
        Ok(())
    }

    fn detach(&self, descriptor: &ResourceDescriptor) {
        self.assets.lock().remove(descriptor.identity());
    }
}
