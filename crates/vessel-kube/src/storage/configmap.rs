//! ConfigMap-backed store
//!
//! All entries live in the data section of a single ConfigMap. The ConfigMap
//! is created on first access. Every write replaces the whole object using
//! the resourceVersion that was read, so a concurrent writer makes the write
//! fail with a conflict instead of silently losing entries.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Client;
use kube::api::{Api, PostParams};
use std::collections::BTreeMap;
use tracing::debug;

use super::{KeyValueStore, REDACT_CONFIGMAP_NAME, managed_labels};
use crate::error::Result;

/// Store keeping entries in one namespaced ConfigMap
pub struct ConfigMapStore {
    client: Client,
    namespace: String,
    name: String,
}

impl ConfigMapStore {
    /// Connect with the default kubeconfig / in-cluster config
    pub async fn new(namespace: impl Into<String>) -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::with_client(client, namespace))
    }

    /// Create with an existing client
    pub fn with_client(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            name: REDACT_CONFIGMAP_NAME.to_string(),
        }
    }

    /// Use a different ConfigMap name (builder style)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn api(&self) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn empty_configmap(&self) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(managed_labels()),
                ..Default::default()
            },
            data: Some(BTreeMap::new()),
            ..Default::default()
        }
    }

    /// Fetch the ConfigMap, creating it when missing
    async fn load(&self) -> Result<ConfigMap> {
        let api = self.api();

        match api.get(&self.name).await {
            Ok(configmap) => Ok(configmap),
            Err(kube::Error::Api(e)) if e.code == 404 => {
                debug!(namespace = %self.namespace, name = %self.name, "creating configmap");
                let created = api
                    .create(&PostParams::default(), &self.empty_configmap())
                    .await?;
                Ok(created)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, configmap: &ConfigMap) -> Result<()> {
        self.api()
            .replace(&self.name, &PostParams::default(), configmap)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for ConfigMapStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let configmap = self.load().await?;
        Ok(configmap.data.and_then(|mut data| data.remove(key)))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut configmap = self.load().await?;
        configmap
            .data
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self.write(&configmap).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut configmap = self.load().await?;
        let existed = configmap
            .data
            .as_mut()
            .map(|data| data.remove(key).is_some())
            .unwrap_or(false);

        if existed {
            self.write(&configmap).await?;
        }
        Ok(existed)
    }

    async fn list_all(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.load().await?.data.unwrap_or_default())
    }

    async fn replace_all(&self, data: BTreeMap<String, String>) -> Result<()> {
        let mut configmap = self.load().await?;
        configmap.data = Some(data);
        self.write(&configmap).await
    }
}
