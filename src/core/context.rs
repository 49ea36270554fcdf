//! Runtime container records supplied by the record source.
//!
//! Field names follow the wire format consumed by templates (`ID`, `Env`,
//! `Labels`, ...). Missing fields default, so partial records deserialize.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::Result;
use crate::query::{Labeled, Record, Result as QueryResult};

/// A port binding of a container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Address {
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "IP6LinkLocal")]
    pub ip6_link_local: String,
    #[serde(rename = "IP6Global")]
    pub ip6_global: String,
    pub port: String,
    pub host_port: String,
    pub proto: String,
    #[serde(rename = "HostIP")]
    pub host_ip: String,
}

/// A network the container is attached to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Network {
    pub name: String,
    #[serde(rename = "IP")]
    pub ip: String,
    pub gateway: String,
    pub mac_address: String,
}

/// A volume mounted into the container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Mount {
    pub name: String,
    pub source: String,
    pub destination: String,
    pub driver: String,
    pub mode: String,
    #[serde(rename = "RW")]
    pub rw: bool,
}

/// Image reference of the container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DockerImage {
    pub registry: String,
    pub repository: String,
    pub tag: String,
}

/// Liveness of the container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct State {
    pub running: bool,
}

/// Runtime metadata of one container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RuntimeContainer {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub hostname: String,
    pub image: DockerImage,
    #[serde(rename = "IP")]
    pub ip: String,
    pub gateway: String,
    pub addresses: Vec<Address>,
    pub networks: Vec<Network>,
    pub mounts: Vec<Mount>,
    pub env: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub state: State,
}

impl RuntimeContainer {
    /// Parses a JSON array of containers
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(text)?)
    }

    /// Addresses bound to a host port
    pub fn published_addresses(&self) -> Vec<&Address> {
        self.addresses
            .iter()
            .filter(|address| !address.host_port.is_empty())
            .collect()
    }

    /// The container as a template value, including `PublishedAddresses`.
    pub fn to_template_value(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "PublishedAddresses".to_string(),
                serde_json::to_value(self.published_addresses()).unwrap_or_default(),
            );
        }
        value
    }
}

fn string_map(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

impl Record for RuntimeContainer {
    fn attribute(&self, name: &str) -> Option<Cow<'_, Value>> {
        let value = match name {
            "ID" => Value::from(self.id.as_str()),
            "Name" => Value::from(self.name.as_str()),
            "Hostname" => Value::from(self.hostname.as_str()),
            "IP" => Value::from(self.ip.as_str()),
            "Gateway" => Value::from(self.gateway.as_str()),
            "Env" => string_map(&self.env),
            "Labels" => string_map(&self.labels),
            "PublishedAddresses" => serde_json::to_value(self.published_addresses()).ok()?,
            _ => serde_json::to_value(self)
                .ok()?
                .as_object_mut()?
                .remove(name)?,
        };
        Some(Cow::Owned(value))
    }

    fn as_value(&self) -> Option<Cow<'_, Value>> {
        Some(Cow::Owned(self.to_template_value()))
    }
}

impl Labeled for RuntimeContainer {
    fn label(&self, _func: &'static str, label: &str) -> QueryResult<Option<&str>> {
        Ok(self.labels.get(label).map(String::as_str))
    }
}
