//! # Provider Document Model
//!
//! Typed view of a configuration document. Built from a document that has
//! already passed validation; the conversion itself only checks what serde
//! checks, so feeding it an unvalidated tree gives weaker guarantees.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::CoreError;
use crate::identity::Identification;
use crate::version::SchemaVersion;

/// Root of a provider configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Document metadata.
    pub meta: Meta,
    /// Provider entries in document order.
    pub providers: Vec<ProviderEntry>,
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Version of the schema the document was written against.
    pub schema_version: SchemaVersion,
}

/// Configuration for one resource provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Which provider this entry applies to.
    pub identification: Identification,
    /// Inventory records keyed by resource class.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inventories: BTreeMap<String, InventoryRecord>,
    /// Trait flags keyed by trait name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub traits: BTreeMap<String, bool>,
}

/// Capacity declared for one resource class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    #[serde(deserialize_with = "whole_number")]
    pub total: u64,
    #[serde(
        default,
        deserialize_with = "optional_whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub reserved: Option<u64>,
    #[serde(
        default,
        deserialize_with = "optional_whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_unit: Option<u64>,
    #[serde(
        default,
        deserialize_with = "optional_whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_unit: Option<u64>,
    #[serde(
        default,
        deserialize_with = "optional_whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub step_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation_ratio: Option<f64>,
}

/// Integer fields accept any non-negative number with no fractional part,
/// so `8.0` reads as `8`.
fn number_to_u64(number: &Number) -> Option<u64> {
    number.as_u64().or_else(|| {
        number
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f < u64::MAX as f64)
            .map(|f| f as u64)
    })
}

fn whole_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    number_to_u64(&number)
        .ok_or_else(|| de::Error::custom(format!("{number} is not a non-negative integer")))
}

fn optional_whole_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Number>::deserialize(deserializer)?
        .map(|number| {
            number_to_u64(&number)
                .ok_or_else(|| de::Error::custom(format!("{number} is not a non-negative integer")))
        })
        .transpose()
}

impl ConfigDocument {
    /// Build the typed model from a generic document tree.
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Find the entry identified by `name`.
    pub fn provider_by_name(&self, name: &str) -> Option<&ProviderEntry> {
        self.providers
            .iter()
            .find(|p| p.identification.name() == Some(name))
    }

    /// Find the entry identified by `uuid`, comparing normalized UUIDs.
    pub fn provider_by_uuid(&self, uuid: &uuid::Uuid) -> Option<&ProviderEntry> {
        self.providers
            .iter()
            .find(|p| p.identification.as_uuid().as_ref() == Some(uuid))
    }
}

impl ProviderEntry {
    /// Trait names set to `true`, in sorted order.
    pub fn enabled_traits(&self) -> impl Iterator<Item = &str> {
        self.traits
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
    }
}
