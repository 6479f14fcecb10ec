//! Integration test: the typed provider model over realistic documents.

use provcfg_core::{
    ConfigDocument, DocumentPath, FailureKind, Identification, SchemaVersion, ValidationFailure,
};
use serde_json::json;

fn sample() -> serde_json::Value {
    json!({
        "meta": {"schema_version": "1.3"},
        "providers": [
            {
                "identification": {"name": "compute-01"},
                "inventories": {
                    "VCPU": {"total": 64, "reserved": 4, "allocation_ratio": 4.0},
                    "CUSTOM_FPGA": {"total": 2, "step_size": 1}
                },
                "traits": {"CUSTOM_GOLD": true, "CUSTOM_DEPRECATED": false}
            },
            {"identification": {"uuid": "{5A4B8E0C-3F5D-4B6E-9A1C-2D3E4F5A6B7C}"}}
        ]
    })
}

#[test]
fn test_model_from_document() {
    let doc = ConfigDocument::from_value(&sample()).unwrap();
    assert_eq!(doc.meta.schema_version, SchemaVersion::new(1, 3));
    assert_eq!(doc.providers.len(), 2);

    let node = doc.provider_by_name("compute-01").unwrap();
    assert_eq!(node.inventories["VCPU"].allocation_ratio, Some(4.0));
    assert_eq!(node.inventories["CUSTOM_FPGA"].reserved, None);
    assert_eq!(node.enabled_traits().collect::<Vec<_>>(), ["CUSTOM_GOLD"]);
}

#[test]
fn test_lookup_by_any_uuid_rendering() {
    let doc = ConfigDocument::from_value(&sample()).unwrap();
    let id = uuid::Uuid::parse_str("5a4b8e0c-3f5d-4b6e-9a1c-2d3e4f5a6b7c").unwrap();
    let entry = doc.provider_by_uuid(&id).unwrap();
    assert!(matches!(entry.identification, Identification::Uuid(_)));
    assert!(entry.inventories.is_empty());
}

#[test]
fn test_model_serializes_back_without_empty_sections() {
    let doc = ConfigDocument::from_value(&sample()).unwrap();
    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["meta"]["schema_version"], "1.3");
    assert!(value["providers"][1].get("inventories").is_none());
    assert_eq!(ConfigDocument::from_value(&value).unwrap(), doc);
}

#[test]
fn test_failure_path_resolves_into_document() {
    let document = sample();
    let path = DocumentPath::root()
        .key("providers")
        .index(0)
        .key("inventories")
        .key("CUSTOM_FPGA");
    let failure =
        ValidationFailure::new(FailureKind::SubSchemaInvalid, path, "step_size: too small");

    assert_eq!(failure.path.resolve(&document), Some(&json!({"total": 2, "step_size": 1})));
    let rendered = serde_json::to_value(&failure).unwrap();
    assert_eq!(rendered["kind"], "sub_schema_invalid");
    assert_eq!(rendered["path"], "/providers/0/inventories/CUSTOM_FPGA");
}
