use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A label the check-in server asks the kiosk to print
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckinLabel {
    pub file_guid: String,
    pub label_file: String,
    pub label_key: String,
    pub label_type: i32,
    #[serde(default)]
    pub merge_fields: BTreeMap<String, String>,
    pub order: i32,
    pub person_id: i64,
    pub print_from: i32,
    pub print_to: i32,
    pub printer_address: String,
    pub printer_device_id: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelPayload {
    Many(Vec<CheckinLabel>),
    One(CheckinLabel),
}

/// Parse a scanned payload into labels, in print order
///
/// Accepts either a JSON array of labels or a single label object.
pub fn parse_labels(payload: &str) -> Result<Vec<CheckinLabel>> {
    let parsed: LabelPayload =
        serde_json::from_str(payload.trim()).context("Payload is not a check-in label list")?;

    let mut labels = match parsed {
        LabelPayload::Many(labels) => labels,
        LabelPayload::One(label) => vec![label],
    };
    labels.sort_by_key(|l| l.order);
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn label_json(key: &str, order: i32) -> String {
        format!(
            r#"{{
                "FileGuid": "6c0b5a10", "LabelFile": "/labels/{key}.zpl", "LabelKey": "{key}",
                "LabelType": 1, "MergeFields": {{"NickName": "Sam"}}, "Order": {order},
                "PersonId": 42, "PrintFrom": 0, "PrintTo": 1,
                "PrinterAddress": "10.0.0.5", "PrinterDeviceId": 7
            }}"#
        )
    }

    #[test]
    fn test_parse_list_sorted_by_order() {
        let payload = format!("[{}, {}]", label_json("parent", 2), label_json("child", 1));
        let labels = parse_labels(&payload).unwrap();

        let keys: Vec<_> = labels.iter().map(|l| l.label_key.as_str()).collect();
        assert_eq!(keys, vec!["child", "parent"]);
        assert_eq!(labels[0].merge_fields.get("NickName").map(String::as_str), Some("Sam"));
    }

    #[test]
    fn test_parse_single_label() {
        let labels = parse_labels(&label_json("child", 1)).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].printer_device_id, 7);
    }

    #[test]
    fn test_plain_code_is_not_labels() {
        assert!(parse_labels("family-42").is_err());
    }
}
