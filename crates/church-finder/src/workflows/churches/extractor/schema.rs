use serde_json::{json, Map, Value};

use super::super::domain::CoreDoctrineKey;

pub const SCHEMA_NAME: &str = "church_evaluation_schema";

const SECONDARY_KEYS: [&str; 9] = [
    "baptism",
    "governance",
    "lords_supper",
    "gifts",
    "women_in_church",
    "sanctification",
    "continuity",
    "security",
    "atonement_model",
];

const TERTIARY_KEYS: [&str; 7] = [
    "eschatology",
    "worship_style",
    "counseling",
    "creation",
    "christian_liberty",
    "discipline",
    "parachurch",
];

/// JSON schema the extraction model must conform to, wrapped for `response_format`.
pub fn response_schema() -> Value {
    let core_keys: Vec<&str> = CoreDoctrineKey::ALL.iter().map(|key| key.as_str()).collect();
    let core_properties: Map<String, Value> = core_keys
        .iter()
        .map(|key| (key.to_string(), json!({ "enum": ["true", "false", "unknown"] })))
        .collect();

    json!({
        "name": SCHEMA_NAME,
        "schema": {
            "type": "object",
            "properties": {
                "church": {
                    "type": "object",
                    "properties": {
                        "name": nullable_string(),
                        "website": { "type": "string" },
                        "addresses": {
                            "type": "array",
                            "items": nullable_string_object(&[
                                "street_1", "street_2", "city", "state", "post_code", "source_url",
                            ]),
                        },
                        "contacts": nullable_string_object(&["phone", "email"]),
                        "service_times": string_array(),
                        "best_pages_for": nullable_string_object(&[
                            "beliefs", "confession", "about", "leadership",
                        ]),
                        "denomination": {
                            "type": "object",
                            "properties": {
                                "label": nullable_string(),
                                "confidence": { "type": "number" },
                                "signals": string_array(),
                            },
                            "required": ["label", "confidence", "signals"],
                            "additionalProperties": false,
                        },
                        "confession": {
                            "type": "object",
                            "properties": {
                                "adopted": { "type": "boolean" },
                                "name": nullable_string(),
                                "source_url": nullable_string(),
                            },
                            "required": ["adopted", "name", "source_url"],
                            "additionalProperties": false,
                        },
                        "core_doctrines": {
                            "type": "object",
                            "properties": core_properties,
                            "required": core_keys,
                            "additionalProperties": false,
                        },
                        "secondary": nullable_string_object(&SECONDARY_KEYS),
                        "tertiary": nullable_string_object(&TERTIARY_KEYS),
                        "badges": string_array(),
                        "notes": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "label": { "type": "string" },
                                    "text": { "type": "string" },
                                    "source_url": { "type": "string" },
                                },
                                "required": ["label", "text", "source_url"],
                                "additionalProperties": false,
                            },
                        },
                    },
                    "required": [
                        "name",
                        "website",
                        "addresses",
                        "contacts",
                        "service_times",
                        "best_pages_for",
                        "denomination",
                        "confession",
                        "core_doctrines",
                        "secondary",
                        "tertiary",
                        "badges",
                        "notes",
                    ],
                    "additionalProperties": false,
                },
            },
            "required": ["church"],
            "additionalProperties": false,
        },
    })
}

fn nullable_string() -> Value {
    json!({ "type": ["string", "null"] })
}

fn string_array() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

fn nullable_string_object(keys: &[&str]) -> Value {
    let properties: Map<String, Value> = keys
        .iter()
        .map(|key| (key.to_string(), nullable_string()))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": keys,
        "additionalProperties": false,
    })
}
