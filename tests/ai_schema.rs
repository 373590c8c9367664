// Schema validation tests for the AI endpoint wire contracts
//
// These tests construct JSON values directly (independent of Rust structs)
// and validate them against the JSON Schema files in schemas/ai/.

use serde_json::json;

fn load_schema(name: &str) -> serde_json::Value {
    let path = format!(
        "{}/schemas/ai/{name}",
        env!("CARGO_MANIFEST_DIR")
    );
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read schema {path}: {e}"));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("Failed to parse schema {path}: {e}"))
}

fn build_validator(schema_name: &str) -> jsonschema::Validator {
    let schema = load_schema(schema_name);
    jsonschema::options()
        .with_retriever(LocalRetriever)
        .build(&schema)
        .unwrap_or_else(|e| panic!("Failed to compile schema {schema_name}: {e}"))
}

fn validate(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    let errors: Vec<_> = validator.iter_errors(instance).collect();
    if !errors.is_empty() {
        let msgs: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
        panic!(
            "Schema validation failed for {schema_name}:\n{}\nInstance: {}",
            msgs.join("\n"),
            serde_json::to_string_pretty(instance).unwrap()
        );
    }
}

fn validate_fails(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    assert!(
        !validator.is_valid(instance),
        "Expected schema validation to fail for {schema_name}, but it passed.\nInstance: {}",
        serde_json::to_string_pretty(instance).unwrap()
    );
}

// Retriever that loads $ref schemas from the local filesystem
struct LocalRetriever;

impl jsonschema::Retrieve for LocalRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let schema_dir = format!("{}/schemas/ai/", env!("CARGO_MANIFEST_DIR"));

        // Extract the schema filename from various URI forms:
        // - "json-schema:///anomaly.schema.json"
        // - "file:///path/to/anomaly.schema.json"
        // - "anomaly.schema.json"
        let filename = if let Some(rest) = uri_str.strip_prefix("json-schema:///") {
            rest
        } else if let Some(path) = uri_str.strip_prefix("file://") {
            // For file:// URIs, use the path directly
            let text = std::fs::read_to_string(path)?;
            return Ok(serde_json::from_str(&text)?);
        } else {
            uri_str
        };

        let path = format!("{schema_dir}{filename}");
        if std::path::Path::new(&path).exists() {
            let text = std::fs::read_to_string(&path)?;
            return Ok(serde_json::from_str(&text)?);
        }
        Err(format!("Cannot retrieve schema: {uri_str}").into())
    }
}

// =========================================================================
// Fan-control request
// =========================================================================

#[test]
fn fan_request_valid() {
    validate(
        "fan_request.schema.json",
        &json!({ "temperature": 27.5, "humidity": 64.0 }),
    );
}

#[test]
fn fan_request_integer_readings() {
    validate(
        "fan_request.schema.json",
        &json!({ "temperature": 27, "humidity": 64 }),
    );
}

#[test]
fn fan_request_missing_humidity_rejected() {
    validate_fails("fan_request.schema.json", &json!({ "temperature": 27.5 }));
}

#[test]
fn fan_request_string_temperature_rejected() {
    validate_fails(
        "fan_request.schema.json",
        &json!({ "temperature": "27.5", "humidity": 64.0 }),
    );
}

#[test]
fn fan_request_extra_field_rejected() {
    validate_fails(
        "fan_request.schema.json",
        &json!({ "temperature": 27.5, "humidity": 64.0, "mode": "AUTO" }),
    );
}

// =========================================================================
// Fan-control response
// =========================================================================

#[test]
fn fan_suggestion_valid() {
    validate(
        "fan_suggestion.schema.json",
        &json!({ "fanSpeed": 75, "reason": "High temperature and humidity" }),
    );
}

#[test]
fn fan_suggestion_zero_speed() {
    validate(
        "fan_suggestion.schema.json",
        &json!({ "fanSpeed": 0, "reason": "Conditions are comfortable" }),
    );
}

#[test]
fn fan_suggestion_over_100_rejected() {
    validate_fails(
        "fan_suggestion.schema.json",
        &json!({ "fanSpeed": 130, "reason": "Scorching" }),
    );
}

#[test]
fn fan_suggestion_negative_rejected() {
    validate_fails(
        "fan_suggestion.schema.json",
        &json!({ "fanSpeed": -5, "reason": "Freezing" }),
    );
}

#[test]
fn fan_suggestion_missing_reason_rejected() {
    validate_fails("fan_suggestion.schema.json", &json!({ "fanSpeed": 50 }));
}

// =========================================================================
// Anomaly-detection request
// =========================================================================

#[test]
fn anomaly_request_all_time_frames() {
    for frame in ["1h", "24h", "7d", "30d", "all"] {
        validate("anomaly_request.schema.json", &json!({ "timeFrame": frame }));
    }
}

#[test]
fn anomaly_request_unknown_time_frame_rejected() {
    validate_fails("anomaly_request.schema.json", &json!({ "timeFrame": "90d" }));
}

#[test]
fn anomaly_request_missing_time_frame_rejected() {
    validate_fails("anomaly_request.schema.json", &json!({}));
}

// =========================================================================
// Anomaly-detection response
// =========================================================================

#[test]
fn anomaly_report_valid() {
    validate(
        "anomaly_report.schema.json",
        &json!({
            "anomalies": [{
                "type": "warning",
                "title": "Humidity spike",
                "description": "Humidity rose 20% within 10 minutes",
                "recommendation": "Check for water leaks"
            }],
            "insights": ["Fan runs more often at night"],
            "statistics": { "avgTemp": "23.4", "avgHum": "51.0", "dataPoints": 100 }
        }),
    );
}

#[test]
fn anomaly_report_insufficient_data_shape() {
    // Short history: only an empty anomaly list plus a message
    validate(
        "anomaly_report.schema.json",
        &json!({ "anomalies": [], "message": "Insufficient data for analysis" }),
    );
}

#[test]
fn anomaly_report_all_severities() {
    for severity in ["warning", "error", "info"] {
        validate(
            "anomaly_report.schema.json",
            &json!({
                "anomalies": [{
                    "type": severity,
                    "title": "t",
                    "description": "d",
                    "recommendation": "r"
                }]
            }),
        );
    }
}

#[test]
fn anomaly_report_unknown_severity_rejected() {
    validate_fails(
        "anomaly_report.schema.json",
        &json!({
            "anomalies": [{
                "type": "catastrophic",
                "title": "t",
                "description": "d",
                "recommendation": "r"
            }]
        }),
    );
}

#[test]
fn anomaly_report_missing_recommendation_rejected() {
    validate_fails(
        "anomaly_report.schema.json",
        &json!({
            "anomalies": [{ "type": "info", "title": "t", "description": "d" }]
        }),
    );
}

#[test]
fn anomaly_report_missing_anomalies_rejected() {
    validate_fails(
        "anomaly_report.schema.json",
        &json!({ "insights": ["nothing to see"] }),
    );
}

#[test]
fn anomaly_report_string_data_points_rejected() {
    validate_fails(
        "anomaly_report.schema.json",
        &json!({
            "anomalies": [],
            "statistics": { "avgTemp": "23.4", "avgHum": "51.0", "dataPoints": "100" }
        }),
    );
}

#[test]
fn anomaly_report_extra_field_rejected() {
    validate_fails(
        "anomaly_report.schema.json",
        &json!({ "anomalies": [], "confidence": 0.9 }),
    );
}
