//! Command envelope decoding and validation.
//!
//! Clients publish one JSON object per queue message:
//!
//! ```json
//! {"time":"2015-06-29T10:00:00Z","job_id":"j1","type":"START_JOB",
//!  "data":{"workflow":{"domain":"prod","name":"transcode","version":"1","taskList":"default"}}}
//! ```
//!
//! Decoding checks the four top-level fields. The `data.workflow` block is
//! checked separately, after the command type is known, so an unknown command
//! is reported as such even when its payload carries no workflow.

use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{DispatchError, EnvelopeDefect};

/// Decoded and validated command message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandEnvelope {
    time: String,
    job_id: String,
    #[serde(rename = "type")]
    command_type: String,
    data: Map<String, Value>,
}

/// Borrowed view of the `data.workflow` block.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowSpec<'a> {
    fields: &'a Map<String, Value>,
}

impl CommandEnvelope {
    /// Decodes a raw message body and validates the top-level fields.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Decode` when the body is not a JSON object and
    /// `DispatchError::InvalidEnvelope` when a required field is absent,
    /// empty, or of the wrong type.
    pub fn parse(body: &[u8]) -> Result<Self, DispatchError> {
        let value: Value = serde_json::from_slice(body).map_err(DispatchError::from_json_error)?;
        Self::from_value(value)
    }

    /// Validates an already decoded JSON value.
    ///
    /// # Errors
    ///
    /// See [`CommandEnvelope::parse`].
    pub fn from_value(value: Value) -> Result<Self, DispatchError> {
        let Value::Object(mut fields) = value else {
            return Err(DispatchError::decode("message is not a JSON object"));
        };

        let missing = || DispatchError::invalid_envelope(EnvelopeDefect::MissingFields);
        let time = take_text(&mut fields, "time").ok_or_else(missing)?;
        let job_id = take_text(&mut fields, "job_id").ok_or_else(missing)?;
        let command_type = take_text(&mut fields, "type").ok_or_else(missing)?;
        let data = match fields.remove("data") {
            Some(Value::Object(data)) => data,
            _ => return Err(missing()),
        };

        Ok(Self {
            time,
            job_id,
            command_type,
            data,
        })
    }

    /// Client-supplied submission time.
    #[must_use]
    pub fn time(&self) -> &str {
        self.time.as_str()
    }

    /// Client-supplied job identifier.
    #[must_use]
    pub fn job_id(&self) -> &str {
        self.job_id.as_str()
    }

    /// Declared command name.
    #[must_use]
    pub fn command_type(&self) -> &str {
        self.command_type.as_str()
    }

    /// Command payload.
    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns the `data.workflow` block.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEnvelope` with [`EnvelopeDefect::MissingWorkflow`] when
    /// the block is absent or null, and [`EnvelopeDefect::InvalidWorkflow`]
    /// when it is not an object.
    pub fn require_workflow(&self) -> Result<WorkflowSpec<'_>, DispatchError> {
        match self.data.get("workflow") {
            None | Some(Value::Null) => Err(DispatchError::invalid_envelope(
                EnvelopeDefect::MissingWorkflow,
            )),
            Some(Value::Object(fields)) => Ok(WorkflowSpec { fields }),
            Some(_) => Err(DispatchError::invalid_envelope(
                EnvelopeDefect::InvalidWorkflow { field: "workflow" },
            )),
        }
    }

    /// Payload serialised as compact JSON, key order preserved.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::EncodeInput` if serialisation fails.
    pub fn data_json(&self) -> Result<String, DispatchError> {
        serde_json::to_string(&self.data).map_err(DispatchError::EncodeInput)
    }

    /// Whole envelope pretty-printed for debug logging.
    #[must_use]
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|error| format!("<unprintable: {error}>"))
    }
}

impl<'a> WorkflowSpec<'a> {
    /// Orchestration domain.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEnvelope` naming the field when it is missing or empty.
    pub fn domain(&self) -> Result<String, DispatchError> {
        self.required("domain")
    }

    /// Workflow type name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEnvelope` naming the field when it is missing or empty.
    pub fn name(&self) -> Result<String, DispatchError> {
        self.required("name")
    }

    /// Workflow type version.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEnvelope` naming the field when it is missing or empty.
    pub fn version(&self) -> Result<String, DispatchError> {
        self.required("version")
    }

    /// Task list name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEnvelope` naming the field when it is missing or empty.
    pub fn task_list(&self) -> Result<String, DispatchError> {
        self.required("taskList")
    }

    fn required(&self, field: &'static str) -> Result<String, DispatchError> {
        let text = match self.fields.get(field) {
            Some(Value::String(text)) => Some(text.clone()),
            // Versions are sometimes published as bare numbers.
            Some(Value::Number(number)) => Some(number.to_string()),
            _ => None,
        };
        text.filter(|text| !text.trim().is_empty())
            .ok_or_else(|| DispatchError::invalid_envelope(EnvelopeDefect::InvalidWorkflow { field }))
    }
}

fn take_text(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn start_job() -> Value {
        json!({
            "time": "t1",
            "job_id": "j1",
            "type": "START_JOB",
            "data": {
                "workflow": {
                    "name": "transcode",
                    "version": "1",
                    "domain": "prod",
                    "taskList": "default"
                }
            }
        })
    }

    fn defect(result: Result<impl std::fmt::Debug, DispatchError>) -> EnvelopeDefect {
        match result {
            Err(DispatchError::InvalidEnvelope { defect }) => defect,
            other => panic!("expected invalid envelope, got {other:?}"),
        }
    }

    #[test]
    fn parses_well_formed_envelope() {
        let body = serde_json::to_vec(&start_job()).expect("encode");
        let envelope = CommandEnvelope::parse(&body).expect("parse");
        assert_eq!(envelope.time(), "t1");
        assert_eq!(envelope.job_id(), "j1");
        assert_eq!(envelope.command_type(), "START_JOB");
        assert!(envelope.data().contains_key("workflow"));
    }

    #[rstest]
    #[case(b"not json".as_slice())]
    #[case(b"".as_slice())]
    #[case(b"{\"time\":".as_slice())]
    #[case(b"[1,2,3]".as_slice())]
    #[case(b"\"START_JOB\"".as_slice())]
    fn rejects_bodies_that_are_not_json_objects(#[case] body: &[u8]) {
        let result = CommandEnvelope::parse(body);
        assert!(matches!(result, Err(DispatchError::Decode { .. })), "{result:?}");
    }

    #[rstest]
    #[case("time")]
    #[case("job_id")]
    #[case("type")]
    #[case("data")]
    fn rejects_missing_top_level_field(#[case] field: &str) {
        let mut value = start_job();
        value.as_object_mut().expect("object").remove(field);
        assert_eq!(
            defect(CommandEnvelope::from_value(value)),
            EnvelopeDefect::MissingFields
        );
    }

    #[rstest]
    #[case("time", json!(""))]
    #[case("job_id", json!("   "))]
    #[case("type", json!(null))]
    #[case("type", json!(7))]
    #[case("data", json!(""))]
    #[case("data", json!("payload"))]
    fn rejects_empty_or_mistyped_field(#[case] field: &str, #[case] replacement: Value) {
        let mut value = start_job();
        value[field] = replacement;
        assert_eq!(
            defect(CommandEnvelope::from_value(value)),
            EnvelopeDefect::MissingFields
        );
    }

    #[test]
    fn accepts_empty_data_object_until_workflow_is_required() {
        let envelope = CommandEnvelope::from_value(json!({
            "time": "t1", "job_id": "j1", "type": "PAUSE_JOB", "data": {}
        }))
        .expect("top-level fields are present");
        assert_eq!(
            defect(envelope.require_workflow()),
            EnvelopeDefect::MissingWorkflow
        );
    }

    #[test]
    fn rejects_non_object_workflow() {
        let mut value = start_job();
        value["data"]["workflow"] = json!("transcode");
        let envelope = CommandEnvelope::from_value(value).expect("envelope");
        assert_eq!(
            defect(envelope.require_workflow()),
            EnvelopeDefect::InvalidWorkflow { field: "workflow" }
        );
    }

    #[rstest]
    #[case("domain")]
    #[case("name")]
    #[case("version")]
    #[case("taskList")]
    fn workflow_sub_fields_are_required(#[case] field: &'static str) {
        let mut value = start_job();
        value["data"]["workflow"]
            .as_object_mut()
            .expect("workflow object")
            .remove(field);
        let envelope = CommandEnvelope::from_value(value).expect("envelope");
        let workflow = envelope.require_workflow().expect("workflow block");
        let result = match field {
            "domain" => workflow.domain(),
            "name" => workflow.name(),
            "version" => workflow.version(),
            _ => workflow.task_list(),
        };
        assert_eq!(defect(result), EnvelopeDefect::InvalidWorkflow { field });
    }

    #[test]
    fn numeric_version_is_accepted() {
        let mut value = start_job();
        value["data"]["workflow"]["version"] = json!(2);
        let envelope = CommandEnvelope::from_value(value).expect("envelope");
        let workflow = envelope.require_workflow().expect("workflow");
        assert_eq!(workflow.version().expect("version"), "2");
    }

    #[test]
    fn data_json_preserves_key_order() {
        let body = br#"{"time":"t","job_id":"j","type":"START_JOB","data":{"zeta":1,"alpha":{"b":2,"a":1}}}"#;
        let envelope = CommandEnvelope::parse(body).expect("parse");
        assert_eq!(
            envelope.data_json().expect("encode"),
            r#"{"zeta":1,"alpha":{"b":2,"a":1}}"#
        );
    }

    #[test]
    fn pretty_json_uses_wire_field_names() {
        let envelope = CommandEnvelope::from_value(start_job()).expect("envelope");
        let pretty = envelope.to_pretty_json();
        assert!(pretty.contains("\"type\": \"START_JOB\""));
        assert!(pretty.contains('\n'));
    }
}
