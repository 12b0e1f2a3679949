//! Normalized result envelope returned by the workflow client.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Wire-form error carried by a failed result.
///
/// `code` is one of the [`crate::retry::ErrorKind`] wire codes for anything
/// the classifier produced; the inbound route layer may also emit its own
/// literals (e.g. `UNAUTHORIZED`) in the same envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl WorkflowError {
    /// Lenient parse of an `error` object embedded in an upstream response
    /// body. Upstream is not trusted to follow our schema exactly.
    pub fn from_body_value(value: &Value) -> Self {
        Self {
            code: value
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown workflow error")
                .to_string(),
            details: value.get("details").cloned(),
        }
    }
}

/// Outcome of a workflow execution: exactly one branch populated.
///
/// Serializes as `{"success":true,"data":...}` or
/// `{"success":false,"error":{...}}`, the shape the inbound HTTP surface
/// returns verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowResult<T = Value> {
    Success(T),
    Failure(WorkflowError),
}

impl<T> WorkflowResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowResult::Success(_))
    }

    pub fn error(&self) -> Option<&WorkflowError> {
        match self {
            WorkflowResult::Success(_) => None,
            WorkflowResult::Failure(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<T, WorkflowError> {
        match self {
            WorkflowResult::Success(data) => Ok(data),
            WorkflowResult::Failure(e) => Err(e),
        }
    }
}

impl<T: Serialize> Serialize for WorkflowResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("WorkflowResult", 2)?;
        match self {
            WorkflowResult::Success(data) => {
                st.serialize_field("success", &true)?;
                st.serialize_field("data", data)?;
            }
            WorkflowResult::Failure(error) => {
                st.serialize_field("success", &false)?;
                st.serialize_field("error", error)?;
            }
        }
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serializes_with_data_branch_only() {
        let result: WorkflowResult = WorkflowResult::Success(json!({"echo": "hi"}));
        let encoded = serde_json::to_value(&result).unwrap();
        assert_eq!(encoded, json!({"success": true, "data": {"echo": "hi"}}));
    }

    #[test]
    fn failure_serializes_with_error_branch_only() {
        let result: WorkflowResult = WorkflowResult::Failure(WorkflowError {
            code: "NETWORK_ERROR".to_string(),
            message: "connection refused".to_string(),
            details: None,
        });
        let encoded = serde_json::to_value(&result).unwrap();
        assert_eq!(
            encoded,
            json!({
                "success": false,
                "error": {"code": "NETWORK_ERROR", "message": "connection refused"}
            })
        );
    }

    #[test]
    fn lenient_parse_of_malformed_upstream_error() {
        let err = WorkflowError::from_body_value(&json!({"weird": true}));
        assert_eq!(err.code, "");
        assert_eq!(err.message, "unknown workflow error");
        assert!(err.details.is_none());
    }
}
