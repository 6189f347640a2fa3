//! Step status change event DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::step::StepState;
use crate::error::EventError;

/// Step status change event, as emitted by the cluster service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepChangeEvent {
    pub detail: StepChangeDetail,
    /// When the state change happened
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// Step identity and state carried in the event detail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepChangeDetail {
    pub name: String,
    pub cluster_id: String,
    pub state: String,
    pub step_id: String,
}

impl StepChangeEvent {
    /// Parses an event from the raw invocation payload
    pub fn from_value(value: serde_json::Value) -> Result<Self, EventError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn state(&self) -> StepState {
        StepState::parse(&self.detail.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_step_change_event() {
        let event = StepChangeEvent::from_value(json!({
            "version": "0",
            "source": "aws.emr",
            "detail-type": "EMR Step Status Change",
            "time": "2018-10-24T17:21:46Z",
            "detail": {
                "severity": "ERROR",
                "actionOnFailure": "TERMINATE_CLUSTER",
                "stepId": "s-2QSHDLM0M6ABK",
                "name": "sampleSparkJob",
                "clusterId": "j-2YDUJ6ISXEY8G",
                "state": "FAILED",
                "message": "Step s-2QSHDLM0M6ABK failed"
            }
        }))
        .unwrap();

        assert_eq!(event.detail.name, "sampleSparkJob");
        assert_eq!(event.detail.cluster_id, "j-2YDUJ6ISXEY8G");
        assert_eq!(event.detail.step_id, "s-2QSHDLM0M6ABK");
        assert_eq!(event.state(), StepState::Failed);
        assert_eq!(
            event.time.map(|time| time.to_rfc3339()),
            Some("2018-10-24T17:21:46+00:00".to_string())
        );
    }

    #[test]
    fn test_envelope_fields_are_optional() {
        let event = StepChangeEvent::from_value(json!({
            "detail": {
                "name": "job",
                "clusterId": "j-1",
                "state": "COMPLETED",
                "stepId": "s-1"
            }
        }))
        .unwrap();

        assert_eq!(event.state(), StepState::Completed);
        assert!(event.time.is_none());
    }

    #[test]
    fn test_missing_step_id_is_malformed() {
        let result = StepChangeEvent::from_value(json!({
            "detail": { "name": "job", "clusterId": "j-1", "state": "FAILED" }
        }));
        assert!(matches!(result, Err(EventError::Shape(_))));
    }
}
