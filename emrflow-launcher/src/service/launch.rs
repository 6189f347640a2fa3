//! Launch service
//!
//! Handles a queue event end to end:
//! - Picking the message body out of the event
//! - Matching it against the trigger payload
//! - Purging the output prefix
//! - Submitting the job flow
//!
//! The job flow is fire-and-forget: completion is reported later through a
//! step status change event handled by the monitor.

use async_trait::async_trait;
use emrflow_client::ClusterService;
use emrflow_core::domain::cluster::JobDefinition;
use emrflow_core::dto::queue::QueueEvent;
use emrflow_core::validation::{Rejection, TriggerMatch, TriggerValidator};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{Span, debug, info};

use crate::error::LaunchError;
use crate::service::cleanup::OutputCleaner;

/// What a launch invocation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The body was not the trigger payload; nothing was touched
    Skipped(Rejection),
    /// The output was purged and the job flow submitted
    Launched {
        job_flow_id: String,
        purged_objects: usize,
    },
}

/// Service trait for launching the cluster job
#[async_trait]
pub trait LaunchService: Send + Sync {
    /// Handles one queue event
    ///
    /// # Arguments
    /// * `payload` - The raw event delivered by the runtime
    ///
    /// # Returns
    /// The outcome of the launch, or the error that stopped it
    async fn handle(&self, payload: JsonValue) -> Result<LaunchOutcome, LaunchError>;
}

/// Standard implementation of LaunchService
pub struct StandardLaunchService {
    validator: TriggerValidator,
    cleaner: OutputCleaner,
    cluster: Arc<dyn ClusterService>,
    definition: JobDefinition,
}

impl StandardLaunchService {
    /// Creates a new launch service
    ///
    /// # Arguments
    /// * `validator` - Matches message bodies against the trigger payload
    /// * `cleaner` - Purges the output prefix before submission
    /// * `cluster` - Cluster repository used for submission
    /// * `definition` - Job flow submitted on every launch
    pub fn new(
        validator: TriggerValidator,
        cleaner: OutputCleaner,
        cluster: Arc<dyn ClusterService>,
        definition: JobDefinition,
    ) -> Self {
        Self {
            validator,
            cleaner,
            cluster,
            definition,
        }
    }
}

#[async_trait]
impl LaunchService for StandardLaunchService {
    async fn handle(&self, payload: JsonValue) -> Result<LaunchOutcome, LaunchError> {
        let event = QueueEvent::from_value(payload)?;
        if event.records.len() > 1 {
            debug!(
                "Queue event carries {} records, only the first is considered",
                event.records.len()
            );
        }
        let record = event.first_record()?;
        if let Some(message_id) = &record.message_id {
            Span::current().record("message_id", message_id.as_str());
        }

        info!("Message body from queue: {}", record.body);
        debug!(
            "Message body for validation ({} match): {}",
            self.validator.mode(),
            self.validator.canonical()
        );

        if let TriggerMatch::Rejected(rejection) = self.validator.check(&record.body) {
            info!("Message is not the launch trigger ({}), skipping", rejection);
            return Ok(LaunchOutcome::Skipped(rejection));
        }

        let purged_objects = self.cleaner.purge().await.map_err(LaunchError::Cleanup)?;

        let job_flow_id = self
            .cluster
            .submit(&self.definition)
            .await
            .map_err(LaunchError::Submission)?;

        info!("Launched EMR job '{}'", self.definition.name);
        info!("The Cluster/Job Id is: {}", job_flow_id);

        Ok(LaunchOutcome::Launched {
            job_flow_id,
            purged_objects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::service::cleanup::tests::RecordingObjectStore;
    use emrflow_client::ClientError;
    use emrflow_core::domain::message::PipelineMessage;
    use emrflow_core::validation::MatchMode;
    use serde_json::json;
    use std::sync::Mutex;

    /// Cluster service that records submitted definitions
    #[derive(Default)]
    struct RecordingCluster {
        fail: bool,
        submitted: Mutex<Vec<JobDefinition>>,
    }

    impl RecordingCluster {
        fn submissions(&self) -> Vec<JobDefinition> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ClusterService for RecordingCluster {
        async fn submit(&self, definition: &JobDefinition) -> emrflow_client::Result<String> {
            if self.fail {
                return Err(ClientError::Cluster("ValidationException".into()));
            }
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(definition.clone());
            Ok(format!("j-{}", submitted.len()))
        }
    }

    fn config() -> Config {
        Config::new(
            "my-sample-bucket".to_string(),
            "s3n://aws-logs/elasticmapreduce/".to_string(),
            "subnet-bhkt5567".to_string(),
            "sg-957ght554s".to_string(),
            "alias/s3TDE".to_string(),
        )
    }

    fn service(
        mode: MatchMode,
        store: Arc<RecordingObjectStore>,
        cluster: Arc<RecordingCluster>,
    ) -> StandardLaunchService {
        let config = config();
        let validator = TriggerValidator::new(config.trigger_payload.clone(), mode);
        let cleaner = OutputCleaner::new(
            store,
            config.output_bucket.clone(),
            config.output_prefix.clone(),
        );
        StandardLaunchService::new(validator, cleaner, cluster, config.job_definition())
    }

    fn queue_event(body: &str) -> JsonValue {
        json!({
            "Records": [
                { "messageId": "c80e8021", "body": body, "eventSource": "aws:sqs" }
            ]
        })
    }

    fn trigger_body() -> String {
        PipelineMessage::default_trigger().mapping_literal()
    }

    #[tokio::test]
    async fn test_non_matching_body_touches_nothing() {
        let store = Arc::new(RecordingObjectStore::with_keys(&["data/outputData/part-0"]));
        let cluster = Arc::new(RecordingCluster::default());
        let service = service(MatchMode::Literal, store.clone(), cluster.clone());

        let bodies = [
            "".to_string(),
            "hello".to_string(),
            PipelineMessage::default_downstream().mapping_literal(),
            PipelineMessage::default_trigger().json_body().unwrap(),
            format!(" {}", trigger_body()),
        ];

        for body in bodies {
            let outcome = service.handle(queue_event(&body)).await.unwrap();
            assert_eq!(outcome, LaunchOutcome::Skipped(Rejection::NotCanonical));
        }

        assert_eq!(store.list_calls(), 0);
        assert!(store.deleted_keys().is_empty());
        assert!(cluster.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_trigger_body_launches() {
        let store = Arc::new(RecordingObjectStore::default());
        let cluster = Arc::new(RecordingCluster::default());
        let service = service(MatchMode::Literal, store, cluster.clone());

        let body = "{'group': 'Sample Group', 'project': 'Hadoop Project', 'version': '1.0', \
                    'environment': 'AWS Production', 'job': 'sampleSparkJob'}";
        let outcome = service.handle(queue_event(body)).await.unwrap();

        assert_eq!(
            outcome,
            LaunchOutcome::Launched {
                job_flow_id: "j-1".to_string(),
                purged_objects: 0,
            }
        );
        assert_eq!(cluster.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_trigger_with_empty_output_submits_without_deletes() {
        let store = Arc::new(RecordingObjectStore::default());
        let cluster = Arc::new(RecordingCluster::default());
        let service = service(MatchMode::Literal, store.clone(), cluster.clone());

        let outcome = service.handle(queue_event(&trigger_body())).await.unwrap();

        assert_eq!(
            outcome,
            LaunchOutcome::Launched {
                job_flow_id: "j-1".to_string(),
                purged_objects: 0,
            }
        );
        assert_eq!(store.list_calls(), 1);
        assert!(store.deleted_keys().is_empty());
        assert_eq!(cluster.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_trigger_deletes_every_listed_object() {
        let keys = [
            "data/outputData/_SUCCESS",
            "data/outputData/part-00000",
            "data/outputData/part-00001",
            "data/outputData/part-00002",
        ];
        let store = Arc::new(RecordingObjectStore::with_keys(&keys));
        let cluster = Arc::new(RecordingCluster::default());
        let service = service(MatchMode::Literal, store.clone(), cluster.clone());

        let outcome = service.handle(queue_event(&trigger_body())).await.unwrap();

        assert!(matches!(
            outcome,
            LaunchOutcome::Launched {
                purged_objects: 4,
                ..
            }
        ));
        assert_eq!(store.deleted_keys(), keys);
        assert_eq!(cluster.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_submitted_definition_is_identical_across_launches() {
        let store = Arc::new(RecordingObjectStore::default());
        let cluster = Arc::new(RecordingCluster::default());
        let service = service(MatchMode::Structural, store, cluster.clone());

        let reordered = r#"{"job":"sampleSparkJob","version":"1.0","group":"Sample Group","environment":"AWS Production","project":"Hadoop Project"}"#;
        service.handle(queue_event(&trigger_body())).await.unwrap();
        service.handle(queue_event(reordered)).await.unwrap();

        let submissions = cluster.submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0], submissions[1]);
        assert_eq!(submissions[0], config().job_definition());
    }

    #[tokio::test]
    async fn test_only_first_record_is_considered() {
        let store = Arc::new(RecordingObjectStore::default());
        let cluster = Arc::new(RecordingCluster::default());
        let service = service(MatchMode::Literal, store, cluster.clone());

        let event = json!({
            "Records": [
                { "body": "not the trigger" },
                { "body": trigger_body() }
            ]
        });

        let outcome = service.handle(event).await.unwrap();
        assert!(matches!(outcome, LaunchOutcome::Skipped(_)));
        assert!(cluster.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_event_is_an_error() {
        let store = Arc::new(RecordingObjectStore::default());
        let cluster = Arc::new(RecordingCluster::default());
        let service = service(MatchMode::Literal, store.clone(), cluster.clone());

        let missing = service.handle(json!({ "body": trigger_body() })).await;
        assert!(matches!(missing, Err(LaunchError::MalformedEvent(_))));

        let empty = service.handle(json!({ "Records": [] })).await;
        assert!(matches!(empty, Err(LaunchError::MalformedEvent(_))));

        assert_eq!(store.list_calls(), 0);
        assert!(cluster.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_failure_prevents_submission() {
        let mut store = RecordingObjectStore::with_keys(&["data/outputData/part-0"]);
        store.fail_list = true;
        let store = Arc::new(store);
        let cluster = Arc::new(RecordingCluster::default());
        let service = service(MatchMode::Literal, store, cluster.clone());

        let result = service.handle(queue_event(&trigger_body())).await;

        assert!(matches!(result, Err(LaunchError::Cleanup(_))));
        assert!(cluster.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_submission_failure_after_purge() {
        let store = Arc::new(RecordingObjectStore::with_keys(&["data/outputData/part-0"]));
        let cluster = Arc::new(RecordingCluster {
            fail: true,
            ..Default::default()
        });
        let service = service(MatchMode::Literal, store.clone(), cluster);

        let result = service.handle(queue_event(&trigger_body())).await;

        assert!(matches!(result, Err(LaunchError::Submission(_))));
        // Purge and submission are not transactional
        assert_eq!(store.deleted_keys(), vec!["data/outputData/part-0"]);
    }
}
