//! Cluster job definition
//!
//! Describes the EMR job flow the launcher submits: cluster shape, software
//! stack, network placement, the Spark step, and encryption settings. The
//! definition is built once from configuration and submitted unchanged on
//! every launch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Jar that wraps shell commands as an EMR step
pub const COMMAND_RUNNER_JAR: &str = "command-runner.jar";

/// Complete description of a job flow submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    pub log_uri: String,
    pub release_label: String,
    pub instance_groups: Vec<InstanceGroup>,
    pub placement: NetworkPlacement,
    /// Keep the cluster running once all steps are done
    pub keep_alive_when_idle: bool,
    pub applications: Vec<String>,
    pub steps: Vec<ProcessingStep>,
    pub visible_to_all_users: bool,
    /// Instance profile assumed by the cluster nodes
    pub job_flow_role: String,
    /// Role assumed by the cluster service itself
    pub service_role: String,
    pub configurations: Vec<ClusterConfiguration>,
}

/// A group of identically configured nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceGroup {
    pub name: String,
    pub role: InstanceRole,
    pub instance_type: String,
    pub count: i32,
}

impl InstanceGroup {
    /// Single master node
    pub fn master(instance_type: impl Into<String>) -> Self {
        Self {
            name: "Master".to_string(),
            role: InstanceRole::Master,
            instance_type: instance_type.into(),
            count: 1,
        }
    }

    /// Core (worker) nodes
    pub fn core(instance_type: impl Into<String>, count: i32) -> Self {
        Self {
            name: "Slaves".to_string(),
            role: InstanceRole::Core,
            instance_type: instance_type.into(),
            count,
        }
    }
}

/// Role of an instance group within the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceRole {
    Master,
    Core,
}

/// Subnet and security group placement of the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPlacement {
    pub subnet_id: String,
    pub master_security_group: String,
    pub worker_security_group: String,
    pub ec2_key_name: Option<String>,
}

/// One unit of work run by the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStep {
    pub name: String,
    pub action_on_failure: FailureAction,
    pub jar: String,
    pub args: Vec<String>,
}

impl ProcessingStep {
    /// Builds a step that runs a Spark application in cluster deploy mode
    ///
    /// The application receives the master (`yarn`), the source location and
    /// the destination location as its arguments.
    pub fn spark_submit(
        name: impl Into<String>,
        main_class: &str,
        application_jar: &str,
        source: &str,
        destination: &str,
    ) -> Self {
        let args = [
            "spark-submit",
            "--deploy-mode",
            "cluster",
            "--class",
            main_class,
            application_jar,
            "yarn",
            source,
            destination,
        ];

        Self {
            name: name.into(),
            action_on_failure: FailureAction::TerminateCluster,
            jar: COMMAND_RUNNER_JAR.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

/// What the cluster does when a step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureAction {
    TerminateCluster,
}

/// A classification block applied to the cluster's configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfiguration {
    pub classification: String,
    pub properties: BTreeMap<String, String>,
}

impl ClusterConfiguration {
    /// EMRFS server-side encryption with the given KMS key
    pub fn emrfs_encryption(kms_key_id: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(
            "fs.s3.serverSideEncryption.kms.keyId".to_string(),
            kms_key_id.to_string(),
        );
        properties.insert(
            "fs.s3.enableServerSideEncryption".to_string(),
            "true".to_string(),
        );

        Self {
            classification: "emrfs-site".to_string(),
            properties,
        }
    }
}
