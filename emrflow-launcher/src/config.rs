//! Launcher configuration
//!
//! Every resource identifier the launcher touches (buckets, roles, network
//! placement, encryption key) comes from the environment and is validated
//! once at cold start.

use anyhow::{Context, Result};
use emrflow_core::domain::cluster::{
    ClusterConfiguration, InstanceGroup, JobDefinition, NetworkPlacement, ProcessingStep,
};
use emrflow_core::domain::message::PipelineMessage;
use emrflow_core::domain::policy::ErrorPolicy;
use emrflow_core::validation::MatchMode;

/// Number of core nodes in the cluster
const CORE_INSTANCE_COUNT: i32 = 3;

/// Launcher configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bucket holding the job output
    pub output_bucket: String,

    /// Prefix purged before each run and written by the job
    pub output_prefix: String,

    /// Input location read by the Spark application
    pub source_uri: String,

    /// Spark application jar
    pub app_jar_uri: String,

    /// Entry point class of the Spark application
    pub app_main_class: String,

    /// Name of the job flow and of its single step
    pub job_name: String,

    pub release_label: String,

    /// Where the cluster ships its logs
    pub cluster_log_uri: String,

    pub master_instance_type: String,
    pub core_instance_type: String,

    pub subnet_id: String,

    /// Security group used for both master and core nodes
    pub security_group_id: String,

    pub ec2_key_name: Option<String>,
    pub job_flow_role: String,
    pub service_role: String,

    /// KMS key used for EMRFS server-side encryption
    pub kms_key_id: String,

    /// Payload a queue message must carry to launch the job
    pub trigger_payload: PipelineMessage,

    pub match_mode: MatchMode,
    pub error_policy: ErrorPolicy,
    pub log_level: String,
}

impl Config {
    /// Creates a configuration from the required values, with defaults for
    /// everything else
    pub fn new(
        output_bucket: String,
        cluster_log_uri: String,
        subnet_id: String,
        security_group_id: String,
        kms_key_id: String,
    ) -> Self {
        Self {
            source_uri: format!("s3://{}/data/sourceData/", output_bucket),
            app_jar_uri: format!("s3://{}/sparkApps/mySampleApp-2.11-1.0.jar", output_bucket),
            output_bucket,
            output_prefix: "data/outputData/".to_string(),
            app_main_class: "com.palwell.Main".to_string(),
            job_name: "sampleSparkJob".to_string(),
            release_label: "emr-5.18.0".to_string(),
            cluster_log_uri,
            master_instance_type: "m3.xlarge".to_string(),
            core_instance_type: "r3.4xlarge".to_string(),
            subnet_id,
            security_group_id,
            ec2_key_name: None,
            job_flow_role: "EMR_EC2_DefaultRole".to_string(),
            service_role: "EMR_DefaultRole".to_string(),
            kms_key_id,
            trigger_payload: PipelineMessage::default_trigger(),
            match_mode: MatchMode::default(),
            error_policy: ErrorPolicy::default(),
            log_level: "info".to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Required environment variables:
    /// - OUTPUT_BUCKET
    /// - CLUSTER_LOG_URI
    /// - SUBNET_ID
    /// - SECURITY_GROUP_ID
    /// - KMS_KEY_ID
    ///
    /// Optional: OUTPUT_PREFIX, SOURCE_URI, APP_JAR_URI, APP_MAIN_CLASS,
    /// JOB_NAME, RELEASE_LABEL, MASTER_INSTANCE_TYPE, CORE_INSTANCE_TYPE,
    /// EC2_KEY_NAME, JOB_FLOW_ROLE, SERVICE_ROLE, TRIGGER_PAYLOAD,
    /// TRIGGER_MATCH, ERROR_POLICY, LOG_LEVEL
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} environment variable not set", key))
        };

        let mut config = Self::new(
            required("OUTPUT_BUCKET")?,
            required("CLUSTER_LOG_URI")?,
            required("SUBNET_ID")?,
            required("SECURITY_GROUP_ID")?,
            required("KMS_KEY_ID")?,
        );

        if let Some(prefix) = lookup("OUTPUT_PREFIX") {
            config.output_prefix = prefix;
        }
        if let Some(uri) = lookup("SOURCE_URI") {
            config.source_uri = uri;
        }
        if let Some(uri) = lookup("APP_JAR_URI") {
            config.app_jar_uri = uri;
        }
        if let Some(class) = lookup("APP_MAIN_CLASS") {
            config.app_main_class = class;
        }
        if let Some(name) = lookup("JOB_NAME") {
            config.job_name = name;
        }
        if let Some(label) = lookup("RELEASE_LABEL") {
            config.release_label = label;
        }
        if let Some(instance_type) = lookup("MASTER_INSTANCE_TYPE") {
            config.master_instance_type = instance_type;
        }
        if let Some(instance_type) = lookup("CORE_INSTANCE_TYPE") {
            config.core_instance_type = instance_type;
        }
        config.ec2_key_name = lookup("EC2_KEY_NAME").filter(|name| !name.is_empty());
        if let Some(role) = lookup("JOB_FLOW_ROLE") {
            config.job_flow_role = role;
        }
        if let Some(role) = lookup("SERVICE_ROLE") {
            config.service_role = role;
        }
        if let Some(raw) = lookup("TRIGGER_PAYLOAD") {
            config.trigger_payload = PipelineMessage::from_json(&raw)
                .context("TRIGGER_PAYLOAD is not a valid payload")?;
        }
        if let Some(raw) = lookup("TRIGGER_MATCH") {
            config.match_mode = raw.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(raw) = lookup("ERROR_POLICY") {
            config.error_policy = raw.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.output_bucket.is_empty() {
            anyhow::bail!("output_bucket cannot be empty");
        }

        // An empty prefix would purge the whole bucket
        if self.output_prefix.is_empty() || !self.output_prefix.ends_with('/') {
            anyhow::bail!("output_prefix must be non-empty and end with '/'");
        }

        for (name, uri) in [
            ("source_uri", &self.source_uri),
            ("app_jar_uri", &self.app_jar_uri),
        ] {
            if !uri.starts_with("s3://") {
                anyhow::bail!("{} must start with s3://", name);
            }
        }

        if !self.cluster_log_uri.starts_with("s3://") && !self.cluster_log_uri.starts_with("s3n://")
        {
            anyhow::bail!("cluster_log_uri must start with s3:// or s3n://");
        }

        if !self.subnet_id.starts_with("subnet-") {
            anyhow::bail!("subnet_id must start with subnet-");
        }

        if !self.security_group_id.starts_with("sg-") {
            anyhow::bail!("security_group_id must start with sg-");
        }

        if !self.kms_key_id.starts_with("arn:") && !self.kms_key_id.starts_with("alias/") {
            anyhow::bail!("kms_key_id must be a key ARN or an alias/ name");
        }

        if self.job_name.is_empty() {
            anyhow::bail!("job_name cannot be empty");
        }

        Ok(())
    }

    /// The `s3://` URI the job writes to
    pub fn output_uri(&self) -> String {
        format!("s3://{}/{}", self.output_bucket, self.output_prefix)
    }

    /// Builds the job flow submitted on every launch
    pub fn job_definition(&self) -> JobDefinition {
        let output_uri = self.output_uri();
        let step = ProcessingStep::spark_submit(
            self.job_name.clone(),
            &self.app_main_class,
            &self.app_jar_uri,
            &self.source_uri,
            &output_uri,
        );

        JobDefinition {
            name: self.job_name.clone(),
            log_uri: self.cluster_log_uri.clone(),
            release_label: self.release_label.clone(),
            instance_groups: vec![
                InstanceGroup::master(self.master_instance_type.clone()),
                InstanceGroup::core(self.core_instance_type.clone(), CORE_INSTANCE_COUNT),
            ],
            placement: NetworkPlacement {
                subnet_id: self.subnet_id.clone(),
                master_security_group: self.security_group_id.clone(),
                worker_security_group: self.security_group_id.clone(),
                ec2_key_name: self.ec2_key_name.clone(),
            },
            keep_alive_when_idle: false,
            applications: vec!["Spark".to_string(), "Hadoop".to_string()],
            steps: vec![step],
            visible_to_all_users: true,
            job_flow_role: self.job_flow_role.clone(),
            service_role: self.service_role.clone(),
            configurations: vec![ClusterConfiguration::emrfs_encryption(&self.kms_key_id)],
        }
    }
}
