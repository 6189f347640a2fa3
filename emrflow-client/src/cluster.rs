//! Cluster repository
//!
//! Translates a [`JobDefinition`] into an EMR `RunJobFlow` request and
//! submits it.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_emr::Client;
use aws_sdk_emr::error::DisplayErrorContext;
use aws_sdk_emr::types::{
    ActionOnFailure, Application, Configuration, HadoopJarStepConfig, InstanceGroupConfig,
    InstanceRoleType, JobFlowInstancesConfig, StepConfig,
};
use emrflow_core::domain::cluster::{
    ClusterConfiguration, FailureAction, InstanceGroup, InstanceRole, JobDefinition,
    ProcessingStep,
};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Repository trait for cluster orchestration
#[async_trait]
pub trait ClusterService: Send + Sync {
    /// Submits a job flow and returns its identifier
    ///
    /// The call returns as soon as the cluster service accepts the request;
    /// it does not wait for the cluster to start or the steps to run.
    async fn submit(&self, definition: &JobDefinition) -> Result<String>;
}

/// EMR implementation of ClusterService
#[derive(Debug, Clone)]
pub struct EmrClusterService {
    client: Client,
}

impl EmrClusterService {
    /// Creates a repository from the shared SDK configuration
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ClusterService for EmrClusterService {
    async fn submit(&self, definition: &JobDefinition) -> Result<String> {
        let instance_groups = definition
            .instance_groups
            .iter()
            .map(instance_group_config)
            .collect::<Vec<_>>();

        let instances = JobFlowInstancesConfig::builder()
            .set_instance_groups(Some(instance_groups))
            .keep_job_flow_alive_when_no_steps(definition.keep_alive_when_idle)
            .ec2_subnet_id(&definition.placement.subnet_id)
            .emr_managed_master_security_group(&definition.placement.master_security_group)
            .emr_managed_slave_security_group(&definition.placement.worker_security_group)
            .set_ec2_key_name(definition.placement.ec2_key_name.clone())
            .build();

        let applications = definition
            .applications
            .iter()
            .map(|name| Application::builder().name(name).build())
            .collect::<Vec<_>>();

        let steps = definition
            .steps
            .iter()
            .map(step_config)
            .collect::<Vec<_>>();

        let configurations = definition
            .configurations
            .iter()
            .map(configuration)
            .collect::<Vec<_>>();

        debug!(
            "Submitting job flow '{}' with {} step(s)",
            definition.name,
            steps.len()
        );

        let response = self
            .client
            .run_job_flow()
            .name(&definition.name)
            .log_uri(&definition.log_uri)
            .release_label(&definition.release_label)
            .instances(instances)
            .set_applications(Some(applications))
            .set_steps(Some(steps))
            .visible_to_all_users(definition.visible_to_all_users)
            .job_flow_role(&definition.job_flow_role)
            .service_role(&definition.service_role)
            .set_configurations(Some(configurations))
            .send()
            .await
            .map_err(|e| {
                ClientError::Cluster(format!(
                    "Failed to run job flow '{}': {}",
                    definition.name,
                    DisplayErrorContext(&e)
                ))
            })?;

        response.job_flow_id().map(str::to_string).ok_or_else(|| {
            ClientError::UnexpectedResponse("RunJobFlow returned no job flow id".into())
        })
    }
}

// =============================================================================
// Request Conversion
// =============================================================================

fn instance_group_config(group: &InstanceGroup) -> InstanceGroupConfig {
    InstanceGroupConfig::builder()
        .name(&group.name)
        .instance_role(instance_role(group.role))
        .instance_type(&group.instance_type)
        .instance_count(group.count)
        .build()
}

fn instance_role(role: InstanceRole) -> InstanceRoleType {
    match role {
        InstanceRole::Master => InstanceRoleType::Master,
        InstanceRole::Core => InstanceRoleType::Core,
    }
}

fn step_config(step: &ProcessingStep) -> StepConfig {
    let jar_step = HadoopJarStepConfig::builder()
        .jar(&step.jar)
        .set_args(Some(step.args.clone()))
        .build();

    StepConfig::builder()
        .name(&step.name)
        .action_on_failure(action_on_failure(step.action_on_failure))
        .hadoop_jar_step(jar_step)
        .build()
}

fn action_on_failure(action: FailureAction) -> ActionOnFailure {
    match action {
        FailureAction::TerminateCluster => ActionOnFailure::TerminateCluster,
    }
}

fn configuration(config: &ClusterConfiguration) -> Configuration {
    let properties = config
        .properties
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<HashMap<_, _>>();

    Configuration::builder()
        .classification(&config.classification)
        .set_properties(Some(properties))
        .build()
}
