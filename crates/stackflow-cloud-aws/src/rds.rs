//! Database driver (RDS)

use crate::context::AwsContext;
use crate::error::api_error;
use async_trait::async_trait;
use stackflow_cloud::{CloudError, Database, Result};

pub struct RdsDriver {
    context: AwsContext,
}

impl RdsDriver {
    pub fn new(context: AwsContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Database for RdsDriver {
    async fn restore_from_snapshot(
        &self,
        region: &str,
        instance_id: &str,
        snapshot_id: &str,
        instance_class: &str,
    ) -> Result<()> {
        let client = self.context.rds_client(region);
        client
            .restore_db_instance_from_db_snapshot()
            .db_instance_identifier(instance_id)
            .db_snapshot_identifier(snapshot_id)
            .db_instance_class(instance_class)
            .multi_az(false)
            .publicly_accessible(true)
            .auto_minor_version_upgrade(true)
            .send()
            .await
            .map_err(|e| api_error(e.into_service_error()))?;
        Ok(())
    }

    async fn delete_instance(&self, region: &str, instance_id: &str) -> Result<()> {
        let client = self.context.rds_client(region);
        client
            .delete_db_instance()
            .db_instance_identifier(instance_id)
            .skip_final_snapshot(true)
            .send()
            .await
            .map_err(|e| api_error(e.into_service_error()))?;
        Ok(())
    }

    async fn instance_status(&self, region: &str, instance_id: &str) -> Result<String> {
        let client = self.context.rds_client(region);
        let resp = client
            .describe_db_instances()
            .db_instance_identifier(instance_id)
            .send()
            .await
            .map_err(|e| api_error(e.into_service_error()))?;

        resp.db_instances()
            .first()
            .and_then(|instance| instance.db_instance_status())
            .map(str::to_string)
            .ok_or_else(|| CloudError::ResourceNotFound(instance_id.to_string()))
    }

    async fn modify_security_groups(
        &self,
        region: &str,
        instance_id: &str,
        group_ids: &[String],
    ) -> Result<()> {
        let client = self.context.rds_client(region);
        let mut request = client
            .modify_db_instance()
            .db_instance_identifier(instance_id)
            .apply_immediately(true);
        for group_id in group_ids {
            request = request.vpc_security_group_ids(group_id);
        }
        request
            .send()
            .await
            .map_err(|e| api_error(e.into_service_error()))?;
        Ok(())
    }
}
