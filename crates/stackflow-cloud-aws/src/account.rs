//! Account identity resolution

use crate::context::AwsContext;
use crate::error::api_error;
use stackflow_cloud::{CloudError, Result};

/// Account id of the active credentials, via STS GetCallerIdentity.
///
/// Needs no special permissions; it succeeds whenever the credentials
/// are valid, which makes it a cheap credential check at the start of a
/// lifecycle run.
pub async fn current_account_id(context: &AwsContext) -> Result<String> {
    let sts = context.sts_client();
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| api_error(e.into_service_error()))?;

    identity
        .account()
        .map(str::to_string)
        .ok_or_else(|| CloudError::api("no account id in caller identity"))
}
