//! Identity driver (IAM roles and instance profiles)

use crate::context::AwsContext;
use crate::error::{ENTITY_ALREADY_EXISTS, NO_SUCH_ENTITY, api_error, has_code};
use async_trait::async_trait;
use serde_json::Value;
use stackflow_cloud::{Identity, Result, RetryPolicy};

pub struct IamDriver {
    context: AwsContext,
    retry: RetryPolicy,
}

impl IamDriver {
    pub fn new(context: AwsContext, retry: RetryPolicy) -> Self {
        Self { context, retry }
    }
}

#[async_trait]
impl Identity for IamDriver {
    async fn ensure_role(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &Value,
        trust_policy: &Value,
    ) -> Result<()> {
        let client = self.context.iam_client();
        let trust_json = serde_json::to_string(trust_policy)?;
        let policy_json = serde_json::to_string(policy_document)?;

        self.retry
            .run("create_role", || {
                let client = client.clone();
                let trust_json = trust_json.clone();
                async move {
                    match client
                        .create_role()
                        .role_name(role_name)
                        .assume_role_policy_document(trust_json)
                        .send()
                        .await
                    {
                        Ok(_) => Ok(()),
                        Err(err) => {
                            let err = err.into_service_error();
                            if has_code(&err, &[ENTITY_ALREADY_EXISTS]) {
                                Ok(())
                            } else {
                                Err(api_error(err))
                            }
                        }
                    }
                }
            })
            .await?;

        // The inline policy is (re)attached even when the role already
        // existed, so a changed resource list converges on re-run.
        self.retry
            .run("put_role_policy", || {
                let client = client.clone();
                let policy_json = policy_json.clone();
                async move {
                    client
                        .put_role_policy()
                        .role_name(role_name)
                        .policy_name(policy_name)
                        .policy_document(policy_json)
                        .send()
                        .await
                        .map(|_| ())
                        .map_err(|e| api_error(e.into_service_error()))
                }
            })
            .await
    }

    async fn destroy_role(&self, role_name: &str) -> Result<()> {
        let client = self.context.iam_client();

        let policy_names = match client.list_role_policies().role_name(role_name).send().await {
            Ok(resp) => resp.policy_names().to_vec(),
            Err(err) => {
                let err = err.into_service_error();
                if has_code(&err, &[NO_SUCH_ENTITY]) {
                    return Ok(());
                }
                return Err(api_error(err));
            }
        };

        for policy_name in policy_names {
            client
                .delete_role_policy()
                .role_name(role_name)
                .policy_name(policy_name)
                .send()
                .await
                .map_err(|e| api_error(e.into_service_error()))?;
        }

        match client.delete_role().role_name(role_name).send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = err.into_service_error();
                if has_code(&err, &[NO_SUCH_ENTITY]) {
                    Ok(())
                } else {
                    Err(api_error(err))
                }
            }
        }
    }

    async fn ensure_instance_profile(&self, profile_name: &str, role_name: &str) -> Result<()> {
        let client = self.context.iam_client();

        // The role is only attached when the profile was freshly
        // created; an existing profile already carries it.
        let created = self
            .retry
            .run("create_instance_profile", || {
                let client = client.clone();
                async move {
                    match client
                        .create_instance_profile()
                        .instance_profile_name(profile_name)
                        .send()
                        .await
                    {
                        Ok(_) => Ok(true),
                        Err(err) => {
                            let err = err.into_service_error();
                            if has_code(&err, &[ENTITY_ALREADY_EXISTS]) {
                                Ok(false)
                            } else {
                                Err(api_error(err))
                            }
                        }
                    }
                }
            })
            .await?;

        if created {
            self.retry
                .run("add_role_to_instance_profile", || {
                    let client = client.clone();
                    async move {
                        client
                            .add_role_to_instance_profile()
                            .instance_profile_name(profile_name)
                            .role_name(role_name)
                            .send()
                            .await
                            .map(|_| ())
                            .map_err(|e| api_error(e.into_service_error()))
                    }
                })
                .await?;
        }

        Ok(())
    }

    async fn destroy_instance_profile(&self, profile_name: &str) -> Result<()> {
        let client = self.context.iam_client();

        let profile = match client
            .get_instance_profile()
            .instance_profile_name(profile_name)
            .send()
            .await
        {
            Ok(resp) => resp.instance_profile().cloned(),
            Err(err) => {
                let err = err.into_service_error();
                if has_code(&err, &[NO_SUCH_ENTITY]) {
                    return Ok(());
                }
                return Err(api_error(err));
            }
        };

        if let Some(profile) = profile {
            for role in profile.roles() {
                client
                    .remove_role_from_instance_profile()
                    .instance_profile_name(profile_name)
                    .role_name(role.role_name())
                    .send()
                    .await
                    .map_err(|e| api_error(e.into_service_error()))?;
            }
        }

        match client
            .delete_instance_profile()
            .instance_profile_name(profile_name)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = err.into_service_error();
                if has_code(&err, &[NO_SUCH_ENTITY]) {
                    Ok(())
                } else {
                    Err(api_error(err))
                }
            }
        }
    }

    async fn account_id(&self) -> Result<String> {
        crate::account::current_account_id(&self.context).await
    }
}
