//! Lifecycle ordering tests against in-memory fake drivers.

use async_trait::async_trait;
use serde_json::Value;
use stackflow_cloud::{
    AppPlatform, Database, Drivers, Identity, MessageQueue, Notifier, ObjectStore, OptionSetting,
    PubSub, Result,
};
use stackflow_core::{
    BucketSpec, DatabaseSpec, QueueSpec, StackConfig, TierSettings, TierSpec, TopicSpec, resolve,
};
use stackflow_deploy::Orchestrator;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared call log; every fake driver appends one line per operation.
#[derive(Clone, Default)]
struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    fn push(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn position(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }
}

impl Notifier for CallLog {
    fn notify(&self, message: &str) {
        self.push(format!("notify:{message}"));
    }
}

struct FakeStorage(CallLog);

#[async_trait]
impl ObjectStore for FakeStorage {
    async fn ensure_bucket(
        &self,
        name: &str,
        region: &str,
        _policy: Option<&Value>,
        cors: bool,
    ) -> Result<()> {
        self.0.push(format!("bucket:ensure:{name}:{region}:cors={cors}"));
        Ok(())
    }

    async fn destroy_bucket(&self, name: &str) -> Result<()> {
        self.0.push(format!("bucket:destroy:{name}"));
        Ok(())
    }

    async fn bucket_region(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn upload_file(&self, _path: &Path, bucket: &str, key: &str) -> Result<()> {
        self.0.push(format!("bucket:upload:{bucket}:{key}"));
        Ok(())
    }
}

struct FakeQueues {
    log: CallLog,
    redrives: Arc<Mutex<Vec<(String, Option<Value>)>>>,
}

#[async_trait]
impl MessageQueue for FakeQueues {
    async fn ensure_queue(
        &self,
        name: &str,
        _region: &str,
        _queue_policy: Option<&Value>,
        redrive_policy: Option<&Value>,
    ) -> Result<()> {
        self.log.push(format!("queue:ensure:{name}"));
        self.redrives
            .lock()
            .unwrap()
            .push((name.to_string(), redrive_policy.cloned()));
        Ok(())
    }

    async fn destroy_queue(&self, name: &str, _region: &str) -> Result<()> {
        self.log.push(format!("queue:destroy:{name}"));
        Ok(())
    }

    async fn send_message(&self, queue_url: &str, _body: &str, _delay_seconds: u32) -> Result<()> {
        self.log.push(format!("queue:send:{queue_url}"));
        Ok(())
    }
}

struct FakeTopics(CallLog);

#[async_trait]
impl PubSub for FakeTopics {
    async fn ensure_topic(&self, name: &str, region: &str) -> Result<String> {
        self.0.push(format!("topic:ensure:{name}"));
        Ok(format!("arn:aws:sns:{region}:123456789012:{name}"))
    }

    async fn destroy_topic(&self, name: &str, _region: &str, _account_id: &str) -> Result<()> {
        self.0.push(format!("topic:destroy:{name}"));
        Ok(())
    }

    async fn subscribe(&self, topic_arn: &str, protocol: &str, _endpoint: &str) -> Result<()> {
        self.0.push(format!("topic:subscribe:{topic_arn}:{protocol}"));
        Ok(())
    }

    async fn publish(&self, _topic_arn: &str, _subject: &str, _message: &str) -> Result<()> {
        Ok(())
    }
}

struct FakeDatabase {
    log: CallLog,
    statuses: Arc<Mutex<VecDeque<&'static str>>>,
}

#[async_trait]
impl Database for FakeDatabase {
    async fn restore_from_snapshot(
        &self,
        _region: &str,
        instance_id: &str,
        snapshot_id: &str,
        _instance_class: &str,
    ) -> Result<()> {
        self.log.push(format!("db:restore:{instance_id}:{snapshot_id}"));
        Ok(())
    }

    async fn delete_instance(&self, _region: &str, instance_id: &str) -> Result<()> {
        self.log.push(format!("db:delete:{instance_id}"));
        Ok(())
    }

    async fn instance_status(&self, _region: &str, _instance_id: &str) -> Result<String> {
        let mut statuses = self.statuses.lock().unwrap();
        let status = statuses.pop_front().unwrap_or("available");
        self.log.push(format!("db:status:{status}"));
        Ok(status.to_string())
    }

    async fn modify_security_groups(
        &self,
        _region: &str,
        instance_id: &str,
        group_ids: &[String],
    ) -> Result<()> {
        self.log
            .push(format!("db:modify_groups:{instance_id}:{}", group_ids.join("+")));
        Ok(())
    }
}

struct FakeIdentity {
    log: CallLog,
    policies: Arc<Mutex<Vec<Value>>>,
}

#[async_trait]
impl Identity for FakeIdentity {
    async fn ensure_role(
        &self,
        role_name: &str,
        _policy_name: &str,
        policy_document: &Value,
        _trust_policy: &Value,
    ) -> Result<()> {
        self.log.push(format!("iam:role:ensure:{role_name}"));
        self.policies.lock().unwrap().push(policy_document.clone());
        Ok(())
    }

    async fn destroy_role(&self, role_name: &str) -> Result<()> {
        self.log.push(format!("iam:role:destroy:{role_name}"));
        Ok(())
    }

    async fn ensure_instance_profile(&self, profile_name: &str, _role_name: &str) -> Result<()> {
        self.log.push(format!("iam:profile:ensure:{profile_name}"));
        Ok(())
    }

    async fn destroy_instance_profile(&self, profile_name: &str) -> Result<()> {
        self.log.push(format!("iam:profile:destroy:{profile_name}"));
        Ok(())
    }

    async fn account_id(&self) -> Result<String> {
        Ok("123456789012".to_string())
    }
}

struct FakePlatform(CallLog);

#[async_trait]
impl AppPlatform for FakePlatform {
    async fn upload_source_bundle(
        &self,
        _region: &str,
        _app_id: &str,
        source_bucket: &str,
        _version_label: &str,
    ) -> Result<()> {
        self.0.push(format!("platform:upload:{source_bucket}"));
        Ok(())
    }

    async fn create_environment(
        &self,
        _region: &str,
        _app_id: &str,
        env_name: &str,
        _version_label: &str,
        _stack_name: &str,
        _option_settings: &[OptionSetting],
        worker_tier: bool,
    ) -> Result<()> {
        self.0
            .push(format!("platform:create_env:{env_name}:worker={worker_tier}"));
        Ok(())
    }

    async fn destroy_environment(&self, env_name: &str, _region: &str) -> Result<()> {
        self.0.push(format!("platform:destroy_env:{env_name}"));
        Ok(())
    }
}

struct Fixture {
    log: CallLog,
    redrives: Arc<Mutex<Vec<(String, Option<Value>)>>>,
    policies: Arc<Mutex<Vec<Value>>>,
    orchestrator: Orchestrator,
}

fn fixture(db_statuses: &[&'static str]) -> Fixture {
    let log = CallLog::default();
    let redrives = Arc::new(Mutex::new(Vec::new()));
    let policies = Arc::new(Mutex::new(Vec::new()));

    let drivers = Drivers {
        storage: Arc::new(FakeStorage(log.clone())),
        queues: Arc::new(FakeQueues {
            log: log.clone(),
            redrives: Arc::clone(&redrives),
        }),
        topics: Arc::new(FakeTopics(log.clone())),
        database: Arc::new(FakeDatabase {
            log: log.clone(),
            statuses: Arc::new(Mutex::new(db_statuses.iter().copied().collect())),
        }),
        identity: Arc::new(FakeIdentity {
            log: log.clone(),
            policies: Arc::clone(&policies),
        }),
        platform: Arc::new(FakePlatform(log.clone())),
    };

    let orchestrator = Orchestrator::new(drivers, Arc::new(log.clone()))
        .with_db_poll_interval(Duration::from_millis(1));

    Fixture {
        log,
        redrives,
        policies,
        orchestrator,
    }
}

fn full_config() -> StackConfig {
    StackConfig {
        app_id: Some("x".into()),
        deployment_delta: Some("d".into()),
        deployment_tag: Some("t".into()),
        deployment_region: Some("r".into()),
        solution_stack_name: Some("64bit Amazon Linux 2".into()),
        rds: Some(DatabaseSpec {
            snapshot_name: "snap".into(),
            db_instance_type: "db.t3.micro".into(),
            security_groups: vec!["sg-db".into()],
        }),
        buckets: vec![BucketSpec {
            nametip: "media".into(),
            setting_name: "MEDIA_BUCKET_NAME".into(),
            name: None,
            region: None,
            permanent: false,
            cors: true,
        }],
        queues: vec![QueueSpec {
            nametip: "jobs".into(),
            setting_name: "JOB_QUEUE_NAME".into(),
            name: None,
            region: None,
            permanent: false,
            max_receive_count: None,
            dead_letter_queue: Some(Box::new(QueueSpec {
                nametip: "jobs-dlq".into(),
                setting_name: "JOB_DLQ_NAME".into(),
                name: None,
                region: None,
                permanent: false,
                max_receive_count: Some(4),
                dead_letter_queue: None,
            })),
        }],
        topics: vec![TopicSpec {
            nametip: "audit".into(),
            setting_name: "AUDIT_TOPIC_NAME".into(),
            name: None,
            region: None,
            permanent: false,
            subscriptions: vec![stackflow_core::SubscriptionSpec {
                protocol: "email".into(),
                endpoint: "ops@example.com".into(),
            }],
        }],
        tier_defaults: Some(TierSettings {
            service_role: Some("service-role".into()),
            ssh_key_name: Some("key".into()),
            instance_type: Some("t3.micro".into()),
            security_groups: Some(vec!["sg-app".into()]),
            healthcheck_url: Some("/health".into()),
            num_processes: Some(2),
            num_threads: Some(8),
            wsgi_path: Some("app/wsgi.py".into()),
            minimum_instance_count: Some(1),
            maximum_instance_count: Some(2),
            receive_path: None,
        }),
        web: Some(TierSpec {
            nametip: "web".into(),
            settings: TierSettings::default(),
        }),
        worker: Some(TierSpec {
            nametip: "worker".into(),
            settings: TierSettings {
                receive_path: Some("/tasks/receive".into()),
                ..Default::default()
            },
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn up_runs_phases_in_dependency_order() {
    let fx = fixture(&["creating", "backing-up", "available"]);
    let plan = resolve(&full_config(), "123456789012").unwrap();

    fx.orchestrator.up(&plan).await.unwrap();

    let restore = fx.log.position("db:restore").unwrap();
    let modify = fx.log.position("db:modify_groups").unwrap();
    let bucket = fx.log.position("bucket:ensure").unwrap();
    let queue = fx.log.position("queue:ensure").unwrap();
    let topic = fx.log.position("topic:ensure").unwrap();
    let role = fx.log.position("iam:role:ensure").unwrap();
    let profile = fx.log.position("iam:profile:ensure").unwrap();
    let upload = fx.log.position("platform:upload").unwrap();
    let env = fx.log.position("platform:create_env").unwrap();

    // Database completes (including security groups) before the
    // parallel resource phase starts.
    for group_start in [bucket, queue, topic] {
        assert!(restore < group_start);
        assert!(modify < group_start);
    }
    // IAM waits for all three groups; tiers come last.
    for group_start in [bucket, queue, topic] {
        assert!(group_start < role);
    }
    assert!(role < profile);
    assert!(profile < upload);
    assert!(upload < env);
}

#[tokio::test]
async fn database_poll_waits_for_available() {
    let fx = fixture(&["creating", "modifying", "available"]);
    let plan = resolve(&full_config(), "123456789012").unwrap();

    fx.orchestrator.up(&plan).await.unwrap();

    let statuses: Vec<String> = fx
        .log
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("db:status:"))
        .collect();
    assert_eq!(
        statuses,
        ["db:status:creating", "db:status:modifying", "db:status:available"]
    );
}

#[tokio::test]
async fn dead_letter_queue_is_provisioned_before_its_parent() {
    let fx = fixture(&[]);
    let plan = resolve(&full_config(), "123456789012").unwrap();

    fx.orchestrator.up(&plan).await.unwrap();

    let dlq = fx.log.position("queue:ensure:x-d-t-jobs-dlq").unwrap();
    let parent = fx.log.position("queue:ensure:x-d-t-jobs").unwrap();
    assert!(dlq < parent);

    let redrives = fx.redrives.lock().unwrap();
    let (_, dlq_redrive) = redrives.iter().find(|(n, _)| n == "x-d-t-jobs-dlq").unwrap();
    assert!(dlq_redrive.is_none());

    let (_, parent_redrive) = redrives.iter().find(|(n, _)| n == "x-d-t-jobs").unwrap();
    let parent_redrive = parent_redrive.as_ref().unwrap();
    assert_eq!(
        parent_redrive["deadLetterTargetArn"],
        "arn:aws:sqs:r:123456789012:x-d-t-jobs-dlq"
    );
    assert_eq!(parent_redrive["maxReceiveCount"], 4);
}

#[tokio::test]
async fn role_policy_covers_the_resolved_resources() {
    let fx = fixture(&[]);
    let plan = resolve(&full_config(), "123456789012").unwrap();

    fx.orchestrator.up(&plan).await.unwrap();

    let policies = fx.policies.lock().unwrap();
    let sids: Vec<String> = policies[0]["Statement"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["Sid"].as_str().unwrap().to_string())
        .collect();
    for sid in [
        "BucketAccessXDTMedia",
        "QueueAccessXDTJobs",
        "QueueAccessXDTJobsDlq",
        "TopicPublishAccessXDTAudit",
    ] {
        assert!(sids.iter().any(|s| s == sid), "missing {sid}");
    }
}

#[tokio::test]
async fn down_tears_down_consumers_before_producers() {
    let fx = fixture(&[]);
    let plan = resolve(&full_config(), "123456789012").unwrap();

    fx.orchestrator.down(&plan).await.unwrap();

    let bucket = fx.log.position("bucket:destroy").unwrap();
    let parent = fx.log.position("queue:destroy:x-d-t-jobs").unwrap();
    let dlq = fx.log.position("queue:destroy:x-d-t-jobs-dlq").unwrap();
    let topic = fx.log.position("topic:destroy").unwrap();
    let profile = fx.log.position("iam:profile:destroy").unwrap();
    let role = fx.log.position("iam:role:destroy").unwrap();
    let env = fx.log.position("platform:destroy_env").unwrap();
    let db = fx.log.position("db:delete").unwrap();

    // Parent queue goes before its DLQ.
    assert!(parent < dlq);
    // Resource groups precede IAM, IAM precedes environments,
    // environments precede the database.
    for group in [bucket, parent, topic] {
        assert!(group < profile);
    }
    assert!(profile < role);
    assert!(role < env);
    assert!(env < db);
}

#[tokio::test]
async fn permanent_resources_are_kept_on_down() {
    let fx = fixture(&[]);
    let mut config = full_config();
    config.buckets[0].permanent = true;
    let plan = resolve(&config, "123456789012").unwrap();

    fx.orchestrator.down(&plan).await.unwrap();

    let calls = fx.log.calls();
    assert!(!calls.iter().any(|c| c.starts_with("bucket:destroy")));
    assert!(
        calls
            .iter()
            .any(|c| c == "notify:Keeping permanent bucket x-d-t-media")
    );
}

#[tokio::test]
async fn local_region_is_a_no_op() {
    let fx = fixture(&[]);
    let mut config = full_config();
    config.deployment_region = Some("local".into());
    let plan = resolve(&config, "123456789012").unwrap();

    fx.orchestrator.up(&plan).await.unwrap();
    fx.orchestrator.down(&plan).await.unwrap();

    let calls = fx.log.calls();
    assert!(calls.iter().all(|c| c.starts_with("notify:")));
    assert_eq!(
        calls
            .iter()
            .filter(|c| *c == "notify:Running local; nothing to do.")
            .count(),
        2
    );
}

#[tokio::test]
async fn up_without_optional_pieces_skips_their_phases() {
    let fx = fixture(&[]);
    let config = StackConfig {
        app_id: Some("x".into()),
        deployment_delta: Some("d".into()),
        deployment_tag: Some("t".into()),
        deployment_region: Some("r".into()),
        ..Default::default()
    };
    let plan = resolve(&config, "123456789012").unwrap();

    fx.orchestrator.up(&plan).await.unwrap();

    let calls = fx.log.calls();
    assert!(!calls.iter().any(|c| c.starts_with("db:")));
    assert!(!calls.iter().any(|c| c.starts_with("platform:")));
    // IAM always runs; the baseline policy exists even for an empty stack.
    assert!(calls.iter().any(|c| c.starts_with("iam:role:ensure")));
}
