//! StackFlow deployment lifecycle
//!
//! Turns a resolved plan into ordered driver calls. `up` provisions in
//! dependency order: database first, then the independent bucket/queue/
//! topic groups in parallel, then IAM, then the application tiers.
//! `down` tears down consumers before producers. Progress streams
//! through a caller-supplied [`stackflow_cloud::Notifier`].

pub mod error;
pub mod options;
pub mod orchestrator;
pub mod policy;

pub use error::{DeployError, Result};
pub use options::{TASK_QUEUE_NAMETIP, tier_option_settings};
pub use orchestrator::Orchestrator;
pub use policy::{inline_policy_document, instance_trust_policy};
