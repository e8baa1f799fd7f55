//! StackFlow cloud abstraction
//!
//! Driver traits for every resource kind a deployment owns, the retry
//! wrapper the drivers share, the notification sink, and address
//! helpers. Provider crates (currently AWS) implement the traits; the
//! orchestrator in `stackflow-deploy` consumes them as trait objects,
//! which keeps the lifecycle testable against in-memory fakes.

pub mod arn;
pub mod driver;
pub mod error;
pub mod notify;
pub mod retry;

pub use driver::{
    AppPlatform, Database, Drivers, Identity, MessageQueue, ObjectStore, OptionSetting, PubSub,
};
pub use error::{CloudError, Result};
pub use notify::{Notifier, NullNotifier, TracingNotifier};
pub use retry::RetryPolicy;
