//! Task dispatch: sign, encode, send / receive, verify, invoke
//!
//! The transport endpoint is public HTTP with no other authentication;
//! the shared secret is the only gate against forged task injection.
//! The signature is computed over the exact wire bytes of the inner
//! message, and verified against the bytes as received, so a
//! serialization-format ambiguity can never bypass it.

use crate::error::{Result, TaskError};
use crate::message::{Envelope, TaskMessage, TaskStatus};
use crate::registry::WorkerRegistry;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use stackflow_cloud::{MessageQueue, Notifier};
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Hex digest of the keyed hash over the message bytes.
fn sign(message_bytes: &[u8], secret: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| TaskError::InvalidSecret)?;
    mac.update(message_bytes);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time signature check.
fn verify(message_bytes: &[u8], secret: &[u8], signature_hex: &str) -> Result<bool> {
    let Ok(signature) = hex::decode(signature_hex) else {
        return Ok(false);
    };
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| TaskError::InvalidSecret)?;
    mac.update(message_bytes);
    Ok(mac.verify_slice(&signature).is_ok())
}

/// Serialize, sign, and transport-encode a message. The transport
/// rejects raw control bytes, so the envelope is base64-encoded whole.
pub fn encode_message(message: &TaskMessage, secret: &[u8]) -> Result<String> {
    let inner_bytes = serde_json::to_vec(message)?;
    let envelope = Envelope {
        msg_body: BASE64.encode(&inner_bytes),
        msg_signature: sign(&inner_bytes, secret)?,
    };
    Ok(BASE64.encode(serde_json::to_vec(&envelope)?))
}

/// Static configuration of the task protocol for one process.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Shared signing secret
    pub secret: String,

    /// URL of the task queue messages are sent to
    pub queue_url: String,

    /// Whether this process accepts and dispatches task messages
    pub receiver: bool,

    /// Invoke workers in-process instead of going through the queue
    pub run_local: bool,
}

pub struct TaskDispatcher {
    config: TaskConfig,
    registry: Arc<WorkerRegistry>,
    queue: Arc<dyn MessageQueue>,
    notifier: Arc<dyn Notifier>,
}

impl TaskDispatcher {
    pub fn new(
        config: TaskConfig,
        registry: Arc<WorkerRegistry>,
        queue: Arc<dyn MessageQueue>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            registry,
            queue,
            notifier,
        }
    }

    fn audit(&self, message: &TaskMessage) {
        let content = serde_json::to_string(message)
            .unwrap_or_else(|_| format!("msg_id={}", message.msg_id));
        self.notifier.notify(&format!("{}: {content}", message.status));
    }

    async fn invoke(&self, message: &TaskMessage) -> Result<()> {
        let worker = self.registry.get(&message.worker_key)?;
        worker
            .call(&message.args, &message.kwargs)
            .await
            .map_err(|source| TaskError::WorkerFailed {
                worker_key: message.worker_key.clone(),
                source,
            })
    }

    /// Dispatch a task. In local mode the worker runs in-process with
    /// no signing and no queue; otherwise the message is signed,
    /// encoded, and handed to the queue with the requested delay.
    pub async fn send(
        &self,
        worker_key: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
        delay_seconds: u32,
    ) -> Result<()> {
        if self.config.run_local {
            let message = TaskMessage::new(worker_key, args, kwargs, delay_seconds);
            return self.invoke(&message).await;
        }

        let message = TaskMessage::new(worker_key, args, kwargs, delay_seconds);
        let body = encode_message(&message, self.config.secret.as_bytes())?;
        self.queue
            .send_message(&self.config.queue_url, &body, delay_seconds)
            .await?;
        self.audit(&message);
        Ok(())
    }

    /// Handle one raw message body delivered to the receive endpoint.
    pub async fn receive(&self, raw_body: &str) -> Result<()> {
        if !self.config.receiver {
            return Err(TaskError::NotReceiver);
        }

        let envelope_bytes = BASE64
            .decode(raw_body.trim())
            .map_err(|e| TaskError::Decode(e.to_string()))?;
        let envelope: Envelope = serde_json::from_slice(&envelope_bytes)?;
        let inner_bytes = BASE64
            .decode(&envelope.msg_body)
            .map_err(|e| TaskError::Decode(e.to_string()))?;

        if !verify(
            &inner_bytes,
            self.config.secret.as_bytes(),
            &envelope.msg_signature,
        )? {
            // Audit the (unverified) content, then refuse to dispatch.
            if let Ok(mut message) = serde_json::from_slice::<TaskMessage>(&inner_bytes) {
                message.status = TaskStatus::SignatureMismatch;
                self.audit(&message);
            } else {
                self.notifier
                    .notify(&format!("{}: <undecodable message>", TaskStatus::SignatureMismatch));
            }
            return Err(TaskError::SignatureMismatch);
        }

        let mut message: TaskMessage = serde_json::from_slice(&inner_bytes)?;
        message.status = TaskStatus::Received;
        self.audit(&message);

        self.invoke(&message).await?;

        message.status = TaskStatus::Complete;
        self.audit(&message);
        Ok(())
    }
}
