use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

/// Outbound notification kinds the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ListingApproved,
    ListingRejected,
    OwnerRequestApproved,
    ReviewHidden,
}

/// Delivery seam for outbound notifications. Always called after the state
/// change has committed; delivery failure never rolls anything back.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn notify(
        &self,
        kind: NotificationKind,
        recipient_id: Uuid,
        payload: Value,
    ) -> anyhow::Result<()>;
}

/// POSTs notifications as JSON to a configured webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl NotificationSender for WebhookNotifier {
    async fn notify(
        &self,
        kind: NotificationKind,
        recipient_id: Uuid,
        payload: Value,
    ) -> anyhow::Result<()> {
        let body = notification_body(kind, recipient_id, payload);
        self.client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Used when no webhook is configured.
pub struct NoopNotifier;

#[async_trait]
impl NotificationSender for NoopNotifier {
    async fn notify(
        &self,
        kind: NotificationKind,
        recipient_id: Uuid,
        _payload: Value,
    ) -> anyhow::Result<()> {
        debug!("Notification {kind:?} for {recipient_id} dropped (no webhook configured)");
        Ok(())
    }
}

/// Fires a notification and logs on failure. The state change is already
/// durable by the time this runs.
pub async fn send_best_effort(
    sender: &dyn NotificationSender,
    kind: NotificationKind,
    recipient_id: Uuid,
    payload: Value,
) {
    if let Err(e) = sender.notify(kind, recipient_id, payload).await {
        warn!("Notification {kind:?} to {recipient_id} failed: {e}");
    }
}

fn notification_body(kind: NotificationKind, recipient_id: Uuid, payload: Value) -> Value {
    json!({
        "kind": kind,
        "recipient_id": recipient_id,
        "payload": payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(NotificationKind::ListingApproved).unwrap(),
            json!("listing_approved")
        );
        assert_eq!(
            serde_json::to_value(NotificationKind::OwnerRequestApproved).unwrap(),
            json!("owner_request_approved")
        );
    }

    #[test]
    fn test_notification_body_shape() {
        let recipient = Uuid::new_v4();
        let body = notification_body(
            NotificationKind::ListingRejected,
            recipient,
            json!({ "listing_id": "x", "reason": "duplicate submission" }),
        );
        assert_eq!(body["kind"], json!("listing_rejected"));
        assert_eq!(body["recipient_id"], json!(recipient.to_string()));
        assert_eq!(body["payload"]["reason"], json!("duplicate submission"));
    }

    #[tokio::test]
    async fn test_noop_notifier_accepts_anything() {
        let sender = NoopNotifier;
        let result = sender
            .notify(NotificationKind::ReviewHidden, Uuid::new_v4(), json!({}))
            .await;
        assert!(result.is_ok());
    }
}
