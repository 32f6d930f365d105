// src/events.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{info, warn};

// для `audit_log!` в чужих крейтах
pub use chrono::Utc;
pub use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuditEvent {
    pub id: Uuid,
    pub action: String,
    pub organization_id: String,
    pub client: Option<String>,
    pub metadata: HashMap<String, String>,
    pub timestamp: chrono::DateTime<Utc>,
}

pub struct EventHub {
    sender: broadcast::Sender<AuditEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1000);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: AuditEvent) {
        let _ = self.sender.send(event); // игнорируем, если нет получателей
    }
}

/// Писать события аудита в лог, пока жив канал
pub async fn log_audit_events(mut receiver: broadcast::Receiver<AuditEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => info!(
                target: "audit",
                action = %event.action,
                org = %event.organization_id,
                client = event.client.as_deref().unwrap_or("-"),
                metadata = ?event.metadata,
                "audit event"
            ),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(target: "audit", skipped, "audit log lagging behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[macro_export]
macro_rules! audit_log {
    ($hub:expr, $action:expr, $org:expr, $client:expr $(, $key:expr => $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut meta = std::collections::HashMap::new();
            $(
                meta.insert($key.to_string(), $value.to_string());
            )*
            let event = $crate::events::AuditEvent {
                id: $crate::events::Uuid::new_v4(),
                action: $action.to_string(),
                organization_id: $org.to_string(),
                client: $client,
                metadata: meta,
                timestamp: $crate::events::Utc::now(),
            };
            $hub.emit(event);
        }
    };
}

// Пример использования:
// audit_log!(hub, "employees.import", org_id, Some(client), "imported" => count);
