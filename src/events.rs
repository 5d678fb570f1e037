//! Domain events raised by successful commands.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    CompanyCreated { id: i32, guid: Uuid, name: String },
    CompanyUpdated { id: i32, guid: Uuid },
    CompanyDeleted { id: i32 },
    DeviceCreated { id: i32, guid: Uuid, device_id: i32 },
    DeviceUpdated { id: i32, guid: Uuid },
    DeviceDeleted { id: i32 },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::CompanyCreated { .. } => "CompanyCreated",
            DomainEvent::CompanyUpdated { .. } => "CompanyUpdated",
            DomainEvent::CompanyDeleted { .. } => "CompanyDeleted",
            DomainEvent::DeviceCreated { .. } => "DeviceCreated",
            DomainEvent::DeviceUpdated { .. } => "DeviceUpdated",
            DomainEvent::DeviceDeleted { .. } => "DeviceDeleted",
        }
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: DomainEvent);
}

/// Writes each event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventPublisher;

#[async_trait]
impl EventPublisher for LogEventPublisher {
    async fn publish(&self, event: DomainEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        info!(event = event.name(), "Domain event published: {}", payload);
    }
}
