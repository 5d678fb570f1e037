use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::company::non_blank;

/// Registered field device (controller unit polled over the network).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Device {
    pub id: i32,
    pub guid: Uuid,
    pub tenant_id: i32,
    pub device_id: i32,
    pub device_ip: String,
    pub device_port: i32,
    pub name: String,
    pub description: Option<String>,
    pub interval: i32,
    pub status: i16,
    pub created_by: Option<String>,
    pub created_user_id: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_user_id: Option<String>,
    pub updated_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewDevice {
    pub tenant_id: i32,
    pub device_id: i32,
    pub device_ip: String,
    pub device_port: i32,
    pub name: String,
    pub description: Option<String>,
    pub interval: i32,
    pub status: i16,
    pub created_by: Option<String>,
    pub created_user_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceChanges {
    pub tenant_id: Option<i32>,
    pub device_id: Option<i32>,
    pub device_ip: Option<String>,
    pub device_port: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub interval: Option<i32>,
    pub status: Option<i16>,
    pub updated_by: String,
    pub updated_user_id: String,
}

/// Search filter; every supplied field must match.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub name: Option<String>,
    pub device_id: Option<i32>,
    pub device_ip: Option<String>,
}

impl Device {
    pub fn from_new(id: i32, new: NewDevice, now: DateTime<Utc>) -> Self {
        Self {
            id,
            guid: Uuid::new_v4(),
            tenant_id: new.tenant_id,
            device_id: new.device_id,
            device_ip: new.device_ip,
            device_port: new.device_port,
            name: new.name,
            description: new.description,
            interval: new.interval,
            status: new.status,
            created_by: new.created_by,
            created_user_id: new.created_user_id,
            created_date: now,
            updated_by: None,
            updated_user_id: None,
            updated_date: None,
        }
    }

    pub fn apply(&mut self, changes: DeviceChanges, now: DateTime<Utc>) {
        if let Some(tenant_id) = changes.tenant_id.filter(|id| *id > 0) {
            self.tenant_id = tenant_id;
        }
        if let Some(device_id) = changes.device_id {
            self.device_id = device_id;
        }
        if let Some(device_ip) = non_blank(changes.device_ip) {
            self.device_ip = device_ip;
        }
        if let Some(device_port) = changes.device_port {
            self.device_port = device_port;
        }
        if let Some(name) = non_blank(changes.name) {
            self.name = name;
        }
        if let Some(description) = non_blank(changes.description) {
            self.description = Some(description);
        }
        if let Some(interval) = changes.interval {
            self.interval = interval;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.updated_by = Some(changes.updated_by);
        self.updated_user_id = Some(changes.updated_user_id);
        self.updated_date = Some(now);
    }

    pub fn matches(&self, filter: &DeviceFilter) -> bool {
        let contains = |haystack: &str, needle: &Option<String>| {
            needle
                .as_deref()
                .is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
        };

        contains(&self.name, &filter.name)
            && contains(&self.device_ip, &filter.device_ip)
            && filter.device_id.is_none_or(|id| id == self.device_id)
    }
}
