use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{MAX_NAME_LENGTH, PageQuery, RequestHandlers};
use crate::cache::keys::{self, DEVICE_PREFIX};
use crate::database::models::{Device, DeviceChanges, DeviceFilter, NewDevice};
use crate::error::{AppError, AppResult};
use crate::events::DomainEvent;
use crate::pipeline::validation::Rules;
use crate::pipeline::{Cacheable, Handler, Request};
use crate::result::PaginatedResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDto {
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
    pub created_date: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl From<Device> for DeviceDto {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            guid: device.guid,
            tenant_id: device.tenant_id,
            device_id: device.device_id,
            device_ip: device.device_ip,
            device_port: device.device_port,
            name: device.name,
            description: device.description,
            interval: device.interval,
            status: device.status,
            created_by: device.created_by,
            created_date: device.created_date,
            updated_by: device.updated_by,
            updated_date: device.updated_date,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDevice {
    #[serde(default)]
    pub tenant_id: i32,
    pub device_id: Option<i32>,
    pub device_ip: Option<String>,
    pub device_port: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub interval: i32,
    #[serde(default)]
    pub status: i16,
    pub created_by: Option<String>,
    pub created_user_id: Option<String>,
}

impl Request for CreateDevice {
    type Response = DeviceDto;

    fn validate(&self) -> Result<(), Vec<String>> {
        Rules::new()
            .positive("TenantId", i64::from(self.tenant_id))
            .required("Name", self.name.as_deref())
            .max_len("Name", self.name.as_deref(), MAX_NAME_LENGTH)
            .check(self.device_id.is_some(), "DeviceId is required.")
            .required("DeviceIp", self.device_ip.as_deref())
            .check(self.device_port.is_some(), "DevicePort is required.")
            .check(
                self.device_port.is_none_or(|port| (1..=65535).contains(&port)),
                "DevicePort must be between 1 and 65535.",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDevice {
    #[serde(default)]
    pub id: i32,
    pub tenant_id: Option<i32>,
    pub device_id: Option<i32>,
    pub device_ip: Option<String>,
    pub device_port: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub interval: Option<i32>,
    pub status: Option<i16>,
    pub updated_by: Option<String>,
    pub updated_user_id: Option<String>,
}

impl Request for UpdateDevice {
    type Response = ();

    fn validate(&self) -> Result<(), Vec<String>> {
        Rules::new()
            .positive("Id", i64::from(self.id))
            .max_len("Name", self.name.as_deref(), MAX_NAME_LENGTH)
            .check(
                self.device_port.is_none_or(|port| (1..=65535).contains(&port)),
                "DevicePort must be between 1 and 65535.",
            )
            .required("UpdatedBy", self.updated_by.as_deref())
            .required("UpdatedUserId", self.updated_user_id.as_deref())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteDevice {
    pub id: i32,
}

impl Request for DeleteDevice {
    type Response = ();

    fn validate(&self) -> Result<(), Vec<String>> {
        Rules::new().positive("Id", i64::from(self.id)).finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDevices {
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
    pub name: Option<String>,
    pub device_id: Option<i32>,
    pub device_ip: Option<String>,
    #[serde(default)]
    pub bypass_cache: bool,
}

impl SearchDevices {
    fn filter(&self) -> DeviceFilter {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        DeviceFilter {
            name: text(&self.name),
            device_id: self.device_id,
            device_ip: text(&self.device_ip),
        }
    }
}

impl Cacheable for SearchDevices {
    fn bypass_cache(&self) -> bool {
        self.bypass_cache
    }

    fn cache_key(&self) -> String {
        let filter = self.filter();
        keys::device_search_key(
            self.page_number,
            self.page_size,
            filter.name.as_deref(),
            filter.device_id,
            filter.device_ip.as_deref(),
        )
    }
}

impl Request for SearchDevices {
    type Response = PaginatedResult<DeviceDto>;

    fn cacheable(&self) -> Option<&dyn Cacheable> {
        Some(self)
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut rules = Rules::new();
        PageQuery::new(self.page_number, self.page_size).check(&mut rules);
        rules.finish()
    }
}

impl RequestHandlers {
    async fn ensure_device_id_free(&self, device_id: i32, excluding: Option<i32>) -> AppResult<()> {
        if self
            .repositories
            .devices
            .exists_with_device_id(device_id, excluding)
            .await?
        {
            info!("Device id already registered: {}", device_id);
            return Err(AppError::Conflict(format!(
                "A device with device id {} already exists.",
                device_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Handler<CreateDevice> for RequestHandlers {
    async fn handle(&self, request: CreateDevice) -> AppResult<DeviceDto> {
        let device_id = request.device_id.unwrap_or_default();
        self.ensure_device_id_free(device_id, None).await?;

        let new = NewDevice {
            tenant_id: request.tenant_id,
            device_id,
            device_ip: request.device_ip.unwrap_or_default().trim().to_string(),
            device_port: request.device_port.unwrap_or_default(),
            name: request.name.unwrap_or_default().trim().to_string(),
            description: request.description,
            interval: request.interval,
            status: request.status,
            created_by: request.created_by,
            created_user_id: request.created_user_id,
        };

        let device = self
            .repositories
            .devices
            .insert(new, self.clock.now())
            .await?;
        info!("Device created: {} - {}", device.device_id, device.name);

        self.invalidate(DEVICE_PREFIX).await;
        self.publish(DomainEvent::DeviceCreated {
            id: device.id,
            guid: device.guid,
            device_id: device.device_id,
        })
        .await;

        Ok(device.into())
    }
}

#[async_trait]
impl Handler<UpdateDevice> for RequestHandlers {
    async fn handle(&self, request: UpdateDevice) -> AppResult<()> {
        let devices = &self.repositories.devices;
        let mut device = devices
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Device {} was not found.", request.id)))?;

        if let Some(device_id) = request.device_id {
            self.ensure_device_id_free(device_id, Some(device.id))
                .await?;
        }

        device.apply(
            DeviceChanges {
                tenant_id: request.tenant_id,
                device_id: request.device_id,
                device_ip: request.device_ip,
                device_port: request.device_port,
                name: request.name,
                description: request.description,
                interval: request.interval,
                status: request.status,
                updated_by: request.updated_by.unwrap_or_default(),
                updated_user_id: request.updated_user_id.unwrap_or_default(),
            },
            self.clock.now(),
        );
        devices.update(&device).await?;
        info!("Device updated: {}", device.id);

        self.invalidate(DEVICE_PREFIX).await;
        self.publish(DomainEvent::DeviceUpdated {
            id: device.id,
            guid: device.guid,
        })
        .await;

        Ok(())
    }
}

#[async_trait]
impl Handler<DeleteDevice> for RequestHandlers {
    async fn handle(&self, request: DeleteDevice) -> AppResult<()> {
        if !self.repositories.devices.delete(request.id).await? {
            tracing::warn!("Device not found: {}", request.id);
            return Err(AppError::NotFound(format!(
                "Device {} was not found.",
                request.id
            )));
        }
        info!("Device deleted: {}", request.id);

        self.invalidate(DEVICE_PREFIX).await;
        self.publish(DomainEvent::DeviceDeleted { id: request.id })
            .await;

        Ok(())
    }
}

#[async_trait]
impl Handler<SearchDevices> for RequestHandlers {
    async fn handle(&self, request: SearchDevices) -> AppResult<PaginatedResult<DeviceDto>> {
        let page = PageQuery::new(request.page_number, request.page_size).page();
        let (devices, total) = self
            .repositories
            .devices
            .search(&request.filter(), page)
            .await?;
        Ok(PaginatedResult::create(
            devices.into_iter().map(DeviceDto::from).collect(),
            total,
            page.number,
            page.size,
        ))
    }
}
