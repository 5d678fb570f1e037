use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;

use super::like_pattern;
use crate::database::models::{Device, DeviceFilter, NewDevice};
use crate::error::AppResult;
use crate::result::Page;

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn insert(&self, new: NewDevice, now: DateTime<Utc>) -> AppResult<Device>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Device>>;

    async fn update(&self, device: &Device) -> AppResult<()>;

    async fn delete(&self, id: i32) -> AppResult<bool>;

    /// Whether another device already uses the hardware `device_id`.
    async fn exists_with_device_id(&self, device_id: i32, excluding: Option<i32>)
    -> AppResult<bool>;

    async fn search(&self, filter: &DeviceFilter, page: Page) -> AppResult<(Vec<Device>, u64)>;
}

const DEVICE_COLUMNS: &str = r#"
    id, guid, tenant_id, device_id, device_ip, device_port, name, description,
    "interval", status, created_by, created_user_id, created_date,
    updated_by, updated_user_id, updated_date
"#;

const DEVICE_FILTER: &str = r#"
    ($1::text IS NULL OR name ILIKE $1)
    AND ($2::int4 IS NULL OR device_id = $2)
    AND ($3::text IS NULL OR device_ip ILIKE $3)
"#;

pub struct PgDeviceRepository {
    pool: PgPool,
}

impl PgDeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRepository for PgDeviceRepository {
    async fn insert(&self, new: NewDevice, now: DateTime<Utc>) -> AppResult<Device> {
        let sql = format!(
            r#"
            INSERT INTO devices (
                guid, tenant_id, device_id, device_ip, device_port, name, description,
                "interval", status, created_by, created_user_id, created_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            DEVICE_COLUMNS
        );

        let device = sqlx::query_as::<_, Device>(&sql)
            .bind(uuid::Uuid::new_v4())
            .bind(new.tenant_id)
            .bind(new.device_id)
            .bind(&new.device_ip)
            .bind(new.device_port)
            .bind(&new.name)
            .bind(&new.description)
            .bind(new.interval)
            .bind(new.status)
            .bind(&new.created_by)
            .bind(&new.created_user_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(device)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Device>> {
        let sql = format!("SELECT {} FROM devices WHERE id = $1", DEVICE_COLUMNS);
        let device = sqlx::query_as::<_, Device>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(device)
    }

    async fn update(&self, device: &Device) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE devices
            SET tenant_id = $2, device_id = $3, device_ip = $4, device_port = $5,
                name = $6, description = $7, "interval" = $8, status = $9,
                updated_by = $10, updated_user_id = $11, updated_date = $12
            WHERE id = $1
            "#,
        )
        .bind(device.id)
        .bind(device.tenant_id)
        .bind(device.device_id)
        .bind(&device.device_ip)
        .bind(device.device_port)
        .bind(&device.name)
        .bind(&device.description)
        .bind(device.interval)
        .bind(device.status)
        .bind(&device.updated_by)
        .bind(&device.updated_user_id)
        .bind(device.updated_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists_with_device_id(
        &self,
        device_id: i32,
        excluding: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM devices
                WHERE device_id = $1 AND ($2::int4 IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(device_id)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn search(&self, filter: &DeviceFilter, page: Page) -> AppResult<(Vec<Device>, u64)> {
        let name = filter.name.as_deref().map(like_pattern);
        let ip = filter.device_ip.as_deref().map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) FROM devices WHERE {}", DEVICE_FILTER);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&name)
            .bind(filter.device_id)
            .bind(&ip)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT {}
            FROM devices
            WHERE {}
            ORDER BY name, id
            LIMIT $4 OFFSET $5
            "#,
            DEVICE_COLUMNS, DEVICE_FILTER
        );
        let devices = sqlx::query_as::<_, Device>(&sql)
            .bind(&name)
            .bind(filter.device_id)
            .bind(&ip)
            .bind(i64::from(page.size))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok((devices, total.max(0) as u64))
    }
}

#[derive(Default)]
pub struct MemoryDeviceRepository {
    rows: RwLock<BTreeMap<i32, Device>>,
}

impl MemoryDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceRepository for MemoryDeviceRepository {
    async fn insert(&self, new: NewDevice, now: DateTime<Utc>) -> AppResult<Device> {
        let mut rows = self.rows.write().await;
        let id = rows.keys().next_back().map_or(1, |last| last + 1);
        let device = Device::from_new(id, new, now);
        rows.insert(id, device.clone());
        Ok(device)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Device>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn update(&self, device: &Device) -> AppResult<()> {
        if let Some(row) = self.rows.write().await.get_mut(&device.id) {
            *row = device.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }

    async fn exists_with_device_id(
        &self,
        device_id: i32,
        excluding: Option<i32>,
    ) -> AppResult<bool> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .any(|d| d.device_id == device_id && Some(d.id) != excluding))
    }

    async fn search(&self, filter: &DeviceFilter, page: Page) -> AppResult<(Vec<Device>, u64)> {
        let mut matches: Vec<Device> = self
            .rows
            .read()
            .await
            .values()
            .filter(|d| d.matches(filter))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();
        Ok((items, total))
    }
}
