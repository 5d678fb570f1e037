//! Persistence for companies and devices.
//!
//! Postgres backs the repositories when `DATABASE_URL` is set; otherwise the
//! in-memory implementations are used.

use std::sync::Arc;

use sqlx::PgPool;

pub mod models;
pub mod repositories;

pub use repositories::{CompanyRepository, DeviceRepository};

use repositories::{
    MemoryCompanyRepository, MemoryDeviceRepository, PgCompanyRepository, PgDeviceRepository,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS companies (
    id              SERIAL PRIMARY KEY,
    guid            UUID NOT NULL UNIQUE,
    tenant_id       INTEGER NOT NULL,
    name            VARCHAR(100) NOT NULL,
    description     TEXT,
    created_by      TEXT,
    created_user_id TEXT,
    created_date    TIMESTAMPTZ NOT NULL,
    updated_by      TEXT,
    updated_user_id TEXT,
    updated_date    TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS devices (
    id              SERIAL PRIMARY KEY,
    guid            UUID NOT NULL UNIQUE,
    tenant_id       INTEGER NOT NULL,
    device_id       INTEGER NOT NULL UNIQUE,
    device_ip       VARCHAR(64) NOT NULL,
    device_port     INTEGER NOT NULL,
    name            VARCHAR(100) NOT NULL,
    description     TEXT,
    "interval"      INTEGER NOT NULL DEFAULT 0,
    status          SMALLINT NOT NULL DEFAULT 0,
    created_by      TEXT,
    created_user_id TEXT,
    created_date    TIMESTAMPTZ NOT NULL,
    updated_by      TEXT,
    updated_user_id TEXT,
    updated_date    TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS companies_name_idx ON companies (name);
CREATE INDEX IF NOT EXISTS devices_name_idx ON devices (name);
"#;

/// Creates the tables on first start.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// Repository handles shared by every request handler.
#[derive(Clone)]
pub struct Repositories {
    pub companies: Arc<dyn CompanyRepository>,
    pub devices: Arc<dyn DeviceRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            companies: Arc::new(PgCompanyRepository::new(pool.clone())),
            devices: Arc::new(PgDeviceRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            companies: Arc::new(MemoryCompanyRepository::new()),
            devices: Arc::new(MemoryDeviceRepository::new()),
        }
    }
}
