use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;

use super::like_pattern;
use crate::database::models::{Company, NewCompany};
use crate::error::AppResult;
use crate::result::Page;

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn insert(&self, new: NewCompany, now: DateTime<Utc>) -> AppResult<Company>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Company>>;

    async fn update(&self, company: &Company) -> AppResult<()>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i32) -> AppResult<bool>;

    async fn list_all(&self) -> AppResult<Vec<Company>>;

    /// One page of companies whose name contains `name` (case-insensitive),
    /// ordered by name, plus the total number of matches.
    async fn search(&self, name: Option<&str>, page: Page) -> AppResult<(Vec<Company>, u64)>;
}

const COMPANY_COLUMNS: &str = r#"
    id, guid, tenant_id, name, description, created_by, created_user_id,
    created_date, updated_by, updated_user_id, updated_date
"#;

pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyRepository for PgCompanyRepository {
    async fn insert(&self, new: NewCompany, now: DateTime<Utc>) -> AppResult<Company> {
        let sql = format!(
            r#"
            INSERT INTO companies (
                guid, tenant_id, name, description, created_by, created_user_id, created_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        );

        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(uuid::Uuid::new_v4())
            .bind(new.tenant_id)
            .bind(&new.name)
            .bind(&new.description)
            .bind(&new.created_by)
            .bind(&new.created_user_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(company)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Company>> {
        let sql = format!("SELECT {} FROM companies WHERE id = $1", COMPANY_COLUMNS);
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    async fn update(&self, company: &Company) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE companies
            SET tenant_id = $2, name = $3, description = $4,
                updated_by = $5, updated_user_id = $6, updated_date = $7
            WHERE id = $1
            "#,
        )
        .bind(company.id)
        .bind(company.tenant_id)
        .bind(&company.name)
        .bind(&company.description)
        .bind(&company.updated_by)
        .bind(&company.updated_user_id)
        .bind(company.updated_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> AppResult<Vec<Company>> {
        let sql = format!("SELECT {} FROM companies ORDER BY id", COMPANY_COLUMNS);
        let companies = sqlx::query_as::<_, Company>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(companies)
    }

    async fn search(&self, name: Option<&str>, page: Page) -> AppResult<(Vec<Company>, u64)> {
        let pattern = name.map(like_pattern);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM companies WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {}
            FROM companies
            WHERE ($1::text IS NULL OR name ILIKE $1)
            ORDER BY name, id
            LIMIT $2 OFFSET $3
            "#,
            COMPANY_COLUMNS
        );
        let companies = sqlx::query_as::<_, Company>(&sql)
            .bind(&pattern)
            .bind(i64::from(page.size))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok((companies, total.max(0) as u64))
    }
}

/// Process-local repository used when no database is configured.
#[derive(Default)]
pub struct MemoryCompanyRepository {
    rows: RwLock<BTreeMap<i32, Company>>,
}

impl MemoryCompanyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompanyRepository for MemoryCompanyRepository {
    async fn insert(&self, new: NewCompany, now: DateTime<Utc>) -> AppResult<Company> {
        let mut rows = self.rows.write().await;
        let id = rows.keys().next_back().map_or(1, |last| last + 1);
        let company = Company::from_new(id, new, now);
        rows.insert(id, company.clone());
        Ok(company)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Company>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn update(&self, company: &Company) -> AppResult<()> {
        if let Some(row) = self.rows.write().await.get_mut(&company.id) {
            *row = company.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }

    async fn list_all(&self) -> AppResult<Vec<Company>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn search(&self, name: Option<&str>, page: Page) -> AppResult<(Vec<Company>, u64)> {
        let needle = name.map(|n| n.trim().to_lowercase());
        let mut matches: Vec<Company> = self
            .rows
            .read()
            .await
            .values()
            .filter(|c| {
                needle
                    .as_deref()
                    .is_none_or(|n| c.name.to_lowercase().contains(n))
            })
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

#[cfg(test)]
mod tests {
    use super::*;

    fn new_company(name: &str) -> NewCompany {
        NewCompany {
            tenant_id: 1,
            name: name.to_string(),
            description: None,
            created_by: None,
            created_user_id: None,
        }
    }

    #[tokio::test]
    async fn memory_search_filters_orders_and_pages() {
        let repo = MemoryCompanyRepository::new();
        for name in ["Zeta Labs", "acme", "Acme West", "Beta"] {
            repo.insert(new_company(name), Utc::now()).await.unwrap();
        }

        let (page, total) = repo
            .search(Some("ACME"), Page { number: 1, size: 1 })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Acme West");

        let (all, total) = repo.search(None, Page { number: 2, size: 3 }).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "acme");
    }

    #[tokio::test]
    async fn memory_ids_increase_and_delete_reports_presence() {
        let repo = MemoryCompanyRepository::new();
        let first = repo.insert(new_company("a"), Utc::now()).await.unwrap();
        let second = repo.insert(new_company("b"), Utc::now()).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        assert!(repo.delete(1).await.unwrap());
        assert!(!repo.delete(1).await.unwrap());
        assert!(repo.find_by_id(1).await.unwrap().is_none());
    }
}
