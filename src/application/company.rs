use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{MAX_NAME_LENGTH, PageQuery, RequestHandlers};
use crate::cache::keys::{self, COMPANY_PREFIX};
use crate::database::models::{Company, CompanyChanges, NewCompany};
use crate::error::{AppError, AppResult};
use crate::events::DomainEvent;
use crate::pipeline::validation::Rules;
use crate::pipeline::{Cacheable, Handler, Request};
use crate::result::PaginatedResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDto {
    pub id: i32,
    pub guid: Uuid,
    pub tenant_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl From<Company> for CompanyDto {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            guid: company.guid,
            tenant_id: company.tenant_id,
            name: company.name,
            description: company.description,
            created_by: company.created_by,
            created_date: company.created_date,
            updated_by: company.updated_by,
            updated_date: company.updated_date,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompany {
    #[serde(default)]
    pub tenant_id: i32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub created_user_id: Option<String>,
}

impl Request for CreateCompany {
    type Response = CompanyDto;

    fn validate(&self) -> Result<(), Vec<String>> {
        Rules::new()
            .positive("TenantId", i64::from(self.tenant_id))
            .required("Name", self.name.as_deref())
            .max_len("Name", self.name.as_deref(), MAX_NAME_LENGTH)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompany {
    #[serde(default)]
    pub id: i32,
    pub tenant_id: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub updated_by: Option<String>,
    pub updated_user_id: Option<String>,
}

impl Request for UpdateCompany {
    type Response = ();

    fn validate(&self) -> Result<(), Vec<String>> {
        Rules::new()
            .positive("Id", i64::from(self.id))
            .max_len("Name", self.name.as_deref(), MAX_NAME_LENGTH)
            .required("UpdatedBy", self.updated_by.as_deref())
            .required("UpdatedUserId", self.updated_user_id.as_deref())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteCompany {
    pub id: i32,
}

impl Request for DeleteCompany {
    type Response = ();

    fn validate(&self) -> Result<(), Vec<String>> {
        Rules::new().positive("Id", i64::from(self.id)).finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCompanies {
    #[serde(default)]
    pub bypass_cache: bool,
}

impl Cacheable for ListCompanies {
    fn bypass_cache(&self) -> bool {
        self.bypass_cache
    }

    fn cache_key(&self) -> String {
        keys::company_all_key()
    }
}

impl Request for ListCompanies {
    type Response = Vec<CompanyDto>;

    fn cacheable(&self) -> Option<&dyn Cacheable> {
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedCompanies {
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub bypass_cache: bool,
}

impl PaginatedCompanies {
    fn paging(&self) -> PageQuery {
        PageQuery::new(self.page_number, self.page_size)
    }
}

impl Cacheable for PaginatedCompanies {
    fn bypass_cache(&self) -> bool {
        self.bypass_cache
    }

    fn cache_key(&self) -> String {
        keys::company_paginated_key(self.page_number, self.page_size)
    }
}

impl Request for PaginatedCompanies {
    type Response = PaginatedResult<CompanyDto>;

    fn cacheable(&self) -> Option<&dyn Cacheable> {
        Some(self)
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut rules = Rules::new();
        self.paging().check(&mut rules);
        rules.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCompanies {
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
    pub name: Option<String>,
    #[serde(default)]
    pub bypass_cache: bool,
}

impl SearchCompanies {
    fn name_filter(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

impl Cacheable for SearchCompanies {
    fn bypass_cache(&self) -> bool {
        self.bypass_cache
    }

    fn cache_key(&self) -> String {
        keys::company_search_key(self.page_number, self.page_size, self.name_filter())
    }
}

impl Request for SearchCompanies {
    type Response = PaginatedResult<CompanyDto>;

    fn cacheable(&self) -> Option<&dyn Cacheable> {
        Some(self)
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut rules = Rules::new();
        PageQuery::new(self.page_number, self.page_size).check(&mut rules);
        rules
            .max_len("Name", self.name.as_deref(), MAX_NAME_LENGTH)
            .finish()
    }
}

#[async_trait]
impl Handler<CreateCompany> for RequestHandlers {
    async fn handle(&self, request: CreateCompany) -> AppResult<CompanyDto> {
        let new = NewCompany {
            tenant_id: request.tenant_id,
            name: request.name.unwrap_or_default().trim().to_string(),
            description: request.description,
            created_by: request.created_by,
            created_user_id: request.created_user_id,
        };

        let company = self
            .repositories
            .companies
            .insert(new, self.clock.now())
            .await?;
        info!("Company created: {} - {}", company.id, company.name);

        self.invalidate(COMPANY_PREFIX).await;
        self.publish(DomainEvent::CompanyCreated {
            id: company.id,
            guid: company.guid,
            name: company.name.clone(),
        })
        .await;

        Ok(company.into())
    }
}

#[async_trait]
impl Handler<UpdateCompany> for RequestHandlers {
    async fn handle(&self, request: UpdateCompany) -> AppResult<()> {
        let companies = &self.repositories.companies;
        let mut company = companies
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Company {} was not found.", request.id)))?;

        company.apply(
            CompanyChanges {
                tenant_id: request.tenant_id,
                name: request.name,
                description: request.description,
                updated_by: request.updated_by.unwrap_or_default(),
                updated_user_id: request.updated_user_id.unwrap_or_default(),
            },
            self.clock.now(),
        );
        companies.update(&company).await?;
        info!("Company updated: {}", company.id);

        self.invalidate(COMPANY_PREFIX).await;
        self.publish(DomainEvent::CompanyUpdated {
            id: company.id,
            guid: company.guid,
        })
        .await;

        Ok(())
    }
}

#[async_trait]
impl Handler<DeleteCompany> for RequestHandlers {
    async fn handle(&self, request: DeleteCompany) -> AppResult<()> {
        if !self.repositories.companies.delete(request.id).await? {
            return Err(AppError::NotFound(format!(
                "Company {} was not found.",
                request.id
            )));
        }
        info!("Company deleted: {}", request.id);

        self.invalidate(COMPANY_PREFIX).await;
        self.publish(DomainEvent::CompanyDeleted { id: request.id })
            .await;

        Ok(())
    }
}

#[async_trait]
impl Handler<ListCompanies> for RequestHandlers {
    async fn handle(&self, _request: ListCompanies) -> AppResult<Vec<CompanyDto>> {
        let companies = self.repositories.companies.list_all().await?;
        Ok(companies.into_iter().map(CompanyDto::from).collect())
    }
}

#[async_trait]
impl Handler<PaginatedCompanies> for RequestHandlers {
    async fn handle(&self, request: PaginatedCompanies) -> AppResult<PaginatedResult<CompanyDto>> {
        let page = request.paging().page();
        let (companies, total) = self.repositories.companies.search(None, page).await?;
        Ok(PaginatedResult::create(
            companies.into_iter().map(CompanyDto::from).collect(),
            total,
            page.number,
            page.size,
        ))
    }
}

#[async_trait]
impl Handler<SearchCompanies> for RequestHandlers {
    async fn handle(&self, request: SearchCompanies) -> AppResult<PaginatedResult<CompanyDto>> {
        let page = PageQuery::new(request.page_number, request.page_size).page();
        let (companies, total) = self
            .repositories
            .companies
            .search(request.name_filter(), page)
            .await?;
        Ok(PaginatedResult::create(
            companies.into_iter().map(CompanyDto::from).collect(),
            total,
            page.number,
            page.size,
        ))
    }
}
