use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Company database entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: i32,
    pub guid: Uuid,
    pub tenant_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub created_user_id: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_user_id: Option<String>,
    pub updated_date: Option<DateTime<Utc>>,
}

/// Fields supplied when a company is created.
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub tenant_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub created_user_id: Option<String>,
}

/// Partial update; blank values leave the stored field alone.
#[derive(Debug, Clone, Default)]
pub struct CompanyChanges {
    pub tenant_id: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub updated_by: String,
    pub updated_user_id: String,
}

impl Company {
    pub fn from_new(id: i32, new: NewCompany, now: DateTime<Utc>) -> Self {
        Self {
            id,
            guid: Uuid::new_v4(),
            tenant_id: new.tenant_id,
            name: new.name,
            description: new.description,
            created_by: new.created_by,
            created_user_id: new.created_user_id,
            created_date: now,
            updated_by: None,
            updated_user_id: None,
            updated_date: None,
        }
    }

    pub fn apply(&mut self, changes: CompanyChanges, now: DateTime<Utc>) {
        if let Some(tenant_id) = changes.tenant_id.filter(|id| *id > 0) {
            self.tenant_id = tenant_id;
        }
        if let Some(name) = non_blank(changes.name) {
            self.name = name;
        }
        if let Some(description) = non_blank(changes.description) {
            self.description = Some(description);
        }
        self.updated_by = Some(changes.updated_by);
        self.updated_user_id = Some(changes.updated_user_id);
        self.updated_date = Some(now);
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Company {
        Company::from_new(
            1,
            NewCompany {
                tenant_id: 1,
                name: "Acme".into(),
                description: Some("anvils".into()),
                created_by: Some("wile".into()),
                created_user_id: Some("u1".into()),
            },
            Utc::now(),
        )
    }

    #[test]
    fn apply_copies_only_supplied_fields() {
        let mut company = sample();
        let now = Utc::now();

        company.apply(
            CompanyChanges {
                tenant_id: None,
                name: Some("Acme Corp".into()),
                description: Some("   ".into()),
                updated_by: "road".into(),
                updated_user_id: "u2".into(),
            },
            now,
        );

        assert_eq!(company.name, "Acme Corp");
        assert_eq!(company.description.as_deref(), Some("anvils"));
        assert_eq!(company.tenant_id, 1);
        assert_eq!(company.updated_by.as_deref(), Some("road"));
        assert_eq!(company.updated_date, Some(now));
    }
}
