use async_trait::async_trait;
use sqlx::{FromRow, MySqlPool};

use crate::model::employee::EmployeeProfile;
use crate::store::StoreError;

/// Resolves who the acting employee is at the time of a request.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn profile(&self, employee_id: u64) -> Result<EmployeeProfile, StoreError>;
}

#[derive(FromRow)]
struct ProfileRow {
    id: u64,
    name: Option<String>,
    department_name: Option<String>,
    designation_name: Option<String>,
}

/// Reads profiles from the HR `employees` table and its lookups.
#[derive(Clone)]
pub struct MySqlIdentityProvider {
    pool: MySqlPool,
}

impl MySqlIdentityProvider {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for MySqlIdentityProvider {
    async fn profile(&self, employee_id: u64) -> Result<EmployeeProfile, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT
                e.id,
                NULLIF(TRIM(CONCAT_WS(' ', e.first_name, e.last_name)), '') AS name,
                d.name AS department_name,
                j.title AS designation_name
            FROM employees e
            LEFT JOIN departments d ON d.id = e.department_id
            LEFT JOIN job_titles j ON j.id = e.job_title_id
            WHERE e.id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::EmployeeNotFound(employee_id))?;

        Ok(EmployeeProfile {
            employee_id: row.id,
            name: row.name,
            department_name: row.department_name,
            designation_name: row.designation_name,
        })
    }
}
