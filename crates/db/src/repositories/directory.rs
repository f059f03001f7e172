use sqlx::Row;

use claimflow_core::domain::employee::Employee;
use claimflow_core::errors::StoreError;
use claimflow_core::ports::DirectoryGateway;

use super::{decode, RepositoryError};
use crate::DbPool;

pub struct SqlDirectory {
    pool: DbPool,
}

impl SqlDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, employee: &Employee) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO employee (email, display_name, portal_role, manager_email, torch_bearer)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET
                 display_name = excluded.display_name,
                 portal_role = excluded.portal_role,
                 manager_email = excluded.manager_email,
                 torch_bearer = excluded.torch_bearer",
        )
        .bind(&employee.email)
        .bind(&employee.display_name)
        .bind(&employee.portal_role)
        .bind(&employee.manager_email)
        .bind(employee.torch_bearer)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_employee(row: &sqlx::sqlite::SqliteRow) -> Result<Employee, RepositoryError> {
    Ok(Employee {
        email: row.try_get("email").map_err(decode)?,
        display_name: row.try_get("display_name").map_err(decode)?,
        portal_role: row.try_get("portal_role").map_err(decode)?,
        manager_email: row.try_get("manager_email").map_err(decode)?,
        torch_bearer: row.try_get("torch_bearer").map_err(decode)?,
    })
}

#[async_trait::async_trait]
impl DirectoryGateway for SqlDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError> {
        let row = sqlx::query(
            "SELECT email, display_name, portal_role, manager_email, torch_bearer
             FROM employee WHERE lower(email) = lower(?)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        match row {
            Some(ref r) => Ok(Some(row_to_employee(r)?)),
            None => Ok(None),
        }
    }

    /// Several users may share a role; the lowest email wins so repeated
    /// lookups agree.
    async fn find_by_role(&self, role: &str) -> Result<Option<Employee>, StoreError> {
        let row = sqlx::query(
            "SELECT email, display_name, portal_role, manager_email, torch_bearer
             FROM employee WHERE lower(portal_role) = lower(?)
             ORDER BY email ASC LIMIT 1",
        )
        .bind(role.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        match row {
            Some(ref r) => Ok(Some(row_to_employee(r)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use claimflow_core::domain::employee::{roles, Employee};
    use claimflow_core::ports::DirectoryGateway;

    use super::SqlDirectory;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlDirectory {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlDirectory::new(pool)
    }

    #[tokio::test]
    async fn finds_employee_case_insensitively_with_manager_and_flags() {
        let directory = setup().await;
        directory
            .upsert(
                &Employee::new("priya@corp.test", roles::EMPLOYEE)
                    .with_display_name("Priya")
                    .with_manager("suresh@corp.test")
                    .torch_bearer(),
            )
            .await
            .expect("upsert");

        let found =
            directory.find_by_email("Priya@Corp.Test").await.expect("query").expect("present");

        assert_eq!(found.display_name, "Priya");
        assert_eq!(found.manager(), Some("suresh@corp.test"));
        assert!(found.torch_bearer);
    }

    #[tokio::test]
    async fn role_lookup_is_deterministic_across_holders() {
        let directory = setup().await;
        for email in ["zoe@corp.test", "arjun@corp.test", "meera@corp.test"] {
            directory.upsert(&Employee::new(email, roles::ADMIN_HEAD)).await.expect("upsert");
        }

        let first = directory.find_by_role("admin_head").await.expect("query").expect("holder");
        let second = directory.find_by_role("ADMIN_HEAD").await.expect("query").expect("holder");

        assert_eq!(first.email, "arjun@corp.test");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn vacant_role_is_none() {
        let directory = setup().await;

        assert!(directory.find_by_role(roles::CFO).await.expect("query").is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_manager() {
        let directory = setup().await;
        let employee = Employee::new("rajesh@corp.test", roles::EMPLOYEE);
        directory.upsert(&employee.clone().with_manager("old@corp.test")).await.expect("upsert");
        directory.upsert(&employee).await.expect("upsert");

        let found =
            directory.find_by_email("rajesh@corp.test").await.expect("query").expect("present");

        assert_eq!(found.manager(), None);
    }
}
