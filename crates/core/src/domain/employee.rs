use serde::{Deserialize, Serialize};

/// Role labels used by the built-in stage table.
pub mod roles {
    pub const JUNIOR_ADMIN: &str = "junior_admin";
    pub const MANAGER: &str = "manager";
    pub const ADMIN_HEAD: &str = "admin_head";
    pub const CRO: &str = "cro";
    pub const CFO: &str = "cfo";
    pub const FINANCE: &str = "finance";
    pub const EMPLOYEE: &str = "employee";
}

/// Directory view of a user. Read-only from the routing engine's side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub email: String,
    pub display_name: String,
    pub portal_role: String,
    pub manager_email: Option<String>,
    #[serde(default)]
    pub torch_bearer: bool,
}

impl Employee {
    pub fn new(email: impl Into<String>, portal_role: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            display_name: email.clone(),
            email,
            portal_role: portal_role.into(),
            manager_email: None,
            torch_bearer: false,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_manager(mut self, manager_email: impl Into<String>) -> Self {
        self.manager_email = Some(manager_email.into());
        self
    }

    pub fn torch_bearer(mut self) -> Self {
        self.torch_bearer = true;
        self
    }

    /// A blank manager email left behind by a directory sync counts as no manager.
    pub fn manager(&self) -> Option<&str> {
        self.manager_email.as_deref().map(str::trim).filter(|email| !email.is_empty())
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.portal_role.trim().eq_ignore_ascii_case(role.trim())
    }
}
