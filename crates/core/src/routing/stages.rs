use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::claim::ClaimStatus;
use crate::domain::employee::roles;

/// How the approver of a stage is found.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Whoever currently holds the portal role.
    FixedRole(String),
    /// The submitting employee's manager as recorded in the directory.
    ManagerOfEmployee,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub status: ClaimStatus,
    pub resolution: ResolutionMode,
    pub next_status: ClaimStatus,
    /// Torch bearers bypass this stage entirely.
    pub skip_for_torch_bearer: bool,
}

impl StageDefinition {
    pub fn fixed_role(status: &str, role: &str, next_status: &str) -> Self {
        Self {
            status: ClaimStatus::new(status),
            resolution: ResolutionMode::FixedRole(role.to_string()),
            next_status: ClaimStatus::new(next_status),
            skip_for_torch_bearer: false,
        }
    }

    pub fn manager_of_employee(status: &str, next_status: &str) -> Self {
        Self {
            status: ClaimStatus::new(status),
            resolution: ResolutionMode::ManagerOfEmployee,
            next_status: ClaimStatus::new(next_status),
            skip_for_torch_bearer: false,
        }
    }

    pub fn skipped_for_torch_bearer(mut self) -> Self {
        self.skip_for_torch_bearer = true;
        self
    }
}

#[derive(Debug, Error)]
pub enum StageTableError {
    #[error("stage table must define at least one stage")]
    Empty,
    #[error("stage `{status}` is defined more than once")]
    DuplicateStage { status: ClaimStatus },
    #[error("stage `{status}` has a blank status, next status or role")]
    BlankField { status: ClaimStatus },
    #[error("stage `{status}` must declare exactly one of `fixed_role` or `manager_of_employee`")]
    AmbiguousResolution { status: ClaimStatus },
    #[error("stage chain loops back to `{status}`")]
    Cycle { status: ClaimStatus },
    #[error("stage `{status}` is not reachable from the first stage")]
    Unreachable { status: ClaimStatus },
    #[error("could not read stage table `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse stage table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Ordered approval pipeline keyed by the status each stage acts on.
///
/// Construction guarantees that following `next_status` from the first stage
/// visits every stage exactly once and ends on a single terminal status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageTable {
    stages: Vec<StageDefinition>,
    index: HashMap<ClaimStatus, usize>,
    terminal: ClaimStatus,
}

impl StageTable {
    pub fn new(stages: Vec<StageDefinition>) -> Result<Self, StageTableError> {
        let Some(first) = stages.first() else {
            return Err(StageTableError::Empty);
        };

        let mut index = HashMap::with_capacity(stages.len());
        for (position, stage) in stages.iter().enumerate() {
            let blank_role =
                matches!(&stage.resolution, ResolutionMode::FixedRole(role) if role.trim().is_empty());
            if stage.status.as_str().is_empty() || stage.next_status.as_str().is_empty() || blank_role
            {
                return Err(StageTableError::BlankField { status: stage.status.clone() });
            }
            if index.insert(stage.status.clone(), position).is_some() {
                return Err(StageTableError::DuplicateStage { status: stage.status.clone() });
            }
        }

        let mut visited = HashSet::with_capacity(stages.len());
        let mut current = first.status.clone();
        while let Some(&position) = index.get(&current) {
            if !visited.insert(current.clone()) {
                return Err(StageTableError::Cycle { status: current });
            }
            current = stages[position].next_status.clone();
        }

        if let Some(orphan) = stages.iter().find(|stage| !visited.contains(&stage.status)) {
            return Err(StageTableError::Unreachable { status: orphan.status.clone() });
        }

        Ok(Self { stages, index, terminal: current })
    }

    /// The reimbursement pipeline: verification, manager, admin head, CRO,
    /// CFO, then finance pays out.
    pub fn standard() -> Self {
        let stages = vec![
            StageDefinition::fixed_role(
                ClaimStatus::SUBMITTED,
                roles::JUNIOR_ADMIN,
                ClaimStatus::VERIFIED,
            )
            .skipped_for_torch_bearer(),
            StageDefinition::manager_of_employee(
                ClaimStatus::VERIFIED,
                ClaimStatus::MANAGER_APPROVED,
            ),
            StageDefinition::fixed_role(
                ClaimStatus::MANAGER_APPROVED,
                roles::ADMIN_HEAD,
                ClaimStatus::ADMIN_APPROVED,
            ),
            StageDefinition::fixed_role(
                ClaimStatus::ADMIN_APPROVED,
                roles::CRO,
                ClaimStatus::CRO_APPROVED,
            ),
            StageDefinition::fixed_role(
                ClaimStatus::CRO_APPROVED,
                roles::CFO,
                ClaimStatus::CFO_APPROVED,
            ),
            StageDefinition::fixed_role(ClaimStatus::CFO_APPROVED, roles::FINANCE, ClaimStatus::PAID),
        ];
        let index = stages
            .iter()
            .enumerate()
            .map(|(position, stage)| (stage.status.clone(), position))
            .collect();

        Self { stages, index, terminal: ClaimStatus::new(ClaimStatus::PAID) }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, StageTableError> {
        let file = toml::from_str::<StageTableFile>(raw)?;
        let stages =
            file.stages.into_iter().map(StageRecord::into_definition).collect::<Result<_, _>>()?;
        Self::new(stages)
    }

    pub fn load(path: &Path) -> Result<Self, StageTableError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| StageTableError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    pub fn stage(&self, status: &ClaimStatus) -> Option<&StageDefinition> {
        self.index.get(status).map(|&position| &self.stages[position])
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn terminal_status(&self) -> &ClaimStatus {
        &self.terminal
    }

    pub fn is_terminal(&self, status: &ClaimStatus) -> bool {
        *status == self.terminal
    }
}

impl Default for StageTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Deserialize)]
struct StageTableFile {
    #[serde(default)]
    stages: Vec<StageRecord>,
}

#[derive(Debug, Deserialize)]
struct StageRecord {
    status: String,
    next_status: String,
    fixed_role: Option<String>,
    #[serde(default)]
    manager_of_employee: bool,
    #[serde(default)]
    skip_for_torch_bearer: bool,
}

impl StageRecord {
    fn into_definition(self) -> Result<StageDefinition, StageTableError> {
        let status = ClaimStatus::new(self.status);
        let resolution = match (self.fixed_role, self.manager_of_employee) {
            (Some(role), false) => ResolutionMode::FixedRole(role.trim().to_string()),
            (None, true) => ResolutionMode::ManagerOfEmployee,
            _ => return Err(StageTableError::AmbiguousResolution { status }),
        };

        Ok(StageDefinition {
            status,
            resolution,
            next_status: ClaimStatus::new(self.next_status),
            skip_for_torch_bearer: self.skip_for_torch_bearer,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{ResolutionMode, StageDefinition, StageTable, StageTableError};
    use crate::domain::claim::ClaimStatus;

    #[test]
    fn standard_table_passes_validation() {
        let standard = StageTable::standard();
        let validated = StageTable::new(standard.stages().to_vec()).expect("standard table valid");

        assert_eq!(validated, standard);
        assert_eq!(standard.len(), 6);
        assert_eq!(standard.terminal_status().as_str(), "paid");
        assert!(standard.stage(&ClaimStatus::new("paid")).is_none());
    }

    #[test]
    fn verification_is_the_only_torch_bearer_stage() {
        let table = StageTable::standard();
        let exempt: Vec<&str> = table
            .stages()
            .iter()
            .filter(|stage| stage.skip_for_torch_bearer)
            .map(|stage| stage.status.as_str())
            .collect();

        assert_eq!(exempt, vec!["submitted"]);
    }

    #[test]
    fn rejects_empty_table() {
        assert!(matches!(StageTable::new(Vec::new()), Err(StageTableError::Empty)));
    }

    #[test]
    fn rejects_duplicate_stage() {
        let error = StageTable::new(vec![
            StageDefinition::fixed_role("submitted", "junior_admin", "verified"),
            StageDefinition::fixed_role("submitted", "admin_head", "paid"),
        ])
        .expect_err("duplicate keys");

        assert!(matches!(error, StageTableError::DuplicateStage { ref status } if status.as_str() == "submitted"));
    }

    #[test]
    fn rejects_cycle() {
        let error = StageTable::new(vec![
            StageDefinition::fixed_role("submitted", "junior_admin", "verified"),
            StageDefinition::manager_of_employee("verified", "submitted"),
        ])
        .expect_err("cycle");

        assert!(matches!(error, StageTableError::Cycle { .. }));
    }

    #[test]
    fn rejects_stage_unreachable_from_first() {
        let error = StageTable::new(vec![
            StageDefinition::fixed_role("submitted", "junior_admin", "paid"),
            StageDefinition::fixed_role("audited", "auditor", "paid"),
        ])
        .expect_err("orphan");

        assert!(matches!(error, StageTableError::Unreachable { ref status } if status.as_str() == "audited"));
    }

    #[test]
    fn rejects_blank_role() {
        let error = StageTable::new(vec![StageDefinition::fixed_role("submitted", "  ", "paid")])
            .expect_err("blank role");

        assert!(matches!(error, StageTableError::BlankField { .. }));
    }

    #[test]
    fn loads_reconfigured_pipeline_from_toml() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("stages.toml");
        fs::write(
            &path,
            r#"
[[stages]]
status = "submitted"
fixed_role = "junior_admin"
next_status = "verified"
skip_for_torch_bearer = true

[[stages]]
status = "verified"
manager_of_employee = true
next_status = "audited"

[[stages]]
status = "audited"
fixed_role = "auditor"
next_status = "reimbursed"
"#,
        )
        .expect("write stage file");

        let table = StageTable::load(&path).expect("load table");

        assert_eq!(table.len(), 3);
        assert_eq!(table.terminal_status().as_str(), "reimbursed");
        let audited = table.stage(&ClaimStatus::new("audited")).expect("audited stage");
        assert_eq!(audited.resolution, ResolutionMode::FixedRole("auditor".to_string()));
        assert!(table.stage(&ClaimStatus::new("submitted")).expect("submitted").skip_for_torch_bearer);
    }

    #[test]
    fn toml_stage_must_pick_one_resolution_mode() {
        let error = StageTable::from_toml_str(
            r#"
[[stages]]
status = "submitted"
fixed_role = "junior_admin"
manager_of_employee = true
next_status = "paid"
"#,
        )
        .expect_err("both modes");

        assert!(matches!(error, StageTableError::AmbiguousResolution { .. }));
    }
}
