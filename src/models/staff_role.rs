use serde::{Deserialize, Serialize};

/// Staff roles, ordered roughly by authority.
///
/// The set is closed: roles are not stored as rows, they are a property of
/// the account. Authorization is derived statically from the role via
/// [`StaffRole::permissions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Pharmacist,
    PharmacyTech,
    Manager,
    Administrator,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Pharmacist => "pharmacist",
            StaffRole::PharmacyTech => "pharmacy_tech",
            StaffRole::Manager => "manager",
            StaffRole::Administrator => "administrator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pharmacist" => Some(StaffRole::Pharmacist),
            "pharmacy_tech" => Some(StaffRole::PharmacyTech),
            "manager" => Some(StaffRole::Manager),
            "administrator" => Some(StaffRole::Administrator),
            _ => None,
        }
    }

    pub fn all() -> Vec<StaffRole> {
        vec![
            StaffRole::Pharmacist,
            StaffRole::PharmacyTech,
            StaffRole::Manager,
            StaffRole::Administrator,
        ]
    }

    /// Permission strings granted to this role
    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            StaffRole::Administrator => &[
                "staff.view",
                "staff.manage",
                "requests.resolve",
                "notifications.send",
                "audit.view",
            ],
            StaffRole::Manager => &["staff.view", "notifications.send"],
            StaffRole::Pharmacist | StaffRole::PharmacyTech => &[],
        }
    }

    pub fn is_administrator(&self) -> bool {
        matches!(self, StaffRole::Administrator)
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
