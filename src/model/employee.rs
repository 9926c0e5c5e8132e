use serde::{Deserialize, Serialize};

/// Placeholder stored when the employee has no department or designation.
pub const NOT_SPECIFIED: &str = "Not specified";

/// The acting employee as resolved by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub employee_id: u64,
    pub name: Option<String>,
    pub department_name: Option<String>,
    pub designation_name: Option<String>,
}

/// Identity fields copied onto attendance and leave records at creation time.
/// Later profile edits do not touch records that already carry a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySnapshot {
    pub employee_name: String,
    pub department_name: String,
    pub designation_name: String,
}

impl EmployeeProfile {
    pub fn snapshot(&self) -> IdentitySnapshot {
        IdentitySnapshot {
            employee_name: or_not_specified(self.name.as_deref()),
            department_name: or_not_specified(self.department_name.as_deref()),
            designation_name: or_not_specified(self.designation_name.as_deref()),
        }
    }
}

fn or_not_specified(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_SPECIFIED.to_string(),
    }
}
