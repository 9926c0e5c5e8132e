use serde::Serialize;

/// Role ids as issued in access tokens.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    /// Approving or rejecting leave is an HR action.
    pub fn can_review_leave(self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}
