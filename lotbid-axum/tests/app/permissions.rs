use std::str::FromStr;

// Endpoint permission checks are exercised by putting a plain-text role in
// the `Authorization: Bearer <...>` header instead of a signed token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// May manage lots, rounds and buyers, and browse the directory
    Admin,
    /// May only browse the buyer directory
    Viewer,
}

impl Role {
    pub fn can_manage(self) -> bool {
        self == Role::Admin
    }

    pub fn can_view_buyers(self) -> bool {
        matches!(self, Role::Admin | Role::Viewer)
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "viewer" => Ok(Role::Viewer),
            _ => Err(()),
        }
    }
}
