use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Veterinarian,
    Receptionist,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Veterinarian => "VETERINARIAN",
            Role::Receptionist => "RECEPTIONIST",
            Role::Customer => "CUSTOMER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "VETERINARIAN" | "VET" => Some(Role::Veterinarian),
            "RECEPTIONIST" => Some(Role::Receptionist),
            "CUSTOMER" => Some(Role::Customer),
            _ => None,
        }
    }

    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Customer)
    }
}
