use crate::prelude::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Instructor,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct User {
    #[new(default)]
    pub id: Record<User>,
    #[new(default)]
    pub created_at: Timestamp,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[new(default)]
    #[serde(default)]
    pub role: Role,
    #[new(value = "true")]
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

define_table!("users" : User = id);

define_relation! {
    User > get(id: &Record<User>) > Option<User>
        where "SELECT * FROM $id"
}

fn active_by_default() -> bool {
    true
}

/// The authenticated caller of a request. Passed explicitly into every service call.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Principal {
    pub id: Record<User>,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal::new(user.id.clone(), user.role)
    }
}
