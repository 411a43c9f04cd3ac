//! Row model for the read-only `profiles` lookup table.

use careline_core::Profile;

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ProfileRow {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileRow {
    pub fn into_core(self) -> Profile {
        Profile {
            user_id: self.user_id,
            first_name: self.first_name,
            last_name: self.last_name,
            avatar_url: self.avatar_url,
        }
    }
}
