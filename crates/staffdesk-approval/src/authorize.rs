use staffdesk_types::discord::{ADMINISTRATOR, Guild, Member, Role, Snowflake};

pub const DEFAULT_STAFF_ROLES: &[&str] = &["Commissioner", "Co-Commissioner"];

/// Why a member may (or may not) decide on applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    StaffRole,
    Administrator,
    Denied,
}

impl Authorization {
    pub fn is_allowed(self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// Role allow-list for reviewers. Names compare case-insensitively.
#[derive(Debug, Clone)]
pub struct StaffPolicy {
    roles: Vec<String>,
}

impl Default for StaffPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STAFF_ROLES.iter().copied())
    }
}

impl StaffPolicy {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            roles: roles
                .into_iter()
                .map(|r| r.as_ref().trim().to_lowercase())
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Check `member` (the user `actor`) against the allow-list, falling back
    /// to the administrator permission.
    pub fn authorize(&self, actor: Snowflake, member: &Member, guild: &Guild) -> Authorization {
        let held: Vec<&Role> = guild
            .roles
            .iter()
            .filter(|role| role.id == guild.id || member.roles.contains(&role.id))
            .collect();

        let staff = held
            .iter()
            .any(|role| self.roles.iter().any(|allowed| role.name.to_lowercase() == *allowed));
        if staff {
            return Authorization::StaffRole;
        }

        let admin = guild.owner_id == actor
            || held.iter().any(|role| role.permission_bits() & ADMINISTRATOR != 0);
        if admin {
            return Authorization::Administrator;
        }

        Authorization::Denied
    }
}
