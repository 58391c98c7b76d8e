use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, UserId};

/// Storage value of the administrator rank.
pub const ADMIN_RANK: i16 = 1;

/// Storage value of the ordinary member rank.
pub const MEMBER_RANK: i16 = 2;

/// Privilege tier of a user account.
///
/// Ranks are totally ordered and a lower numeric rank denotes higher
/// privilege. Only the ordering relation is meaningful; the numeric values
/// exist for storage and wire compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleRank {
    /// Administrator, the highest-privileged tier.
    Admin,
    /// Ordinary member.
    Member,
}

impl RoleRank {
    /// Returns the numeric rank used in storage. Lower means more privileged.
    #[must_use]
    pub fn rank(self) -> i16 {
        match self {
            Self::Admin => ADMIN_RANK,
            Self::Member => MEMBER_RANK,
        }
    }

    /// Creates a role from its numeric storage rank.
    pub fn from_rank(value: i16) -> AppResult<Self> {
        match value {
            ADMIN_RANK => Ok(Self::Admin),
            MEMBER_RANK => Ok(Self::Member),
            _ => Err(AppError::Validation(format!(
                "unknown role rank '{value}'"
            ))),
        }
    }

    /// Returns whether this role is at least as privileged as `other`.
    #[must_use]
    pub fn at_least_as_privileged_as(self, other: Self) -> bool {
        self.rank() <= other.rank()
    }

    /// Returns whether this role is the administrator rank.
    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns the storage string for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl FromStr for RoleRank {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

/// Authenticated requester resolved by the session layer.
///
/// Carries only what access policy decisions need: the account identity and
/// its privilege tier. Credential verification happens before a `Principal`
/// is ever constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    id: UserId,
    role: RoleRank,
}

impl Principal {
    /// Creates a principal from an authenticated account.
    #[must_use]
    pub fn new(id: UserId, role: RoleRank) -> Self {
        Self { id, role }
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the privilege tier.
    #[must_use]
    pub fn role(&self) -> RoleRank {
        self.role
    }

    /// Returns whether the principal holds the administrator rank.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::UserId;

    use super::{Principal, RoleRank};

    #[test]
    fn admin_outranks_member() {
        assert!(RoleRank::Admin.at_least_as_privileged_as(RoleRank::Member));
        assert!(!RoleRank::Member.at_least_as_privileged_as(RoleRank::Admin));
    }

    #[test]
    fn every_rank_is_at_least_as_privileged_as_itself() {
        assert!(RoleRank::Admin.at_least_as_privileged_as(RoleRank::Admin));
        assert!(RoleRank::Member.at_least_as_privileged_as(RoleRank::Member));
    }

    #[test]
    fn role_roundtrips_through_storage_rank() {
        for role in [RoleRank::Admin, RoleRank::Member] {
            assert_eq!(RoleRank::from_rank(role.rank()).ok(), Some(role));
        }
    }

    #[test]
    fn unknown_rank_is_rejected() {
        assert!(RoleRank::from_rank(0).is_err());
        assert!(RoleRank::from_rank(3).is_err());
    }

    #[test]
    fn role_roundtrips_through_storage_string() {
        let parsed = RoleRank::from_str(RoleRank::Member.as_str());
        assert_eq!(parsed.ok(), Some(RoleRank::Member));
    }

    #[test]
    fn principal_exposes_identity_and_role() {
        let principal = Principal::new(UserId::from_i64(7), RoleRank::Admin);
        assert_eq!(principal.id(), UserId::from_i64(7));
        assert!(principal.is_admin());
    }
}
