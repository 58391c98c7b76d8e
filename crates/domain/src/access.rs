//! Access policy: visibility and mutation rules for documents and accounts.
//!
//! All checks are pure functions over an optional [`Principal`] and
//! already-fetched records. Outcomes are [`AccessDecision`] values, never
//! errors; the policy denies by default whenever a rule does not explicitly
//! allow.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use docman_core::{AppError, Principal, UserId};

use crate::document::Document;

/// Visibility tier declared on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Visible to everyone, including anonymous requesters.
    Public,
    /// Visible to the owning account only.
    Private,
    /// Visible to principals at least as privileged as the owner's
    /// creation-time role tier.
    Role,
}

impl AccessLevel {
    /// Returns the storage string for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Role => "role",
        }
    }

    /// Parses a storage value leniently.
    ///
    /// Returns `None` for unrecognized values so that storage adapters can
    /// treat such rows as not visible instead of failing the whole request.
    #[must_use]
    pub fn parse_stored(value: &str) -> Option<Self> {
        Self::from_str(value).ok()
    }
}

impl FromStr for AccessLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "role" => Ok(Self::Role),
            _ => Err(AppError::Validation(format!(
                "unknown access level '{value}'"
            ))),
        }
    }
}

/// Why a policy check allowed or denied an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    /// Operation is permitted.
    Ok,
    /// Requester does not own the resource and is not privileged to act on it.
    NotOwner,
    /// Role-scoped resource requested by a lower-privileged non-owner.
    InsufficientRole,
    /// Resource absent. Produced by callers that resolve a lookup miss into
    /// a decision; the policy itself never conflates absent with hidden.
    NotFound,
}

/// Outcome of a policy check. Transient, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    allowed: bool,
    reason: AccessReason,
}

impl AccessDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: AccessReason::Ok,
        }
    }

    fn deny(reason: AccessReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    /// Creates the decision for an absent resource.
    #[must_use]
    pub fn not_found() -> Self {
        Self::deny(AccessReason::NotFound)
    }

    /// Returns whether the operation is permitted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Returns the reason code for this decision.
    #[must_use]
    pub fn reason(&self) -> AccessReason {
        self.reason
    }
}

/// Decides whether `principal` may view `document`.
///
/// Ownership is checked before the role-tier comparison, so authors always
/// see their own documents. An absent principal sees only public documents.
#[must_use]
pub fn can_view(principal: Option<Principal>, document: &Document) -> AccessDecision {
    match document.access {
        AccessLevel::Public => AccessDecision::allow(),
        AccessLevel::Private => match principal {
            Some(requester) if requester.id() == document.author_id => AccessDecision::allow(),
            _ => AccessDecision::deny(AccessReason::NotOwner),
        },
        AccessLevel::Role => match principal {
            Some(requester) if requester.id() == document.author_id => AccessDecision::allow(),
            Some(requester)
                if requester
                    .role()
                    .at_least_as_privileged_as(document.owner_role_rank) =>
            {
                AccessDecision::allow()
            }
            Some(_) => AccessDecision::deny(AccessReason::InsufficientRole),
            None => AccessDecision::deny(AccessReason::NotOwner),
        },
    }
}

/// Decides whether `principal` may update or delete `document`.
///
/// Strictly owner-or-admin: the role-tier comparison that relaxes viewing
/// never grants mutation rights.
#[must_use]
pub fn can_mutate(principal: Option<Principal>, document: &Document) -> AccessDecision {
    match principal {
        Some(requester) if requester.id() == document.author_id || requester.is_admin() => {
            AccessDecision::allow()
        }
        _ => AccessDecision::deny(AccessReason::NotOwner),
    }
}

/// Decides whether `principal` may update or delete the account owned by
/// `owner`. Same owner-or-admin rule as document mutation.
#[must_use]
pub fn can_manage_account(principal: Option<Principal>, owner: UserId) -> AccessDecision {
    match principal {
        Some(requester) if requester.id() == owner || requester.is_admin() => {
            AccessDecision::allow()
        }
        _ => AccessDecision::deny(AccessReason::NotOwner),
    }
}

/// Lazily filters `documents` down to the subset visible to `principal`.
///
/// Order-preserving and non-mutating; each element is kept exactly when
/// [`can_view`] allows it.
pub fn filter_visible<'a, I>(
    principal: Option<Principal>,
    documents: I,
) -> impl Iterator<Item = &'a Document>
where
    I: IntoIterator<Item = &'a Document>,
{
    documents
        .into_iter()
        .filter(move |document| can_view(principal, document).is_allowed())
}

/// Decides whether `document` appears when `principal` lists the documents
/// authored by `author`.
///
/// Admins and the author see every access level; other requesters see public
/// documents plus role-scoped ones their tier can view. Private documents of
/// another account are never listed.
#[must_use]
pub fn author_listing_allows(
    principal: Option<Principal>,
    author: UserId,
    document: &Document,
) -> bool {
    if document.author_id != author {
        return false;
    }

    if let Some(requester) = principal
        && (requester.is_admin() || requester.id() == author)
    {
        return true;
    }

    match document.access {
        AccessLevel::Public => true,
        AccessLevel::Private => false,
        AccessLevel::Role => principal.is_some_and(|requester| {
            requester
                .role()
                .at_least_as_privileged_as(document.owner_role_rank)
        }),
    }
}
