//! Query scope builder: declarative storage filters for document listings.
//!
//! A [`Predicate`] is an abstract filter tree over document fields. Storage
//! adapters translate it into their own query language; [`Predicate::matches`]
//! evaluates it against in-memory records. The builders here mirror the
//! access policy in `access` exactly, so listings fetched under a scope
//! contain precisely the rows a client-side [`crate::can_view`] pass would
//! keep.

use docman_core::{Principal, RoleRank, UserId};

use crate::access::AccessLevel;
use crate::document::Document;

/// Declarative filter over document fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Document declares exactly this access level.
    AccessIs(AccessLevel),
    /// Document is authored by this account.
    AuthorIs(UserId),
    /// Document owner's creation-time tier is visible to the given
    /// privilege, i.e. the given role is at least as privileged as the
    /// owner's captured rank.
    OwnerRoleVisibleTo(RoleRank),
    /// Document title contains the given text, case-insensitively.
    TitleContains(String),
    /// Every child predicate holds. An empty conjunction holds trivially.
    And(Vec<Predicate>),
    /// At least one child predicate holds. An empty disjunction never holds.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Evaluates the predicate against an in-memory document.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::AccessIs(level) => document.access == *level,
            Self::AuthorIs(author) => document.author_id == *author,
            Self::OwnerRoleVisibleTo(role) => {
                role.at_least_as_privileged_as(document.owner_role_rank)
            }
            Self::TitleContains(text) => document
                .title
                .to_lowercase()
                .contains(&text.to_lowercase()),
            Self::And(children) => children.iter().all(|child| child.matches(document)),
            Self::Or(children) => children.iter().any(|child| child.matches(document)),
        }
    }

    /// Combines this predicate with another under a conjunction.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut children) => {
                children.push(other);
                Self::And(children)
            }
            _ => Self::And(vec![self, other]),
        }
    }
}

/// Builds the storage scope for a general document listing.
///
/// Kept in lockstep with [`crate::can_view`]: public documents, the
/// requester's own documents, and role-scoped documents whose owner tier the
/// requester's privilege covers. An absent principal scopes down to public
/// documents only.
#[must_use]
pub fn scope_for_listing(principal: Option<Principal>) -> Predicate {
    let Some(requester) = principal else {
        return Predicate::AccessIs(AccessLevel::Public);
    };

    Predicate::Or(vec![
        Predicate::AccessIs(AccessLevel::Public),
        Predicate::AuthorIs(requester.id()),
        Predicate::And(vec![
            Predicate::AccessIs(AccessLevel::Role),
            Predicate::OwnerRoleVisibleTo(requester.role()),
        ]),
    ])
}

/// Builds the storage scope for listing one author's documents.
///
/// Mirrors [`crate::author_listing_allows`]: admins and the author get the
/// full set; other principals get public documents plus role-scoped ones
/// their tier can view; anonymous requesters get public documents only.
#[must_use]
pub fn scope_for_user_documents(principal: Option<Principal>, author: UserId) -> Predicate {
    let author_clause = Predicate::AuthorIs(author);

    match principal {
        Some(requester) if requester.is_admin() || requester.id() == author => author_clause,
        Some(requester) => author_clause.and(Predicate::Or(vec![
            Predicate::AccessIs(AccessLevel::Public),
            Predicate::And(vec![
                Predicate::AccessIs(AccessLevel::Role),
                Predicate::OwnerRoleVisibleTo(requester.role()),
            ]),
        ])),
        None => author_clause.and(Predicate::AccessIs(AccessLevel::Public)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use docman_core::{Principal, RoleRank, UserId};
    use proptest::prelude::*;

    use crate::access::{AccessLevel, author_listing_allows, can_view};
    use crate::document::{Document, DocumentId};

    use super::{Predicate, scope_for_listing, scope_for_user_documents};

    fn document(id: i64, access: AccessLevel, author: i64, owner_rank: RoleRank) -> Document {
        Document {
            id: DocumentId::from_i64(id),
            title: format!("doc-{id}"),
            content: "body".to_owned(),
            access,
            author_id: UserId::from_i64(author),
            owner_role_rank: owner_rank,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn title_predicate_is_case_insensitive() {
        let mut doc = document(1, AccessLevel::Public, 1, RoleRank::Member);
        doc.title = "Quarterly Report".to_owned();

        assert!(Predicate::TitleContains("quarterly".to_owned()).matches(&doc));
        assert!(Predicate::TitleContains("REPORT".to_owned()).matches(&doc));
        assert!(!Predicate::TitleContains("annual".to_owned()).matches(&doc));
    }

    #[test]
    fn empty_conjunction_holds_and_empty_disjunction_does_not() {
        let doc = document(1, AccessLevel::Public, 1, RoleRank::Member);
        assert!(Predicate::And(Vec::new()).matches(&doc));
        assert!(!Predicate::Or(Vec::new()).matches(&doc));
    }

    #[test]
    fn and_helper_flattens_existing_conjunctions() {
        let combined = Predicate::AuthorIs(UserId::from_i64(1))
            .and(Predicate::AccessIs(AccessLevel::Public))
            .and(Predicate::TitleContains("notes".to_owned()));

        match combined {
            Predicate::And(children) => assert_eq!(children.len(), 3),
            other => panic!("expected flattened conjunction, got {other:?}"),
        }
    }

    #[test]
    fn anonymous_listing_scope_is_public_only() {
        let scope = scope_for_listing(None);
        assert!(scope.matches(&document(1, AccessLevel::Public, 5, RoleRank::Member)));
        assert!(!scope.matches(&document(2, AccessLevel::Private, 5, RoleRank::Member)));
        assert!(!scope.matches(&document(3, AccessLevel::Role, 5, RoleRank::Member)));
    }

    #[test]
    fn admin_author_listing_scope_admits_private_documents() {
        let admin = Principal::new(UserId::from_i64(1), RoleRank::Admin);
        let author = UserId::from_i64(5);
        let scope = scope_for_user_documents(Some(admin), author);

        assert!(scope.matches(&document(1, AccessLevel::Private, 5, RoleRank::Member)));
        assert!(!scope.matches(&document(2, AccessLevel::Private, 6, RoleRank::Member)));
    }

    fn access_level_strategy() -> impl Strategy<Value = AccessLevel> {
        prop_oneof![
            Just(AccessLevel::Public),
            Just(AccessLevel::Private),
            Just(AccessLevel::Role),
        ]
    }

    fn role_strategy() -> impl Strategy<Value = RoleRank> {
        prop_oneof![Just(RoleRank::Admin), Just(RoleRank::Member)]
    }

    fn document_strategy() -> impl Strategy<Value = Document> {
        (1i64..=6, access_level_strategy(), 1i64..=6, role_strategy()).prop_map(
            |(id, access, author, owner_rank)| document(id, access, author, owner_rank),
        )
    }

    fn principal_strategy() -> impl Strategy<Value = Option<Principal>> {
        proptest::option::of(
            (1i64..=6, role_strategy())
                .prop_map(|(id, role)| Principal::new(UserId::from_i64(id), role)),
        )
    }

    proptest! {
        #[test]
        fn listing_scope_agrees_with_can_view(
            principal in principal_strategy(),
            doc in document_strategy(),
        ) {
            prop_assert_eq!(
                scope_for_listing(principal).matches(&doc),
                can_view(principal, &doc).is_allowed()
            );
        }

        #[test]
        fn user_documents_scope_agrees_with_author_listing_rule(
            principal in principal_strategy(),
            author in (1i64..=6).prop_map(UserId::from_i64),
            doc in document_strategy(),
        ) {
            prop_assert_eq!(
                scope_for_user_documents(principal, author).matches(&doc),
                author_listing_allows(principal, author, &doc)
            );
        }
    }
}
