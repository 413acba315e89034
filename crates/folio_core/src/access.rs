//! Document access model.
//!
//! A document has exactly one owner, zero or more per-user share grants, and
//! a visibility flag. Effective access is always *computed* from those three
//! inputs, never stored: the owner never appears in the share table, and a
//! public document grants read access to anyone, authenticated or not.

use serde::{Deserialize, Serialize};

/// Document visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the owner and users with a share grant can see the document
    #[default]
    Private,
    /// Anyone can read the document, including anonymous visitors
    Public,
}

impl Visibility {
    /// Database and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
        }
    }

    /// Parse the database representation. Unknown values fall back to
    /// private, the restrictive direction.
    pub fn parse(s: &str) -> Self {
        match s {
            "public" => Visibility::Public,
            _ => Visibility::Private,
        }
    }
}

/// Permission level of a share grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    /// Read-only access
    View,
    /// Read and write access
    Edit,
}

impl SharePermission {
    /// Database and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePermission::View => "view",
            SharePermission::Edit => "edit",
        }
    }

    /// Parse the database representation. Unknown values fall back to view,
    /// the restrictive direction.
    pub fn parse(s: &str) -> Self {
        match s {
            "edit" => SharePermission::Edit,
            _ => SharePermission::View,
        }
    }
}

/// Effective access of a requester (or anonymous visitor) on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The requester owns the document and holds full rights
    Owner,
    /// The requester has an explicit share grant
    Shared(SharePermission),
    /// No grant, but the document is public (read-only)
    Public,
    /// No access at all
    None,
}

impl Access {
    /// Whether the document content and version history may be read
    pub fn can_read(&self) -> bool {
        !matches!(self, Access::None)
    }

    /// Whether the document content and title may be changed
    pub fn can_edit(&self) -> bool {
        matches!(self, Access::Owner | Access::Shared(SharePermission::Edit))
    }

    /// Whether the requester is the owner (visibility changes, share
    /// management)
    pub fn is_owner(&self) -> bool {
        matches!(self, Access::Owner)
    }
}

/// Resolve the effective access of `requester` on a document.
///
/// Priority order: ownership, then an explicit share grant, then public
/// visibility. `requester` is `None` for anonymous requests, which can still
/// earn [`Access::Public`].
pub fn resolve_access(
    owner_id: &str,
    visibility: Visibility,
    share: Option<SharePermission>,
    requester: Option<&str>,
) -> Access {
    if requester == Some(owner_id) {
        return Access::Owner;
    }
    if let Some(permission) = share {
        return Access::Shared(permission);
    }
    if visibility == Visibility::Public {
        return Access::Public;
    }
    Access::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_wins_over_share_and_visibility() {
        let access = resolve_access(
            "alice",
            Visibility::Public,
            Some(SharePermission::View),
            Some("alice"),
        );
        assert_eq!(access, Access::Owner);
        assert!(access.can_read());
        assert!(access.can_edit());
        assert!(access.is_owner());
    }

    #[test]
    fn test_share_grant_beats_visibility() {
        let access = resolve_access(
            "alice",
            Visibility::Public,
            Some(SharePermission::Edit),
            Some("bob"),
        );
        assert_eq!(access, Access::Shared(SharePermission::Edit));
        assert!(access.can_edit());
        assert!(!access.is_owner());
    }

    #[test]
    fn test_view_share_cannot_edit() {
        let access = resolve_access(
            "alice",
            Visibility::Private,
            Some(SharePermission::View),
            Some("bob"),
        );
        assert!(access.can_read());
        assert!(!access.can_edit());
    }

    #[test]
    fn test_public_document_readable_by_stranger() {
        let access = resolve_access("alice", Visibility::Public, None, Some("bob"));
        assert_eq!(access, Access::Public);
        assert!(access.can_read());
        assert!(!access.can_edit());
    }

    #[test]
    fn test_public_document_readable_anonymously() {
        let access = resolve_access("alice", Visibility::Public, None, None);
        assert_eq!(access, Access::Public);
    }

    #[test]
    fn test_private_document_denied_to_stranger() {
        let access = resolve_access("alice", Visibility::Private, None, Some("bob"));
        assert_eq!(access, Access::None);
        assert!(!access.can_read());
    }

    #[test]
    fn test_private_document_denied_anonymously() {
        let access = resolve_access("alice", Visibility::Private, None, None);
        assert_eq!(access, Access::None);
    }

    #[test]
    fn test_round_trip_representations() {
        assert_eq!(Visibility::parse(Visibility::Public.as_str()), Visibility::Public);
        assert_eq!(Visibility::parse(Visibility::Private.as_str()), Visibility::Private);
        assert_eq!(Visibility::parse("garbage"), Visibility::Private);
        assert_eq!(
            SharePermission::parse(SharePermission::Edit.as_str()),
            SharePermission::Edit
        );
        assert_eq!(SharePermission::parse("garbage"), SharePermission::View);
    }
}
