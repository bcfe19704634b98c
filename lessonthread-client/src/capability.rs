use crate::{
    api::{Authored, CapabilitySet, IdentityClaims},
    store::InteractionStore,
};

/// Decides what the current caller may do with one comment or reply.
///
/// Evaluated in order, first grant wins:
/// 1. admin role claim (case-insensitive),
/// 2. exact string match between any identity candidate and any author
///    candidate of the item,
/// 3. a deletion credential held locally for this id (anonymous
///    self-authored item on this device).
/// Otherwise the caller can only report. A caller whose assertion could
/// not be decoded arrives here with `identity = None` and falls through to
/// the anonymous rules.
pub fn resolve(
    identity: Option<&IdentityClaims>,
    item: &impl Authored,
    store: &InteractionStore,
) -> CapabilitySet {
    if let Some(claims) = identity {
        if claims.is_admin() {
            return CapabilitySet::owner();
        }
        let candidates = claims.candidates();
        let authors = item.author_candidates();
        if candidates
            .iter()
            .any(|candidate| authors.iter().any(|author| author == candidate))
        {
            return CapabilitySet::owner();
        }
    }
    if store.deletion_credential(item.item_id()).is_some() {
        return CapabilitySet::owner();
    }
    CapabilitySet::report_only()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Comment, CommentId, CourseId};
    use crate::store::MemoryBackend;

    fn store() -> InteractionStore {
        InteractionStore::new(CourseId::new("algebra-101"), Box::new(MemoryBackend::default()))
    }

    fn item() -> Comment {
        Comment {
            id: CommentId::new("c1"),
            author: String::from("Alice"),
            role: None,
            author_email: Some(String::from("alice@example.com")),
            author_id: Some(String::from("u-1")),
            text: String::from("hello"),
            created_at: None,
            replies: vec![],
        }
    }

    #[test]
    fn admin_may_edit_anything() {
        let claims = IdentityClaims {
            role: Some(String::from("ADMIN")),
            ..Default::default()
        };
        let caps = resolve(Some(&claims), &item(), &store());
        assert!(caps.can_edit && caps.can_delete);
    }

    #[test]
    fn matching_identity_field_grants_ownership() {
        for claims in [
            IdentityClaims {
                email: Some(String::from("alice@example.com")),
                ..Default::default()
            },
            IdentityClaims {
                name: Some(String::from("Alice")),
                ..Default::default()
            },
            IdentityClaims {
                preferred_handle: Some(String::from("u-1")),
                ..Default::default()
            },
            IdentityClaims {
                subject: Some(String::from("u-1")),
                ..Default::default()
            },
        ] {
            let caps = resolve(Some(&claims), &item(), &store());
            assert!(caps.can_edit, "claims {claims:?}");
        }
    }

    #[test]
    fn non_matching_identity_gets_report_only() {
        let claims = IdentityClaims {
            email: Some(String::from("mallory@example.com")),
            name: Some(String::from("Mallory")),
            ..Default::default()
        };
        let caps = resolve(Some(&claims), &item(), &store());
        assert_eq!(caps, CapabilitySet::report_only());
        assert!(caps.can_report);
    }

    #[test]
    fn local_deletion_credential_grants_ownership() {
        let store = store();
        store.remember_deletion_credential(&CommentId::new("c1"), "tok-1");
        // with no identity at all
        assert_eq!(resolve(None, &item(), &store), CapabilitySet::owner());
        // and also with a non-matching identity, as the source does
        let claims = IdentityClaims {
            email: Some(String::from("mallory@example.com")),
            ..Default::default()
        };
        assert_eq!(resolve(Some(&claims), &item(), &store), CapabilitySet::owner());
    }

    #[test]
    fn anonymous_without_credential_gets_report_only() {
        assert_eq!(resolve(None, &item(), &store()), CapabilitySet::report_only());
    }

    #[test]
    fn resolve_is_deterministic() {
        let store = store();
        let claims = IdentityClaims {
            name: Some(String::from("Alice")),
            ..Default::default()
        };
        let first = resolve(Some(&claims), &item(), &store);
        let second = resolve(Some(&claims), &item(), &store);
        assert_eq!(first, second);
    }
}
