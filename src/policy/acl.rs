//! User-owns-document / ACL evaluation (§4.3)
//!
//! Standard documents are governed only by builder-owns-collection (see
//! [`super::ownership`]); this module applies only to `owned` documents.

use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::ids::{AclBit, AclEntry, Did};

fn owner_of(doc: &Value) -> Option<Did> {
    doc.get("_owner")
        .and_then(|v| v.as_str())
        .and_then(|s| Did::parse(s).ok())
}

fn acl_of(doc: &Value) -> Vec<AclEntry> {
    doc.get("_acl")
        .cloned()
        .map(|v| serde_json::from_value(v).unwrap_or_default())
        .unwrap_or_default()
}

/// §4.3: caller must either own the document, or hold an `_acl` entry
/// granting the required bit.
pub fn require_access(caller: &Did, doc: &Value, bit: AclBit) -> AppResult<()> {
    if owner_of(doc).as_ref() == Some(caller) {
        return Ok(());
    }
    let acl = acl_of(doc);
    if crate::ids::acl::find(&acl, caller).is_some_and(|e| e.grants(bit)) {
        return Ok(());
    }
    Err(AppError::ResourceAccessDenied(
        "caller does not own this document and has no granting ACL entry".to_string(),
    ))
}

/// §4.3: "only the owner may add/remove ACL entries" — unlike
/// [`require_access`], a write-granted ACL entry is not sufficient here.
pub fn require_owns_document(caller: &Did, doc: &Value) -> AppResult<()> {
    if owner_of(doc).as_ref() == Some(caller) {
        Ok(())
    } else {
        Err(AppError::ResourceAccessDenied(
            "only the document owner may mutate its ACL".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn did(s: &str) -> Did {
        Did::parse(s).unwrap()
    }

    #[test]
    fn owner_always_passes() {
        let doc = json!({"_id": Uuid::new_v4().to_string(), "_owner": "did:nil:aa", "_acl": []});
        assert!(require_access(&did("did:nil:aa"), &doc, AclBit::Write).is_ok());
    }

    #[test]
    fn acl_grant_passes_for_granted_bit_only() {
        let doc = json!({
            "_owner": "did:nil:aa",
            "_acl": [{"grantee": "did:nil:bb", "read": true, "write": false, "execute": false}],
        });
        assert!(require_access(&did("did:nil:bb"), &doc, AclBit::Read).is_ok());
        assert!(require_access(&did("did:nil:bb"), &doc, AclBit::Write).is_err());
    }

    #[test]
    fn stranger_is_denied() {
        let doc = json!({"_owner": "did:nil:aa", "_acl": []});
        assert!(require_access(&did("did:nil:zz"), &doc, AclBit::Read).is_err());
    }

    #[test]
    fn owns_document_rejects_grantee_with_write_bit() {
        let doc = json!({
            "_owner": "did:nil:aa",
            "_acl": [{"grantee": "did:nil:bb", "read": false, "write": true, "execute": false}],
        });
        assert!(require_owns_document(&did("did:nil:aa"), &doc).is_ok());
        assert!(require_owns_document(&did("did:nil:bb"), &doc).is_err());
    }
}
