//! ACL entries for owned documents (§3, §4.3)

use serde::{Deserialize, Serialize};

use super::did::Did;

/// Which bit a capability check is asserting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclBit {
    Read,
    Write,
    Execute,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    pub grantee: Did,
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl AclEntry {
    pub fn grants(&self, bit: AclBit) -> bool {
        match bit {
            AclBit::Read => self.read,
            AclBit::Write => self.write,
            AclBit::Execute => self.execute,
        }
    }
}

/// Upsert `entry` into `acl`, overwriting any existing entry for the same
/// grantee. §4.3: "grant-access overwrites an existing entry for the
/// same grantee atomically (delete then insert, same update)" and §3/§8
/// invariant 3: no two entries share a grantee.
pub fn upsert(acl: &mut Vec<AclEntry>, entry: AclEntry) {
    acl.retain(|e| e.grantee != entry.grantee);
    acl.push(entry);
}

pub fn revoke(acl: &mut Vec<AclEntry>, grantee: &Did) -> bool {
    let before = acl.len();
    acl.retain(|e| &e.grantee != grantee);
    acl.len() != before
}

pub fn find<'a>(acl: &'a [AclEntry], grantee: &Did) -> Option<&'a AclEntry> {
    acl.iter().find(|e| &e.grantee == grantee)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn did(s: &str) -> Did {
        Did::parse(s).unwrap()
    }

    #[test]
    fn upsert_overwrites_same_grantee() {
        let mut acl = vec![AclEntry {
            grantee: did("did:nil:aa"),
            read: true,
            write: false,
            execute: false,
        }];

        upsert(
            &mut acl,
            AclEntry {
                grantee: did("did:nil:aa"),
                read: false,
                write: true,
                execute: false,
            },
        );

        assert_eq!(acl.len(), 1);
        assert!(acl[0].write);
        assert!(!acl[0].read);
    }

    #[test]
    fn revoke_removes_entry() {
        let mut acl = vec![AclEntry {
            grantee: did("did:nil:aa"),
            read: true,
            write: false,
            execute: false,
        }];
        assert!(revoke(&mut acl, &did("did:nil:aa")));
        assert!(acl.is_empty());
        assert!(!revoke(&mut acl, &did("did:nil:aa")));
    }
}
