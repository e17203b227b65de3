//! Capability token shape (§4.2)
//!
//! A token is the signed unit; an envelope (see [`super::envelope`]) is the
//! ordered chain of tokens presented on a request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::Did;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub subject: Did,
    /// Dotted hierarchical path, e.g. `nil.db.queries.read`.
    pub command: String,
    pub audience: Did,
    #[serde(default)]
    pub policies: Vec<Value>,
    pub issuer: Did,
    /// Hex-encoded detached signature over this token's canonical signing
    /// bytes, produced by `issuer`'s key.
    pub signature: String,
}

impl Token {
    /// Bytes a signature is computed over: the token with `signature`
    /// stripped, canonicalized by `serde_json`'s field order.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let unsigned = serde_json::json!({
            "subject": self.subject.as_str(),
            "command": self.command,
            "audience": self.audience.as_str(),
            "policies": self.policies,
            "issuer": self.issuer.as_str(),
        });
        unsigned.to_string().into_bytes()
    }

    pub fn hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.signing_bytes());
        hasher.update(self.signature.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// §4.2 step 5: command `a.b.c` attenuates `a.b` but not `a.x`.
    pub fn attenuates(&self, required: &str) -> bool {
        super::attenuation::attenuates(&self.command, required)
    }
}
