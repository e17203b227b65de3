//! Signature chain validation (§4.2 steps 3-4)

use crate::error::AppError;
use crate::ids::Did;

use super::envelope::Envelope;
use super::verify::SignatureVerifier;

/// Validates that every token in `envelope.chain` is signed by its own
/// issuer, that audience(i) == issuer(i+1), that the innermost invocation
/// token's audience is this node, and that the root token's issuer is the
/// configured trust anchor.
pub fn validate_chain(
    envelope: &Envelope,
    verifier: &dyn SignatureVerifier,
    node_did: &Did,
    trust_anchor_public_key_hex: &str,
) -> Result<(), AppError> {
    for token in &envelope.chain {
        verifier
            .verify(token.issuer.key_hex(), &token.signing_bytes(), &token.signature)
            .map_err(|_| AppError::Unauthorized(format!("bad signature from issuer {}", token.issuer)))?;
    }

    for pair in envelope.chain.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if current.audience != next.issuer {
            return Err(AppError::Unauthorized(
                "broken delegation chain: audience/issuer mismatch".to_string(),
            ));
        }
    }

    if &envelope.invocation().audience != node_did {
        return Err(AppError::Unauthorized(
            "invocation token is not addressed to this node".to_string(),
        ));
    }

    if envelope.root().issuer.key_hex() != trust_anchor_public_key_hex.to_ascii_lowercase() {
        return Err(AppError::PaymentRequired(
            "chain root is not signed by the configured trust anchor".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::token::Token;
    use serde_json::json;

    struct AlwaysOk;
    impl SignatureVerifier for AlwaysOk {
        fn verify(&self, _pk: &str, _msg: &[u8], _sig: &str) -> Result<(), AppError> {
            Ok(())
        }
    }

    struct AlwaysFail;
    impl SignatureVerifier for AlwaysFail {
        fn verify(&self, _pk: &str, _msg: &[u8], _sig: &str) -> Result<(), AppError> {
            Err(AppError::Unauthorized("nope".to_string()))
        }
    }

    fn token(issuer: &str, audience: &str, command: &str) -> Token {
        Token {
            subject: Did::parse(issuer).unwrap(),
            command: command.to_string(),
            audience: Did::parse(audience).unwrap(),
            policies: vec![json!({})],
            issuer: Did::parse(issuer).unwrap(),
            signature: "00".to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_chain() {
        let anchor = "did:nil:aa";
        let node = Did::parse("did:nil:cc").unwrap();
        let chain = vec![
            token(anchor, "did:nil:bb", "nil.db.read"),
            token("did:nil:bb", "did:nil:cc", "nil.db.read"),
        ];
        let envelope = Envelope { chain };
        assert!(validate_chain(&envelope, &AlwaysOk, &node, "aa").is_ok());
    }

    #[test]
    fn rejects_audience_issuer_mismatch() {
        let node = Did::parse("did:nil:cc").unwrap();
        let chain = vec![
            token("did:nil:aa", "did:nil:zz", "nil.db.read"),
            token("did:nil:bb", "did:nil:cc", "nil.db.read"),
        ];
        let envelope = Envelope { chain };
        assert!(validate_chain(&envelope, &AlwaysOk, &node, "aa").is_err());
    }

    #[test]
    fn rejects_untrusted_root() {
        let node = Did::parse("did:nil:cc").unwrap();
        let chain = vec![token("did:nil:aa", "did:nil:cc", "nil.db.read")];
        let envelope = Envelope { chain };
        let err = validate_chain(&envelope, &AlwaysOk, &node, "ff").unwrap_err();
        assert_eq!(err.code(), "PaymentRequired");
    }

    #[test]
    fn rejects_bad_signature() {
        let node = Did::parse("did:nil:cc").unwrap();
        let chain = vec![token("did:nil:aa", "did:nil:cc", "nil.db.read")];
        let envelope = Envelope { chain };
        assert!(validate_chain(&envelope, &AlwaysFail, &node, "aa").is_err());
    }
}
