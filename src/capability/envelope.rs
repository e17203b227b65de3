//! Bearer header parsing into an ordered token chain (§4.2 step 1)

use crate::error::AppError;

use super::token::Token;

/// Root token, zero or more delegations, and a final invocation token, in
/// presentation order (root first, invocation last).
#[derive(Debug, Clone)]
pub struct Envelope {
    pub chain: Vec<Token>,
}

impl Envelope {
    pub fn root(&self) -> &Token {
        &self.chain[0]
    }

    pub fn invocation(&self) -> &Token {
        self.chain.last().expect("chain is non-empty by construction")
    }

    /// Tokens are serialized base64url(JSON), joined with `.` in the
    /// `Authorization: bearer <chain>` header.
    pub fn parse(header: &str) -> Result<Self, AppError> {
        let mut parts = header.splitn(2, ' ');
        let scheme = parts.next().unwrap_or_default();
        let rest = parts.next().ok_or_else(|| {
            AppError::Unauthorized("malformed bearer header".to_string())
        })?;

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AppError::Unauthorized("expected bearer scheme".to_string()));
        }

        let chain: Result<Vec<Token>, AppError> = rest
            .split('.')
            .map(|segment| {
                use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
                let bytes = URL_SAFE_NO_PAD
                    .decode(segment)
                    .map_err(|_| AppError::Unauthorized("malformed token segment".to_string()))?;
                serde_json::from_slice(&bytes)
                    .map_err(|_| AppError::Unauthorized("malformed token segment".to_string()))
            })
            .collect();
        let chain = chain?;

        if chain.is_empty() {
            return Err(AppError::Unauthorized("empty token chain".to_string()));
        }
        Ok(Self { chain })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Did;

    fn token(issuer: &str, subject: &str, audience: &str, command: &str) -> Token {
        Token {
            subject: Did::parse(subject).unwrap(),
            command: command.to_string(),
            audience: Did::parse(audience).unwrap(),
            policies: vec![],
            issuer: Did::parse(issuer).unwrap(),
            signature: "00".to_string(),
        }
    }

    fn encode(chain: &[Token]) -> String {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        let segments: Vec<String> = chain
            .iter()
            .map(|t| URL_SAFE_NO_PAD.encode(serde_json::to_vec(t).unwrap()))
            .collect();
        format!("bearer {}", segments.join("."))
    }

    #[test]
    fn parses_well_formed_chain() {
        let chain = vec![token("did:nil:aa", "did:nil:bb", "did:nil:cc", "nil.db.read")];
        let header = encode(&chain);
        let envelope = Envelope::parse(&header).unwrap();
        assert_eq!(envelope.chain.len(), 1);
        assert_eq!(envelope.invocation().command, "nil.db.read");
    }

    #[test]
    fn rejects_missing_bearer_scheme() {
        assert!(Envelope::parse("basic abcd").is_err());
    }

    #[test]
    fn rejects_malformed_segment() {
        assert!(Envelope::parse("bearer not-valid-base64!!!").is_err());
    }
}
