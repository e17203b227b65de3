//! Capability engine (component C5, §4.2)
//!
//! Ties together envelope parsing, chain validation, attenuation,
//! revocation, and the route-specific policy predicate into three
//! ready-made guards: `requireBuilder`, `requireUser`, `requireAdmin`.

use std::sync::Arc;

use crate::entities::{Builder, BuilderRepo, User, UserRepo};
use crate::error::{AppError, AppResult};
use crate::ids::Did;

use super::chain::validate_chain;
use super::envelope::Envelope;
use super::revocation::RevocationClient;
use super::token::Token;
use super::verify::SignatureVerifier;

/// The authenticated subject of a request, loaded per §4.2 step 2.
pub enum Subject {
    Builder(Builder),
    User(User),
    /// `requireAdmin` has no stored subject document — the trust anchor's
    /// own DID stands in as the admin principal (SPEC_FULL §B.2).
    Admin(Did),
}

pub struct CapabilityEngine {
    node_did: Did,
    trust_anchor_public_key_hex: String,
    verifier: Arc<dyn SignatureVerifier>,
    revocation: Arc<dyn RevocationClient>,
    builders: Arc<BuilderRepo>,
    users: Arc<UserRepo>,
}

impl CapabilityEngine {
    pub fn new(
        node_did: Did,
        trust_anchor_public_key_hex: String,
        verifier: Arc<dyn SignatureVerifier>,
        revocation: Arc<dyn RevocationClient>,
        builders: Arc<BuilderRepo>,
        users: Arc<UserRepo>,
    ) -> Self {
        Self {
            node_did,
            trust_anchor_public_key_hex,
            verifier,
            revocation,
            builders,
            users,
        }
    }

    /// Validate the chain and attenuation/revocation without resolving a
    /// stored subject — used by registration endpoints where the Builder or
    /// User record does not exist yet.
    pub async fn authenticate(
        &self,
        bearer_header: &str,
        required_command: &str,
    ) -> AppResult<Token> {
        let envelope = Envelope::parse(bearer_header)?;
        self.validate_envelope(&envelope, required_command).await?;
        Ok(envelope.invocation().clone())
    }

    /// §4.2 steps 3-6: signature chain, trust-anchor root, attenuation and
    /// revocation. Subject loading (step 2) happens in the caller, before
    /// this runs.
    async fn validate_envelope(&self, envelope: &Envelope, required_command: &str) -> AppResult<()> {
        validate_chain(
            envelope,
            self.verifier.as_ref(),
            &self.node_did,
            &self.trust_anchor_public_key_hex,
        )?;

        let invocation = envelope.invocation();
        if !invocation.attenuates(required_command) {
            return Err(AppError::Forbidden(format!(
                "command {} does not attenuate {required_command}",
                invocation.command
            )));
        }

        let hashes: Vec<String> = envelope.chain.iter().map(Token::hash).collect();
        if self.revocation.is_revoked(&hashes).await? {
            return Err(AppError::Unauthorized("token has been revoked".to_string()));
        }

        Ok(())
    }

    pub async fn require_builder(
        &self,
        bearer_header: &str,
        required_command: &str,
    ) -> AppResult<(Subject, Token)> {
        let envelope = Envelope::parse(bearer_header)?;
        let invocation = envelope.invocation();
        let builder = self
            .builders
            .find(&invocation.subject)
            .await?
            .ok_or_else(|| AppError::Unauthorized(format!("no builder {}", invocation.subject)))?;
        self.validate_envelope(&envelope, required_command).await?;
        Ok((Subject::Builder(builder), invocation.clone()))
    }

    pub async fn require_user(
        &self,
        bearer_header: &str,
        required_command: &str,
    ) -> AppResult<(Subject, Token)> {
        let envelope = Envelope::parse(bearer_header)?;
        let invocation = envelope.invocation();
        let user = self
            .users
            .find(&invocation.subject)
            .await?
            .ok_or_else(|| AppError::Unauthorized(format!("no user {}", invocation.subject)))?;
        self.validate_envelope(&envelope, required_command).await?;
        Ok((Subject::User(user), invocation.clone()))
    }

    pub fn node_did(&self) -> &Did {
        &self.node_did
    }

    pub async fn require_admin(
        &self,
        bearer_header: &str,
        required_command: &str,
    ) -> AppResult<(Subject, Token)> {
        let invocation = self.authenticate(bearer_header, required_command).await?;
        if invocation.subject.key_hex() != self.trust_anchor_public_key_hex.to_ascii_lowercase() {
            return Err(AppError::Unauthorized("caller is not the trust anchor".to_string()));
        }
        Ok((Subject::Admin(invocation.subject.clone()), invocation))
    }
}
