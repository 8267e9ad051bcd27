//! The external signer that produces detached CMS signatures.

use crate::error::Result;
use crate::signature::armor_cms;
use async_trait::async_trait;
use cryptographic_message_syntax::{Bytes, Oid, SignedDataBuilder, SignerBuilder};
use std::path::Path;
use thiserror::Error;
use x509_certificate::{CapturedX509Certificate, InMemorySigningKeyPair};

/// Why the agent did not return a signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    #[error("Signing was cancelled by the user")]
    Cancelled,
    #[error("Could not reach the signing agent: {0}")]
    Connection(String),
    #[error("Signing agent refused to sign: {0}")]
    Rejected(String),
}

/// Produces a detached signature over a base64 payload.
///
/// The returned string may still carry the `-----BEGIN CMS-----` wrapper and
/// line breaks, callers strip them before sending it anywhere.
#[async_trait]
pub trait SigningAgent: Send + Sync {
    async fn sign_cms(&self, payload_base64: &str) -> std::result::Result<String, AgentError>;
}

/// Signs with a certificate and PKCS#8 key kept on disk.
pub struct LocalKeyAgent {
    key: InMemorySigningKeyPair,
    certificate: CapturedX509Certificate,
}

impl LocalKeyAgent {
    pub fn new(key: InMemorySigningKeyPair, certificate: CapturedX509Certificate) -> Self {
        LocalKeyAgent { key, certificate }
    }

    pub fn from_pem(certificate_pem: &str, key_pem: &str) -> Result<Self> {
        let certificate = CapturedX509Certificate::from_pem(certificate_pem)?;
        let key = InMemorySigningKeyPair::from_pkcs8_pem(key_pem)?;
        Ok(LocalKeyAgent::new(key, certificate))
    }

    pub fn from_pem_files(certificate_path: &Path, key_path: &Path) -> Result<Self> {
        let certificate = std::fs::read_to_string(certificate_path)?;
        let key = std::fs::read_to_string(key_path)?;
        LocalKeyAgent::from_pem(&certificate, &key)
    }

    /// DER encoded SignedData over `content`, the content itself left out.
    fn detached_signature(&self, content: Vec<u8>) -> Result<Vec<u8>> {
        let signer = SignerBuilder::new(&self.key, self.certificate.clone());
        let signature = SignedDataBuilder::default()
            .content_external(content)
            .content_type(Oid(Bytes::copy_from_slice(
                cryptographic_message_syntax::asn1::rfc5652::OID_ID_DATA.as_ref(),
            )))
            .signer(signer)
            .build_der()?;
        Ok(signature)
    }
}

impl std::fmt::Debug for LocalKeyAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyAgent")
            .field("subject", &self.certificate.subject_common_name())
            .finish()
    }
}

#[async_trait]
impl SigningAgent for LocalKeyAgent {
    async fn sign_cms(&self, payload_base64: &str) -> std::result::Result<String, AgentError> {
        // The signature covers the base64 text, that is what verification hashes.
        let der = self
            .detached_signature(payload_base64.as_bytes().to_vec())
            .map_err(|err| AgentError::Rejected(err.to_string()))?;
        #[cfg(feature = "debug")]
        log::trace!("CMS signature (DER): {}", base64::encode(&der));
        Ok(armor_cms(&der))
    }
}
