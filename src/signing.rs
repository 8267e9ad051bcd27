//! One signing attempt by one participant against one document.

use crate::agent::SigningAgent;
use crate::error::{Error, Result};
use crate::profile::UserProfile;
use crate::signature::strip_cms_envelope;
use crate::{DocFlowClient, Service};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// `authorId` sent for people signing through an emailed link.
const GUEST_AUTHOR_ID: &str = "-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningState {
    Idle,
    FetchingDocument,
    AwaitingAgent,
    PostingSignature,
    Done,
    Failed,
}

impl SigningState {
    fn is_busy(self) -> bool {
        matches!(
            self,
            SigningState::FetchingDocument
                | SigningState::AwaitingAgent
                | SigningState::PostingSignature
        )
    }
}

/// Someone signing without a session, reached through an emailed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuestIdentity {
    Email(String),
    DeputyOf { deputy: String, signer: String },
}

impl GuestIdentity {
    pub fn label(&self) -> String {
        match self {
            GuestIdentity::Email(email) => email.clone(),
            GuestIdentity::DeputyOf { deputy, signer } => {
                format!("{} (deputy of {})", deputy, signer)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerIdentity {
    User { id: String, name: String },
    Guest(GuestIdentity),
}

impl SignerIdentity {
    pub fn from_user(user: &UserProfile) -> Self {
        SignerIdentity::User {
            id: user.id.clone(),
            name: user.full_name(),
        }
    }

    pub fn author_id(&self) -> &str {
        match self {
            SignerIdentity::User { id, .. } => id,
            SignerIdentity::Guest(_) => GUEST_AUTHOR_ID,
        }
    }

    pub fn author_name(&self) -> String {
        match self {
            SignerIdentity::User { name, .. } => name.clone(),
            SignerIdentity::Guest(guest) => guest.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureSubmission {
    pub document_id: String,
    pub author_id: String,
    pub author_name: String,
    pub cms: String,
}

impl DocFlowClient {
    pub async fn submit_signature(&self, submission: &SignatureSubmission) -> Result<()> {
        let url = self.endpoint(Service::Approval, &["signatures"])?;
        self.send(self.request(Method::POST, url).json(submission))
            .await?;
        log::info!(
            "Signature of `{}` by `{}` recorded",
            submission.document_id,
            submission.author_name
        );
        Ok(())
    }
}

/// State of the sign dialog for one document.
///
/// The document binary is fetched once when the session opens. If that
/// fails the session stays usable but [`SigningSession::can_sign`] is false.
#[derive(Debug)]
pub struct SigningSession {
    document_id: String,
    identity: SignerIdentity,
    state: SigningState,
    document: Option<Vec<u8>>,
}

impl SigningSession {
    pub async fn open(
        client: &DocFlowClient,
        document_id: impl Into<String>,
        identity: SignerIdentity,
    ) -> Self {
        let mut session = SigningSession {
            document_id: document_id.into(),
            identity,
            state: SigningState::FetchingDocument,
            document: None,
        };
        match client.fetch_document(&session.document_id).await {
            Ok(document) => session.document = Some(document),
            Err(err) => log::error!(
                "Could not fetch document `{}` for signing: {}",
                session.document_id,
                err
            ),
        }
        session.state = SigningState::Idle;
        session
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn identity(&self) -> &SignerIdentity {
        &self.identity
    }

    pub fn state(&self) -> SigningState {
        self.state
    }

    pub fn document(&self) -> Option<&[u8]> {
        self.document.as_deref()
    }

    pub fn can_sign(&self) -> bool {
        self.document.is_some() && matches!(self.state, SigningState::Idle | SigningState::Failed)
    }

    /// SHA-256 of the fetched document, lowercase hex.
    pub fn fingerprint(&self) -> Option<String> {
        let digest = Sha256::digest(self.document.as_deref()?);
        Some(digest.iter().map(|byte| format!("{:02x}", byte)).collect())
    }

    /// Back to `Idle` after an attempt was abandoned half way.
    pub fn reset(&mut self) {
        if self.state != SigningState::Done {
            self.state = SigningState::Idle;
        }
    }

    /// Have `agent` sign the document and record the signature.
    ///
    /// An agent failure returns the session to `Idle`. A failed post leaves it
    /// `Failed`, both can be retried. On success the caller should reload the
    /// signer list from the approval service.
    pub async fn sign(&mut self, client: &DocFlowClient, agent: &dyn SigningAgent) -> Result<()> {
        if self.state.is_busy() {
            return Err(Error::Busy);
        }
        if self.state == SigningState::Done {
            return Err(Error::Validation("Document is already signed".to_owned()));
        }
        let document = self.document.as_deref().ok_or(Error::DocumentUnavailable)?;
        let payload = base64::encode(document);

        self.state = SigningState::AwaitingAgent;
        let signature = match agent.sign_cms(&payload).await {
            Ok(signature) => signature,
            Err(err) => {
                log::warn!("Signing agent failed: {}", err);
                self.state = SigningState::Idle;
                return Err(err.into());
            }
        };
        let cms = strip_cms_envelope(&signature);
        if cms.is_empty() {
            self.state = SigningState::Idle;
            return Err(Error::Agent(crate::AgentError::Rejected(
                "empty signature".to_owned(),
            )));
        }

        self.state = SigningState::PostingSignature;
        let submission = SignatureSubmission {
            document_id: self.document_id.clone(),
            author_id: self.identity.author_id().to_owned(),
            author_name: self.identity.author_name(),
            cms,
        };
        match client.submit_signature(&submission).await {
            Ok(()) => {
                self.state = SigningState::Done;
                Ok(())
            }
            Err(err) => {
                self.state = SigningState::Failed;
                Err(err)
            }
        }
    }
}
