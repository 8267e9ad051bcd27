mod agent;
mod approval;
mod config;
mod documents;
mod error;
mod filename;
mod profile;
mod reconcile;
mod roster;
mod session;
mod signature;
mod signer;
mod signing;
mod templates;
mod upload;
mod verification;
mod view;

pub use agent::{AgentError, LocalKeyAgent, SigningAgent};
pub use approval::{
    compute_expiration_from, compute_expiration_timestamp, ApprovalRequest, ApprovalSettings,
    ApprovalType, ExpirationPeriod,
};
pub use config::{Config, ConfigLoader};
pub use documents::{content_type_for, DocumentFilter, DocumentItem, DocumentKind};
pub use error::{Error, Result};
pub use filename::{build_storage_name, parse_document_id};
pub use profile::{LookupOutcome, PasswordChange, ProfileQuery, UserProfile};
pub use reconcile::{reconcile, ReconciliationReport};
pub use roster::{reorder, SignerRoster};
pub use session::Session;
pub use signature::{armor_cms, strip_cms_envelope};
pub use signer::{
    eligible_signers, signable_by, Deputy, DeputyForm, Signer, SignerDto, SignerForm,
    SignerStatus,
};
pub use signing::{GuestIdentity, SignatureSubmission, SignerIdentity, SigningSession, SigningState};
pub use templates::{normalize_template_values, TemplateField, TemplateSummary};
pub use upload::{DraftMetadata, ALLOWED_EXTENSIONS};
pub use verification::{LegacyVerificationEntry, VerificationEntry, VerificationOutcome};
pub use view::{Route, Section, ViewMode, Workspace};

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

/// The backend a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Service {
    Auth,
    Documents,
    Approval,
    Templates,
}

/// Connection to the DocFlow services.
///
/// Holds the HTTP client and the bearer token of the current session. All
/// service calls are implemented on this type, grouped by concern in the
/// other modules.
#[derive(Debug, Clone)]
pub struct DocFlowClient {
    http: reqwest::Client,
    config: Config,
    access_token: Option<String>,
}

impl DocFlowClient {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(DocFlowClient {
            http,
            config,
            access_token: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn set_access_token(&mut self, token: Option<String>) {
        self.access_token = token;
    }

    fn base_url(&self, service: Service) -> &str {
        match service {
            Service::Auth => &self.config.auth_url,
            Service::Documents => &self.config.documents_url,
            Service::Approval => &self.config.approval_url,
            Service::Templates => &self.config.templates_url,
        }
    }

    /// Build `<base>/<segments...>`, escaping every segment.
    pub(crate) fn endpoint(&self, service: Service, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(self.base_url(service))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("{:?} URL can not be a base", service)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and turn a non-success status into `Error::Status`.
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        log::debug!("Request failed with {}: {}", status, body);
        Err(Error::Status { status, body })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        service: Service,
        segments: &[&str],
    ) -> Result<T> {
        let url = self.endpoint(service, segments)?;
        let response = self.send(self.request(Method::GET, url)).await?;
        Ok(response.json().await?)
    }
}
