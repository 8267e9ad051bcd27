//! Navigation state and the server derived caches behind it.

use crate::approval::ApprovalSettings;
use crate::documents::{DocumentFilter, DocumentItem, DocumentKind};
use crate::error::Result;
use crate::profile::UserProfile;
use crate::roster::SignerRoster;
use crate::signer::SignerDto;
use crate::signing::GuestIdentity;
use crate::DocFlowClient;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Sent,
    Received,
    Closed,
    Drafts,
    Archive,
    Deleted,
}

impl std::str::FromStr for Section {
    type Err = crate::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "sent" => Ok(Section::Sent),
            "received" | "inbox" => Ok(Section::Received),
            "closed" => Ok(Section::Closed),
            "drafts" => Ok(Section::Drafts),
            "archive" => Ok(Section::Archive),
            "deleted" | "trash" => Ok(Section::Deleted),
            _ => Err(crate::Error::Validation(format!("Unknown section `{}`", value))),
        }
    }
}

/// What the main area shows. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    Upload,
    DraftSettings { document_id: String },
    DocumentPreview { document: DocumentItem },
    TemplateFill { template_id: String },
    ListView { section: Section },
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Upload
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Reset { token: Option<String> },
    TwoFactor { token: Option<String> },
    VerifyEmail { code: Option<String> },
    Profile,
    Verify,
    Sign {
        document_id: String,
        guest: Option<GuestIdentity>,
    },
    NotFound(String),
}

impl Route {
    /// Map an application path, query included, to a page.
    pub fn parse(path: &str) -> Route {
        let url = match Url::parse("http://docflow.local/").and_then(|base| base.join(path)) {
            Ok(url) => url,
            Err(_) => return Route::NotFound(path.to_owned()),
        };
        let query = |key: &str| {
            url.query_pairs()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        };
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["reset"] => Route::Reset {
                token: query("token"),
            },
            ["2fa"] => Route::TwoFactor {
                token: query("token"),
            },
            ["verify-email"] => Route::VerifyEmail {
                code: query("code"),
            },
            ["profile"] => Route::Profile,
            ["verify"] => Route::Verify,
            ["sign", document_id] => {
                let guest = query("guest").map(|guest| match query("deputyOf") {
                    Some(signer) => GuestIdentity::DeputyOf {
                        deputy: guest,
                        signer,
                    },
                    None => GuestIdentity::Email(guest),
                });
                Route::Sign {
                    document_id: (*document_id).to_owned(),
                    guest,
                }
            }
            _ => Route::NotFound(path.to_owned()),
        }
    }
}

/// The profile page: current view, the roster being edited and what the
/// services last reported.
///
/// Server data is never merged into local state. Every refresh replaces the
/// cached lists as a whole, and roster edits only flow out with the approval.
#[derive(Debug, Clone)]
pub struct Workspace {
    view: ViewMode,
    roster: SignerRoster,
    drafts: Vec<DocumentItem>,
    sent: Vec<DocumentItem>,
    signers_from_server: Vec<SignerDto>,
}

impl Workspace {
    pub fn new(user: &UserProfile) -> Self {
        let mut roster = SignerRoster::new();
        roster.initialize_self(user);
        Workspace {
            view: ViewMode::default(),
            roster,
            drafts: Vec::new(),
            sent: Vec::new(),
            signers_from_server: Vec::new(),
        }
    }

    pub fn view(&self) -> &ViewMode {
        &self.view
    }

    pub fn set_view(&mut self, view: ViewMode) {
        log::debug!("View changed to {:?}", view);
        self.view = view;
    }

    pub fn roster(&self) -> &SignerRoster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut SignerRoster {
        &mut self.roster
    }

    pub fn drafts(&self) -> &[DocumentItem] {
        &self.drafts
    }

    pub fn sent(&self) -> &[DocumentItem] {
        &self.sent
    }

    pub fn signers_from_server(&self) -> &[SignerDto] {
        &self.signers_from_server
    }

    /// Replace both document lists with a fresh listing.
    pub fn replace_documents(&mut self, documents: Vec<DocumentItem>) {
        let (drafts, sent): (Vec<_>, Vec<_>) = documents
            .into_iter()
            .partition(|item| item.kind == DocumentKind::Draft);
        self.drafts = drafts;
        self.sent = sent;
    }

    pub fn replace_signers(&mut self, signers: Vec<SignerDto>) {
        self.signers_from_server = signers;
    }

    /// Move a draft to the sent list once its approval started.
    pub fn mark_sent(&mut self, document_id: &str) -> bool {
        let index = match self.drafts.iter().position(|item| item.id == document_id) {
            Some(index) => index,
            None => return false,
        };
        let mut item = self.drafts.remove(index);
        item.kind = DocumentKind::Sent;
        self.sent.insert(0, item);
        true
    }

    /// Reload the user's documents. On error the caches are left as they were.
    pub async fn refresh_documents(&mut self, client: &DocFlowClient, user_id: &str) -> Result<()> {
        let documents = client
            .list_documents(&DocumentFilter::uploaded_by(user_id))
            .await?;
        self.replace_documents(documents);
        Ok(())
    }

    pub async fn refresh_signers(&mut self, client: &DocFlowClient, document_id: &str) -> Result<()> {
        let signers = client.document_signers(document_id).await?;
        self.replace_signers(signers);
        Ok(())
    }

    /// Upload a draft and open its settings.
    pub async fn upload_draft(
        &mut self,
        client: &DocFlowClient,
        file_name: &str,
        data: Vec<u8>,
        document_name: &str,
    ) -> Result<&DocumentItem> {
        let item = client
            .upload_as_draft(file_name, data, document_name)
            .await?;
        self.set_view(ViewMode::DraftSettings {
            document_id: item.id.clone(),
        });
        self.drafts.insert(0, item);
        Ok(&self.drafts[0])
    }

    /// Start the approval of a draft with the current roster.
    ///
    /// Nothing local changes unless every call succeeded.
    pub async fn submit_draft(
        &mut self,
        client: &DocFlowClient,
        document_id: &str,
        initiator_id: &str,
        settings: &ApprovalSettings,
    ) -> Result<()> {
        client
            .submit_for_approval(document_id, initiator_id, settings, &self.roster)
            .await?;
        if !self.mark_sent(document_id) {
            log::debug!("Sent document `{}` was not in the draft list", document_id);
        }
        self.set_view(ViewMode::ListView {
            section: Section::Sent,
        });
        Ok(())
    }
}
