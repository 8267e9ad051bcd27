use crate::profile::UserProfile;
use serde::{Deserialize, Serialize};

/// Server reported state of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignerStatus {
    Pending,
    Signed,
    Declined,
}

impl SignerStatus {
    /// `Signed` and `Declined` are final, the participant can no longer act.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SignerStatus::Pending)
    }
}

impl std::fmt::Display for SignerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SignerStatus::Pending => "PENDING",
            SignerStatus::Signed => "SIGNED",
            SignerStatus::Declined => "DECLINED",
        };
        f.write_str(text)
    }
}

/// A substitute who may sign on behalf of a signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deputy {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// One participant of the roster that is built locally before an approval starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    /// Local identifier, never sent to the approval service.
    #[serde(skip)]
    pub id: String,
    pub user_id: Option<String>,
    pub full_name: String,
    pub email: String,
    pub position: String,
    pub iin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deputy: Option<Deputy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SignerStatus>,
}

impl Signer {
    pub(crate) fn from_form(id: String, form: SignerForm) -> Self {
        Signer {
            id,
            user_id: form.user_id,
            full_name: form.full_name,
            email: form.email,
            position: form.position,
            iin: form.iin,
            deputy: None,
            order: None,
            status: None,
        }
    }

    pub(crate) fn for_user(id: String, user: &UserProfile) -> Self {
        Signer::from_form(id, SignerForm::from_profile(user))
    }
}

/// Editable fields of the add/edit signer form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignerForm {
    pub full_name: String,
    pub email: String,
    pub position: String,
    pub iin: String,
    /// Set by a successful directory lookup. Ignored when editing.
    pub user_id: Option<String>,
}

impl SignerForm {
    pub fn from_profile(user: &UserProfile) -> Self {
        SignerForm {
            full_name: user.full_name(),
            email: user.email.clone(),
            position: user.position.clone(),
            iin: user.iin.clone(),
            user_id: Some(user.id.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeputyForm {
    pub name: String,
    pub email: String,
}

/// One approval participant as known by the approval service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerDto {
    /// `None` for participants added by email only.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub position: String,
    pub status: SignerStatus,
    #[serde(default)]
    pub can_sign_now: bool,
    #[serde(default)]
    pub deputy: Option<Deputy>,
}

impl SignerDto {
    /// True when this participant may act right now.
    ///
    /// The approval service decides `canSignNow`, the status check only guards
    /// against a stale flag on a participant that already finished.
    pub fn is_eligible(&self) -> bool {
        self.can_sign_now && !self.status.is_terminal()
    }

    /// Whether `user_id` acts for this participant, directly or as its deputy.
    ///
    /// A participant without an account is only represented through a deputy.
    pub fn is_represented_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
            || self
                .deputy
                .as_ref()
                .map_or(false, |deputy| deputy.id == user_id)
    }
}

/// Participants that may sign at this moment, in server order.
pub fn eligible_signers(signers: &[SignerDto]) -> Vec<&SignerDto> {
    signers.iter().filter(|signer| signer.is_eligible()).collect()
}

/// Find the participant `user_id` may sign for now, if any.
pub fn signable_by<'a>(signers: &'a [SignerDto], user_id: &str) -> Option<&'a SignerDto> {
    signers
        .iter()
        .find(|signer| signer.is_eligible() && signer.is_represented_by(user_id))
}
