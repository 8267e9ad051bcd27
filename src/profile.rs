use crate::error::{Error, Result};
use crate::signer::SignerForm;
use crate::{DocFlowClient, Service};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

/// Account profile as returned by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub iin: String,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// Exact match query against the profile directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileQuery {
    Email(String),
    Iin(String),
}

impl ProfileQuery {
    fn as_pair(&self) -> (&'static str, &str) {
        match self {
            ProfileQuery::Email(email) => ("email", email.trim()),
            ProfileQuery::Iin(iin) => ("iin", iin.trim()),
        }
    }
}

/// A password change submitted together with a profile edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChange {
    /// Checked locally, before anything is sent.
    pub fn validate(&self) -> Result<()> {
        if self.old_password.is_empty() {
            return Err(Error::Validation("Enter the current password".to_owned()));
        }
        if self.new_password.is_empty() {
            return Err(Error::Validation("Enter a new password".to_owned()));
        }
        if self.new_password != self.confirm_password {
            return Err(Error::Validation("Passwords do not match".to_owned()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordChangeRequest<'a> {
    email: &'a str,
    old_password: &'a str,
    new_password: &'a str,
}

/// Result of looking up a signer before adding them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Pre-filled form, still to be confirmed by the caller.
    Found(SignerForm),
    NotFound,
}

impl DocFlowClient {
    /// Profile of the account owning the current access token.
    pub async fn fetch_profile(&self) -> Result<UserProfile> {
        if self.access_token().is_none() {
            return Err(Error::NotAuthenticated);
        }
        self.get_json(Service::Auth, &["api", "profile"]).await
    }

    /// Store an edited profile for the current account.
    pub async fn update_profile(&self, profile: &UserProfile) -> Result<()> {
        if self.access_token().is_none() {
            return Err(Error::NotAuthenticated);
        }
        let url = self.endpoint(Service::Auth, &["api", "profile"])?;
        self.send(self.request(Method::PUT, url).json(profile))
            .await?;
        log::info!("Updated profile of {}", profile.email);
        Ok(())
    }

    pub async fn change_password(&self, email: &str, change: &PasswordChange) -> Result<()> {
        change.validate()?;
        if self.access_token().is_none() {
            return Err(Error::NotAuthenticated);
        }
        let url = self.endpoint(Service::Auth, &["api", "auth", "password"])?;
        let body = PasswordChangeRequest {
            email,
            old_password: &change.old_password,
            new_password: &change.new_password,
        };
        self.send(self.request(Method::PUT, url).json(&body))
            .await?;
        Ok(())
    }

    /// `Ok(None)` when the directory has no exact match.
    pub async fn lookup_profile(&self, query: &ProfileQuery) -> Result<Option<UserProfile>> {
        let (key, value) = query.as_pair();
        if value.is_empty() {
            return Err(Error::Validation(format!("Enter an {} to search for", key)));
        }
        let url = self.endpoint(Service::Auth, &["api", "profile", "lookup"])?;
        let builder = self.request(Method::GET, url).query(&[(key, value)]);
        match self.send(builder).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(Error::Status {
                status: StatusCode::NOT_FOUND,
                ..
            }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Look up a signer for the add-signer form.
    ///
    /// Never fails: network trouble is logged and reported as not found.
    pub async fn lookup_signer(&self, query: &ProfileQuery) -> LookupOutcome {
        match self.lookup_profile(query).await {
            Ok(Some(profile)) => LookupOutcome::Found(SignerForm::from_profile(&profile)),
            Ok(None) => LookupOutcome::NotFound,
            Err(err) => {
                log::warn!("Signer lookup {:?} failed: {}", query, err);
                LookupOutcome::NotFound
            }
        }
    }

    pub async fn lookup_signer_by_email(&self, email: &str) -> LookupOutcome {
        self.lookup_signer(&ProfileQuery::Email(email.to_owned()))
            .await
    }

    pub async fn lookup_signer_by_iin(&self, iin: &str) -> LookupOutcome {
        self.lookup_signer(&ProfileQuery::Iin(iin.to_owned())).await
    }
}
