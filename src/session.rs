//! The authenticated user and their access token.
//!
//! Persisted to a small JSON file between runs. Created explicitly with
//! [`Session::load`] and torn down with [`Session::logout`].

use crate::error::{Error, Result};
use crate::profile::{PasswordChange, UserProfile};
use crate::DocFlowClient;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    access_token: Option<String>,
    user: Option<UserProfile>,
}

#[derive(Debug, Clone)]
pub struct Session {
    path: PathBuf,
    stored: StoredSession,
}

impl Session {
    /// Read the persisted token and cached profile. A missing file is an empty session.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stored = match fs::read(&path) {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoredSession::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Session { path, stored })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn access_token(&self) -> Option<&str> {
        self.stored.access_token.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.stored.user.as_ref()
    }

    /// The user, or `NotAuthenticated`.
    pub fn require_user(&self) -> Result<&UserProfile> {
        self.user().ok_or(Error::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.stored.access_token.is_some() && self.stored.user.is_some()
    }

    /// Hand the token to `client` so its requests are authorized.
    pub fn attach(&self, client: &mut DocFlowClient) {
        client.set_access_token(self.stored.access_token.clone());
    }

    /// Start a session from a token issued by the auth service.
    pub async fn establish(
        &mut self,
        client: &mut DocFlowClient,
        access_token: String,
    ) -> Result<&UserProfile> {
        client.set_access_token(Some(access_token.clone()));
        let profile = match client.fetch_profile().await {
            Ok(profile) => profile,
            Err(err) => {
                self.attach(client);
                return Err(err);
            }
        };
        log::info!("Logged in as {}", profile.email);
        self.stored = StoredSession {
            access_token: Some(access_token),
            user: Some(profile),
        };
        self.save()?;
        self.require_user()
    }

    /// Save an edited profile, optionally change the password, then re-read
    /// the profile from the server.
    ///
    /// The password change is validated before the profile is sent. When the
    /// profile was saved but the password change failed, the cached profile
    /// is left as it was.
    pub async fn update_profile(
        &mut self,
        client: &DocFlowClient,
        profile: &UserProfile,
        password: Option<&PasswordChange>,
    ) -> Result<&UserProfile> {
        if self.stored.access_token.is_none() {
            return Err(Error::NotAuthenticated);
        }
        if let Some(change) = password {
            change.validate()?;
        }
        client.update_profile(profile).await?;
        if let Some(change) = password {
            client.change_password(&profile.email, change).await?;
        }
        self.refresh(client).await
    }

    /// Re-read the profile after it was edited.
    pub async fn refresh(&mut self, client: &DocFlowClient) -> Result<&UserProfile> {
        if self.stored.access_token.is_none() {
            return Err(Error::NotAuthenticated);
        }
        let profile = client.fetch_profile().await?;
        self.stored.user = Some(profile);
        self.save()?;
        self.require_user()
    }

    /// Forget the token and profile, here and on disk.
    pub fn logout(&mut self, client: &mut DocFlowClient) -> Result<()> {
        self.stored = StoredSession::default();
        client.set_access_token(None);
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&self.stored)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
