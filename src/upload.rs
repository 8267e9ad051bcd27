use crate::documents::{content_type_for, DocumentItem, DocumentKind};
use crate::error::{Error, Result};
use crate::filename::build_storage_name;
use crate::{DocFlowClient, Service};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "doc"];

/// JSON part sent alongside the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub id: String,
}

/// Fail before any request if the extension is not accepted.
fn check_extension(file_name: &str) -> Result<&'static str> {
    let accepted = file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .map_or(false, |extension| {
            ALLOWED_EXTENSIONS.contains(&extension.as_str())
        });
    if !accepted {
        return Err(Error::UnsupportedExtension(file_name.to_owned()));
    }
    content_type_for(file_name).ok_or_else(|| Error::UnsupportedExtension(file_name.to_owned()))
}

/// The service may answer with a JSON string, a JSON number or plain text.
fn parse_next_id(body: &str) -> Result<String> {
    let body = body.trim();
    let id = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(id)) => id,
        Ok(serde_json::Value::Number(id)) => id.to_string(),
        _ => body.to_owned(),
    };
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::Other(format!(
            "Document service returned an unusable id `{}`",
            id
        )));
    }
    Ok(id)
}

impl DocFlowClient {
    /// Reserve the id the next upload will be stored under.
    pub async fn request_next_id(&self) -> Result<String> {
        let url = self.endpoint(Service::Documents, &["documents", "next-id"])?;
        let body = self
            .send(self.request(Method::GET, url))
            .await?
            .text()
            .await?;
        parse_next_id(&body)
    }

    /// Store `data` as a draft named `document_name`.
    ///
    /// Reserves an id, embeds it in the stored file name and uploads the file
    /// together with its metadata.
    pub async fn upload_as_draft(
        &self,
        file_name: &str,
        data: Vec<u8>,
        document_name: &str,
    ) -> Result<DocumentItem> {
        let content_type = check_extension(file_name)?;
        let id = self.request_next_id().await?;
        let storage_name = build_storage_name(file_name, &id);
        let name = if document_name.trim().is_empty() {
            file_name.to_owned()
        } else {
            document_name.trim().to_owned()
        };
        let metadata = DraftMetadata {
            name: name.clone(),
            kind: DocumentKind::Draft,
            id: id.clone(),
        };

        let form = Form::new()
            .part(
                "file",
                Part::bytes(data)
                    .file_name(storage_name.clone())
                    .mime_str(content_type)?,
            )
            .part(
                "metadata",
                Part::text(serde_json::to_string(&metadata)?).mime_str("application/json")?,
            );
        let url = self.endpoint(Service::Documents, &["documents", "upload"])?;
        self.send(self.request(Method::POST, url).multipart(form))
            .await?;
        log::info!("Uploaded `{}` as draft `{}`", storage_name, id);

        Ok(DocumentItem {
            preview_url: self.preview_url(&id)?,
            id,
            name,
            content_type: content_type.to_owned(),
            expiration_date: None,
            kind: DocumentKind::Draft,
            tags: Vec::new(),
        })
    }
}
