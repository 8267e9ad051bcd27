use crate::error::Result;
use crate::{DocFlowClient, Service};
use reqwest::Method;
use serde::{Deserialize, Serialize};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DOC_CONTENT_TYPE: &str = "application/msword";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Where a document is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Draft,
    Sent,
    Ready,
    #[serde(other)]
    Unknown,
}

impl Default for DocumentKind {
    fn default() -> Self {
        DocumentKind::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub content_type: String,
    /// Filled in by the client, not stored by the document service.
    #[serde(skip)]
    pub preview_url: String,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(rename = "type", alias = "status", default)]
    pub kind: DocumentKind,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DocumentItem {
    /// Word documents have no inline preview.
    pub fn is_word_document(&self) -> bool {
        self.content_type == DOC_CONTENT_TYPE || self.content_type == DOCX_CONTENT_TYPE
    }
}

/// Content type from the file extension, for files the OS did not type.
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some(PDF_CONTENT_TYPE),
        "docx" => Some(DOCX_CONTENT_TYPE),
        "doc" => Some(DOC_CONTENT_TYPE),
        _ => None,
    }
}

/// Query for the metadata listing. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub uploader_id: Option<String>,
    pub tags: Vec<String>,
    pub document_id: Option<String>,
}

impl DocumentFilter {
    pub fn uploaded_by(user_id: &str) -> Self {
        DocumentFilter {
            uploader_id: Some(user_id.to_owned()),
            ..Self::default()
        }
    }

    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(uploader_id) = &self.uploader_id {
            query.push(("uploaderId", uploader_id.clone()));
        }
        if !self.tags.is_empty() {
            query.push(("tags", self.tags.join(",")));
        }
        if let Some(document_id) = &self.document_id {
            query.push(("documentId", document_id.clone()));
        }
        query
    }
}

/// Strip quotes users tend to type around tag names.
fn clean_tag(tag: &str) -> String {
    tag.trim().trim_matches('"').to_owned()
}

impl DocFlowClient {
    /// Where the document binary can be viewed.
    pub fn preview_url(&self, document_id: &str) -> Result<String> {
        Ok(self
            .endpoint(Service::Documents, &["documents", document_id])?
            .to_string())
    }

    fn with_preview(&self, mut item: DocumentItem) -> Result<DocumentItem> {
        item.preview_url = self.preview_url(&item.id)?;
        Ok(item)
    }

    pub async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<DocumentItem>> {
        let url = self.endpoint(Service::Documents, &["documents", "metadata"])?;
        let builder = self.request(Method::GET, url).query(&filter.to_query());
        let items: Vec<DocumentItem> = self.send(builder).await?.json().await?;
        items
            .into_iter()
            .map(|item| self.with_preview(item))
            .collect()
    }

    pub async fn document_metadata(&self, document_id: &str) -> Result<DocumentItem> {
        let item = self
            .get_json(Service::Documents, &["documents", document_id, "metadata"])
            .await?;
        self.with_preview(item)
    }

    /// Download the document binary.
    pub async fn fetch_document(&self, document_id: &str) -> Result<Vec<u8>> {
        let url = self.endpoint(Service::Documents, &["documents", document_id])?;
        let builder = self
            .request(Method::GET, url)
            .query(&[("download", "true")]);
        let bytes = self.send(builder).await?.bytes().await?;
        log::debug!("Fetched document `{}` ({} bytes)", document_id, bytes.len());
        Ok(bytes.to_vec())
    }

    /// Tags the user has created so far.
    pub async fn list_tags(&self, user_id: &str) -> Result<Vec<String>> {
        self.get_json(Service::Documents, &["tags", user_id]).await
    }

    pub async fn add_tag(&self, user_id: &str, tag: &str) -> Result<()> {
        let tag = clean_tag(tag);
        if tag.is_empty() {
            return Err(crate::Error::Validation("Tag name is empty".to_owned()));
        }
        let url = self.endpoint(Service::Documents, &["tags", user_id])?;
        self.send(self.request(Method::POST, url).json(&tag)).await?;
        Ok(())
    }

    pub async fn delete_tag(&self, user_id: &str, tag: &str) -> Result<()> {
        let url = self.endpoint(Service::Documents, &["tags", user_id])?;
        self.send(self.request(Method::DELETE, url).json(&clean_tag(tag)))
            .await?;
        Ok(())
    }
}
