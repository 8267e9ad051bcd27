use crate::documents::content_type_for;
use crate::error::{Error, Result};
use crate::filename::parse_document_id;
use crate::reconcile::{reconcile, ReconciliationReport};
use crate::signer::SignerDto;
use crate::{DocFlowClient, Service};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// One signature found by the v2 verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationEntry {
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub certificate_valid: bool,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub valid_to: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// What the legacy verifier reports per signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyVerificationEntry {
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub certificate: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The v2 verifier found no signature at all.
    NoSignatures,
    /// The v2 verifier was unavailable, these came from the legacy one.
    /// There is no roster to compare them with.
    Legacy(Vec<LegacyVerificationEntry>),
    Reconciled {
        signatures: Vec<VerificationEntry>,
        expected: Vec<SignerDto>,
        report: ReconciliationReport,
    },
}

fn file_part(file_name: &str, data: &[u8]) -> Result<Part> {
    let mime = content_type_for(file_name).unwrap_or("application/octet-stream");
    Ok(Part::bytes(data.to_vec())
        .file_name(file_name.to_owned())
        .mime_str(mime)?)
}

impl DocFlowClient {
    pub async fn verify_v2(
        &self,
        file_name: &str,
        data: &[u8],
        document_id: &str,
    ) -> Result<Vec<VerificationEntry>> {
        let form = Form::new()
            .part("file", file_part(file_name, data)?)
            .text("id", document_id.to_owned());
        let url = self.endpoint(Service::Approval, &["v2", "verify"])?;
        let response = self
            .send(self.request(Method::POST, url).multipart(form))
            .await?;
        Ok(response.json().await?)
    }

    pub async fn verify_legacy(
        &self,
        file_name: &str,
        data: &[u8],
    ) -> Result<Vec<LegacyVerificationEntry>> {
        let form = Form::new().part("file", file_part(file_name, data)?);
        let url = self.endpoint(Service::Approval, &["verify"])?;
        let response = self
            .send(self.request(Method::POST, url).multipart(form))
            .await?;
        Ok(response.json().await?)
    }

    /// Verify a signed file and compare its signers with the approval roster.
    ///
    /// The document id comes from the file name (`<base>-id<hex>.<ext>`). The
    /// legacy verifier is only tried when the v2 call itself fails.
    pub async fn verify_document(&self, file_name: &str, data: &[u8]) -> Result<VerificationOutcome> {
        let document_id = parse_document_id(file_name)
            .ok_or_else(|| Error::DocumentIdNotFound(file_name.to_owned()))?;

        let signatures = match self.verify_v2(file_name, data, &document_id).await {
            Ok(signatures) => signatures,
            Err(primary) => {
                log::warn!(
                    "v2 verification of `{}` failed, trying legacy verifier: {}",
                    file_name,
                    primary
                );
                return match self.verify_legacy(file_name, data).await {
                    Ok(entries) => Ok(VerificationOutcome::Legacy(entries)),
                    Err(fallback) => Err(Error::VerificationFailed {
                        primary: primary.to_string(),
                        fallback: fallback.to_string(),
                    }),
                };
            }
        };
        if signatures.is_empty() {
            return Ok(VerificationOutcome::NoSignatures);
        }

        let expected = self.document_signers(&document_id).await?;
        let report = reconcile(&expected, &signatures);
        log::info!(
            "Verified {} signatures on `{}`: {} missing, {} unexpected",
            signatures.len(),
            document_id,
            report.missing.len(),
            report.unexpected.len()
        );
        Ok(VerificationOutcome::Reconciled {
            signatures,
            expected,
            report,
        })
    }
}
