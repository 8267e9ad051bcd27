//! Starting an approval workflow for a draft.

use crate::error::{Error, Result};
use crate::roster::SignerRoster;
use crate::signer::{Signer, SignerDto};
use crate::{DocFlowClient, Service};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Timestamps are sent without zone, the service reads them as local time.
const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpirationPeriod {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl ExpirationPeriod {
    pub fn new(years: u32, months: u32, days: u32) -> Self {
        ExpirationPeriod {
            years,
            months,
            days,
        }
    }

    /// A zero period means the document never expires.
    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }
}

/// Build a date, letting an out of range month or day spill into the next
/// month or year (31 January + 1 month is 3 March, 29 February + 1 year is
/// 1 March).
fn spill_date(year: i32, month0: i64, day: u32) -> Option<NaiveDate> {
    let year = year.checked_add(i32::try_from(month0.div_euclid(12)).ok()?)?;
    let month = u32::try_from(month0.rem_euclid(12)).ok()? + 1;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_signed(Duration::days(i64::from(day) - 1))
}

/// Add `period` to `now` the way a calendar does: years, then months, then days.
pub fn compute_expiration_from(
    now: NaiveDateTime,
    period: ExpirationPeriod,
) -> Option<NaiveDateTime> {
    if period.is_zero() {
        return None;
    }
    let date = now.date();
    let date = spill_date(
        date.year().checked_add(i32::try_from(period.years).ok()?)?,
        i64::from(date.month0()),
        date.day(),
    )?;
    let date = spill_date(
        date.year(),
        i64::from(date.month0()) + i64::from(period.months),
        date.day(),
    )?;
    let date = date.checked_add_signed(Duration::days(i64::from(period.days)))?;
    Some(date.and_time(now.time()))
}

/// Expiration timestamp for a document, or `None` for no expiration.
pub fn compute_expiration_timestamp(years: u32, months: u32, days: u32) -> Option<String> {
    compute_expiration_from(
        Local::now().naive_local(),
        ExpirationPeriod::new(years, months, days),
    )
    .map(|at| at.format(EXPIRATION_FORMAT).to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalType {
    Sequential,
    Parallel,
}

impl ApprovalType {
    pub fn from_sequential(sequential: bool) -> Self {
        if sequential {
            ApprovalType::Sequential
        } else {
            ApprovalType::Parallel
        }
    }
}

/// Body of the start approval call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub document_id: String,
    pub initiator: String,
    pub approval_type: ApprovalType,
    pub signers: Vec<Signer>,
    pub current_signer_index: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpirationUpdate<'a> {
    expiration_date: Option<&'a str>,
}

/// Document level settings applied right before the approval starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalSettings {
    pub tags: Vec<String>,
    pub expiration: ExpirationPeriod,
}

impl DocFlowClient {
    /// Replace the whole tag set of a document.
    pub async fn apply_tags(&self, document_id: &str, tags: &[String]) -> Result<()> {
        let url = self.endpoint(Service::Documents, &["documents", document_id, "tags"])?;
        self.send(self.request(Method::PUT, url).json(tags)).await?;
        Ok(())
    }

    /// `None` clears the expiration.
    pub async fn update_expiration(
        &self,
        document_id: &str,
        expiration_date: Option<&str>,
    ) -> Result<()> {
        let url = self.endpoint(
            Service::Documents,
            &["documents", document_id, "expiration"],
        )?;
        let body = ExpirationUpdate { expiration_date };
        self.send(self.request(Method::PUT, url).json(&body)).await?;
        Ok(())
    }

    pub async fn start_approval(
        &self,
        document_id: &str,
        initiator_id: &str,
        sequential: bool,
        signers: Vec<Signer>,
    ) -> Result<()> {
        let request = ApprovalRequest {
            document_id: document_id.to_owned(),
            initiator: initiator_id.to_owned(),
            approval_type: ApprovalType::from_sequential(sequential),
            signers,
            current_signer_index: 0,
        };
        let url = self.endpoint(Service::Approval, &["approvals"])?;
        self.send(self.request(Method::POST, url).json(&request))
            .await?;
        log::info!(
            "Started {:?} approval of `{}` with {} signers",
            request.approval_type,
            document_id,
            request.signers.len()
        );
        Ok(())
    }

    /// Apply tags, then expiration, then start the approval.
    ///
    /// Each step only runs when the previous one succeeded. On error the
    /// document is still a draft and the whole call can be retried.
    pub async fn submit_for_approval(
        &self,
        document_id: &str,
        initiator_id: &str,
        settings: &ApprovalSettings,
        roster: &SignerRoster,
    ) -> Result<()> {
        if roster.is_empty() {
            return Err(Error::Validation("Add at least one signer".to_owned()));
        }
        self.apply_tags(document_id, &settings.tags).await?;
        let expiration = compute_expiration_timestamp(
            settings.expiration.years,
            settings.expiration.months,
            settings.expiration.days,
        );
        self.update_expiration(document_id, expiration.as_deref())
            .await?;
        self.start_approval(
            document_id,
            initiator_id,
            roster.is_sequential(),
            roster.to_payload(),
        )
        .await
    }

    /// Current participants of the approval for `document_id`.
    pub async fn document_signers(&self, document_id: &str) -> Result<Vec<SignerDto>> {
        self.get_json(Service::Approval, &["approvals", document_id, "signers"])
            .await
    }
}
