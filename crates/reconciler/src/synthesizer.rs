//! Turns snapshot diffs into [`NotificationRecord`]s.
//!
//! Pure and synchronous. Callers pass the timestamp so output is
//! deterministic under test.

use assetflow_core::asset::Asset;
use assetflow_core::notification::{NotificationRecord, Severity};
use assetflow_core::request::{AssetRequest, RequestStatus};
use assetflow_core::types::{DbId, Timestamp};

use crate::request_store::StatusChange;

pub const TITLE_NEW_ASSET: &str = "New Asset Available";
pub const TITLE_APPROVED: &str = "Request Approved";
pub const TITLE_REJECTED: &str = "Request Rejected";
pub const TITLE_IN_PROGRESS: &str = "Request In Progress";
pub const TITLE_RETURNED: &str = "Asset Returned";
pub const TITLE_NEW_REQUEST: &str = "New Asset Request";

/// Display name for an asset we could not resolve.
pub fn fallback_asset_name(asset_id: DbId) -> String {
    format!("asset #{asset_id}")
}

/// Display name for an employee we could not resolve.
pub fn fallback_employee_name(employee_id: DbId) -> String {
    format!("employee #{employee_id}")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationSynthesizer;

impl NotificationSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// [`synthesize_at`](Self::synthesize_at) stamped with the current time.
    pub fn synthesize(
        &self,
        new_assets: &[Asset],
        status_changes: &[StatusChange],
    ) -> Vec<NotificationRecord> {
        self.synthesize_at(chrono::Utc::now(), new_assets, status_changes)
    }

    /// One record per new asset, then one per status change whose new status
    /// has a template. Input order is preserved within each group.
    pub fn synthesize_at(
        &self,
        now: Timestamp,
        new_assets: &[Asset],
        status_changes: &[StatusChange],
    ) -> Vec<NotificationRecord> {
        let assets = new_assets.iter().map(|asset| new_asset_record(now, asset));
        let changes = status_changes
            .iter()
            .filter_map(|change| status_change_record(now, change));
        assets.chain(changes).collect()
    }

    /// Admin-side records for newly submitted requests still pending review.
    pub fn synthesize_submissions_at(
        &self,
        now: Timestamp,
        submitted: &[AssetRequest],
    ) -> Vec<NotificationRecord> {
        submitted
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .map(|r| {
                let employee = r
                    .employee_name
                    .clone()
                    .unwrap_or_else(|| fallback_employee_name(r.employee_id));
                let asset = r
                    .asset_name
                    .clone()
                    .unwrap_or_else(|| fallback_asset_name(r.asset_id));
                NotificationRecord::new(
                    TITLE_NEW_REQUEST,
                    format!("{employee} requested {asset}."),
                    Severity::Info,
                    now,
                )
            })
            .collect()
    }
}

fn new_asset_record(now: Timestamp, asset: &Asset) -> NotificationRecord {
    NotificationRecord::new(
        TITLE_NEW_ASSET,
        format!("A new {} ({}) is now available", asset.name, asset.code),
        Severity::Info,
        now,
    )
    .with_subtext(asset.location.clone())
}

/// `None` for statuses outside the closed template table.
fn status_change_record(now: Timestamp, change: &StatusChange) -> Option<NotificationRecord> {
    let name = change
        .asset_name
        .clone()
        .unwrap_or_else(|| fallback_asset_name(change.asset_id));

    let (title, message, severity, subtext) = match change.new_status {
        RequestStatus::Approved => (
            TITLE_APPROVED,
            format!("Your request for {name} has been approved and is ready for dispatch."),
            Severity::Success,
            None,
        ),
        RequestStatus::Rejected => (
            TITLE_REJECTED,
            format!("Your request for {name} has been rejected."),
            Severity::Error,
            change.rejection_reason.clone(),
        ),
        RequestStatus::InProgress => (
            TITLE_IN_PROGRESS,
            format!("Your request for {name} is now being processed."),
            Severity::Success,
            None,
        ),
        RequestStatus::Returned => (
            TITLE_RETURNED,
            format!("The asset {name} has been marked as returned."),
            Severity::Success,
            None,
        ),
        _ => {
            tracing::debug!(
                request_id = change.request_id,
                status = %change.new_status,
                "No notification for status"
            );
            return None;
        }
    };

    Some(NotificationRecord::new(title, message, severity, now).with_subtext(subtext))
}
