use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    assets::repo_types::{Asset, AssetStatus},
    auth::repo_types::User,
};

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    AccountCreated,
    KycSubmitted,
    AssetPledged,
    AssetApproved,
    AssetRejected,
    AssetTokenized,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Requested page size, clamped to `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn asset_label(a: &Asset) -> String {
    match &a.token {
        Some(t) => format!("{} ({})", a.asset_type, t.symbol),
        None => a.asset_type.to_string(),
    }
}

/// Timeline reconstructed from stored rows, newest first.
///
/// Status changes carry the asset's `updated_at`, the last time the row was written.
pub fn timeline(user: &User, assets: &[Asset], limit: usize) -> Vec<ActivityItem> {
    let mut items = vec![ActivityItem {
        kind: ActivityKind::AccountCreated,
        description: "Account created".into(),
        asset_id: None,
        timestamp: user.created_at,
    }];

    if let Some(at) = user.kyc_submitted_at {
        items.push(ActivityItem {
            kind: ActivityKind::KycSubmitted,
            description: "KYC documents submitted".into(),
            asset_id: None,
            timestamp: at,
        });
    }

    for a in assets {
        items.push(ActivityItem {
            kind: ActivityKind::AssetPledged,
            description: format!("Pledged {} asset valued at {}", a.asset_type, a.estimated_value),
            asset_id: Some(a.id),
            timestamp: a.created_at,
        });

        let change = match a.status {
            AssetStatus::Pending => None,
            AssetStatus::Approved => Some((ActivityKind::AssetApproved, "approved")),
            AssetStatus::Rejected => Some((ActivityKind::AssetRejected, "rejected")),
            AssetStatus::Tokenized => Some((ActivityKind::AssetTokenized, "tokenized")),
        };
        if let Some((kind, verb)) = change {
            items.push(ActivityItem {
                kind,
                description: format!("Asset {} {verb}", asset_label(a)),
                asset_id: Some(a.id),
                timestamp: a.updated_at,
            });
        }
    }

    items.sort_by(|x, y| y.timestamp.cmp(&x.timestamp));
    items.truncate(limit);
    items
}
