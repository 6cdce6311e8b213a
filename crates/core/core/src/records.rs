//! Rows owned by the platform's CRUD subsystems.
//!
//! Analytics only ever reads these. Storage adapters expose `insert_*`
//! helpers taking them so that tests and local demos can seed data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserRole;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(id: i64, name: impl Into<String>, role: UserRole, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            created_at,
        }
    }
}

/// An asset category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
}

impl CategoryRecord {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A purchasable asset (skin, sticker pack, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: i64,
    pub name: String,
    pub is_free: bool,
    pub category_id: Option<i64>,
}

impl AssetRecord {
    pub fn new(id: i64, name: impl Into<String>, is_free: bool, category_id: Option<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            is_free,
            category_id,
        }
    }
}

/// A user acquiring an asset, at the price paid (zero for free assets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: i64,
    pub user_id: i64,
    pub asset_id: i64,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

impl PurchaseRecord {
    pub fn new(id: i64, user_id: i64, asset_id: i64, price: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            asset_id,
            price,
            created_at,
        }
    }
}

/// A page written in a student's diary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryPageRecord {
    pub id: i64,
    pub user_id: i64,
    pub diary_title: String,
    pub created_at: DateTime<Utc>,
}

/// A forum post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumPostRecord {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// An award granted to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardRecord {
    pub id: i64,
    pub user_id: i64,
    pub award_name: String,
    pub created_at: DateTime<Utc>,
}

/// A chat message between two users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageRecord {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub created_at: DateTime<Utc>,
}
