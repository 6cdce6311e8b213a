//! Table layout read by the analytics queries.
//!
//! Timestamps are stored as Unix seconds so that `strftime(.., 'unixepoch')`
//! can bucket them in UTC.

pub(crate) const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        role TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS assets (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        is_free INTEGER NOT NULL DEFAULT 0,
        category_id INTEGER REFERENCES categories(id)
    )",
    "CREATE TABLE IF NOT EXISTS user_assets (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        asset_id INTEGER NOT NULL,
        price REAL NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS diary_pages (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        diary_title TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS forum_posts (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS awards (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        award_name TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY,
        sender_id INTEGER NOT NULL,
        recipient_id INTEGER NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_user_assets_created_at ON user_assets(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_diary_pages_created_at ON diary_pages(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_forum_posts_created_at ON forum_posts(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_awards_created_at ON awards(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_chat_messages_created_at ON chat_messages(created_at)",
];

/// Event table for a metric source, aliased `e`, plus any joins its
/// filters need (`a` for assets).
pub(crate) fn source_from(source: tutorhub_core::MetricSource) -> &'static str {
    use tutorhub_core::MetricSource::*;
    match source {
        UserRegistrations => "users e",
        AssetPurchases => "user_assets e LEFT JOIN assets a ON a.id = e.asset_id",
        DiaryPages => "diary_pages e",
        ForumPosts => "forum_posts e",
        AwardGrants => "awards e",
        ChatMessages => "chat_messages e",
    }
}

/// SQL selecting the recent rows of one activity kind as
/// `(id, user, detail, price, created_at)`.
pub(crate) fn recent_select(kind: tutorhub_core::ActivityKind) -> &'static str {
    use tutorhub_core::ActivityKind::*;
    match kind {
        AssetPurchase => {
            "SELECT e.id, COALESCE(u.name, 'User #' || e.user_id), \
             COALESCE(a.name, 'Asset #' || e.asset_id), e.price, e.created_at \
             FROM user_assets e \
             LEFT JOIN users u ON u.id = e.user_id \
             LEFT JOIN assets a ON a.id = e.asset_id"
        }
        DiaryPage => {
            "SELECT e.id, COALESCE(u.name, 'User #' || e.user_id), e.diary_title, 0.0, e.created_at \
             FROM diary_pages e LEFT JOIN users u ON u.id = e.user_id"
        }
        ForumPost => {
            "SELECT e.id, COALESCE(u.name, 'User #' || e.user_id), e.title, 0.0, e.created_at \
             FROM forum_posts e LEFT JOIN users u ON u.id = e.user_id"
        }
        AwardGrant => {
            "SELECT e.id, COALESCE(u.name, 'User #' || e.user_id), e.award_name, 0.0, e.created_at \
             FROM awards e LEFT JOIN users u ON u.id = e.user_id"
        }
        ChatMessage => {
            "SELECT e.id, COALESCE(u.name, 'User #' || e.sender_id), \
             COALESCE(r.name, 'User #' || e.recipient_id), 0.0, e.created_at \
             FROM chat_messages e \
             LEFT JOIN users u ON u.id = e.sender_id \
             LEFT JOIN users r ON r.id = e.recipient_id"
        }
    }
}
