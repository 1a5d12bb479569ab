//! SQL schema for the Agora SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.
//!
//! Rows are never deleted: every table carries `is_deleted` / `deleted_at`.
//! Reads go through the `live_*` views, which are the only place the
//! "not deleted" predicate is spelled out.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL,
    username      TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    display_name  TEXT,
    bio           TEXT,
    status        TEXT NOT NULL DEFAULT 'active',   -- 'active' | 'suspended'
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    is_deleted    INTEGER NOT NULL DEFAULT 0,
    deleted_at    TEXT
);

-- Uniqueness applies among live accounts only, so a deleted account's
-- handle can be reused.
CREATE UNIQUE INDEX IF NOT EXISTS users_email_live
    ON users(email) WHERE is_deleted = 0;
CREATE UNIQUE INDEX IF NOT EXISTS users_username_live
    ON users(username) WHERE is_deleted = 0;

CREATE TABLE IF NOT EXISTS posts (
    post_id    TEXT PRIMARY KEY,
    author_id  TEXT NOT NULL REFERENCES users(user_id),
    content    TEXT,
    media      TEXT NOT NULL DEFAULT '[]',         -- JSON array of URLs
    visibility TEXT NOT NULL DEFAULT 'public',     -- 'public' | 'followers' | 'private'
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS posts_author_idx  ON posts(author_id, created_at);
CREATE INDEX IF NOT EXISTS posts_created_idx ON posts(created_at);

-- One row per (follower, followee), ever. Unfollow soft-deletes it and a
-- later follow resurrects it.
CREATE TABLE IF NOT EXISTS follows (
    follow_id   TEXT PRIMARY KEY,
    follower_id TEXT NOT NULL REFERENCES users(user_id),
    followee_id TEXT NOT NULL REFERENCES users(user_id),
    status      TEXT NOT NULL DEFAULT 'accepted',  -- 'pending' | 'accepted' | 'rejected'
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    deleted_at  TEXT,
    UNIQUE (follower_id, followee_id),
    CHECK  (follower_id != followee_id)
);

CREATE INDEX IF NOT EXISTS follows_followee_idx ON follows(followee_id);

CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    post_id    TEXT NOT NULL REFERENCES posts(post_id),
    author_id  TEXT NOT NULL REFERENCES users(user_id),
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS comments_post_idx ON comments(post_id, created_at);

-- One row per (post, user); changing the reaction overwrites `kind`.
CREATE TABLE IF NOT EXISTS reactions (
    reaction_id TEXT PRIMARY KEY,
    post_id     TEXT NOT NULL REFERENCES posts(post_id),
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    kind        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    deleted_at  TEXT,
    UNIQUE (post_id, user_id)
);

CREATE TABLE IF NOT EXISTS chats (
    chat_id         TEXT PRIMARY KEY,
    kind            TEXT NOT NULL,                 -- 'direct' | 'group'
    title           TEXT,
    created_by      TEXT NOT NULL REFERENCES users(user_id),
    direct_key      TEXT,                          -- 'lo:hi' user pair; direct chats only
    last_message_at TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    is_deleted      INTEGER NOT NULL DEFAULT 0,
    deleted_at      TEXT,
    CHECK ((kind = 'direct') = (direct_key IS NOT NULL))
);

-- At most one live direct chat per unordered pair of users.
CREATE UNIQUE INDEX IF NOT EXISTS chats_direct_pair_live
    ON chats(direct_key) WHERE is_deleted = 0 AND direct_key IS NOT NULL;

-- One row per (chat, user). `left_at` marks a participant who left or was
-- removed; re-adding clears it on the same row.
CREATE TABLE IF NOT EXISTS chat_participants (
    chat_id    TEXT NOT NULL REFERENCES chats(chat_id),
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    role       TEXT NOT NULL,                      -- 'owner' | 'admin' | 'member'
    joined_at  TEXT NOT NULL,
    left_at    TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    deleted_at TEXT,
    PRIMARY KEY (chat_id, user_id)
);

CREATE INDEX IF NOT EXISTS chat_participants_user_idx ON chat_participants(user_id);

CREATE TABLE IF NOT EXISTS chat_messages (
    message_id TEXT PRIMARY KEY,
    chat_id    TEXT NOT NULL REFERENCES chats(chat_id),
    sender_id  TEXT NOT NULL REFERENCES users(user_id),
    content    TEXT,
    media      TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS chat_messages_chat_idx ON chat_messages(chat_id, created_at);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    owner_id        TEXT NOT NULL REFERENCES users(user_id),
    kind            TEXT NOT NULL,                 -- 'follow' | 'comment' | 'message'
    payload         TEXT NOT NULL,                 -- opaque JSON
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    is_deleted      INTEGER NOT NULL DEFAULT 0,
    deleted_at      TEXT
);

CREATE INDEX IF NOT EXISTS notifications_owner_idx ON notifications(owner_id, created_at);

-- ─── Live views ───────────────────────────────────────────────────────────────

CREATE VIEW IF NOT EXISTS live_users AS
    SELECT * FROM users WHERE is_deleted = 0;

-- Posts of deleted accounts are hidden along with the account.
CREATE VIEW IF NOT EXISTS live_posts AS
    SELECT p.rowid AS seq, p.*
    FROM posts p
    JOIN users u ON u.user_id = p.author_id
    WHERE p.is_deleted = 0 AND u.is_deleted = 0;

CREATE VIEW IF NOT EXISTS live_follows AS
    SELECT * FROM follows WHERE is_deleted = 0;

CREATE VIEW IF NOT EXISTS live_comments AS
    SELECT rowid AS seq, * FROM comments WHERE is_deleted = 0;

CREATE VIEW IF NOT EXISTS live_reactions AS
    SELECT * FROM reactions WHERE is_deleted = 0;

CREATE VIEW IF NOT EXISTS live_chats AS
    SELECT * FROM chats WHERE is_deleted = 0;

CREATE VIEW IF NOT EXISTS live_chat_participants AS
    SELECT * FROM chat_participants WHERE is_deleted = 0;

CREATE VIEW IF NOT EXISTS live_chat_messages AS
    SELECT rowid AS seq, * FROM chat_messages WHERE is_deleted = 0;

CREATE VIEW IF NOT EXISTS live_notifications AS
    SELECT rowid AS seq, * FROM notifications WHERE is_deleted = 0;

PRAGMA user_version = 1;
";
