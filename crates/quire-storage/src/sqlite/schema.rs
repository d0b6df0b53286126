//! Table definitions applied when a database is opened.
//!
//! Statements are idempotent so they run on every connect.

pub(super) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL,
        photo TEXT NOT NULL DEFAULT ''
    )",
    // cloned_from is a weak reference: forks outlive their source.
    "CREATE TABLE IF NOT EXISTS documentations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        version TEXT NOT NULL DEFAULT '',
        cloned_from INTEGER,
        author_id INTEGER NOT NULL REFERENCES users(id),
        last_editor_id INTEGER REFERENCES users(id),
        favicon TEXT NOT NULL DEFAULT '',
        meta_image TEXT NOT NULL DEFAULT '',
        nav_image TEXT NOT NULL DEFAULT '',
        custom_css TEXT NOT NULL DEFAULT '',
        footer_label_links TEXT NOT NULL DEFAULT '',
        more_label_links TEXT NOT NULL DEFAULT '',
        copyright_text TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS documentations_root_name
        ON documentations(name) WHERE cloned_from IS NULL",
    "CREATE INDEX IF NOT EXISTS documentations_cloned_from ON documentations(cloned_from)",
    "CREATE TABLE IF NOT EXISTS page_groups (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        documentation_id INTEGER NOT NULL REFERENCES documentations(id),
        parent_id INTEGER REFERENCES page_groups(id) ON DELETE SET NULL,
        name TEXT NOT NULL,
        sort_order INTEGER,
        author_id INTEGER NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS page_groups_documentation ON page_groups(documentation_id)",
    "CREATE INDEX IF NOT EXISTS page_groups_parent ON page_groups(parent_id)",
    "CREATE TABLE IF NOT EXISTS pages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        documentation_id INTEGER NOT NULL REFERENCES documentations(id),
        page_group_id INTEGER REFERENCES page_groups(id),
        title TEXT NOT NULL,
        slug TEXT NOT NULL,
        content TEXT NOT NULL DEFAULT '',
        sort_order INTEGER,
        author_id INTEGER NOT NULL REFERENCES users(id),
        last_editor_id INTEGER REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS pages_documentation ON pages(documentation_id)",
    "CREATE INDEX IF NOT EXISTS pages_page_group ON pages(page_group_id)",
    "CREATE TABLE IF NOT EXISTS documentation_editors (
        documentation_id INTEGER NOT NULL REFERENCES documentations(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        PRIMARY KEY (documentation_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS page_group_editors (
        page_group_id INTEGER NOT NULL REFERENCES page_groups(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        PRIMARY KEY (page_group_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS page_editors (
        page_id INTEGER NOT NULL REFERENCES pages(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        PRIMARY KEY (page_id, user_id)
    )",
];
