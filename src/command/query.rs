// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::warn;
use tabled::{
    settings::{object::Segment, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::{
    error::Result,
    model::{KeyDb, KeyRecord},
    storage::{self, Storage as _},
};

#[derive(Clone, Debug, Tabled)]
struct Row {
    #[tabled(rename = "Type")]
    key_type: String,
    #[tabled(rename = "Key")]
    key_material: String,
    #[tabled(rename = "Comment")]
    comment: String,
    #[tabled(rename = "Servers")]
    servers: String,
}

impl Row {
    fn new(key_material: &str, record: &KeyRecord) -> Self {
        Self {
            key_type: record.key_type.clone(),
            key_material: key_material.to_owned(),
            comment: record.comment.clone(),
            servers: record.servers.join("\n"),
        }
    }
}

/// Show which hosts each recorded key grants access to.
#[derive(Debug, Default, Parser)]
pub(crate) struct Command {
    /// Only show keys whose encoded material contains this text.
    #[arg(long, short)]
    key: Option<String>,

    /// Only show keys whose comment contains this text.
    #[arg(long, short)]
    comment: Option<String>,

    /// Only show keys that grant access to this host.
    #[arg(long = "host", short = 'H')]
    host: Option<String>,

    /// Also show keys that no longer grant access to any host.
    #[arg(long, short)]
    all: bool,
}

impl Command {
    fn matches(&self, key_material: &str, record: &KeyRecord) -> bool {
        (self.all || !record.servers.is_empty())
            && self
                .key
                .as_deref()
                .map_or(true, |needle| key_material.contains(needle))
            && self
                .comment
                .as_deref()
                .map_or(true, |needle| record.comment.contains(needle))
            && self
                .host
                .as_deref()
                .map_or(true, |host| record.authorizes(host))
    }

    fn rows(&self, db: &KeyDb) -> Vec<Row> {
        db.iter()
            .filter(|(key_material, record)| self.matches(key_material, record))
            .map(|(key_material, record)| Row::new(key_material, record))
            .collect()
    }
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, mut storage: storage::File) -> Result<()> {
        let stored: Option<KeyDb> = storage.get().await?;
        let db = match stored {
            Some(db) => db,
            None => {
                warn!(
                    "There is no key database at {} yet; run a scan first",
                    storage.path().display()
                );
                KeyDb::new()
            }
        };

        let rows = self.rows(&db);
        if !rows.is_empty() {
            println!(
                "{}",
                Table::new(rows)
                    .with(Style::rounded())
                    .with(Modify::new(Segment::all()).with(Alignment::left()))
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::entry;

    fn db() -> KeyDb {
        let mut db = KeyDb::new();
        let _stats = db.merge("web1", &[entry("AAAA"), entry("BBBB")]);
        let _stats = db.merge("web2", &[entry("BBBB")]);
        let _stats = db.merge("db1", &[entry("CCCC")]);
        let _stats = db.merge("db1", &[]);
        db
    }

    fn keys(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|row| row.key_material.as_str()).collect()
    }

    #[test]
    fn rows_hide_orphaned_keys() {
        let rows = Command::default().rows(&db());

        assert_eq!(keys(&rows), vec!["AAAA", "BBBB"]);
        assert_eq!(rows[1].servers, "web1\nweb2");
    }

    #[test]
    fn rows_with_all() {
        let cmd = Command {
            all: true,
            ..Command::default()
        };

        assert_eq!(keys(&cmd.rows(&db())), vec!["AAAA", "BBBB", "CCCC"]);
    }

    #[test]
    fn rows_for_host() {
        let cmd = Command {
            host: Some("web2".to_owned()),
            ..Command::default()
        };

        assert_eq!(keys(&cmd.rows(&db())), vec!["BBBB"]);
    }

    #[test]
    fn rows_for_key_and_comment() {
        let by_key = Command {
            key: Some("AA".to_owned()),
            ..Command::default()
        };
        let by_comment = Command {
            comment: Some("BBBB@".to_owned()),
            ..Command::default()
        };

        assert_eq!(keys(&by_key.rows(&db())), vec!["AAAA"]);
        assert_eq!(keys(&by_comment.rows(&db())), vec!["BBBB"]);
    }
}
