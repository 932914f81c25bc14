//! Document schema versions.
//!
//! v1 creates the `documents` table with a `json_valid` check on bodies.
//! v2 indexes `(collection, doc_id)`, the prefix of every query scan and its
//! default order.
//!
//! An upgrade runs all pending steps in one transaction, so a file is either
//! fully at the new version or untouched.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "documents_table",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "collection_index",
        sql: include_str!("0002_collection_index.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    latest_of(MIGRATIONS)
}

/// Brings the document schema up to [`latest_version`].
///
/// Refuses files from a newer build instead of touching them.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    apply_list(conn, MIGRATIONS)
}

fn latest_of(migrations: &[Migration]) -> u32 {
    migrations.last().map_or(0, |migration| migration.version)
}

fn apply_list(conn: &mut Connection, migrations: &[Migration]) -> DbResult<()> {
    let from = current_user_version(conn)?;
    let latest = latest_of(migrations);
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }
    if from == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in migrations.iter().filter(|m| m.version > from) {
        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| DbError::Migration {
                version: migration.version,
                source,
            })?;
        info!(
            "event=db_migrate module=db status=step version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from} to_version={latest}");
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{apply_list, current_user_version, latest_version, Migration, MIGRATIONS};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn versions_are_strictly_increasing() {
        assert!(MIGRATIONS
            .windows(2)
            .all(|pair| pair[0].version < pair[1].version));
        assert_eq!(latest_version(), 2);
    }

    #[test]
    fn failing_step_reports_its_version_and_rolls_back() {
        let mut conn = Connection::open_in_memory().expect("open");
        let broken = [
            MIGRATIONS[0],
            Migration {
                version: 2,
                name: "broken",
                sql: "CREATE INDEX idx_missing ON no_such_table (x);",
            },
        ];

        let err = apply_list(&mut conn, &broken).expect_err("second step must fail");
        assert!(matches!(err, DbError::Migration { version: 2, .. }), "{err}");
        assert!(err.to_string().contains("version 2"));
        assert_eq!(current_user_version(&conn).expect("version"), 0);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'documents';",
                [],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(tables, 0);
    }
}
