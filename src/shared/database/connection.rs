use crate::shared::errors::AppResult;
use rusqlite::Connection;
use std::path::Path;

/// データベース接続を初期化し、テーブルを作成する
///
/// # 引数
/// * `database_path` - データベースファイルのパス
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
pub fn initialize_database(database_path: &Path) -> AppResult<Connection> {
    let conn = Connection::open(database_path)?;

    // プロバイダー削除時にサブスクリプションも削除するため外部キーを有効化
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    create_tables(&conn)?;

    log::info!("データベースを初期化しました: {database_path:?}");

    Ok(conn)
}

/// データベーステーブルを作成する
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    create_providers_table(conn)?;

    let table_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='subscriptions'",
        [],
        |row| row.get(0),
    )?;

    if table_exists == 0 {
        create_subscriptions_table(conn)?;
        log::info!("subscriptionsテーブルを作成しました");
    } else {
        log::info!("既存のデータベースを確認中...");
        migrate_subscriptions_table(conn)?;
    }

    create_indexes(conn)?;

    Ok(())
}

/// プロバイダーテーブルを作成する
fn create_providers_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS providers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            url TEXT NOT NULL DEFAULT '',
            logo_url TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// サブスクリプションテーブルを作成する
///
/// 金額は誤差を避けるためTEXT（10進数文字列）で保存する。
fn create_subscriptions_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE subscriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            provider_id INTEGER REFERENCES providers(id) ON DELETE CASCADE,
            plan_name TEXT NOT NULL DEFAULT '',
            price TEXT NOT NULL DEFAULT '0',
            currency TEXT NOT NULL DEFAULT 'USD',
            billing_cycle TEXT NOT NULL DEFAULT 'monthly',
            start_date TEXT NOT NULL,
            custom_cycle_days INTEGER NOT NULL DEFAULT 0,
            next_renewal_date TEXT,
            auto_renew INTEGER NOT NULL DEFAULT 1,
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// 既存のサブスクリプションテーブルに不足しているカラムを追加する
fn migrate_subscriptions_table(conn: &Connection) -> AppResult<()> {
    let columns = [
        ("custom_cycle_days", "INTEGER NOT NULL DEFAULT 0"),
        ("auto_renew", "INTEGER NOT NULL DEFAULT 1"),
        ("notes", "TEXT NOT NULL DEFAULT ''"),
    ];

    for (column, definition) in columns {
        if !check_column_exists(conn, "subscriptions", column) {
            log::info!("{column}カラムを追加します...");
            conn.execute(
                &format!("ALTER TABLE subscriptions ADD COLUMN {column} {definition}"),
                [],
            )?;
        }
    }

    Ok(())
}

/// インデックスを作成する
fn create_indexes(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_user_renewal
         ON subscriptions(user_id, next_renewal_date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_user_provider
         ON subscriptions(user_id, provider_id)",
        [],
    )?;

    Ok(())
}

/// テーブルに指定されたカラムが存在するかチェックする
///
/// # 引数
/// * `conn` - データベース接続
/// * `table_name` - テーブル名
/// * `column_name` - カラム名
///
/// # 戻り値
/// カラムが存在する場合はtrue、存在しないかエラーの場合はfalse
pub fn check_column_exists(conn: &Connection, table_name: &str, column_name: &str) -> bool {
    let query = format!("PRAGMA table_info({table_name})");

    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };

    let Ok(rows) = stmt.query_map([], |row| row.get::<_, String>(1)) else {
        return false;
    };

    for name in rows.flatten() {
        if name == column_name {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_tables() {
        let conn = Connection::open_in_memory().unwrap();

        let result = create_tables(&conn);
        assert!(result.is_ok());

        for table in ["providers", "subscriptions"] {
            let count: i64 = conn
                .query_row(
                    &format!(
                        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='{table}'"
                    ),
                    [],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "テーブル {table} が作成されていません");
        }

        // 2回目の呼び出しも成功すること
        assert!(create_tables(&conn).is_ok());
    }

    #[test]
    fn test_migrate_legacy_subscriptions_table() {
        let conn = Connection::open_in_memory().unwrap();

        // 旧スキーマ（custom_cycle_days / auto_renew / notes なし）
        conn.execute(
            "CREATE TABLE subscriptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                provider_id INTEGER,
                plan_name TEXT NOT NULL DEFAULT '',
                price TEXT NOT NULL DEFAULT '0',
                currency TEXT NOT NULL DEFAULT 'USD',
                billing_cycle TEXT NOT NULL DEFAULT 'monthly',
                start_date TEXT NOT NULL,
                next_renewal_date TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .unwrap();

        create_tables(&conn).unwrap();

        assert!(check_column_exists(&conn, "subscriptions", "custom_cycle_days"));
        assert!(check_column_exists(&conn, "subscriptions", "auto_renew"));
        assert!(check_column_exists(&conn, "subscriptions", "notes"));
    }

    #[test]
    fn test_check_column_exists() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE test_table (id INTEGER PRIMARY KEY, name TEXT)",
            [],
        )
        .unwrap();

        assert!(check_column_exists(&conn, "test_table", "id"));
        assert!(check_column_exists(&conn, "test_table", "name"));
        assert!(!check_column_exists(&conn, "test_table", "nonexistent"));
        assert!(!check_column_exists(&conn, "nonexistent_table", "id"));
    }

    #[test]
    fn test_initialize_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let database_path = temp_dir.path().join("test_subscriptions.db");

        let conn = initialize_database(&database_path).unwrap();

        assert!(database_path.exists());
        let foreign_keys: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }
}
