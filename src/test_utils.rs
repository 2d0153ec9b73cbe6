use crate::shared::config::{EnvironmentConfig, DEFAULT_TIMEZONE};
use crate::shared::database::create_tables;
use crate::AppState;
use rusqlite::Connection;

/// テスト用の環境設定（開発環境・Asia/Tokyo）
pub fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        environment: "development".to_string(),
        log_level: "debug".to_string(),
        timezone: DEFAULT_TIMEZONE,
        database_path: None,
    }
}

/// インメモリデータベースを使用したアプリケーション状態を作成する
pub fn test_state() -> AppState {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    create_tables(&conn).unwrap();
    AppState::new(conn, test_config())
}
