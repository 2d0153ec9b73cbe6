pub mod features;
pub mod shared;

#[cfg(test)]
mod test_utils;

use log::{error, info};
use rusqlite::Connection;
use shared::config::{
    initialize_application, initialize_logging_system, load_environment_variables,
    log_initialization_complete, EnvironmentConfig,
};
use shared::errors::{AppError, AppResult};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// アプリケーション状態（データベース接続と環境設定を保持）
pub struct AppState {
    pub db: Mutex<Connection>,
    pub config: EnvironmentConfig,
}

impl AppState {
    pub fn new(conn: Connection, config: EnvironmentConfig) -> Self {
        Self {
            db: Mutex::new(conn),
            config,
        }
    }

    /// データベース接続のロックを取得する
    pub fn lock_db(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))
    }
}

/// アプリケーションを初期化する
///
/// # 引数
/// * `app_data_dir` - アプリケーションデータディレクトリ
///
/// # 戻り値
/// 初期化済みのアプリケーション状態
///
/// # 処理内容
/// 1. 環境変数（.env）の読み込み
/// 2. ログシステムの初期化
/// 3. データディレクトリとデータベースファイルの準備
/// 4. テーブル作成と未設定の次回更新日の補完
pub fn initialize(app_data_dir: &Path) -> AppResult<AppState> {
    load_environment_variables();
    initialize_logging_system();

    info!("アプリケーション初期化を開始します...");

    let config = EnvironmentConfig::from_env();
    let init_result = initialize_application(app_data_dir, &config)?;

    let conn = shared::database::initialize_database(&init_result.database_path).map_err(|e| {
        error!("データベースの初期化に失敗しました: {e}");
        e
    })?;

    features::subscriptions::repository::fill_missing_renewal_dates(&conn)?;

    log_initialization_complete(&init_result);

    Ok(AppState::new(conn, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_creates_database() {
        let temp_dir = TempDir::new().unwrap();

        let state = initialize(temp_dir.path()).unwrap();

        let subscriptions = features::subscriptions::get_subscriptions(1, &state).unwrap();
        assert!(subscriptions.is_empty());
        if state.config.database_path.is_none() {
            let has_db_file = std::fs::read_dir(temp_dir.path())
                .unwrap()
                .flatten()
                .any(|entry| entry.file_name().to_string_lossy().ends_with(".db"));
            assert!(has_db_file);
        }
    }

    #[test]
    fn test_poisoned_lock_is_concurrency_error() {
        let state = test_state();

        std::thread::scope(|scope| {
            let result = scope
                .spawn(|| {
                    let _guard = state.db.lock().unwrap();
                    panic!("ロック保持中のパニック");
                })
                .join();
            assert!(result.is_err());
        });

        let error = state.lock_db().err().unwrap();
        assert!(matches!(error, AppError::Concurrency(_)));
        assert_eq!(
            features::subscriptions::get_subscriptions(1, &state).unwrap_err(),
            "並行処理でエラーが発生しました"
        );
    }
}
