use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::path::PathBuf;

/// タイムゾーン未指定時に使用するデフォルト値
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Tokyo;

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// ログレベル
    pub log_level: String,
    /// 「今日」の判定やタイムスタンプに使用するタイムゾーン
    pub timezone: Tz,
    /// データベースファイルパスの上書き（DATABASE_PATH）
    pub database_path: Option<PathBuf>,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 戻り値
    /// 環境設定
    ///
    /// # 読み込む環境変数
    /// - `LOG_LEVEL`: 未設定の場合は開発環境で"debug"、本番環境で"info"
    /// - `APP_TIMEZONE`: IANAタイムゾーン名。不正な値の場合はAsia/Tokyo
    /// - `DATABASE_PATH`: データベースファイルの絶対パス（任意）
    pub fn from_env() -> Self {
        let environment = get_environment();
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if environment == Environment::Development {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });
        let timezone = parse_timezone(std::env::var("APP_TIMEZONE").ok().as_deref());
        let database_path = std::env::var("DATABASE_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            log_level,
            timezone,
            database_path,
        }
    }

    /// 設定タイムゾーンにおける今日の日付を取得する
    ///
    /// 集計処理では1回の呼び出しにつき1度だけ読み取ること。
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    /// 設定タイムゾーンにおける現在時刻をRFC3339形式で取得する
    pub fn now_rfc3339(&self) -> String {
        Utc::now().with_timezone(&self.timezone).to_rfc3339()
    }
}

/// タイムゾーン名を解析する
///
/// # 引数
/// * `name` - IANAタイムゾーン名（例: "Asia/Tokyo", "UTC"）
///
/// # 戻り値
/// 解析したタイムゾーン。未指定または不正な場合はデフォルト（Asia/Tokyo）
pub fn parse_timezone(name: Option<&str>) -> Tz {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
            log::warn!("APP_TIMEZONEの解析に失敗しました: {name}。デフォルト値を使用します");
            DEFAULT_TIMEZONE
        }),
        None => DEFAULT_TIMEZONE,
    }
}

/// 現在の実行環境を判定する
///
/// # 判定ロジック
/// 1. 実行時環境変数 ENVIRONMENT を確認
/// 2. デバッグビルドの場合は Development
/// 3. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        let env = match env_var.as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: 実行時環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    // フォールバック: ビルド設定に基づく判定
    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # ファイル名の規則
/// - 開発環境: "dev_subscriptions.db"
/// - プロダクション環境: "subscriptions.db"
pub fn get_database_filename(env: Environment) -> &'static str {
    match env {
        Environment::Development => "dev_subscriptions.db",
        Environment::Production => "subscriptions.db",
    }
}

/// 環境に応じた.envファイルを読み込む
///
/// # 処理内容
/// 1. ENVIRONMENTに応じた.envファイルを決定
/// 2. 該当ファイルを読み込み
/// 3. 見つからない場合はデフォルトの.envにフォールバック
pub fn load_environment_variables() {
    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let env_file = match environment.as_str() {
        "production" => ".env.production",
        _ => ".env",
    };

    log::info!("環境: {environment}, 読み込み対象: {env_file}");

    match dotenv::from_filename(env_file) {
        Ok(_) => {
            log::info!("{env_file}ファイルを読み込みました");
        }
        Err(_) => {
            if env_file != ".env" && dotenv::dotenv().is_ok() {
                log::warn!("{env_file}が見つからないため、デフォルトの.envファイルを読み込みました");
            } else {
                log::warn!("環境変数ファイルが見つかりません。直接設定された環境変数を使用します。");
            }
        }
    }
}

/// ログシステムを初期化する
///
/// # 処理内容
/// 1. 環境設定を取得
/// 2. ログレベルを設定
/// 3. env_loggerを初期化（初期化済みの場合は何もしない）
pub fn initialize_logging_system() {
    let env_config = EnvironmentConfig::from_env();

    let log_level = match env_config.log_level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };

    let initialized = env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();

    if initialized.is_err() {
        log::debug!("ログシステムは既に初期化されています");
        return;
    }

    log::info!(
        "ログシステムを初期化しました: level={}, environment={}, timezone={}",
        env_config.log_level,
        env_config.environment,
        env_config.timezone
    );
}
