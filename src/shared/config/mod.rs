/// 環境設定とログ初期化
pub mod environment;

/// アプリケーション初期化処理
pub mod initialization;

pub use environment::{
    get_database_filename, get_environment, initialize_logging_system,
    load_environment_variables, parse_timezone, Environment, EnvironmentConfig,
    DEFAULT_TIMEZONE,
};
pub use initialization::{initialize_application, log_initialization_complete, InitializationResult};
