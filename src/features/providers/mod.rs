/// プロバイダー機能モジュール
///
/// - プロバイダー（配信・メディアサービス）の登録
/// - 名前順の一覧取得と名前による検索
pub mod commands;
pub mod models;
pub mod repository;

pub use commands::{create_provider, get_providers};
pub use models::{CreateProviderDto, Provider};
