use super::models::{CreateProviderDto, Provider};
use super::repository;
use crate::shared::errors::{command_error, AppError, AppResult};
use crate::shared::utils::{validate_required_field, validate_text_length};
use crate::AppState;
use rusqlite::Connection;

/// プロバイダーを作成する
///
/// # 引数
/// * `dto` - プロバイダー作成用DTO
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 作成されたプロバイダー、または失敗時はエラーメッセージ
pub fn create_provider(dto: CreateProviderDto, state: &AppState) -> Result<Provider, String> {
    validate_create_provider_dto(&dto).map_err(command_error("プロバイダーの入力検証"))?;

    let db = state.lock_db().map_err(command_error("データベースロックの取得"))?;
    ensure_unique_name(&db, &dto.name).map_err(command_error("プロバイダー名の重複確認"))?;
    let now = state.config.now_rfc3339();

    let provider =
        repository::create(&db, dto, &now).map_err(command_error("プロバイダーの作成"))?;

    log::info!("プロバイダーを作成しました: id={}, name={}", provider.id, provider.name);
    Ok(provider)
}

/// プロバイダー一覧を取得する
///
/// # 引数
/// * `search` - 名前の部分一致検索（任意）
/// * `state` - アプリケーション状態
pub fn get_providers(search: Option<String>, state: &AppState) -> Result<Vec<Provider>, String> {
    let db = state.lock_db().map_err(command_error("データベースロックの取得"))?;

    repository::find_all(&db, search.as_deref()).map_err(command_error("プロバイダー一覧の取得"))
}

/// 同名（前後の空白を除いた完全一致）のプロバイダーが未登録であることを確認する
fn ensure_unique_name(conn: &Connection, name: &str) -> AppResult<()> {
    let name = name.trim();
    match repository::find_by_name(conn, name)? {
        Some(existing) => Err(AppError::validation(format!(
            "プロバイダー「{}」は既に登録されています（ID {}）",
            existing.name, existing.id
        ))),
        None => Ok(()),
    }
}

/// プロバイダー作成DTOのバリデーション
fn validate_create_provider_dto(dto: &CreateProviderDto) -> AppResult<()> {
    validate_required_field(&dto.name, "プロバイダー名")?;
    validate_text_length(dto.name.trim(), 100, "プロバイダー名")?;
    validate_text_length(&dto.url, 200, "URL")?;
    validate_text_length(&dto.logo_url, 200, "ロゴURL")?;
    Ok(())
}
