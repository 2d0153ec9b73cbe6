use super::models::{CreateProviderDto, Provider};
use crate::shared::errors::{AppError, AppResult};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};

const SELECT_PROVIDER: &str = "SELECT id, name, url, logo_url, created_at, updated_at FROM providers";

fn map_provider_row(row: &Row<'_>) -> rusqlite::Result<Provider> {
    Ok(Provider {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        logo_url: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// プロバイダーを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `dto` - プロバイダー作成用DTO（バリデーション済み）
/// * `now` - 作成日時（RFC3339形式）
///
/// # 戻り値
/// 作成されたプロバイダー。同名のプロバイダーが存在する場合はバリデーションエラー
pub fn create(conn: &Connection, dto: CreateProviderDto, now: &str) -> AppResult<Provider> {
    let name = dto.name.trim().to_string();

    conn.execute(
        "INSERT INTO providers (name, url, logo_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, dto.url, dto.logo_url, now, now],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.code == ErrorCode::ConstraintViolation =>
        {
            AppError::validation(format!("プロバイダー「{name}」は既に登録されています"))
        }
        _ => AppError::from(e),
    })?;

    let id = conn.last_insert_rowid();
    find_by_id(conn, id)
}

/// IDでプロバイダーを取得する
pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Provider> {
    conn.query_row(
        &format!("{SELECT_PROVIDER} WHERE id = ?1"),
        params![id],
        map_provider_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            AppError::not_found(format!("ID {id} のプロバイダー"))
        }
        _ => AppError::Database(e.to_string()),
    })
}

/// 名前でプロバイダーを取得する（完全一致）
pub fn find_by_name(conn: &Connection, name: &str) -> AppResult<Option<Provider>> {
    let provider = conn
        .query_row(
            &format!("{SELECT_PROVIDER} WHERE name = ?1"),
            params![name],
            map_provider_row,
        )
        .optional()?;

    Ok(provider)
}

/// プロバイダー一覧を名前順で取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `search` - 名前の部分一致検索（大文字小文字を区別しない）
pub fn find_all(conn: &Connection, search: Option<&str>) -> AppResult<Vec<Provider>> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(s)));

    let (query, args) = match pattern {
        Some(pattern) => (
            format!("{SELECT_PROVIDER} WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name"),
            vec![pattern],
        ),
        None => (format!("{SELECT_PROVIDER} ORDER BY name"), Vec::new()),
    };

    let mut stmt = conn.prepare(&query)?;
    let providers = stmt.query_map(params_from_iter(args.iter()), map_provider_row)?;

    providers
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))
}

/// LIKE句の特殊文字をエスケープする
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
