use super::models::{
    BillingCycle, CreateSubscriptionDto, NewSubscription, Subscription, SubscriptionChanges,
    UpdateSubscriptionDto,
};
use super::repository;
use super::summary::{parse_window_days, summarize, Summary};
use crate::features::providers;
use crate::shared::errors::{command_error, AppError, AppResult};
use crate::shared::utils::{
    validate_date, validate_price, validate_required_field, validate_text_length,
};
use crate::AppState;
use rusqlite::Connection;

/// 通貨未指定時の既定値
const DEFAULT_CURRENCY: &str = "USD";

/// サブスクリプションを作成する
///
/// # 引数
/// * `user_id` - ユーザーID（認証済みの呼び出し元から渡される）
/// * `dto` - サブスクリプション作成用DTO
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 作成されたサブスクリプション、または失敗時はエラーメッセージ
pub fn create_subscription(
    user_id: i64,
    dto: CreateSubscriptionDto,
    state: &AppState,
) -> Result<Subscription, String> {
    let db = state.lock_db().map_err(command_error("データベースロックの取得"))?;

    let new = validate_create_subscription_dto(&db, dto)
        .map_err(command_error("サブスクリプションの入力検証"))?;
    let now = state.config.now_rfc3339();

    let subscription = repository::create(&db, user_id, new, &now)
        .map_err(command_error("サブスクリプションの作成"))?;

    log::info!(
        "サブスクリプションを作成しました: id={}, user_id={user_id}, next_renewal_date={:?}",
        subscription.id,
        subscription.next_renewal_date
    );
    Ok(subscription)
}

/// サブスクリプション一覧を取得する
pub fn get_subscriptions(user_id: i64, state: &AppState) -> Result<Vec<Subscription>, String> {
    let db = state.lock_db().map_err(command_error("データベースロックの取得"))?;

    repository::find_all(&db, user_id).map_err(command_error("サブスクリプション一覧の取得"))
}

/// サブスクリプションを更新する
///
/// # 引数
/// * `user_id` - ユーザーID
/// * `id` - サブスクリプションID
/// * `dto` - サブスクリプション更新用DTO
/// * `state` - アプリケーション状態
pub fn update_subscription(
    user_id: i64,
    id: i64,
    dto: UpdateSubscriptionDto,
    state: &AppState,
) -> Result<Subscription, String> {
    let db = state.lock_db().map_err(command_error("データベースロックの取得"))?;

    let changes = validate_update_subscription_dto(&db, dto)
        .map_err(command_error("サブスクリプションの入力検証"))?;

    let subscription = repository::update(&db, id, user_id, changes)
        .map_err(command_error("サブスクリプションの更新"))?;

    log::info!("サブスクリプションを更新しました: id={id}, user_id={user_id}");
    Ok(subscription)
}

/// サブスクリプションを削除する
pub fn delete_subscription(user_id: i64, id: i64, state: &AppState) -> Result<(), String> {
    let db = state.lock_db().map_err(command_error("データベースロックの取得"))?;

    repository::delete(&db, id, user_id).map_err(command_error("サブスクリプションの削除"))?;

    log::info!("サブスクリプションを削除しました: id={id}, user_id={user_id}");
    Ok(())
}

/// ダッシュボード用の集計を取得する
///
/// # 引数
/// * `user_id` - ユーザーID
/// * `days` - 更新予定の対象日数（クエリ文字列のまま。不正な値は14日として扱う）
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 合計・更新予定・プロバイダー別内訳
pub fn get_dashboard_summary(
    user_id: i64,
    days: Option<String>,
    state: &AppState,
) -> Result<Summary, String> {
    let subscriptions = {
        let db = state.lock_db().map_err(command_error("データベースロックの取得"))?;
        repository::find_all(&db, user_id).map_err(command_error("ダッシュボード集計"))?
    };

    let window_days = parse_window_days(days.as_deref());
    // 1回の集計につき「今日」は1度だけ読み取る
    let today = state.config.today();

    log::debug!(
        "ダッシュボード集計: user_id={user_id}, subscriptions={}, window_days={window_days}, today={today}",
        subscriptions.len()
    );

    Ok(summarize(&subscriptions, window_days, today))
}

/// 請求サイクルのバリデーション
fn validate_billing_cycle(value: &str) -> AppResult<BillingCycle> {
    BillingCycle::parse(value).ok_or_else(|| {
        AppError::validation("支払いサイクルは'monthly'、'yearly'、'custom'のいずれかである必要があります")
    })
}

/// 通貨コードのバリデーション
fn validate_currency(value: &str) -> AppResult<String> {
    validate_required_field(value, "通貨")?;
    let currency = value.trim().to_uppercase();
    validate_text_length(&currency, 8, "通貨")?;
    Ok(currency)
}

/// 参照先のプロバイダーが存在するか確認する
fn validate_provider_exists(conn: &Connection, provider_id: i64) -> AppResult<()> {
    providers::repository::find_by_id(conn, provider_id)
        .map(|_| ())
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::validation(format!(
                "ID {provider_id} のプロバイダーは登録されていません"
            )),
            other => other,
        })
}

/// サブスクリプション作成DTOのバリデーション
///
/// # 戻り値
/// バリデーション済みのサブスクリプション、失敗時はバリデーションエラー
fn validate_create_subscription_dto(
    conn: &Connection,
    dto: CreateSubscriptionDto,
) -> AppResult<NewSubscription> {
    if let Some(provider_id) = dto.provider_id {
        validate_provider_exists(conn, provider_id)?;
    }

    validate_text_length(&dto.plan_name, 120, "プラン名")?;
    validate_price(dto.price)?;
    let billing_cycle = validate_billing_cycle(&dto.billing_cycle)?;
    let start_date = validate_date(&dto.start_date)?;
    let next_renewal_date = dto
        .next_renewal_date
        .as_deref()
        .map(validate_date)
        .transpose()?;
    let currency = validate_currency(dto.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))?;

    Ok(NewSubscription {
        provider_id: dto.provider_id,
        plan_name: dto.plan_name.trim().to_string(),
        price: dto.price,
        currency,
        billing_cycle,
        start_date,
        custom_cycle_days: dto.custom_cycle_days.unwrap_or(0),
        next_renewal_date,
        auto_renew: dto.auto_renew.unwrap_or(true),
        notes: dto.notes.unwrap_or_default(),
    })
}

/// サブスクリプション更新DTOのバリデーション
fn validate_update_subscription_dto(
    conn: &Connection,
    dto: UpdateSubscriptionDto,
) -> AppResult<SubscriptionChanges> {
    if let Some(provider_id) = dto.provider_id {
        validate_provider_exists(conn, provider_id)?;
    }

    if let Some(ref plan_name) = dto.plan_name {
        validate_text_length(plan_name, 120, "プラン名")?;
    }

    if let Some(price) = dto.price {
        validate_price(price)?;
    }

    let billing_cycle = dto
        .billing_cycle
        .as_deref()
        .map(validate_billing_cycle)
        .transpose()?;
    let start_date = dto.start_date.as_deref().map(validate_date).transpose()?;
    let next_renewal_date = dto
        .next_renewal_date
        .as_deref()
        .map(validate_date)
        .transpose()?;
    let currency = dto.currency.as_deref().map(validate_currency).transpose()?;

    Ok(SubscriptionChanges {
        provider_id: dto.provider_id,
        plan_name: dto.plan_name.map(|name| name.trim().to_string()),
        price: dto.price,
        currency,
        billing_cycle,
        start_date,
        custom_cycle_days: dto.custom_cycle_days,
        next_renewal_date,
        recompute_renewal: dto.recompute_renewal,
        auto_renew: dto.auto_renew,
        notes: dto.notes,
    })
}
