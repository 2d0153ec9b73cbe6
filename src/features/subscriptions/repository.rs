use super::models::{NewSubscription, Subscription, SubscriptionChanges};
use super::renewal::compute_next_renewal;
use crate::shared::errors::{AppError, AppResult};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::str::FromStr;

const SELECT_SUBSCRIPTION: &str =
    "SELECT s.id, s.user_id, s.provider_id, p.name, s.plan_name, s.price, s.currency,
            s.billing_cycle, s.start_date, s.custom_cycle_days, s.next_renewal_date,
            s.auto_renew, s.notes, s.created_at
     FROM subscriptions s
     LEFT JOIN providers p ON p.id = s.provider_id";

fn map_subscription_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    let price: String = row.get(5)?;

    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        provider_id: row.get(2)?,
        provider_name: row.get(3)?,
        plan_name: row.get(4)?,
        price: parse_price(5, &price)?,
        currency: row.get(6)?,
        billing_cycle: row.get(7)?,
        start_date: row.get(8)?,
        custom_cycle_days: row.get(9)?,
        next_renewal_date: row.get(10)?,
        auto_renew: row.get::<_, i64>(11)? != 0,
        notes: row.get(12)?,
        created_at: row.get(13)?,
    })
}

/// TEXTで保存された金額を解析する
fn parse_price(index: usize, raw: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

/// 次回更新日が未設定なら計算して埋める
fn resolve_next_renewal(
    next_renewal_date: Option<NaiveDate>,
    start_date: NaiveDate,
    billing_cycle: &str,
    custom_cycle_days: u32,
) -> NaiveDate {
    next_renewal_date.unwrap_or_else(|| {
        let computed = compute_next_renewal(start_date, billing_cycle, custom_cycle_days);
        log::debug!(
            "次回更新日を計算しました: start={start_date}, cycle={billing_cycle}, days={custom_cycle_days} -> {computed}"
        );
        computed
    })
}

/// サブスクリプションを作成する
///
/// 次回更新日が指定されていない場合は開始日と請求サイクルから計算して保存する。
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - ユーザーID
/// * `new` - バリデーション済みのサブスクリプション
/// * `now` - 作成日時（RFC3339形式）
///
/// # 戻り値
/// 作成されたサブスクリプション、または失敗時はエラー
pub fn create(
    conn: &Connection,
    user_id: i64,
    new: NewSubscription,
    now: &str,
) -> AppResult<Subscription> {
    let billing_cycle = new.billing_cycle.as_str();
    let next_renewal_date = resolve_next_renewal(
        new.next_renewal_date,
        new.start_date,
        billing_cycle,
        new.custom_cycle_days,
    );

    conn.execute(
        "INSERT INTO subscriptions (user_id, provider_id, plan_name, price, currency, billing_cycle,
                                    start_date, custom_cycle_days, next_renewal_date, auto_renew,
                                    notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            user_id,
            new.provider_id,
            new.plan_name,
            new.price.to_string(),
            new.currency,
            billing_cycle,
            new.start_date,
            new.custom_cycle_days,
            next_renewal_date,
            new.auto_renew,
            new.notes,
            now
        ],
    )?;

    let id = conn.last_insert_rowid();
    find_by_id(conn, id, user_id)
}

/// IDでサブスクリプションを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - サブスクリプションID
/// * `user_id` - ユーザーID（他ユーザーのデータは見つからない扱い）
pub fn find_by_id(conn: &Connection, id: i64, user_id: i64) -> AppResult<Subscription> {
    conn.query_row(
        &format!("{SELECT_SUBSCRIPTION} WHERE s.id = ?1 AND s.user_id = ?2"),
        params![id, user_id],
        map_subscription_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            AppError::not_found(format!("ID {id} のサブスクリプション"))
        }
        _ => AppError::Database(e.to_string()),
    })
}

/// ユーザーのサブスクリプション一覧を取得する
///
/// 次回更新日、プロバイダー名の順で並べる（更新日未設定は先頭）。
pub fn find_all(conn: &Connection, user_id: i64) -> AppResult<Vec<Subscription>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_SUBSCRIPTION} WHERE s.user_id = ?1 ORDER BY s.next_renewal_date, p.name, s.id"
    ))?;
    let subscriptions = stmt.query_map([user_id], map_subscription_row)?;

    subscriptions
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))
}

/// サブスクリプションを更新する
///
/// 次回更新日は保存済みの値を維持する。`recompute_renewal`が指定された場合、
/// または値が未設定の場合のみ、更新後の開始日・請求サイクルから再計算する。
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - サブスクリプションID
/// * `user_id` - ユーザーID
/// * `changes` - バリデーション済みの更新内容
pub fn update(
    conn: &Connection,
    id: i64,
    user_id: i64,
    changes: SubscriptionChanges,
) -> AppResult<Subscription> {
    let existing = find_by_id(conn, id, user_id)?;

    let provider_id = changes.provider_id.or(existing.provider_id);
    let plan_name = changes.plan_name.unwrap_or(existing.plan_name);
    let price = changes.price.unwrap_or(existing.price);
    let currency = changes.currency.unwrap_or(existing.currency);
    let billing_cycle = changes
        .billing_cycle
        .map(|cycle| cycle.as_str().to_string())
        .unwrap_or(existing.billing_cycle);
    let start_date = changes.start_date.unwrap_or(existing.start_date);
    let custom_cycle_days = changes
        .custom_cycle_days
        .unwrap_or(existing.custom_cycle_days);
    let auto_renew = changes.auto_renew.unwrap_or(existing.auto_renew);
    let notes = changes.notes.unwrap_or(existing.notes);

    let kept_renewal = if changes.recompute_renewal {
        None
    } else {
        existing.next_renewal_date
    };
    let next_renewal_date = resolve_next_renewal(
        changes.next_renewal_date.or(kept_renewal),
        start_date,
        &billing_cycle,
        custom_cycle_days,
    );

    conn.execute(
        "UPDATE subscriptions
         SET provider_id = ?1, plan_name = ?2, price = ?3, currency = ?4, billing_cycle = ?5,
             start_date = ?6, custom_cycle_days = ?7, next_renewal_date = ?8, auto_renew = ?9,
             notes = ?10
         WHERE id = ?11 AND user_id = ?12",
        params![
            provider_id,
            plan_name,
            price.to_string(),
            currency,
            billing_cycle,
            start_date,
            custom_cycle_days,
            next_renewal_date,
            auto_renew,
            notes,
            id,
            user_id
        ],
    )?;

    find_by_id(conn, id, user_id)
}

/// サブスクリプションを削除する
pub fn delete(conn: &Connection, id: i64, user_id: i64) -> AppResult<()> {
    let rows_affected = conn.execute(
        "DELETE FROM subscriptions WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;

    if rows_affected == 0 {
        return Err(AppError::not_found(format!("ID {id} のサブスクリプション")));
    }

    Ok(())
}

/// 次回更新日が未設定のサブスクリプションに計算済みの値を埋める
///
/// インポートなどで更新日が空のまま保存された行を対象にする。
/// 既に設定されている更新日は変更しない。
///
/// # 戻り値
/// 更新した件数
pub fn fill_missing_renewal_dates(conn: &Connection) -> AppResult<usize> {
    let pending: Vec<(i64, NaiveDate, String, u32)> = {
        let mut stmt = conn.prepare(
            "SELECT id, start_date, billing_cycle, custom_cycle_days
             FROM subscriptions WHERE next_renewal_date IS NULL",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, NaiveDate>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
            ))
        })?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    let tx = conn.unchecked_transaction()?;
    for (id, start_date, billing_cycle, custom_cycle_days) in &pending {
        let next_renewal_date =
            compute_next_renewal(*start_date, billing_cycle, *custom_cycle_days);
        tx.execute(
            "UPDATE subscriptions SET next_renewal_date = ?1 WHERE id = ?2",
            params![next_renewal_date, id],
        )?;
    }
    tx.commit()?;

    if !pending.is_empty() {
        log::info!("次回更新日を{}件補完しました", pending.len());
    }

    Ok(pending.len())
}
