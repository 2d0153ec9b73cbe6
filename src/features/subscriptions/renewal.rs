//! 次回更新日の計算

use super::models::BillingCycle;
use chrono::{Days, NaiveDate};

/// 月額・未指定時の周期日数
pub const DEFAULT_CYCLE_DAYS: u32 = 30;

/// 年額の周期日数
pub const YEARLY_CYCLE_DAYS: u32 = 365;

/// 請求サイクル文字列を解析する
///
/// 認識できない値は`None`を返し、既定の周期で扱われることをdebugログに残す。
pub(crate) fn parse_cycle(billing_cycle: &str) -> Option<BillingCycle> {
    let cycle = BillingCycle::parse(billing_cycle);
    if cycle.is_none() {
        log::debug!("未知の請求サイクルです: {billing_cycle:?}。30日周期として扱います");
    }
    cycle
}

/// 請求サイクルの周期日数を取得する
///
/// # 規則
/// 1. monthly -> 30日
/// 2. yearly -> 365日
/// 3. custom かつ custom_cycle_days > 0 -> custom_cycle_days日
/// 4. それ以外（custom で0日、未知のサイクル）-> 30日
pub fn cycle_length_days(billing_cycle: &str, custom_cycle_days: u32) -> u32 {
    match parse_cycle(billing_cycle) {
        Some(BillingCycle::Monthly) => DEFAULT_CYCLE_DAYS,
        Some(BillingCycle::Yearly) => YEARLY_CYCLE_DAYS,
        Some(BillingCycle::Custom) if custom_cycle_days > 0 => custom_cycle_days,
        Some(BillingCycle::Custom) => {
            log::debug!("customの周期日数が未指定です。30日周期として扱います");
            DEFAULT_CYCLE_DAYS
        }
        None => DEFAULT_CYCLE_DAYS,
    }
}

/// 開始日から次回更新日を計算する
///
/// # 引数
/// * `start_date` - 開始日
/// * `billing_cycle` - 請求サイクル（大文字小文字を区別しない）
/// * `custom_cycle_days` - customの周期日数（0は未指定）
///
/// # 戻り値
/// 次回更新日。未知のサイクルでもエラーにせず30日後を返す。
/// 暦の上限を超える場合は`NaiveDate::MAX`に丸める。
pub fn compute_next_renewal(
    start_date: NaiveDate,
    billing_cycle: &str,
    custom_cycle_days: u32,
) -> NaiveDate {
    let days = cycle_length_days(billing_cycle, custom_cycle_days);
    start_date
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}
