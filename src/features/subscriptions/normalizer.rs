//! 請求サイクルをまたいだ金額の正規化
//!
//! どの請求サイクルの価格も月額・年額換算に揃えて比較・合算できるようにする。
//! 計算は`Decimal`で行い、途中で丸めない。
//! 乗算が`Decimal`の範囲を超える場合は`Decimal::MAX`で飽和させる。

use super::models::BillingCycle;
use super::renewal::{parse_cycle, DEFAULT_CYCLE_DAYS};
use rust_decimal::Decimal;

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);
const DAYS_PER_MONTH: Decimal = Decimal::from_parts(30, 0, 0, false, 0);

/// 換算に使用する周期日数（0は30日）
fn effective_cycle_days(custom_days: u32) -> Decimal {
    if custom_days == 0 {
        Decimal::from(DEFAULT_CYCLE_DAYS)
    } else {
        Decimal::from(custom_days)
    }
}

/// 月額換算の金額を計算する
///
/// # 引数
/// * `price` - 価格
/// * `cycle` - 請求サイクル（大文字小文字を区別しない）
/// * `custom_days` - 周期日数（0は30日）
///
/// # 戻り値
/// - 価格が0以下: 0
/// - monthly: 価格そのまま
/// - yearly: 価格 / 12
/// - それ以外（custom・未知・空）: 価格 * 日数 / 30
pub fn monthly_equivalent(price: Decimal, cycle: &str, custom_days: u32) -> Decimal {
    if price <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    match parse_cycle(cycle) {
        Some(BillingCycle::Monthly) => price,
        Some(BillingCycle::Yearly) => price / MONTHS_PER_YEAR,
        _ => price.saturating_mul(effective_cycle_days(custom_days)) / DAYS_PER_MONTH,
    }
}

/// 年額換算の金額を計算する
///
/// # 戻り値
/// - 価格が0以下: 0
/// - monthly: 価格 * 12
/// - yearly: 価格そのまま
/// - それ以外: 価格 * 日数 * 12 / 30（30日の月を12回）
///
/// `Decimal::MAX`を超える結果はパニックせず上限に丸める。
pub fn yearly_equivalent(price: Decimal, cycle: &str, custom_days: u32) -> Decimal {
    if price <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    match parse_cycle(cycle) {
        Some(BillingCycle::Monthly) => price.saturating_mul(MONTHS_PER_YEAR),
        Some(BillingCycle::Yearly) => price,
        _ => {
            let yearly_days = effective_cycle_days(custom_days).saturating_mul(MONTHS_PER_YEAR);
            price.saturating_mul(yearly_days) / DAYS_PER_MONTH
        }
    }
}
