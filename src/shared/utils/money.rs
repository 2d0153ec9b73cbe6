//! 金額の表示用フォーマット
//!
//! 計算は常に`Decimal`の全精度で行い、丸めは表示（シリアライズ）時にのみ行う。

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serializer;

/// 表示時の小数点以下桁数
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// 金額を小数点以下2桁に四捨五入する（0.5は0から遠い方へ）
///
/// # 引数
/// * `value` - 全精度の金額
///
/// # 戻り値
/// スケールが常に2の金額（例: 9.5 -> 9.50）
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        // "-0.00"を出さない
        rounded.set_sign_positive(true);
    }
    rounded.rescale(MONEY_DECIMAL_PLACES);
    rounded
}

/// 金額を2桁の10進数文字列に変換する
pub fn format_money(value: Decimal) -> String {
    round_money(value).to_string()
}

/// serdeの`serialize_with`で使用する金額シリアライザ
pub fn serialize_money<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_money(*value))
}
