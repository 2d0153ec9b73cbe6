use crate::shared::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

pub mod money;

pub use money::{format_money, round_money, serialize_money};

/// 金額の上限（10桁以内）
const MAX_PRICE_EXCLUSIVE: i64 = 10_000_000_000;

/// 日付文字列のバリデーション
///
/// # 引数
/// * `date_str` - 日付文字列（YYYY-MM-DD形式）
///
/// # 戻り値
/// 解析済みの日付、無効な場合はエラー
///
/// # バリデーション規則
/// - YYYY-MM-DD形式であること
/// - 実在する日付であること
/// - 1900年以降、2100年以前であること
pub fn validate_date(date_str: &str) -> AppResult<NaiveDate> {
    if date_str.len() != 10 {
        return Err(AppError::validation(
            "日付はYYYY-MM-DD形式で入力してください",
        ));
    }

    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| AppError::validation("無効な日付です"))?;

    if !(1900..=2100).contains(&date.year()) {
        return Err(AppError::validation(
            "日付は1900年から2100年の間で入力してください",
        ));
    }

    Ok(date)
}

/// 価格のバリデーション
///
/// # バリデーション規則
/// - 0以上であること
/// - 10桁以内であること
/// - 小数点以下は2桁まで
pub fn validate_price(price: Decimal) -> AppResult<()> {
    if price < Decimal::ZERO {
        return Err(AppError::validation("価格は0以上で入力してください"));
    }

    if price >= Decimal::from(MAX_PRICE_EXCLUSIVE) {
        return Err(AppError::validation("価格は10桁以内で入力してください"));
    }

    if price.normalize().scale() > 2 {
        return Err(AppError::validation(
            "価格は小数点以下2桁まで入力してください",
        ));
    }

    Ok(())
}

/// 文字列の長さバリデーション
///
/// # 引数
/// * `text` - 検証対象の文字列
/// * `max_length` - 最大文字数
/// * `field_name` - フィールド名（エラーメッセージ用）
pub fn validate_text_length(text: &str, max_length: usize, field_name: &str) -> AppResult<()> {
    let char_count = text.chars().count();
    if char_count > max_length {
        return Err(AppError::validation(format!(
            "{field_name}は{max_length}文字以内で入力してください（現在: {char_count}文字）"
        )));
    }
    Ok(())
}

/// 必須フィールドのバリデーション
pub fn validate_required_field(text: &str, field_name: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::validation(format!("{field_name}は必須項目です")));
    }
    Ok(())
}
