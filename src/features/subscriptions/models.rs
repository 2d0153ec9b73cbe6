use super::normalizer::{monthly_equivalent, yearly_equivalent};
use super::renewal::compute_next_renewal;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 請求サイクル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    /// 月額
    Monthly,
    /// 年額
    Yearly,
    /// 任意の日数ごと（custom_cycle_days）
    Custom,
}

impl BillingCycle {
    /// 保存時に使用する文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
            BillingCycle::Custom => "custom",
        }
    }

    /// 文字列から請求サイクルを解析する
    ///
    /// 前後の空白を無視し、大文字小文字を区別しない。
    /// 認識できない値や空文字列は`None`を返す（呼び出し側がフォールバックを決める）。
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" => Some(BillingCycle::Monthly),
            "yearly" => Some(BillingCycle::Yearly),
            "custom" => Some(BillingCycle::Custom),
            _ => None,
        }
    }
}

/// サブスクリプションデータモデル
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub provider_id: Option<i64>,
    pub provider_name: Option<String>, // providersテーブルから結合
    pub plan_name: String,             // 120文字以内、空文字列可
    #[serde(default)]
    pub price: Decimal, // 0以上、小数点以下2桁まで
    pub currency: String,       // 保存のみ、換算はしない
    pub billing_cycle: String,  // "monthly" / "yearly" / "custom"
    pub start_date: NaiveDate,
    #[serde(default)]
    pub custom_cycle_days: u32, // 0は未指定（30日として扱う）
    pub next_renewal_date: Option<NaiveDate>,
    pub auto_renew: bool,
    pub notes: String,
    pub created_at: String, // RFC3339形式
}

impl Subscription {
    /// 月額換算の金額（全精度）
    pub fn monthly_equivalent(&self) -> Decimal {
        monthly_equivalent(self.price, &self.billing_cycle, self.custom_cycle_days)
    }

    /// 年額換算の金額（全精度）
    pub fn yearly_equivalent(&self) -> Decimal {
        yearly_equivalent(self.price, &self.billing_cycle, self.custom_cycle_days)
    }

    /// 開始日と請求サイクルから次回更新日を計算する
    pub fn compute_next_renewal(&self) -> NaiveDate {
        compute_next_renewal(self.start_date, &self.billing_cycle, self.custom_cycle_days)
    }
}

/// サブスクリプション作成用DTO
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSubscriptionDto {
    pub provider_id: Option<i64>,
    #[serde(default)]
    pub plan_name: String,
    pub price: Decimal,
    pub currency: Option<String>, // 未指定の場合は"USD"
    pub billing_cycle: String,
    pub start_date: String, // YYYY-MM-DD形式
    pub custom_cycle_days: Option<u32>,
    pub next_renewal_date: Option<String>, // 未指定の場合は自動計算
    pub auto_renew: Option<bool>,
    pub notes: Option<String>,
}

/// サブスクリプション更新用DTO
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateSubscriptionDto {
    pub provider_id: Option<i64>,
    pub plan_name: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub billing_cycle: Option<String>,
    pub start_date: Option<String>,
    pub custom_cycle_days: Option<u32>,
    pub next_renewal_date: Option<String>,
    /// trueの場合、既存の次回更新日を破棄して再計算する
    #[serde(default)]
    pub recompute_renewal: bool,
    pub auto_renew: Option<bool>,
    pub notes: Option<String>,
}

/// バリデーション済みの新規サブスクリプション
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub provider_id: Option<i64>,
    pub plan_name: String,
    pub price: Decimal,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub start_date: NaiveDate,
    pub custom_cycle_days: u32,
    pub next_renewal_date: Option<NaiveDate>,
    pub auto_renew: bool,
    pub notes: String,
}

/// バリデーション済みの更新内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionChanges {
    pub provider_id: Option<i64>,
    pub plan_name: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
    pub start_date: Option<NaiveDate>,
    pub custom_cycle_days: Option<u32>,
    pub next_renewal_date: Option<NaiveDate>,
    pub recompute_renewal: bool,
    pub auto_renew: Option<bool>,
    pub notes: Option<String>,
}
