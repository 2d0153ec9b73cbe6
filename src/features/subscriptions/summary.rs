//! ダッシュボード用の集計
//!
//! ユーザーのサブスクリプション一覧から、合計金額・直近の更新予定・
//! プロバイダー別の内訳を作成する。入力と`today`だけに依存する純粋な処理。

use super::models::Subscription;
use crate::shared::utils::serialize_money;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// 更新予定の既定の対象期間（日）
pub const DEFAULT_WINDOW_DAYS: i64 = 14;

/// 更新予定一覧の最大件数
pub const UPCOMING_LIMIT: usize = 20;

/// プロバイダー未設定のサブスクリプションをまとめるキー
pub const UNKNOWN_PROVIDER: &str = "Unknown";

/// 集計結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub totals: Totals,
    pub upcoming: Vec<UpcomingRenewal>,
    pub by_provider: Vec<ProviderRollup>,
}

/// 合計金額
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    #[serde(serialize_with = "serialize_money")]
    pub monthly: Decimal,
    #[serde(serialize_with = "serialize_money")]
    pub yearly: Decimal,
    pub count: usize,
}

/// 更新予定の1件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingRenewal {
    pub id: i64,
    pub provider_name: Option<String>,
    pub plan_name: String,
    pub next_renewal_date: NaiveDate,
    #[serde(serialize_with = "serialize_money")]
    pub price: Decimal,
    pub currency: String,
    pub auto_renew: bool,
}

/// プロバイダー別の内訳
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRollup {
    pub provider: String,
    pub count: usize,
    #[serde(serialize_with = "serialize_money")]
    pub monthly: Decimal,
}

/// `days`パラメータを対象期間（日数）に変換する
///
/// 未指定・数値でない値はエラーにせず既定の14日を返す。
pub fn parse_window_days(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return DEFAULT_WINDOW_DAYS;
    };

    raw.trim().parse::<i64>().unwrap_or_else(|_| {
        log::debug!("daysパラメータを解析できません: {raw:?}。既定値{DEFAULT_WINDOW_DAYS}日を使用します");
        DEFAULT_WINDOW_DAYS
    })
}

/// サブスクリプション一覧を集計する
///
/// # 引数
/// * `subscriptions` - 集計対象（ユーザーで絞り込み済み）
/// * `window_days` - 更新予定の対象期間（今日から何日後まで含めるか）
/// * `today` - 基準日（呼び出しごとに1度だけ読み取った値）
///
/// # 戻り値
/// 合計・更新予定（日付昇順、最大20件）・プロバイダー別内訳（名前の大文字小文字を無視した昇順）
pub fn summarize(subscriptions: &[Subscription], window_days: i64, today: NaiveDate) -> Summary {
    let summary = Summary {
        totals: compute_totals(subscriptions),
        upcoming: collect_upcoming(subscriptions, window_end(today, window_days)),
        by_provider: rollup_by_provider(subscriptions),
    };

    log::debug!(
        "集計完了: count={}, upcoming={}, providers={}, window_days={window_days}",
        summary.totals.count,
        summary.upcoming.len(),
        summary.by_provider.len()
    );

    summary
}

/// 対象期間の終了日（暦の範囲外になる場合は端に丸める）
fn window_end(today: NaiveDate, window_days: i64) -> NaiveDate {
    let days = Days::new(window_days.unsigned_abs());
    if window_days >= 0 {
        today.checked_add_days(days).unwrap_or(NaiveDate::MAX)
    } else {
        today.checked_sub_days(days).unwrap_or(NaiveDate::MIN)
    }
}

fn compute_totals(subscriptions: &[Subscription]) -> Totals {
    let (monthly, yearly) = subscriptions.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(monthly, yearly), sub| {
            (
                monthly.saturating_add(sub.monthly_equivalent()),
                yearly.saturating_add(sub.yearly_equivalent()),
            )
        },
    );

    Totals {
        monthly,
        yearly,
        count: subscriptions.len(),
    }
}

fn collect_upcoming(subscriptions: &[Subscription], until: NaiveDate) -> Vec<UpcomingRenewal> {
    let mut due: Vec<(&Subscription, NaiveDate)> = subscriptions
        .iter()
        .filter_map(|sub| {
            sub.next_renewal_date
                .filter(|date| *date <= until)
                .map(|date| (sub, date))
        })
        .collect();

    // 同日の場合はプロバイダー名、IDの順
    due.sort_by(|(a, a_date), (b, b_date)| {
        a_date
            .cmp(b_date)
            .then_with(|| a.provider_name.cmp(&b.provider_name))
            .then_with(|| a.id.cmp(&b.id))
    });

    due.into_iter()
        .take(UPCOMING_LIMIT)
        .map(|(sub, date)| UpcomingRenewal {
            id: sub.id,
            provider_name: sub.provider_name.clone(),
            plan_name: sub.plan_name.clone(),
            next_renewal_date: date,
            price: sub.price,
            currency: sub.currency.clone(),
            auto_renew: sub.auto_renew,
        })
        .collect()
}

fn rollup_by_provider(subscriptions: &[Subscription]) -> Vec<ProviderRollup> {
    // グループ化は名前の完全一致（"Netflix"と"netflix"は別グループ）
    let mut groups: BTreeMap<&str, (usize, Decimal)> = BTreeMap::new();
    for sub in subscriptions {
        let key = sub.provider_name.as_deref().unwrap_or(UNKNOWN_PROVIDER);
        let entry = groups.entry(key).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(sub.monthly_equivalent());
    }

    let mut rollups: Vec<ProviderRollup> = groups
        .into_iter()
        .map(|(provider, (count, monthly))| ProviderRollup {
            provider: provider.to_string(),
            count,
            monthly,
        })
        .collect();

    rollups.sort_by(|a, b| compare_provider_names(&a.provider, &b.provider));
    rollups
}

/// 大文字小文字を無視して比較し、同一の場合は元の文字列で比較する
fn compare_provider_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn subscription(
        id: i64,
        provider: Option<&str>,
        price: &str,
        cycle: &str,
        next_renewal_date: Option<NaiveDate>,
    ) -> Subscription {
        Subscription {
            id,
            user_id: 1,
            provider_id: provider.map(|_| id),
            provider_name: provider.map(str::to_string),
            plan_name: "Standard".to_string(),
            price: dec(price),
            currency: "USD".to_string(),
            billing_cycle: cycle.to_string(),
            start_date: date(2024, 6, 1),
            custom_cycle_days: 0,
            next_renewal_date,
            auto_renew: true,
            notes: String::new(),
            created_at: "2024-06-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_parse_window_days() {
        assert_eq!(parse_window_days(None), 14);
        assert_eq!(parse_window_days(Some("abc")), 14);
        assert_eq!(parse_window_days(Some("")), 14);
        assert_eq!(parse_window_days(Some("7.5")), 14);
        assert_eq!(parse_window_days(Some("30")), 30);
        assert_eq!(parse_window_days(Some(" 7 ")), 7);
        assert_eq!(parse_window_days(Some("0")), 0);
        assert_eq!(parse_window_days(Some("-3")), -3);
    }

    #[test]
    fn test_empty_input() {
        let summary = summarize(&[], 14, date(2024, 6, 20));

        assert_eq!(summary.totals.monthly, Decimal::ZERO);
        assert_eq!(summary.totals.yearly, Decimal::ZERO);
        assert_eq!(summary.totals.count, 0);
        assert!(summary.upcoming.is_empty());
        assert!(summary.by_provider.is_empty());

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            json!({
                "totals": {"monthly": "0.00", "yearly": "0.00", "count": 0},
                "upcoming": [],
                "by_provider": []
            })
        );
    }

    #[test]
    fn test_response_contract() {
        let subscriptions = vec![subscription(
            1,
            Some("Netflix"),
            "15.99",
            "monthly",
            Some(date(2024, 7, 1)),
        )];

        let summary = summarize(&subscriptions, 14, date(2024, 6, 20));
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(
            value,
            json!({
                "totals": {"monthly": "15.99", "yearly": "191.88", "count": 1},
                "upcoming": [{
                    "id": 1,
                    "provider_name": "Netflix",
                    "plan_name": "Standard",
                    "next_renewal_date": "2024-07-01",
                    "price": "15.99",
                    "currency": "USD",
                    "auto_renew": true
                }],
                "by_provider": [{"provider": "Netflix", "count": 1, "monthly": "15.99"}]
            })
        );
    }

    #[test]
    fn test_totals_mix_cycles_and_zero_price() {
        let subscriptions = vec![
            subscription(1, Some("Netflix"), "9.99", "monthly", None),
            subscription(2, Some("Spotify"), "119.88", "yearly", None),
            // 価格0も件数には含める
            subscription(3, Some("Trial"), "0", "monthly", None),
        ];

        let summary = summarize(&subscriptions, 14, date(2024, 6, 20));

        assert_eq!(summary.totals.count, 3);
        assert_eq!(summary.totals.monthly, dec("19.98"));
        assert_eq!(summary.totals.yearly, dec("239.76"));
    }

    #[test]
    fn test_totals_round_only_at_presentation() {
        // 0.8325 * 3 = 2.4975 -> "2.50"（個別に丸めると 0.83 * 3 = 2.49）
        let subscriptions: Vec<Subscription> = (1..=3)
            .map(|id| subscription(id, Some("Yearly Co"), "9.99", "yearly", None))
            .collect();

        let summary = summarize(&subscriptions, 14, date(2024, 6, 20));
        let value = serde_json::to_value(&summary.totals).unwrap();

        assert_eq!(summary.totals.monthly, dec("2.4975"));
        assert_eq!(value["monthly"], "2.50");
        assert_eq!(value["yearly"], "29.97");
    }

    #[test]
    fn test_upcoming_window_filter() {
        let today = date(2024, 6, 20);
        let subscriptions = vec![
            subscription(1, Some("Past"), "1.00", "monthly", Some(date(2024, 6, 1))),
            subscription(2, Some("Edge"), "1.00", "monthly", Some(date(2024, 7, 4))),
            subscription(3, Some("Later"), "1.00", "monthly", Some(date(2024, 7, 5))),
            subscription(4, Some("NoDate"), "1.00", "monthly", None),
        ];

        let summary = summarize(&subscriptions, 14, today);
        let ids: Vec<i64> = summary.upcoming.iter().map(|u| u.id).collect();

        // 期限切れの更新日も含み、境界日（今日+14日）も含む
        assert_eq!(ids, vec![1, 2]);

        let summary = summarize(&subscriptions, 0, today);
        assert_eq!(summary.upcoming.len(), 1);
    }

    #[test]
    fn test_upcoming_sorted_and_capped() {
        let today = date(2024, 6, 1);
        let subscriptions: Vec<Subscription> = (0..100)
            .map(|i| {
                let renewal = today + Days::new(((i * 37) % 10) as u64);
                subscription(i, Some("Bulk"), "1.00", "monthly", Some(renewal))
            })
            .collect();

        let summary = summarize(&subscriptions, 14, today);

        assert_eq!(summary.upcoming.len(), UPCOMING_LIMIT);
        assert!(summary
            .upcoming
            .windows(2)
            .all(|pair| pair[0].next_renewal_date <= pair[1].next_renewal_date));
        assert_eq!(summary.upcoming[0].next_renewal_date, today);
        // 集計は上限に関係なく全件
        assert_eq!(summary.totals.count, 100);
    }

    #[test]
    fn test_upcoming_ties_ordered_by_provider_then_id() {
        let renewal = Some(date(2024, 6, 5));
        let subscriptions = vec![
            subscription(3, Some("Spotify"), "1.00", "monthly", renewal),
            subscription(2, Some("Netflix"), "1.00", "monthly", renewal),
            subscription(1, Some("Spotify"), "1.00", "monthly", renewal),
        ];

        let summary = summarize(&subscriptions, 14, date(2024, 6, 1));
        let ids: Vec<i64> = summary.upcoming.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_upcoming_missing_provider_serializes_null() {
        let subscriptions = vec![subscription(
            9,
            None,
            "4.50",
            "monthly",
            Some(date(2024, 6, 2)),
        )];

        let summary = summarize(&subscriptions, 14, date(2024, 6, 1));
        let value = serde_json::to_value(&summary.upcoming[0]).unwrap();
        assert!(value["provider_name"].is_null());
        assert_eq!(value["price"], "4.50");
    }

    #[test]
    fn test_by_provider_groups_exact_names() {
        let subscriptions = vec![
            subscription(1, Some("netflix"), "10.00", "monthly", None),
            subscription(2, Some("Netflix"), "15.99", "monthly", None),
            subscription(3, Some("Apple"), "120.00", "yearly", None),
            subscription(4, None, "3.00", "monthly", None),
            subscription(5, Some("Netflix"), "6.00", "monthly", None),
            subscription(6, Some("zulu"), "1.00", "monthly", None),
        ];

        let summary = summarize(&subscriptions, 14, date(2024, 6, 1));
        let rollup: Vec<(&str, usize, Decimal)> = summary
            .by_provider
            .iter()
            .map(|r| (r.provider.as_str(), r.count, r.monthly))
            .collect();

        assert_eq!(
            rollup,
            vec![
                ("Apple", 1, dec("10")),
                ("Netflix", 2, dec("21.99")),
                ("netflix", 1, dec("10")),
                ("Unknown", 1, dec("3")),
                ("zulu", 1, dec("1")),
            ]
        );
    }

    #[test]
    fn test_window_end_saturates() {
        assert_eq!(window_end(date(2024, 1, 1), i64::MAX), NaiveDate::MAX);
        assert_eq!(window_end(date(2024, 1, 1), i64::MIN), NaiveDate::MIN);
        assert_eq!(window_end(date(2024, 1, 1), -1), date(2023, 12, 31));
    }

    #[test]
    fn test_totals_saturate_for_huge_prices() {
        let mut first = subscription(1, Some("Big"), "0", "monthly", None);
        first.price = Decimal::MAX;
        let mut second = subscription(2, Some("Big"), "0", "monthly", None);
        second.price = Decimal::MAX;

        let summary = summarize(&[first, second], 14, date(2024, 1, 1));

        assert_eq!(summary.totals.monthly, Decimal::MAX);
        assert_eq!(summary.totals.yearly, Decimal::MAX);
        assert_eq!(summary.by_provider[0].monthly, Decimal::MAX);
    }

    #[quickcheck]
    fn prop_totals_match_item_sums(items: Vec<(u32, u8, u16)>) -> bool {
        let cycles = ["monthly", "yearly", "custom", "other"];
        let subscriptions: Vec<Subscription> = items
            .iter()
            .enumerate()
            .map(|(i, (cents, cycle, days))| {
                let cycle = cycles[*cycle as usize % 4];
                let mut sub = subscription(i as i64, Some("P"), "0", cycle, None);
                sub.price = Decimal::new(i64::from(*cents), 2);
                sub.custom_cycle_days = u32::from(*days);
                sub
            })
            .collect();

        let summary = summarize(&subscriptions, 14, date(2024, 6, 1));
        let monthly: Decimal = subscriptions.iter().map(Subscription::monthly_equivalent).sum();
        let yearly: Decimal = subscriptions.iter().map(Subscription::yearly_equivalent).sum();

        summary.totals.count == subscriptions.len()
            && summary.totals.monthly == monthly
            && summary.totals.yearly == yearly
    }

    #[quickcheck]
    fn prop_upcoming_sorted_and_bounded(offsets: Vec<u8>, window: u8) -> bool {
        let today = date(2024, 6, 1);
        let subscriptions: Vec<Subscription> = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| {
                let renewal = today + Days::new(u64::from(*offset));
                subscription(i as i64, Some("P"), "1.00", "monthly", Some(renewal))
            })
            .collect();

        let summary = summarize(&subscriptions, i64::from(window), today);
        let until = today + Days::new(u64::from(window));

        summary.upcoming.len() <= UPCOMING_LIMIT
            && summary.upcoming.iter().all(|u| u.next_renewal_date <= until)
            && summary
                .upcoming
                .windows(2)
                .all(|pair| pair[0].next_renewal_date <= pair[1].next_renewal_date)
    }
}
