/// サブスクリプション機能モジュール
///
/// このモジュールは、サブスクリプション管理に関連するすべての機能を提供します：
/// - 次回更新日の計算（renewal）
/// - 請求サイクルをまたいだ月額・年額換算（normalizer）
/// - ダッシュボード用の集計（summary）
/// - サブスクリプションの作成、読み取り、更新、削除
pub mod commands;
pub mod models;
pub mod normalizer;
pub mod renewal;
pub mod repository;
pub mod summary;

// 公開インターフェース
pub use commands::{
    create_subscription, delete_subscription, get_dashboard_summary, get_subscriptions,
    update_subscription,
};

pub use models::{BillingCycle, CreateSubscriptionDto, Subscription, UpdateSubscriptionDto};

pub use normalizer::{monthly_equivalent, yearly_equivalent};
pub use renewal::compute_next_renewal;
pub use summary::{parse_window_days, summarize, ProviderRollup, Summary, Totals, UpcomingRenewal};
