use serde::{Deserialize, Serialize};

/// 配信・メディアサービスのプロバイダー（例: Netflix, Spotify）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Provider {
    pub id: i64,
    pub name: String,     // 一意、100文字以内
    pub url: String,      // 空文字列可
    pub logo_url: String, // 空文字列可
    pub created_at: String,
    pub updated_at: String,
}

/// プロバイダー作成用DTO
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateProviderDto {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub logo_url: String,
}
