//! サービス定義

use regex::Regex;
use serde::{Deserialize, Serialize};

/// ユーザー定義サービス
///
/// JSON形式：
/// ```json
/// { "name": "orders", "port": 7602, "dbPort": 7603 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// サービス名（ソリューション内で一意）
    pub name: String,
    /// プロジェクトディレクトリ（プロジェクトルートからの相対パス。
    /// 省略時は `services/<name>`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// 公開ポート
    pub port: u16,
    /// データベースの公開ポート（データベースを持つサービスのみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_port: Option<u16>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            project: None,
            port,
            db_port: None,
        }
    }

    /// プロジェクトルートからの相対ディレクトリ
    pub fn project_dir(&self) -> String {
        self.project
            .clone()
            .unwrap_or_else(|| format!("services/{}", self.name))
    }

    pub fn has_database(&self) -> bool {
        self.db_port.is_some()
    }
}

/// ソリューション名・サービス名の検証
///
/// コンテナ名やKVキーにそのまま使うため、小文字英数字とハイフンに限定します。
pub fn is_valid_name(name: &str) -> bool {
    Regex::new(r"^[a-z][a-z0-9-]*$").unwrap().is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation() {
        assert!(is_valid_name("orders"));
        assert!(is_valid_name("order-history2"));
        assert!(!is_valid_name("Orders"));
        assert!(!is_valid_name("2orders"));
        assert!(!is_valid_name("orders_api"));
        assert!(!is_valid_name(""));
    }
}
