//! イメージバージョンタグ
//!
//! 1回のビルドに参加する全デプロイ単位は同じタイムスタンプ版タグを共有します。

use chrono::{DateTime, Local};

/// タイムスタンプからバージョンタグを作る（yyyy.MM.dd.HHmmss 形式）
pub fn version_tag(now: DateTime<Local>) -> String {
    now.format("%Y.%m.%d.%H%M%S").to_string()
}

/// 現在時刻で新しいバージョンタグを発行する
pub fn current_version_tag() -> String {
    version_tag(Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn tag_format_is_dotted_timestamp() {
        let now = Local.with_ymd_and_hms(2025, 8, 25, 14, 30, 5).unwrap();
        assert_eq!(version_tag(now), "2025.08.25.143005");
    }

    #[test]
    fn current_tag_parses_back() {
        let tag = current_version_tag();
        assert_eq!(tag.len(), "yyyy.MM.dd.HHmmss".len());
        assert!(chrono::NaiveDateTime::parse_from_str(&tag, "%Y.%m.%d.%H%M%S").is_ok());
    }
}
