//! ビルド対象の解決
//!
//! ソリューション設定からデプロイ単位（フロントエンド・ゲートウェイ・
//! ダッシュボード・各サービス）のイメージ計画を作ります。

use nexus_core::{SolutionConfig, SolutionLayout};
use std::path::PathBuf;

/// デプロイ単位1つ分のイメージ計画
#[derive(Debug, Clone)]
pub struct ImageSpec {
    /// イメージのベース名（= デプロイ単位名）
    pub unit: String,
    /// ビルドコンテキスト
    pub context: PathBuf,
}

impl ImageSpec {
    pub fn new(unit: impl Into<String>, context: impl Into<PathBuf>) -> Self {
        Self {
            unit: unit.into(),
            context: context.into(),
        }
    }

    /// ローカル参照（latest とバージョン付き）
    pub fn local_tags(&self, version: &str) -> Vec<String> {
        vec![
            format!("{}:latest", self.unit),
            format!("{}:{version}", self.unit),
        ]
    }

    /// リポジトリ配下の参照
    pub fn remote_tags(&self, repository: &str, version: &str) -> Vec<String> {
        vec![
            format!("{repository}/{}:latest", self.unit),
            format!("{repository}/{}:{version}", self.unit),
        ]
    }

    /// ビルド時に一括で付与するタグ
    ///
    /// リポジトリ未設定の場合はローカル参照のみです。
    pub fn all_tags(&self, repository: &str, version: &str) -> Vec<String> {
        let mut tags = self.local_tags(version);
        if !repository.is_empty() {
            tags.extend(self.remote_tags(repository, version));
        }
        tags
    }

    /// 公開対象の参照（バージョン付き → latest の順）
    pub fn push_refs(&self, repository: &str, version: &str) -> Vec<String> {
        vec![
            format!("{repository}/{}:{version}", self.unit),
            format!("{repository}/{}:latest", self.unit),
        ]
    }
}

/// ビルド順のデプロイ単位一覧
///
/// フロントエンド → ゲートウェイ → ダッシュボード → 各サービス（設定順）。
pub fn image_plan(config: &SolutionConfig, layout: &SolutionLayout) -> Vec<ImageSpec> {
    let mut plan = vec![
        ImageSpec::new(&config.framework.frontend.name, layout.frontend_dir()),
        ImageSpec::new(&config.framework.gateway.name, layout.gateway_dir()),
        ImageSpec::new(&config.framework.dashboard.name, layout.dashboard_dir()),
    ];
    for service in &config.services {
        plan.push(ImageSpec::new(
            &service.name,
            layout.service_dir(&service.project_dir()),
        ));
    }
    plan
}
