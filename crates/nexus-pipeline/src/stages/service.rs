//! サービスプロビジョニングステージ
//!
//! ポリシー作成 → トークン作成 → アプリ設定更新 → ローカル設定更新 →
//! 起動の5フェーズを固定順で実行します。前半2フェーズの失敗は
//! ハード失敗、後半の設定ファイル欠落はソフトエラーとして続行します。
//! ポリシーの結果は成否にかかわらず実行状態へ記録します。

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;

use nexus_consul::AccessControl;

use crate::patch;
use crate::pipeline::Stage;
use crate::platform::{ServicePlatform, ServiceSpec};
use crate::state::{PolicyOutcome, RunState};

/// アプリ設定内のディスカバリトークンのパス
const CONFIG_TOKEN_PATH: &[&str] = &["discovery", "token"];
const CONFIG_DB_HOST_PATH: &[&str] = &["database", "host"];
const CONFIG_DB_PORT_PATH: &[&str] = &["database", "port"];

pub struct ServiceStage {
    spec: ServiceSpec,
    platform: Arc<dyn ServicePlatform>,
    acl: Arc<dyn AccessControl>,
    display_name: String,
}

impl ServiceStage {
    pub fn new(
        spec: ServiceSpec,
        platform: Arc<dyn ServicePlatform>,
        acl: Arc<dyn AccessControl>,
    ) -> Self {
        let display_name = format!("service {}", spec.name);
        Self {
            spec,
            platform,
            acl,
            display_name,
        }
    }

    /// フェーズ1: ACLポリシー作成
    async fn create_policy(&self, state: &mut RunState) -> PolicyOutcome {
        let path = self.spec.policy_file();
        if !path.exists() {
            if self.platform.requires_policy_artifact() {
                return PolicyOutcome::Failed {
                    reason: format!("ポリシー定義がありません: {}", path.display()),
                };
            }
            state.log(format!(
                "{}: ポリシー定義が無いため作成をスキップ",
                self.spec.name
            ));
            return PolicyOutcome::NotAttempted;
        }
        let rules = match std::fs::read_to_string(&path) {
            Ok(rules) => rules,
            Err(e) => {
                return PolicyOutcome::Failed {
                    reason: format!("ポリシー定義を読めません: {e}"),
                };
            }
        };
        match self
            .acl
            .create_policy(&state.global_token, &self.spec.name, &rules)
            .await
        {
            Ok(created) => PolicyOutcome::Created { name: created.name },
            Err(e) => PolicyOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// フェーズ3: アプリ設定へトークンとDB接続先を書き込み、KVへ上げる
    ///
    /// 設定ファイルが無ければソフトエラー。読み書きや構文の失敗は
    /// 呼び出し側でハード失敗になります。
    async fn update_app_config(&self, state: &mut RunState, token: &str) -> anyhow::Result<()> {
        let path = self.spec.app_config_file();
        if !path.exists() {
            state.soft_error(format!(
                "{}: アプリ設定がありません: {}",
                self.spec.name,
                path.display()
            ));
            return Ok(());
        }
        let blob = self.patch_config(&path, token)?;
        self.acl
            .kv_put(&state.global_token, &self.spec.name, &blob)
            .await?;
        println!("  {} KVキー: {}", "✓".green(), self.spec.name.cyan());
        state.log(format!("{}: app config uploaded", self.spec.name));
        Ok(())
    }

    fn patch_config(&self, path: &Path, token: &str) -> anyhow::Result<String> {
        let content = std::fs::read_to_string(path)?;
        let mut value: serde_json::Value = serde_json::from_str(&content)?;
        patch::set_string(&mut value, CONFIG_TOKEN_PATH, token)?;
        if let Some((host, port)) = self.platform.database_endpoint(&self.spec) {
            patch::set_string(&mut value, CONFIG_DB_HOST_PATH, &host)?;
            patch::set_number(&mut value, CONFIG_DB_PORT_PATH, u64::from(port))?;
        }
        let blob = serde_json::to_string_pretty(&value)?;
        std::fs::write(path, format!("{blob}\n"))?;
        Ok(blob)
    }

    /// フェーズ4: ローカル実行用設定へ同じトークンを書き込む
    fn update_app_settings(&self, state: &mut RunState, token: &str) -> anyhow::Result<()> {
        let path = self.spec.app_settings_file();
        if !path.exists() {
            state.soft_error(format!(
                "{}: ローカル設定がありません: {}",
                self.spec.name,
                path.display()
            ));
            return Ok(());
        }
        let content = std::fs::read_to_string(&path)?;
        let mut value: serde_json::Value = serde_json::from_str(&content)?;
        patch::set_string(&mut value, CONFIG_TOKEN_PATH, token)?;
        std::fs::write(&path, format!("{}\n", serde_json::to_string_pretty(&value)?))?;
        state.log(format!("{}: local settings updated", self.spec.name));
        Ok(())
    }
}

#[async_trait]
impl Stage for ServiceStage {
    fn name(&self) -> &str {
        &self.display_name
    }

    async fn execute(&self, mut state: RunState) -> RunState {
        let name = self.spec.name.clone();

        println!("  ポリシーを作成中...");
        let outcome = self.create_policy(&mut state).await;
        state.policies.insert(name.clone(), outcome.clone());
        let policy_name = match outcome {
            PolicyOutcome::Created { name: policy } => {
                println!("  {} ポリシー: {}", "✓".green(), policy.cyan());
                policy
            }
            PolicyOutcome::NotAttempted => {
                state.fail(format!(
                    "サービス '{name}' にポリシーが無いためトークンを作成できません"
                ));
                return state;
            }
            PolicyOutcome::Failed { reason } => {
                state.fail(format!(
                    "サービス '{name}' のポリシー作成に失敗しました: {reason}"
                ));
                return state;
            }
        };

        println!("  トークンを作成中...");
        let token = match self
            .platform
            .create_token(&state.global_token, &self.spec, &policy_name)
            .await
        {
            Ok(token) if !token.trim().is_empty() => token,
            Ok(_) => {
                state.fail(format!("サービス '{name}' のトークンが空です"));
                return state;
            }
            Err(e) => {
                state.fail(format!(
                    "サービス '{name}' のトークン作成に失敗しました: {e:#}"
                ));
                return state;
            }
        };
        state.service_tokens.insert(name.clone(), token.clone());

        if let Err(e) = self.update_app_config(&mut state, &token).await {
            state.fail(format!(
                "サービス '{name}' のアプリ設定更新に失敗しました: {e:#}"
            ));
            return state;
        }

        if let Err(e) = self.update_app_settings(&mut state, &token) {
            state.fail(format!(
                "サービス '{name}' のローカル設定更新に失敗しました: {e:#}"
            ));
            return state;
        }

        println!("  サービスを起動中...");
        match self.platform.run_service(&self.spec).await {
            Ok(url) => {
                println!("  {} {}", "✓".green(), url.cyan());
                state.service_urls.insert(name, url);
            }
            Err(e) => {
                state.fail(format!("サービス '{name}' の起動に失敗しました: {e:#}"));
            }
        }
        state
    }
}
