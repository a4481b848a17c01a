use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// ビルド中のスピナー表示
pub struct BuildProgress {
    progress_bar: ProgressBar,
}

impl BuildProgress {
    pub fn new(unit: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} [{elapsed_precise}]")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("{unit} をビルド中..."));
        Self { progress_bar: pb }
    }

    pub fn finish_success(&self) {
        self.progress_bar.finish_with_message("ビルド完了 ✓");
    }

    pub fn finish_error(&self, error: &str) {
        self.progress_bar
            .finish_with_message(format!("ビルド失敗: {error}"));
    }
}
