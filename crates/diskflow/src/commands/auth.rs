use crate::job::Job;
use colored::Colorize;

pub async fn handle(job: &Job) -> anyhow::Result<()> {
    let adapter = job.orchestrator.adapter();
    job.say(format!("{} の認証状態を確認中...", adapter.name()).blue());

    let status = adapter.check_auth().await?;
    if status.authenticated {
        job.done(format!(
            "認証済み: {}",
            status.account_info.unwrap_or_default()
        ));
        Ok(())
    } else {
        anyhow::bail!(
            "認証されていません: {}",
            status.error.unwrap_or_else(|| "不明なエラー".to_string())
        )
    }
}
