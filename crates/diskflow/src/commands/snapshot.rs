use super::report_failure;
use crate::job::Job;
use colored::Colorize;
use diskflow_cloud::SnapshotSpec;

pub async fn create(
    job: &Job,
    volume_id: String,
    description: Option<String>,
) -> anyhow::Result<()> {
    job.say(format!("ボリューム {} のスナップショットを作成中...", volume_id).yellow());

    let mut spec = SnapshotSpec::new(volume_id);
    if let Some(description) = description {
        spec = spec.with_description(description);
    }

    let snapshot = job
        .orchestrator
        .create_snapshot(&job.ctx, &spec)
        .await
        .map_err(report_failure)?;

    job.done(format!("スナップショット {} を作成しました", snapshot.id));
    Ok(())
}

pub async fn delete(job: &Job, id: &str) -> anyhow::Result<()> {
    job.say(format!("スナップショット {} を削除中...", id).yellow());

    job.orchestrator
        .delete_snapshot(&job.ctx, id)
        .await
        .map_err(report_failure)?;

    job.done(format!("スナップショット {} を削除しました", id));
    Ok(())
}

pub async fn show(job: &Job, id: &str) -> anyhow::Result<()> {
    match job.orchestrator.copy_snapshot(id).await? {
        Some(snapshot) => {
            job.say(format!("スナップショット {}", snapshot.id.cyan().bold()));
            job.say(format!("  状態: {}", snapshot.status));
            job.say(format!("  元ボリュームサイズ: {} GB", snapshot.source_size_gb));
            if let Some(created) = snapshot.creation_time {
                job.say(format!("  作成日時: {}", created.to_rfc3339()));
            }
            Ok(())
        }
        None => anyhow::bail!("スナップショット {} が見つかりません", id),
    }
}
