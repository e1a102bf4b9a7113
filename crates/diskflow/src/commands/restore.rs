use super::report_failure;
use crate::job::Job;
use colored::Colorize;
use diskflow_cloud::Volume;

/// Restore a snapshot onto a fresh volume attached to an instance.
///
/// A volume whose attach fails is deleted again, so a failed restore
/// leaves nothing behind.
pub async fn handle(
    job: &Job,
    snapshot_id: &str,
    size_gb: u64,
    instance: Option<String>,
    partition: Option<String>,
) -> anyhow::Result<()> {
    let instance_id = job.instance(instance)?;

    if !job.orchestrator.snapshot_exists(snapshot_id).await? {
        anyhow::bail!("スナップショット {} が見つかりません", snapshot_id);
    }

    job.say(format!("スナップショット {} からボリュームを作成中...", snapshot_id).yellow());
    let spec = job.volume_spec(size_gb, None).from_snapshot(snapshot_id);
    let volume = job
        .orchestrator
        .create_volume(&job.ctx, &spec)
        .await
        .map_err(report_failure)?;
    job.say(format!("  ✓ ボリューム {} を作成しました", volume.id));

    job.say(format!("{} にアタッチ中...", instance_id).yellow());
    if let Err(failure) = job
        .orchestrator
        .attach(&job.ctx, &volume.id, &instance_id)
        .await
    {
        discard(job, &volume).await;
        return Err(report_failure(failure));
    }

    let device = job
        .orchestrator
        .mountpoint(&volume.id, partition.as_deref())
        .unwrap_or_default();
    job.done(format!("リストア完了: {}", device));
    Ok(())
}

async fn discard(job: &Job, volume: &Volume) {
    job.say(format!("ボリューム {} を削除しています...", volume.id).red());
    if let Err(failure) = job.orchestrator.delete_volume(&job.ctx, &volume.id).await {
        tracing::error!(
            volume_id = %volume.id,
            error = %failure,
            "Failed to delete volume after attach failure"
        );
        eprintln!(
            "{}",
            format!("⚠ ボリューム {} が残っています: {}", volume.id, failure)
                .red()
                .bold()
        );
    }
}
