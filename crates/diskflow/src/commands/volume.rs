use super::report_failure;
use crate::job::Job;
use colored::Colorize;

pub async fn create(
    job: &Job,
    size_gb: u64,
    snapshot: Option<String>,
    category: Option<String>,
) -> anyhow::Result<()> {
    let mut spec = job.volume_spec(size_gb, category);
    if let Some(snapshot_id) = snapshot {
        job.say(format!("スナップショット {} から復元します", snapshot_id).dimmed());
        spec = spec.from_snapshot(snapshot_id);
    }
    job.say(format!("{} GB のボリュームを作成中...", size_gb).yellow());

    let volume = job
        .orchestrator
        .create_volume(&job.ctx, &spec)
        .await
        .map_err(report_failure)?;

    job.done(format!("ボリューム {} を作成しました", volume.id));
    Ok(())
}

pub async fn delete(job: &Job, id: &str) -> anyhow::Result<()> {
    job.say(format!("ボリューム {} を削除中...", id).yellow());

    job.orchestrator
        .delete_volume(&job.ctx, id)
        .await
        .map_err(report_failure)?;

    job.done(format!("ボリューム {} を削除しました", id));
    Ok(())
}

pub async fn show(job: &Job, id: &str) -> anyhow::Result<()> {
    match job.orchestrator.volume(id).await? {
        Some(volume) => {
            job.say(format!("ボリューム {}", volume.id.cyan().bold()));
            job.say(format!("  状態: {}", volume.status));
            job.say(format!("  サイズ: {} GB", volume.size_gb));
            if let Some(device) = volume.device {
                job.say(format!("  デバイス: {}", device));
            }
            Ok(())
        }
        None => anyhow::bail!("ボリューム {} が見つかりません", id),
    }
}

pub async fn list(job: &Job, instance: Option<String>) -> anyhow::Result<()> {
    let instance_id = job.instance(instance)?;
    let volumes = job.orchestrator.attached_volumes(&instance_id).await?;

    if volumes.is_empty() {
        job.say(format!("ℹ {} にアタッチされたボリュームはありません", instance_id).dimmed());
        return Ok(());
    }

    job.say("VOLUME\t\tSIZE\tDEVICE".bold());
    for volume in volumes {
        job.say(format!(
            "{}\t{} GB\t{}",
            volume.id,
            volume.size_gb,
            volume.device.unwrap_or_default()
        ));
    }
    Ok(())
}
