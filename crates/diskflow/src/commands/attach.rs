use super::report_failure;
use crate::job::Job;
use colored::Colorize;

pub async fn attach(job: &Job, volume_id: &str, instance: Option<String>) -> anyhow::Result<()> {
    let instance_id = job.instance(instance)?;
    job.say(format!("{} を {} にアタッチ中...", volume_id, instance_id).yellow());

    let attachment = job
        .orchestrator
        .attach(&job.ctx, volume_id, &instance_id)
        .await
        .map_err(report_failure)?;

    job.done(format!("アタッチしました: {}", attachment.device));
    Ok(())
}

pub async fn detach(job: &Job, volume_id: &str, instance: Option<String>) -> anyhow::Result<()> {
    let instance_id = job.instance(instance)?;
    job.say(format!("{} を {} からデタッチ中...", volume_id, instance_id).yellow());

    job.orchestrator
        .detach(&job.ctx, volume_id, &instance_id)
        .await
        .map_err(report_failure)?;

    job.done(format!("{} をデタッチしました", volume_id));
    Ok(())
}
