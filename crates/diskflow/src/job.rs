//! One backup/restore job: settings, adapter, orchestrator and context

use colored::Colorize;
use diskflow_cloud::{JobContext, JobLabels, Orchestrator, PollConfig, VolumeSpec};
use diskflow_cloud_aliyun::{AliyunProvider, XvdDevices};
use diskflow_config::Settings;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Job {
    pub orchestrator: Orchestrator,
    pub ctx: JobContext,
    pub settings: Settings,
    json: bool,
}

impl Job {
    /// Build the provider from settings. `placement` is the instance whose
    /// zone new volumes go to, used only when no zone is configured.
    pub async fn connect(
        settings: Settings,
        placement: Option<&str>,
        cancel: CancellationToken,
        json: bool,
    ) -> anyhow::Result<Self> {
        let mut provider = AliyunProvider::new(&settings.provider.region);
        if let Some(profile) = &settings.provider.profile {
            provider = provider.with_profile(profile);
        }
        provider = match (&settings.provider.zone, placement) {
            (Some(zone), _) => provider.with_zone(zone),
            (None, Some(instance)) => {
                until_cancelled(&cancel, provider.for_instance(instance)).await??
            }
            (None, None) => provider,
        };

        let ctx = context(&settings)?.with_cancel(cancel);
        Ok(Self {
            orchestrator: Orchestrator::new(Arc::new(provider)),
            ctx,
            settings,
            json,
        })
    }

    /// Instance from the command line, falling back to the settings file
    pub fn instance(&self, flag: Option<String>) -> anyhow::Result<String> {
        flag.or_else(|| self.settings.provider.instance_id.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "インスタンスIDが指定されていません (--instance または provider.instance_id)"
                )
            })
    }

    pub fn volume_spec(&self, size_gb: u64, category: Option<String>) -> VolumeSpec {
        let mut spec = VolumeSpec::new(size_gb)
            .with_category(category.unwrap_or_else(|| self.settings.volume.category.clone()));
        spec.encrypted = self.settings.volume.encrypted;
        spec
    }

    /// Human-readable progress. Goes to stderr when stdout carries JSON.
    pub fn say(&self, message: impl Display) {
        if self.json {
            eprintln!("{}", message);
        } else {
            println!("{}", message);
        }
    }

    pub fn done(&self, message: impl Display) {
        self.say(format!("✓ {}", message).green().bold());
    }
}

/// Run `work` unless the job is cancelled first
pub async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    work: F,
) -> anyhow::Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => anyhow::bail!("中断されました"),
        output = work => Ok(output),
    }
}

/// Poll timing, naming and device translation for one job
pub fn context(settings: &Settings) -> anyhow::Result<JobContext> {
    let poll = PollConfig::new(settings.poll.delay(), settings.poll.max_duration())?;
    let labels = JobLabels::random().with_tags(settings.tags.clone());
    tracing::info!(job_id = %labels.job_id(), "Starting job");

    Ok(JobContext::new(poll)
        .with_names(Arc::new(labels))
        .with_devices(Arc::new(XvdDevices)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn settings(yaml: &str) -> Settings {
        Settings::from_yaml(yaml, Path::new("diskflow.yaml")).unwrap()
    }

    /// キャンセル済みのジョブでは応答しない呼び出しを待たない
    #[tokio::test]
    async fn test_until_cancelled_interrupts_pending_work() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = until_cancelled(&cancel, std::future::pending::<()>()).await;
        assert!(result.unwrap_err().to_string().contains("中断"));
    }

    #[tokio::test]
    async fn test_until_cancelled_passes_output_through() {
        let cancel = CancellationToken::new();
        let result = until_cancelled(&cancel, async { 42 }).await.unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn test_context_uses_poll_settings() {
        let settings = settings(
            "provider:\n  region: cn-hangzhou\npoll:\n  delay_secs: 2\n  max_secs: 30\n",
        );
        let ctx = context(&settings).unwrap();

        assert_eq!(ctx.poll.delay, std::time::Duration::from_secs(2));
        assert_eq!(ctx.poll.max_duration, std::time::Duration::from_secs(30));
        assert_eq!(ctx.devices.to_host("/dev/xvdb").as_deref(), Some("/dev/vdb"));
        assert!(ctx.names.generate("diskflow-disk").starts_with("diskflow-disk-"));
    }

    #[test]
    fn test_context_carries_user_tags() {
        let settings = settings("provider:\n  region: r\ntags:\n  team: storage\n");
        let ctx = context(&settings).unwrap();

        let tags = ctx.names.tags();
        assert_eq!(tags.get("team").map(String::as_str), Some("storage"));
        assert!(tags.contains_key("diskflow:job-id"));
    }
}
