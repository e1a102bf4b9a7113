use async_trait::async_trait;
use diskflow_cloud::{
    AuthStatus, CloudError, DeviceTranslator, JobContext, JobLabels, Lookup, PollConfig, Result,
    ResourceAdapter, Snapshot, SnapshotSpec, SnapshotStatus, Tags, Volume, VolumeSpec,
    VolumeStatus,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What one describe call reports
#[derive(Debug, Clone)]
pub enum Reply {
    Status(&'static str),
    Missing,
    Multiple(usize),
}

/// Calls the orchestrator made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateVolume,
    DeleteVolume(String),
    CreateSnapshot,
    DeleteSnapshot(String),
    Attach(String, String),
    Detach(String, String),
}

#[derive(Debug)]
struct Entry {
    replies: VecDeque<Reply>,
    size_gb: u64,
    device: Option<String>,
    deleted: bool,
}

impl Entry {
    fn new(replies: Vec<Reply>, size_gb: u64) -> Self {
        Self {
            replies: replies.into(),
            size_gb,
            device: None,
            deleted: false,
        }
    }

    /// Pop the next reply; the last one sticks
    fn next(&mut self) -> Reply {
        if self.replies.len() > 1 {
            self.replies.pop_front().unwrap()
        } else {
            self.replies.front().cloned().unwrap_or(Reply::Missing)
        }
    }
}

#[derive(Default)]
struct FakeState {
    next_id: u32,
    volumes: HashMap<String, Entry>,
    snapshots: HashMap<String, Entry>,
    next_volume_script: Option<Vec<Reply>>,
    next_snapshot_script: Option<Vec<Reply>>,
    attach_script: Option<Vec<Reply>>,
    attach_device: Option<String>,
    fail_next_create: Option<String>,
    ignore_deletes: bool,
    calls: Vec<Call>,
}

/// Scripted in-memory provider
pub struct FakeAdapter {
    state: Mutex<FakeState>,
}

#[allow(dead_code)]
impl FakeAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                attach_device: Some("/dev/xvdb".to_string()),
                ..Default::default()
            }),
        })
    }

    pub fn script_next_volume(&self, replies: Vec<Reply>) {
        self.state.lock().unwrap().next_volume_script = Some(replies);
    }

    pub fn script_next_snapshot(&self, replies: Vec<Reply>) {
        self.state.lock().unwrap().next_snapshot_script = Some(replies);
    }

    /// What the volume reports after the next attach call
    pub fn script_attach(&self, replies: Vec<Reply>) {
        self.state.lock().unwrap().attach_script = Some(replies);
    }

    pub fn set_attach_device(&self, device: Option<&str>) {
        self.state.lock().unwrap().attach_device = device.map(str::to_string);
    }

    pub fn fail_next_create(&self, message: &str) {
        self.state.lock().unwrap().fail_next_create = Some(message.to_string());
    }

    /// Accept delete calls but keep reporting the resource
    pub fn ignore_deletes(&self) {
        self.state.lock().unwrap().ignore_deletes = true;
    }

    /// Seed an existing volume
    pub fn add_volume(&self, id: &str, status: &'static str, device: Option<&str>) {
        let mut entry = Entry::new(vec![Reply::Status(status)], 20);
        entry.device = device.map(str::to_string);
        self.state
            .lock()
            .unwrap()
            .volumes
            .insert(id.to_string(), entry);
    }

    /// Replace what an existing volume reports from now on
    pub fn script_volume(&self, id: &str, replies: Vec<Reply>) {
        let mut state = self.state.lock().unwrap();
        let entry = state.volumes.get_mut(id).unwrap();
        entry.replies = replies.into();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls().iter().filter(|c| *c == wanted).count()
    }

    fn take_failure(state: &mut FakeState) -> Result<()> {
        match state.fail_next_create.take() {
            Some(message) => Err(CloudError::Transport(message)),
            None => Ok(()),
        }
    }
}

fn volume_record(id: &str, entry: &mut Entry) -> Lookup<Volume> {
    if entry.deleted {
        return Lookup::NotFound;
    }
    match entry.next() {
        Reply::Status(status) => {
            let status = VolumeStatus::parse(status);
            let mut volume = Volume::new(id, status.clone(), entry.size_gb);
            if status == VolumeStatus::InUse {
                volume.device = entry.device.clone();
            }
            Lookup::Found(volume)
        }
        Reply::Missing => Lookup::NotFound,
        Reply::Multiple(n) => Lookup::Multiple(n),
    }
}

#[async_trait]
impl ResourceAdapter for FakeAdapter {
    fn name(&self) -> &str {
        "fake"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        Ok(AuthStatus::ok("tester"))
    }

    async fn create_volume(&self, spec: &VolumeSpec, _name: &str, _tags: &Tags) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateVolume);
        Self::take_failure(&mut state)?;

        state.next_id += 1;
        let id = format!("d-{}", state.next_id);
        let script = state
            .next_volume_script
            .take()
            .unwrap_or_else(|| vec![Reply::Status("Creating"), Reply::Status("Available")]);
        state
            .volumes
            .insert(id.clone(), Entry::new(script, spec.size_gb));
        Ok(id)
    }

    async fn describe_volume(&self, id: &str) -> Result<Lookup<Volume>> {
        let mut state = self.state.lock().unwrap();
        Ok(match state.volumes.get_mut(id) {
            Some(entry) => volume_record(id, entry),
            None => Lookup::NotFound,
        })
    }

    async fn delete_volume(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteVolume(id.to_string()));
        let ignore = state.ignore_deletes;
        if let Some(entry) = state.volumes.get_mut(id) {
            entry.deleted = !ignore;
        }
        Ok(())
    }

    async fn create_snapshot(
        &self,
        spec: &SnapshotSpec,
        _name: &str,
        _tags: &Tags,
    ) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateSnapshot);
        Self::take_failure(&mut state)?;

        state.next_id += 1;
        let id = format!("s-{}", state.next_id);
        let size = state
            .volumes
            .get(&spec.volume_id)
            .map(|v| v.size_gb)
            .unwrap_or(20);
        let script = state
            .next_snapshot_script
            .take()
            .unwrap_or_else(|| vec![Reply::Status("progressing"), Reply::Status("accomplished")]);
        state.snapshots.insert(id.clone(), Entry::new(script, size));
        Ok(id)
    }

    async fn describe_snapshot(&self, id: &str) -> Result<Lookup<Snapshot>> {
        let mut state = self.state.lock().unwrap();
        let Some(entry) = state.snapshots.get_mut(id) else {
            return Ok(Lookup::NotFound);
        };
        if entry.deleted {
            return Ok(Lookup::NotFound);
        }
        Ok(match entry.next() {
            Reply::Status(status) => Lookup::Found(Snapshot::new(
                id,
                SnapshotStatus::parse(status),
                entry.size_gb,
            )),
            Reply::Missing => Lookup::NotFound,
            Reply::Multiple(n) => Lookup::Multiple(n),
        })
    }

    async fn delete_snapshot(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteSnapshot(id.to_string()));
        let ignore = state.ignore_deletes;
        if let Some(entry) = state.snapshots.get_mut(id) {
            entry.deleted = !ignore;
        }
        Ok(())
    }

    async fn attach_volume(&self, volume_id: &str, instance_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Attach(volume_id.to_string(), instance_id.to_string()));
        let script = state
            .attach_script
            .take()
            .unwrap_or_else(|| vec![Reply::Status("Attaching"), Reply::Status("In_use")]);
        let device = state.attach_device.clone();
        let entry = state
            .volumes
            .get_mut(volume_id)
            .ok_or_else(|| CloudError::Transport(format!("no such disk {}", volume_id)))?;
        entry.replies = script.into();
        entry.device = device;
        Ok(())
    }

    async fn detach_volume(&self, volume_id: &str, instance_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Detach(volume_id.to_string(), instance_id.to_string()));
        let entry = state
            .volumes
            .get_mut(volume_id)
            .ok_or_else(|| CloudError::Transport(format!("no such disk {}", volume_id)))?;
        entry.replies = vec![Reply::Status("Detaching"), Reply::Status("Available")].into();
        entry.device = None;
        Ok(())
    }

    async fn list_instance_volumes(&self, _instance_id: &str) -> Result<Vec<Volume>> {
        let state = self.state.lock().unwrap();
        let mut volumes: Vec<Volume> = state
            .volumes
            .iter()
            .filter(|(_, e)| !e.deleted)
            .filter_map(|(id, e)| {
                e.device.as_ref().map(|d| {
                    Volume::new(id.as_str(), VolumeStatus::InUse, e.size_gb).with_device(d.as_str())
                })
            })
            .collect();
        volumes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(volumes)
    }
}

/// Translator that never finds a device
#[allow(dead_code)]
pub struct NoDevices;

impl DeviceTranslator for NoDevices {
    fn to_host(&self, _provider_device: &str) -> Option<String> {
        None
    }

    fn to_provider(&self, host_device: &str) -> String {
        host_device.to_string()
    }
}

/// Context with a 1s poll delay and a 10s deadline
pub fn ctx() -> JobContext {
    JobContext::new(PollConfig::new(Duration::from_secs(1), Duration::from_secs(10)).unwrap())
        .with_names(Arc::new(JobLabels::new("test-job")))
}
