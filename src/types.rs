use serde::{Deserialize, Serialize};

/// Bucket a probed code is sorted into.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Success,
    Filtered,
    Fail,
    Locked,
    Images,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Success,
        Category::Filtered,
        Category::Fail,
        Category::Locked,
        Category::Images,
    ];
}

/// One outcome of probing a single code.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: String,
    pub message: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl ResultRecord {
    pub fn new(id: impl Into<String>, message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            url: url.into(),
            img_url: None,
            locked: None,
        }
    }

    pub fn with_img_url(mut self, img_url: impl Into<String>) -> Self {
        self.img_url = Some(img_url.into());
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }
}

/// Aggregate state of one full or in-progress scan pass.
///
/// Buckets are append-only. `scanned` is bumped by [`ScanSnapshot::push`] so it
/// always equals the sum of the bucket lengths.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSnapshot {
    /// Completion instant in milliseconds since the Unix epoch; `None` while in progress.
    pub timestamp: Option<i64>,
    pub scanned: u64,
    pub success: Vec<ResultRecord>,
    pub filtered: Vec<ResultRecord>,
    pub fail: Vec<ResultRecord>,
    pub locked: Vec<ResultRecord>,
    pub images: Vec<ResultRecord>,
}

impl ScanSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: Category, record: ResultRecord) {
        self.bucket_mut(category).push(record);
        self.scanned += 1;
    }

    pub fn bucket(&self, category: Category) -> &[ResultRecord] {
        match category {
            Category::Success => &self.success,
            Category::Filtered => &self.filtered,
            Category::Fail => &self.fail,
            Category::Locked => &self.locked,
            Category::Images => &self.images,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<ResultRecord> {
        match category {
            Category::Success => &mut self.success,
            Category::Filtered => &mut self.filtered,
            Category::Fail => &mut self.fail,
            Category::Locked => &mut self.locked,
            Category::Images => &mut self.images,
        }
    }

    pub fn count(&self, category: Category) -> usize {
        self.bucket(category).len()
    }

    /// Wire view of this snapshot. `live` is omitted from the JSON when `None`.
    pub fn payload(&self, live: Option<bool>) -> SnapshotPayload<'_> {
        SnapshotPayload {
            live,
            timestamp: self.timestamp,
            scanned: self.scanned,
            success_count: self.success.len(),
            filtered_count: self.filtered.len(),
            fail_count: self.fail.len(),
            locked_count: self.locked.len(),
            images_count: self.images.len(),
            success: &self.success,
            locked: &self.locked,
            filtered: &self.filtered,
            fail: &self.fail,
            images: &self.images,
        }
    }
}

/// Full snapshot contents plus per-bucket counts, borrowed for serialization.
#[derive(Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    pub scanned: u64,
    pub success_count: usize,
    pub filtered_count: usize,
    pub fail_count: usize,
    pub locked_count: usize,
    pub images_count: usize,
    pub success: &'a [ResultRecord],
    pub locked: &'a [ResultRecord],
    pub filtered: &'a [ResultRecord],
    pub fail: &'a [ResultRecord],
    pub images: &'a [ResultRecord],
}

/// Messages pushed over the live progress channel.
#[derive(Serialize, Debug, Clone, Copy)]
#[serde(untagged)]
pub enum ProgressEvent<'a> {
    Snapshot(SnapshotPayload<'a>),
    LiveStarted { live: bool },
    Done { done: bool, message: &'static str },
    Idle { message: &'static str },
}

impl<'a> ProgressEvent<'a> {
    /// Per-code update during the first-ever pass.
    pub fn live(snapshot: &'a ScanSnapshot) -> Self {
        ProgressEvent::Snapshot(snapshot.payload(Some(true)))
    }

    /// The last finished snapshot, sent to clients that connect after the first pass.
    pub fn finished(snapshot: &'a ScanSnapshot) -> Self {
        ProgressEvent::Snapshot(snapshot.payload(Some(false)))
    }

    pub fn live_started() -> Self {
        ProgressEvent::LiveStarted { live: true }
    }

    pub fn done() -> Self {
        ProgressEvent::Done {
            done: true,
            message: "Scan complete",
        }
    }

    pub fn idle() -> Self {
        ProgressEvent::Idle {
            message: "No scan running yet",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
