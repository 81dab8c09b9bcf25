//! Conversation Journal
//!
//! Keeps a record of incoming messages and the intent decided for each of
//! them in `logs/incoming.log`. Each line is one JSON entry; only the last
//! `MAX_ENTRIES` are retained.
//!
//! Writes happen on a dedicated task fed through [`JournalHandle`], so a slow
//! disk never delays a reply, and a failed write is only logged.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::brain::engine::{Outcome, Reply};
use crate::error::AppError;

/// Maximum number of entries kept in the journal file
pub const MAX_ENTRIES: usize = 500;

/// One processed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Local>,
    pub request_id: Uuid,
    pub text: String,
    pub intent: Option<String>,
    pub probability: Option<f32>,
    pub outcome: Outcome,
}

impl JournalEntry {
    pub fn new(request_id: Uuid, text: impl Into<String>, reply: &Reply) -> Self {
        Self {
            timestamp: Local::now(),
            request_id,
            text: text.into(),
            intent: reply.intent.clone(),
            probability: reply.probability,
            outcome: reply.outcome,
        }
    }
}

/// File-backed journal with bounded retention.
pub struct ConversationJournal {
    path: PathBuf,
    max_entries: usize,
    entries: VecDeque<JournalEntry>,
}

impl ConversationJournal {
    /// Open the journal at `path`, picking up entries from a previous run.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, MAX_ENTRIES)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        let path = path.into();
        let mut entries: VecDeque<JournalEntry> = read_entries(&path).into();
        while entries.len() > max_entries {
            entries.pop_front();
        }
        Self {
            path,
            max_entries,
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    /// Record an entry and rewrite the file.
    pub fn append(&mut self, entry: JournalEntry) -> Result<(), AppError> {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
        self.write_to_file()
    }

    fn write_to_file(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&self.path)?;

        writeln!(file, "# Incoming messages - last {} entries", self.entries.len())?;
        writeln!(file, "# Each line is a JSON object")?;

        for entry in &self.entries {
            writeln!(file, "{}", serde_json::to_string(entry)?)?;
        }
        Ok(())
    }
}

/// Read entries from a journal file, skipping comments and broken lines.
pub fn read_entries(path: &Path) -> Vec<JournalEntry> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(_) => return Vec::new(),
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .filter_map(|line| match serde_json::from_str::<JournalEntry>(line.trim()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed journal line: {}", e);
                None
            }
        })
        .collect()
}

#[derive(Debug)]
enum JournalMessage {
    Record(JournalEntry),
    Flush(oneshot::Sender<()>),
}

/// A handle to the journal task.
#[derive(Clone)]
pub struct JournalHandle {
    sender: mpsc::Sender<JournalMessage>,
}

impl JournalHandle {
    /// Spawn the journal task owning `journal`.
    pub fn spawn(journal: ConversationJournal) -> Self {
        let (sender, receiver) = mpsc::channel(256);
        tokio::spawn(run(journal, receiver));
        Self { sender }
    }

    /// Queue an entry. Never blocks; a full queue drops the entry.
    pub fn record(&self, entry: JournalEntry) {
        if let Err(e) = self.sender.try_send(JournalMessage::Record(entry)) {
            warn!("Journal entry dropped: {}", e);
        }
    }

    /// Wait until every entry queued before this call is written.
    pub async fn flush(&self) {
        let (send, recv) = oneshot::channel();
        if self.sender.send(JournalMessage::Flush(send)).await.is_ok() {
            let _ = recv.await;
        }
    }
}

async fn run(mut journal: ConversationJournal, mut receiver: mpsc::Receiver<JournalMessage>) {
    info!("Journal started: {:?}", journal.path());
    while let Some(msg) = receiver.recv().await {
        match msg {
            JournalMessage::Record(entry) => {
                if let Err(e) = journal.append(entry) {
                    error!("Failed to write journal {:?}: {}", journal.path(), e);
                }
            }
            JournalMessage::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    info!("Journal stopped");
}
