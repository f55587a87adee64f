use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::StoreError;
use crate::models::TopicTermRecord;

/// Append-only sink for topic-term records.
pub trait TopicStore {
    /// Creates whatever the store needs before the first insert.
    fn prepare(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert(&mut self, record: &TopicTermRecord) -> Result<(), StoreError>;
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonlTopicStore {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonlTopicStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonlTopicStore {
            path: path.as_ref().to_path_buf(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, StoreError> {
        if self.writer.is_none() {
            self.prepare()?;
        }
        self.writer
            .as_mut()
            .ok_or_else(|| StoreError::Rejected(format!("{} is not open", self.path.display())))
    }
}

impl TopicStore for JsonlTopicStore {
    fn prepare(&mut self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        info!("Topic store ready at {}", self.path.display());
        Ok(())
    }

    fn insert(&mut self, record: &TopicTermRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(record)?;
        let writer = self.writer()?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory, for dry runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryTopicStore {
    pub records: Vec<TopicTermRecord>,
}

impl MemoryTopicStore {
    pub fn new() -> Self {
        MemoryTopicStore::default()
    }
}

impl TopicStore for MemoryTopicStore {
    fn insert(&mut self, record: &TopicTermRecord) -> Result<(), StoreError> {
        self.records.push(record.clone());
        Ok(())
    }
}

impl<S: TopicStore + ?Sized> TopicStore for Box<S> {
    fn prepare(&mut self) -> Result<(), StoreError> {
        (**self).prepare()
    }

    fn insert(&mut self, record: &TopicTermRecord) -> Result<(), StoreError> {
        (**self).insert(record)
    }
}
