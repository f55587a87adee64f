use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::SourceError;
use crate::models::{Message, Period};

/// Supplies the message history of one period.
pub trait MessageSource {
    fn fetch(&self, period: Period) -> Result<Vec<Message>, SourceError>;
}

/// Reads message history from CSV files with the columns
/// `name, content, create_at, channel, sender_role, sender_id`.
#[derive(Debug, Clone)]
pub enum CsvMessageSource {
    /// One `{month}_{year}.csv` file per period inside the directory.
    Directory(PathBuf),
    /// The same file whatever the period.
    File(PathBuf),
}

impl CsvMessageSource {
    pub fn path_for(&self, period: Period) -> PathBuf {
        match self {
            CsvMessageSource::Directory(dir) => {
                dir.join(format!("{}_{}.csv", period.month, period.year))
            }
            CsvMessageSource::File(path) => path.clone(),
        }
    }
}

impl MessageSource for CsvMessageSource {
    fn fetch(&self, period: Period) -> Result<Vec<Message>, SourceError> {
        if let CsvMessageSource::Directory(dir) = self {
            if !dir.is_dir() {
                return Err(SourceError::MissingDirectory(dir.clone()));
            }
        }

        let path = self.path_for(period);
        if !path.is_file() {
            warn!("No message history for {} at {}", period, path.display());
            return Ok(Vec::new());
        }

        let messages = read_messages(&path)?;
        if messages.is_empty() {
            info!("No chat message yet.");
        } else {
            info!(
                "Succeeded get chat message, total message {} from {}",
                messages.len(),
                path.display()
            );
        }
        Ok(messages)
    }
}

fn read_messages(path: &Path) -> Result<Vec<Message>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut messages = Vec::new();
    for record in reader.deserialize::<Message>() {
        let message = record.map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        messages.push(message);
    }
    Ok(messages)
}
