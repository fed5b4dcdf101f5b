//! # File Ledger
//!
//! [`OperationLedger`] stored as a JSON-lines file, one record per line.
//!
//! Appends are serialized within the process and flushed before
//! returning. A torn final line, left by a crash mid-write, is skipped on
//! read and cut off by the next append; corruption anywhere else is an
//! error.

use crate::infrastructure::persistence::ledger::{
    LedgerError, LedgerRecord, LedgerResult, OperationLedger,
};
use async_trait::async_trait;
use std::io::{ErrorKind as IoErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::warn;

/// JSON-lines ledger file.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileLedger {
    /// Opens (or lazily creates) the ledger at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: std::io::Error) -> LedgerError {
        LedgerError::io(format!("{}: {}", self.path.display(), e))
    }

    /// Makes sure the file ends on a line boundary before a new record is
    /// written. An unparseable tail is dropped; a complete record that only
    /// lacks its newline gets one.
    async fn seal_tail(&self, file: &mut File) -> LedgerResult<()> {
        let len = file.metadata().await.map_err(|e| self.io_error(e))?.len();
        if len == 0 {
            return Ok(());
        }
        file.seek(SeekFrom::Start(len - 1))
            .await
            .map_err(|e| self.io_error(e))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)
            .await
            .map_err(|e| self.io_error(e))?;
        if last[0] == b'\n' {
            return Ok(());
        }

        file.seek(SeekFrom::Start(0))
            .await
            .map_err(|e| self.io_error(e))?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .await
            .map_err(|e| self.io_error(e))?;
        let keep = contents
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |i| i + 1);

        if serde_json::from_slice::<LedgerRecord>(&contents[keep..]).is_ok() {
            file.seek(SeekFrom::End(0))
                .await
                .map_err(|e| self.io_error(e))?;
            file.write_all(b"\n").await.map_err(|e| self.io_error(e))?;
        } else {
            warn!(
                path = %self.path.display(),
                dropped_bytes = contents.len() - keep,
                "truncating torn ledger line"
            );
            file.set_len(keep as u64)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl OperationLedger for FileLedger {
    async fn append(&self, record: LedgerRecord) -> LedgerResult<()> {
        let mut line = serde_json::to_string(&record)
            .map_err(|e| LedgerError::serialization(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LedgerError::io(format!("{}: {}", parent.display(), e)))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        self.seal_tail(&mut file).await?;
        file.seek(SeekFrom::End(0))
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;
        Ok(())
    }

    async fn records(&self) -> LedgerResult<Vec<LedgerRecord>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LedgerError::io(format!("{}: {}", self.path.display(), e))),
        };

        let lines: Vec<(usize, &str)> = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .collect();
        let last = lines.len().saturating_sub(1);

        let mut records = Vec::with_capacity(lines.len());
        for (position, (number, line)) in lines.into_iter().enumerate() {
            match serde_json::from_str::<LedgerRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) if position == last && !contents.ends_with('\n') => {
                    warn!(path = %self.path.display(), line = number + 1, error = %e, "skipping torn ledger line");
                }
                Err(e) => {
                    return Err(LedgerError::deserialization(format!(
                        "{}:{}: {}",
                        self.path.display(),
                        number + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;
    use crate::domain::value_objects::{OperationId, Timestamp, TxStatus};
    use ethers::types::{H256, U256};

    fn record(id: &str, status: TxStatus) -> LedgerRecord {
        LedgerRecord {
            operation_id: OperationId::new(id),
            status,
            timestamp: Timestamp::now(),
            submitted_hash: Some(H256::repeat_byte(3)),
            nonce: Some(U256::from(9u64)),
            gas_price: Some(U256::from(20_000_000_000u64)),
            previous_hashes: Vec::new(),
            error_kind: None,
        }
    }

    #[tokio::test]
    async fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::new(dir.path().join("ledger.jsonl"));
        assert!(ledger.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appended_records_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::new(dir.path().join("nested").join("ledger.jsonl"));

        let first = record("a", TxStatus::Submitted);
        let mut second = record("a", TxStatus::Failed);
        second.error_kind = Some(ErrorKind::Reverted);
        ledger.append(first.clone()).await.unwrap();
        ledger.append(second.clone()).await.unwrap();

        let records = ledger.records().await.unwrap();
        assert_eq!(records, vec![first, second]);
    }

    #[tokio::test]
    async fn one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = FileLedger::new(&path);
        ledger.append(record("a", TxStatus::Submitted)).await.unwrap();
        ledger.append(record("b", TxStatus::Submitted)).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn torn_last_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = FileLedger::new(&path);
        ledger.append(record("a", TxStatus::Submitted)).await.unwrap();

        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str(r#"{"operation_id":"b","sta"#);
        std::fs::write(&path, contents).unwrap();

        let records = ledger.records().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn append_after_torn_line_keeps_the_ledger_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = FileLedger::new(&path);
        let first = record("a", TxStatus::Submitted);
        ledger.append(first.clone()).await.unwrap();

        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str(r#"{"operation_id":"b","sta"#);
        std::fs::write(&path, contents).unwrap();

        let third = record("c", TxStatus::Confirmed);
        ledger.append(third.clone()).await.unwrap();

        assert_eq!(ledger.records().await.unwrap(), vec![first, third]);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains(r#""sta"#));
        assert!(contents.ends_with('\n'));
    }

    #[tokio::test]
    async fn complete_record_without_newline_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let first = record("a", TxStatus::Submitted);
        std::fs::write(&path, serde_json::to_string(&first).unwrap()).unwrap();
        let ledger = FileLedger::new(&path);

        let second = record("b", TxStatus::Submitted);
        ledger.append(second.clone()).await.unwrap();

        assert_eq!(ledger.records().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn corrupt_middle_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        std::fs::write(&path, "garbage\n").unwrap();
        let ledger = FileLedger::new(&path);
        ledger.append(record("a", TxStatus::Submitted)).await.unwrap();

        assert!(matches!(
            ledger.records().await,
            Err(LedgerError::Deserialization(_))
        ));
    }
}
