//! Batched holder writes.

use chrono::NaiveDate;
use hs_store::{SnapshotStore, StoreError};
use hs_types::HolderRecord;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Writes holder pages to the snapshot store in small sub-batches.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    sub_batch_size: usize,
    sub_batch_delay: Duration,
}

impl SnapshotWriter {
    /// Create a writer. A zero `sub_batch_size` is treated as 1.
    pub fn new(sub_batch_size: usize, sub_batch_delay: Duration) -> Self {
        Self {
            sub_batch_size: sub_batch_size.max(1),
            sub_batch_delay,
        }
    }

    /// Write `records` for `date` and return the number of new rows.
    ///
    /// Duplicate addresses within the batch are dropped before writing,
    /// keeping the first occurrence. Addresses already stored for the date
    /// are skipped by the store itself.
    ///
    /// # Errors
    ///
    /// The first failing chunk aborts the batch. Chunks written before it
    /// stay written.
    pub async fn write_batch<St: SnapshotStore>(
        &self,
        store: &St,
        date: NaiveDate,
        records: &[HolderRecord],
    ) -> Result<u64, StoreError> {
        let mut seen = HashSet::with_capacity(records.len());
        let unique: Vec<HolderRecord> = records
            .iter()
            .filter(|r| seen.insert(r.address.as_str()))
            .cloned()
            .collect();

        let mut inserted = 0u64;
        let chunk_count = unique.len().div_ceil(self.sub_batch_size);

        for (index, chunk) in unique.chunks(self.sub_batch_size).enumerate() {
            let written = store.insert_holders(date, chunk).await?;
            debug!("Wrote holder chunk {}/{}: {} of {} rows new", index + 1, chunk_count, written, chunk.len());
            inserted += written;

            if index + 1 < chunk_count && !self.sub_batch_delay.is_zero() {
                tokio::time::sleep(self.sub_batch_delay).await;
            }
        }

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_store::MemoryStore;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn holder(n: u32) -> HolderRecord {
        HolderRecord {
            address: format!("0x{:040x}", n),
            is_contract: false,
            balance: dec!(1),
        }
    }

    #[tokio::test]
    async fn test_write_batch_chunks_and_counts() {
        let store = MemoryStore::new();
        let writer = SnapshotWriter::new(3, Duration::ZERO);
        let records: Vec<_> = (0..10).map(holder).collect();

        let inserted = writer.write_batch(&store, date(), &records).await.unwrap();
        assert_eq!(inserted, 10);
        assert_eq!(store.load_holders(date()).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_write_batch_dedupes_within_and_across_batches() {
        let store = MemoryStore::new();
        let writer = SnapshotWriter::new(100, Duration::ZERO);

        let first: Vec<_> = vec![holder(1), holder(2), holder(1)];
        assert_eq!(writer.write_batch(&store, date(), &first).await.unwrap(), 2);

        let second: Vec<_> = vec![holder(2), holder(3)];
        assert_eq!(writer.write_batch(&store, date(), &second).await.unwrap(), 1);

        assert_eq!(store.load_holders(date()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_write_batch_propagates_failure() {
        let store = MemoryStore::new();
        store.set_fail_holder_writes(true);
        let writer = SnapshotWriter::new(100, Duration::ZERO);

        let result = writer.write_batch(&store, date(), &[holder(1)]).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let store = MemoryStore::new();
        let writer = SnapshotWriter::new(0, Duration::ZERO);
        assert_eq!(writer.write_batch(&store, date(), &[]).await.unwrap(), 0);
    }
}
