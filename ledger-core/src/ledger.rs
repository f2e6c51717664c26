//! Distribution ledger
//!
//! Ties the record store and the single-writer actor into the two
//! operations the gateway exposes: ticket lookup and distribution
//! recording.
//!
//! # Example
//!
//! ```no_run
//! use beneficiary_ledger::{Category, Config, DistributionRequest, Ledger, TicketCode};
//!
//! #[tokio::main]
//! async fn main() -> beneficiary_ledger::Result<()> {
//!     let ledger = Ledger::open(Config::from_env()?).await?;
//!
//!     let code = TicketCode::new("A001");
//!     let info = ledger.check_ticket(&code).await?;
//!     println!("{}: {}", info.kind, info.info);
//!
//!     let receipt = ledger
//!         .record_distribution(&code, DistributionRequest::done(&[Category::Nfi]))
//!         .await?;
//!     println!("{}", receipt.message);
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    error::NoOpReason,
    metrics::Metrics,
    store::{CsvRecordStore, RecordStore},
    types::{
        BeneficiaryRecord, DistributionReceipt, DistributionRequest, EffectiveUpdate,
        LedgerSummary, TicketCode, TicketInfo,
    },
    Config, Error, Result,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::Duration;

/// Main ledger interface
pub struct Ledger {
    /// Actor handle for writes
    handle: LedgerHandle,

    /// Direct store access (for reads)
    store: Arc<dyn RecordStore>,

    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Open the CSV store named by the configuration
    ///
    /// The store is loaded once so that a missing or malformed file is
    /// reported at startup rather than on the first request.
    pub async fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(CsvRecordStore::open(&config));
        let table = store.load_all()?;

        tracing::info!(
            path = ?config.store_path,
            records = table.len(),
            "Beneficiary store opened"
        );

        let ledger = Self::with_store(store, config)?;
        ledger.metrics.update_records(table.len());
        Ok(ledger)
    }

    /// Build a ledger over any store. Fails with [`Error::Concurrency`]
    /// outside a Tokio runtime.
    pub fn with_store(store: Arc<dyn RecordStore>, config: Config) -> Result<Self> {
        config.validate()?;
        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to create metrics: {}", e)))?;

        let handle = spawn_ledger_actor(
            store.clone(),
            config.writer.mailbox_capacity,
            Duration::from_millis(config.writer.write_timeout_ms),
            metrics.clone(),
        )?;

        Ok(Self {
            handle,
            store,
            metrics,
            config,
        })
    }

    /// Look up a ticket and return its descriptive info
    ///
    /// Reads bypass the writer: the store is replaced atomically, so a read
    /// sees either the state before or after any concurrent write.
    pub async fn check_ticket(&self, ticket_code: &TicketCode) -> Result<TicketInfo> {
        require_code(ticket_code)?;
        self.metrics.ticket_checks.inc();

        let table = self.store.load_all()?;
        self.metrics.update_records(table.len());

        let record = table
            .find(ticket_code)
            .ok_or_else(|| Error::NotFound(ticket_code.to_string()))?;

        let info = record
            .info()
            .ok_or_else(|| Error::NoBeneficiaryInfo(ticket_code.to_string()))?;

        tracing::debug!(ticket_code = %ticket_code, kind = %info.kind, "Ticket checked");
        Ok(info)
    }

    /// Merge a distribution into a record and persist the collection
    pub async fn record_distribution(
        &self,
        ticket_code: &TicketCode,
        request: DistributionRequest,
    ) -> Result<DistributionReceipt> {
        require_code(ticket_code)?;
        self.handle
            .record_distribution(ticket_code.clone(), request)
            .await
    }

    /// Snapshot of every record, in stored order
    pub async fn list_records(&self) -> Result<Vec<BeneficiaryRecord>> {
        let table = self.store.load_all()?;
        Ok(table.records().collect())
    }

    /// Completion counts over the store
    pub async fn summary(&self) -> Result<LedgerSummary> {
        let table = self.store.load_all()?;
        self.metrics.update_records(table.len());

        let mut summary = LedgerSummary::default();
        for record in table.records() {
            summary.add(&record.flags);
        }
        Ok(summary)
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stop the writer. Later writes fail with a concurrency error.
    pub async fn shutdown(&self) -> Result<()> {
        self.handle.shutdown().await
    }
}

fn require_code(ticket_code: &TicketCode) -> Result<()> {
    if ticket_code.is_empty() {
        return Err(Error::InvalidRequest("ticket code is required".to_string()));
    }
    Ok(())
}

/// Read-merge-write for one ticket. Callers must serialize invocations
/// against the same store; the ledger does so through its actor.
pub(crate) fn apply_distribution(
    store: &dyn RecordStore,
    ticket_code: &TicketCode,
    request: &DistributionRequest,
) -> Result<DistributionReceipt> {
    let mut table = store.load_all()?;

    let (index, record) = table
        .position(ticket_code)
        .and_then(|i| table.record(i).map(|r| (i, r)))
        .ok_or_else(|| Error::NotFound(ticket_code.to_string()))?;

    if record.flags.is_fully_served() {
        return Err(Error::NoOpUpdate(NoOpReason::AlreadyServed));
    }

    let update = EffectiveUpdate::compute(&record.flags, request);
    if update.is_empty() {
        return Err(Error::NoOpUpdate(NoOpReason::NothingToUpdate));
    }

    table.apply(index, &update);
    store.save_all(&table)?;

    let mut flags = record.flags;
    update.apply_to(&mut flags);
    let applied = update.categories();
    let names: Vec<&str> = applied.iter().map(|c| c.as_str()).collect();

    Ok(DistributionReceipt {
        ticket_code: ticket_code.clone(),
        message: format!("Distribution recorded: {}", names.join(", ")),
        applied,
        flags,
        recorded_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::tests::{sample_file, SAMPLE};
    use crate::store::{MemoryRecordStore, Schema};
    use crate::types::{Category, FlagState, InfoKind};

    fn memory_ledger() -> (Ledger, Arc<MemoryRecordStore>) {
        let store = Arc::new(MemoryRecordStore::from_csv(SAMPLE, &Schema::default()).unwrap());
        let ledger = Ledger::with_store(store.clone(), Config::default()).unwrap();
        (ledger, store)
    }

    #[tokio::test]
    async fn test_ledger_open() {
        let (store, dir) = sample_file();
        let mut config = Config::default();
        config.store_path = store.path().to_path_buf();

        let ledger = Ledger::open(config).await.unwrap();
        assert_eq!(ledger.metrics().records.get(), 3);
        ledger.shutdown().await.unwrap();
        drop(dir);
    }

    #[test]
    fn test_with_store_outside_runtime_fails() {
        let store = Arc::new(MemoryRecordStore::from_csv(SAMPLE, &Schema::default()).unwrap());
        let err = Ledger::with_store(store, Config::default()).err().unwrap();
        assert!(matches!(err, Error::Concurrency(_)));
    }

    #[tokio::test]
    async fn test_open_missing_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.store_path = dir.path().join("missing.csv");

        let err = Ledger::open(config).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }

    #[tokio::test]
    async fn test_check_ticket_priority() {
        let (ledger, _) = memory_ledger();

        let partner = ledger.check_ticket(&TicketCode::new("A002")).await.unwrap();
        assert_eq!(partner.kind, InfoKind::Partner);
        assert_eq!(partner.info, "Caritas");

        let card = ledger.check_ticket(&TicketCode::new("A003")).await.unwrap();
        assert_eq!(card.kind, InfoKind::Card);

        let age = ledger.check_ticket(&TicketCode::new("A001")).await.unwrap();
        assert_eq!(age.kind, InfoKind::Age);
        assert_eq!(age.info, "34");
    }

    #[tokio::test]
    async fn test_check_unknown_ticket() {
        let (ledger, _) = memory_ledger();
        let err = ledger.check_ticket(&TicketCode::new("NOPE")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_check_ticket_without_info() {
        let text = format!("{}B001,Blank,,,,Non,Non,Non,Non,Uvira\n", SAMPLE);
        let store = Arc::new(MemoryRecordStore::from_csv(&text, &Schema::default()).unwrap());
        let ledger = Ledger::with_store(store, Config::default()).unwrap();

        let err = ledger.check_ticket(&TicketCode::new("B001")).await.unwrap_err();
        assert!(matches!(err, Error::NoBeneficiaryInfo(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_empty_code_rejected() {
        let (ledger, _) = memory_ledger();
        let err = ledger
            .record_distribution(&TicketCode::new("  "), DistributionRequest::done(&[Category::Nfi]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = ledger.check_ticket(&TicketCode::new("")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_merge_reports_effective_update() {
        let (ledger, store) = memory_ledger();
        let code = TicketCode::new("A001");

        let receipt = ledger
            .record_distribution(&code, DistributionRequest::done(&[Category::Nfi, Category::Tools]))
            .await
            .unwrap();
        assert_eq!(receipt.applied, vec![Category::Nfi, Category::Tools]);

        let record = store.load_all().unwrap().find(&code).unwrap();
        assert_eq!(record.flags.token_distributed, FlagState::Done);
        assert_eq!(record.flags.nfi, FlagState::Done);
        assert_eq!(record.flags.tools, FlagState::Done);
        assert_eq!(record.flags.seed, FlagState::Pending);
    }

    #[tokio::test]
    async fn test_second_submission_is_noop() {
        let (ledger, store) = memory_ledger();
        let code = TicketCode::new("A002");
        let request = DistributionRequest::done(&[Category::Token, Category::Seed]);

        ledger.record_distribution(&code, request).await.unwrap();
        let after_first = store.to_csv();

        let err = ledger.record_distribution(&code, request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoOpUpdate(NoOpReason::NothingToUpdate));
        assert_eq!(store.to_csv(), after_first);
    }

    #[tokio::test]
    async fn test_fully_served_rejects_everything() {
        let (ledger, store) = memory_ledger();
        let code = TicketCode::new("A003");
        let before = store.to_csv();

        for request in [
            DistributionRequest::default(),
            DistributionRequest::done(&[Category::Seed]),
            DistributionRequest::default().with(Category::Nfi, FlagState::Pending),
        ] {
            let err = ledger.record_distribution(&code, request).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NoOpUpdate(NoOpReason::AlreadyServed));
        }
        assert_eq!(store.to_csv(), before);
    }

    #[tokio::test]
    async fn test_empty_request_is_nothing_to_update() {
        let (ledger, _) = memory_ledger();
        let err = ledger
            .record_distribution(&TicketCode::new("A001"), DistributionRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoOpUpdate(NoOpReason::NothingToUpdate));
    }

    #[tokio::test]
    async fn test_unknown_ticket_not_written() {
        let (ledger, store) = memory_ledger();
        let before = store.to_csv();
        let err = ledger
            .record_distribution(&TicketCode::new("Z999"), DistributionRequest::done(&[Category::Nfi]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert_eq!(store.to_csv(), before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_are_not_lost() {
        let (store, dir) = sample_file();
        let mut rows = String::from(SAMPLE);
        for i in 0..40 {
            rows.push_str(&format!("C{:03},Beneficiary {},30,,,Non,Non,Non,Non,Uvira\n", i, i));
        }
        std::fs::write(store.path(), rows).unwrap();

        let mut config = Config::default();
        config.store_path = store.path().to_path_buf();
        let ledger = Arc::new(Ledger::open(config).await.unwrap());

        let mut tasks = Vec::new();
        for i in 0..40 {
            let ledger = ledger.clone();
            tasks.push(tokio::spawn(async move {
                let category = Category::ALL[i % 4];
                ledger
                    .record_distribution(
                        &TicketCode::new(format!("C{:03}", i)),
                        DistributionRequest::done(&[category]),
                    )
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let table = store.load_all().unwrap();
        for i in 0..40 {
            let record = table.find(&TicketCode::new(format!("C{:03}", i))).unwrap();
            assert_eq!(record.flags.get(Category::ALL[i % 4]), FlagState::Done);
            assert_eq!(record.flags.done_categories().len(), 1);
        }
        assert_eq!(ledger.metrics().distributions.get(), 40);

        ledger.shutdown().await.unwrap();
        drop(dir);
    }

    #[tokio::test]
    async fn test_summary_and_listing() {
        let (ledger, _) = memory_ledger();
        let summary = ledger.summary().await.unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.fully_served, 1);
        assert_eq!(summary.token_distributed, 2);

        let records = ledger.list_records().await.unwrap();
        let codes: Vec<&str> = records.iter().map(|r| r.ticket_code.as_str()).collect();
        assert_eq!(codes, vec!["A001", "A002", "A003"]);
    }
}
