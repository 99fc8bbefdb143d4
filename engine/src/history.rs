/// Cycle history persistence: `(id, timestamp, json payload)` rows into
/// PostgreSQL when a pool is configured, else a JSONL file under the data
/// directory. Write failures degrade to a log line and a counter; history
/// is never allowed to fail a cycle.
use pool_core::telemetry::HISTORY_WRITE_ERRORS_TOTAL;
use pool_core::CycleRecord;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{create_dir_all, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::{error, info};

pub struct HistoryRecorder {
    pool: Option<deadpool_postgres::Pool>,
    file: Option<Arc<Mutex<BufWriter<File>>>>,
}

impl HistoryRecorder {
    pub async fn new(database_url: Option<&str>, data_dir: &str) -> anyhow::Result<Self> {
        if let Some(url) = database_url {
            let mut cfg = deadpool_postgres::Config::new();
            cfg.url = Some(url.to_string());
            let pool = cfg.create_pool(
                Some(deadpool_postgres::Runtime::Tokio1),
                tokio_postgres::NoTls,
            )?;

            let recorder = Self { pool: Some(pool), file: None };
            recorder.init_db().await?;
            info!("History recorder writing to PostgreSQL");
            return Ok(recorder);
        }

        let dir = Path::new(data_dir);
        if !dir.exists() {
            create_dir_all(dir).await?;
        }
        let path = dir.join("cycle_history.jsonl");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        info!("History recorder writing to {}", path.display());
        Ok(Self {
            pool: None,
            file: Some(Arc::new(Mutex::new(BufWriter::new(file)))),
        })
    }

    async fn init_db(&self) -> anyhow::Result<()> {
        if let Some(pool) = &self.pool {
            let client = pool.get().await?;
            client
                .batch_execute(
                    "CREATE TABLE IF NOT EXISTS cycle_history (
                        id BIGSERIAL PRIMARY KEY,
                        cycle_id BIGINT NOT NULL,
                        recorded_at BIGINT NOT NULL,
                        payload TEXT NOT NULL
                    );
                    CREATE INDEX IF NOT EXISTS idx_cycle_history_cycle ON cycle_history (cycle_id);",
                )
                .await?;
        }
        Ok(())
    }

    /// Append one cycle row. Failures are logged and counted, not raised.
    pub async fn record_cycle(&self, record: &CycleRecord) {
        let payload = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                HISTORY_WRITE_ERRORS_TOTAL.inc();
                error!("Failed to serialize cycle record: {}", e);
                return;
            }
        };
        let recorded_at = chrono::Utc::now().timestamp();

        if let Some(pool) = &self.pool {
            let result = async {
                let client = pool.get().await?;
                client
                    .execute(
                        "INSERT INTO cycle_history (cycle_id, recorded_at, payload) VALUES ($1, $2, $3)",
                        &[&(record.cycle_id as i64), &recorded_at, &payload],
                    )
                    .await?;
                Ok::<_, anyhow::Error>(())
            }
            .await;

            if let Err(e) = result {
                HISTORY_WRITE_ERRORS_TOTAL.inc();
                error!("Failed to persist cycle {} to PostgreSQL: {}", record.cycle_id, e);
            }
            return;
        }

        if let Some(file) = &self.file {
            let mut writer = file.lock().await;
            let line = format!("{}\n", payload);
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                HISTORY_WRITE_ERRORS_TOTAL.inc();
                error!("Failed to write cycle history line: {}", e);
                return;
            }
            if let Err(e) = writer.flush().await {
                HISTORY_WRITE_ERRORS_TOTAL.inc();
                error!("Failed to flush cycle history: {}", e);
            }
        }
    }

    /// Flush and release the backing file handle on shutdown.
    pub async fn close(&self) {
        if let Some(file) = &self.file {
            let mut writer = file.lock().await;
            if let Err(e) = writer.flush().await {
                error!("Failed to flush cycle history on close: {}", e);
            }
        }
    }
}
