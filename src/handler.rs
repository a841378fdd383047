use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::collector::RateCollector;
use crate::config::Config;
use crate::date_range::DateRange;
use crate::error::Result;
use crate::exporter::Exporter;
use crate::notifier::Notifier;
use crate::storage::StorageClient;

pub const DEFAULT_START_DATE: &str = "2025-10-01";
pub const DEFAULT_END_DATE: &str = "2025-10-05";

/// Invocation input. Both fields are `YYYY-MM-DD` strings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Event {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl Response {
    fn ok(key: &str, record_count: usize) -> Self {
        Self {
            status_code: 200,
            body: json!({
                "message": "실행 완료",
                "s3_path": key,
                "record_count": record_count,
            })
            .to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            status_code: 500,
            body: json!({ "error": message }).to_string(),
        }
    }
}

struct Summary {
    key: String,
    record_count: usize,
}

pub struct Handler {
    notifier: Notifier,
    collector: RateCollector,
    exporter: Exporter,
}

impl Handler {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_storage(config, StorageClient::s3(&config.bucket_name)?)
    }

    pub fn with_storage(config: &Config, storage: StorageClient) -> Result<Self> {
        let notifier = Notifier::new(config)?;

        Ok(Self {
            collector: RateCollector::new(config, notifier.clone())?,
            exporter: Exporter::new(storage, notifier.clone()),
            notifier,
        })
    }

    pub async fn handle(&self, event: Event) -> Response {
        match self.run(event).await {
            Ok(summary) => Response::ok(&summary.key, summary.record_count),
            Err(e) => {
                let message = e.to_string();
                log::error!("Run failed: {}", message);
                let report = format!("❌ 실행 오류: {message}");
                if let Err(notify_err) = self.notifier.notify(&report).await {
                    log::error!("Could not report failure: {}", notify_err);
                }
                Response::error(&message)
            }
        }
    }

    async fn run(&self, event: Event) -> Result<Summary> {
        let start = event.start_date.as_deref().unwrap_or(DEFAULT_START_DATE);
        let end = event.end_date.as_deref().unwrap_or(DEFAULT_END_DATE);
        log::info!("Collecting rates from {} to {}", start, end);

        self.notifier.notify("🚀 환율 수집 작업을 시작합니다.").await?;

        let range = DateRange::parse(start, end)?;
        let records = self.collector.collect(&range).await?;
        let key = self.exporter.export(&records, &range).await?;

        let text = format!("🎯 작업 완료: {}건 수집됨", records.len());
        self.notifier
            .notify_with_blocks(&text, &self.summary_blocks(&range, &key, records.len()))
            .await?;

        log::info!("Stored {} records at {}", records.len(), key);

        Ok(Summary {
            key,
            record_count: records.len(),
        })
    }

    fn summary_blocks(&self, range: &DateRange, key: &str, record_count: usize) -> Value {
        json!([{
            "type": "section",
            "fields": [
                {
                    "type": "mrkdwn",
                    "text": format!("*기간*\n{} ~ {}", range.start_label(), range.end_label()),
                },
                { "type": "mrkdwn", "text": format!("*건수*\n{record_count}") },
                { "type": "mrkdwn", "text": format!("*위치*\n{}", self.exporter.location(key)) },
            ]
        }])
    }
}
