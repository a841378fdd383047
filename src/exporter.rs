use crate::date_range::DateRange;
use crate::error::{Error, Result};
use crate::exchange_rate::ExchangeRate;
use crate::notifier::Notifier;
use crate::storage::StorageClient;

const CONTENT_TYPE: &str = "text/csv";

pub struct Exporter {
    storage: StorageClient,
    notifier: Notifier,
}

impl Exporter {
    pub fn new(storage: StorageClient, notifier: Notifier) -> Self {
        Self { storage, notifier }
    }

    /// Uploads the records as CSV and returns the object key.
    pub async fn export(&self, records: &[ExchangeRate], range: &DateRange) -> Result<String> {
        if records.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let data = to_csv(records)?;
        let key = object_key(range);

        self.storage.upload(&key, data, CONTENT_TYPE).await?;

        self.notifier
            .notify(&format!("✅ 환율 CSV 업로드 완료: {}", self.location(&key)))
            .await?;

        Ok(key)
    }

    pub fn location(&self, key: &str) -> String {
        self.storage.location(key)
    }
}

pub fn object_key(range: &DateRange) -> String {
    format!(
        "exchange_rate/{}__{}_fxdata.csv",
        range.start_label(),
        range.end_label()
    )
}

fn to_csv(records: &[ExchangeRate]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Csv(csv::Error::from(e.into_error())))
}
