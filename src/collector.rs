use std::time::Duration;

use chrono::{Local, NaiveDate, Timelike};
use rand::Rng;
use reqwest::Client;

use crate::config::Config;
use crate::date_range::DateRange;
use crate::error::{Error, Result};
use crate::exchange_rate::ExchangeRate;
use crate::notifier::Notifier;
use crate::rates::RatesResponse;

enum DayOutcome {
    Collected(ExchangeRate),
    /// The source answered with a different day, usually a weekend or holiday.
    Mismatched(String),
    Failed(reqwest::Error),
}

pub struct RateCollector {
    client: Client,
    notifier: Notifier,
    api_base_url: String,
    base_currency: String,
    target_currency: String,
    min_delay: Duration,
    max_delay: Duration,
}

impl RateCollector {
    pub fn new(config: &Config, notifier: Notifier) -> Result<Self> {
        let client = Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self {
            client,
            notifier,
            api_base_url: config.api_base_url.clone(),
            base_currency: config.base_currency.clone(),
            target_currency: config.target_currency.clone(),
            min_delay: config.min_delay,
            max_delay: config.max_delay,
        })
    }

    /// Fetches one rate per day. Days that fail are reported and skipped.
    pub async fn collect(&self, range: &DateRange) -> Result<Vec<ExchangeRate>> {
        let mut records = Vec::new();

        for date in range.days() {
            match self.fetch_day(date).await? {
                DayOutcome::Collected(record) => {
                    log::debug!("Collected {} rate for {}: {}", self.target_currency, date, record.rate);
                    records.push(record);
                    tokio::time::sleep(self.courtesy_delay()).await;
                }
                DayOutcome::Mismatched(returned) => {
                    log::debug!("Skipping {}: source returned {}", date, returned);
                }
                DayOutcome::Failed(e) => {
                    let message = format!("⚠️ {date} 데이터 수집 오류: {e}");
                    log::warn!("{}", message);
                    self.notifier.notify(&message).await?;
                }
            }
        }

        Ok(records)
    }

    async fn fetch_day(&self, date: NaiveDate) -> Result<DayOutcome> {
        let response = match self.get_rates(date).await {
            Ok(response) => response,
            Err(e) => return Ok(DayOutcome::Failed(e)),
        };

        if response.date != date.format("%Y-%m-%d").to_string() {
            return Ok(DayOutcome::Mismatched(response.date));
        }

        let rate = response
            .rates
            .get(&self.target_currency)
            .copied()
            .ok_or_else(|| Error::MissingRate {
                date: date.to_string(),
                symbol: self.target_currency.clone(),
            })?;

        let now = Local::now().naive_local();
        let requested_at = now.with_nanosecond(0).unwrap_or(now);

        Ok(DayOutcome::Collected(ExchangeRate {
            requested_at,
            date,
            rate,
        }))
    }

    async fn get_rates(&self, date: NaiveDate) -> reqwest::Result<RatesResponse> {
        let url = self.get_url(date);
        let resp = self.client.get(&url).send().await?.error_for_status()?;

        resp.json::<RatesResponse>().await
    }

    fn get_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/{}?base={}&symbols={}",
            self.api_base_url,
            date.format("%Y-%m-%d"),
            self.base_currency,
            self.target_currency
        )
    }

    fn courtesy_delay(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::test_config;

    struct Fixture {
        api: MockServer,
        webhook: MockServer,
    }

    impl Fixture {
        async fn start() -> Self {
            Self {
                api: MockServer::start().await,
                webhook: MockServer::start().await,
            }
        }

        fn collector(&self) -> RateCollector {
            self.collector_with(|_| {})
        }

        fn collector_with(&self, adjust: impl FnOnce(&mut Config)) -> RateCollector {
            let mut config = test_config(
                &format!("{}/hook", self.webhook.uri()),
                &format!("{}/v1", self.api.uri()),
            );
            adjust(&mut config);
            let notifier = Notifier::new(&config).unwrap();
            RateCollector::new(&config, notifier).unwrap()
        }

        async fn rate(&self, requested: &str, returned: &str, krw: f64) {
            Mock::given(method("GET"))
                .and(path(format!("/v1/{requested}")))
                .and(query_param("base", "USD"))
                .and(query_param("symbols", "KRW"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "amount": 1.0,
                    "base": "USD",
                    "date": returned,
                    "rates": { "KRW": krw }
                })))
                .expect(1)
                .mount(&self.api)
                .await;
        }

        async fn failure(&self, requested: &str) {
            Mock::given(method("GET"))
                .and(path(format!("/v1/{requested}")))
                .respond_with(ResponseTemplate::new(500))
                .expect(1)
                .mount(&self.api)
                .await;
        }

        async fn respond(&self, requested: &str, template: ResponseTemplate) {
            Mock::given(method("GET"))
                .and(path(format!("/v1/{requested}")))
                .respond_with(template)
                .expect(1)
                .mount(&self.api)
                .await;
        }

        async fn expect_report_for(&self, date: &str) {
            Mock::given(method("POST"))
                .and(path("/hook"))
                .and(body_string_contains(date))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&self.webhook)
                .await;
        }

        async fn webhook_calls(&self) -> usize {
            self.webhook.received_requests().await.unwrap().len()
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_one_record_per_day_in_order() {
        let fx = Fixture::start().await;
        fx.rate("2025-10-01", "2025-10-01", 1401.5).await;
        fx.rate("2025-10-02", "2025-10-02", 1402.37).await;
        fx.rate("2025-10-03", "2025-10-03", 1398.0).await;

        let range = DateRange::parse("2025-10-01", "2025-10-03").unwrap();
        let records = fx.collector().collect(&range).await.unwrap();

        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day("2025-10-01"), day("2025-10-02"), day("2025-10-03")]);
        assert_eq!(records[1].rate, dec!(1402.37));
        assert_eq!(records[0].requested_at.nanosecond(), 0);
        assert_eq!(fx.webhook_calls().await, 0);
    }

    #[tokio::test]
    async fn test_mismatched_date_is_dropped_silently() {
        let fx = Fixture::start().await;
        fx.rate("2025-10-03", "2025-10-03", 1398.0).await;
        fx.rate("2025-10-04", "2025-10-03", 1398.0).await;
        fx.rate("2025-10-05", "2025-10-03", 1398.0).await;

        let range = DateRange::parse("2025-10-03", "2025-10-05").unwrap();
        let records = fx.collector().collect(&range).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, day("2025-10-03"));
        assert_eq!(fx.webhook_calls().await, 0);
    }

    #[tokio::test]
    async fn test_failed_day_is_reported_and_loop_continues() {
        let fx = Fixture::start().await;
        fx.rate("2025-10-01", "2025-10-01", 1401.5).await;
        fx.failure("2025-10-02").await;
        fx.rate("2025-10-03", "2025-10-03", 1398.0).await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_string_contains("2025-10-02"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&fx.webhook)
            .await;

        let range = DateRange::parse("2025-10-01", "2025-10-03").unwrap();
        let records = fx.collector().collect(&range).await.unwrap();

        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day("2025-10-01"), day("2025-10-03")]);
        assert_eq!(fx.webhook_calls().await, 1);
    }

    #[tokio::test]
    async fn test_reversed_range_makes_no_requests() {
        let fx = Fixture::start().await;

        let range = DateRange::parse("2025-10-05", "2025-10-01").unwrap();
        let records = fx.collector().collect(&range).await.unwrap();

        assert!(records.is_empty());
        assert!(fx.api.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_target_rate_aborts() {
        let fx = Fixture::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/2025-10-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "date": "2025-10-01",
                "rates": { "EUR": 0.85 }
            })))
            .mount(&fx.api)
            .await;

        let range = DateRange::parse("2025-10-01", "2025-10-01").unwrap();
        let err = fx.collector().collect(&range).await.unwrap_err();

        assert!(matches!(err, Error::MissingRate { .. }));
    }

    #[tokio::test]
    async fn test_failed_report_propagates() {
        let fx = Fixture::start().await;
        fx.failure("2025-10-01").await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&fx.webhook)
            .await;

        let range = DateRange::parse("2025-10-01", "2025-10-01").unwrap();
        let err = fx.collector().collect(&range).await.unwrap_err();

        assert!(matches!(err, Error::Notification(_)));
    }

    #[tokio::test]
    async fn test_timed_out_day_is_reported_and_loop_continues() {
        let fx = Fixture::start().await;
        fx.respond(
            "2025-10-01",
            ResponseTemplate::new(200)
                .set_body_json(json!({ "date": "2025-10-01", "rates": { "KRW": 1401.5 } }))
                .set_delay(Duration::from_secs(2)),
        )
        .await;
        fx.rate("2025-10-02", "2025-10-02", 1402.37).await;
        fx.expect_report_for("2025-10-01").await;

        let range = DateRange::parse("2025-10-01", "2025-10-02").unwrap();
        let records = fx
            .collector_with(|config| config.http_timeout = Duration::from_millis(200))
            .collect(&range)
            .await
            .unwrap();

        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day("2025-10-02")]);
        assert_eq!(fx.webhook_calls().await, 1);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_reported_and_loop_continues() {
        let fx = Fixture::start().await;
        fx.respond(
            "2025-10-01",
            ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
        )
        .await;
        fx.rate("2025-10-02", "2025-10-02", 1402.37).await;
        fx.expect_report_for("2025-10-01").await;

        let range = DateRange::parse("2025-10-01", "2025-10-02").unwrap();
        let records = fx.collector().collect(&range).await.unwrap();

        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day("2025-10-02")]);
        assert_eq!(fx.webhook_calls().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_returned_date_is_skipped_silently() {
        let fx = Fixture::start().await;
        fx.rate("2025-10-01", "not-a-date", 1401.5).await;
        fx.rate("2025-10-02", "2025-10-02", 1402.37).await;

        let range = DateRange::parse("2025-10-01", "2025-10-02").unwrap();
        let records = fx.collector().collect(&range).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, day("2025-10-02"));
        assert_eq!(fx.webhook_calls().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_courtesy_delay_only_after_stored_records() {
        let fx = Fixture::start().await;
        fx.rate("2025-10-01", "2025-10-01", 1401.5).await;
        fx.failure("2025-10-02").await;
        fx.rate("2025-10-03", "2025-10-02", 1402.37).await;
        fx.rate("2025-10-04", "2025-10-04", 1398.0).await;
        fx.expect_report_for("2025-10-02").await;
        let delay = Duration::from_millis(300);

        let range = DateRange::parse("2025-10-01", "2025-10-04").unwrap();
        let collector = fx.collector_with(|config| {
            config.min_delay = delay;
            config.max_delay = delay;
        });
        let started = tokio::time::Instant::now();
        let records = collector.collect(&range).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(records.len(), 2);
        assert!(elapsed >= delay * 2, "elapsed {elapsed:?}");
        assert!(elapsed < delay * 3, "elapsed {elapsed:?}");
    }
}
