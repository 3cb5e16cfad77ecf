use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, warn};

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::data_source::{BarsRequest, DataSource, SourceError, SourceFuture};
use crate::domain::{date_from_unix, date_from_unix_at, local_offset};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::retry::RetryPolicy;
use crate::{Bar, BarSeries, EarningsCalendar, InstrumentInfo, ProviderId, Symbol};

const REFERER: &str = "https://finance.yahoo.com/";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const INFO_MODULES: &str = "price,summaryDetail,defaultKeyStatistics";
const CALENDAR_MODULES: &str = "calendarEvents";
const SECONDS_PER_DAY: i64 = 86_400;

/// Tunables for the Yahoo adapter.
#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
    pub circuit_breaker: CircuitBreakerConfig,
    /// Session cookie to send instead of the one negotiated on `fc.yahoo.com`.
    pub cookie: Option<String>,
    /// How long a crumb is reused before it is fetched again.
    pub crumb_ttl: Duration,
    /// Offset at which earnings timestamps become calendar dates. Keep it in
    /// line with whatever supplies "today" for the aggregator.
    pub utc_offset: UtcOffset,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retry: RetryPolicy::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            cookie: None,
            crumb_ttl: Duration::from_secs(3_600),
            utc_offset: local_offset(),
        }
    }
}

// ============================================================================
// Crumb cache - Yahoo query endpoints require a session cookie plus a crumb
// ============================================================================

#[derive(Debug, Clone)]
struct CachedCrumb {
    value: String,
    fetched_at: Instant,
}

/// Caches the Yahoo crumb token.
///
/// The async mutex is held across the refresh so concurrent lookups wait for
/// one negotiation instead of each starting their own.
#[derive(Debug, Default)]
struct CrumbCache {
    slot: tokio::sync::Mutex<Option<CachedCrumb>>,
}

impl CrumbCache {
    async fn get(
        &self,
        http_client: &dyn HttpClient,
        config: &YahooConfig,
    ) -> Result<String, SourceError> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.fetched_at.elapsed() < config.crumb_ttl {
                return Ok(cached.value.clone());
            }
        }

        let value = fetch_crumb(http_client, config).await?;
        *slot = Some(CachedCrumb {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}

async fn fetch_crumb(
    http_client: &dyn HttpClient,
    config: &YahooConfig,
) -> Result<String, SourceError> {
    debug!("negotiating yahoo session crumb");

    // fc.yahoo.com answers 404 but sets the session cookie in the jar.
    if config.cookie.is_none() {
        let cookie_request = HttpRequest::get(COOKIE_URL)
            .with_header("referer", REFERER)
            .with_timeout_ms(config.timeout_ms);
        http_client.execute(cookie_request).await.map_err(|e| {
            SourceError::unavailable(format!("failed to fetch yahoo cookie: {}", e.message()))
        })?;
    }

    for endpoint in CRUMB_URLS {
        let request = HttpRequest::get(endpoint)
            .with_header("referer", REFERER)
            .with_cookie(config.cookie.as_deref())
            .with_timeout_ms(config.timeout_ms);

        let response = match http_client.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                debug!(endpoint, error = %error, "crumb endpoint failed");
                continue;
            }
        };

        if response.status == 429 {
            return Err(SourceError::rate_limited(
                "yahoo rate limited while fetching crumb",
            ));
        }
        if !response.is_success() {
            continue;
        }

        let body = response.body.trim();
        if is_plausible_crumb(body) {
            return Ok(body.to_owned());
        }
    }

    Err(SourceError::unavailable(
        "failed to fetch yahoo crumb from all endpoints",
    ))
}

fn is_plausible_crumb(body: &str) -> bool {
    !body.is_empty()
        && body.len() < 100
        && !body.contains(char::is_whitespace)
        && !body.contains('<')
        && !body.to_ascii_lowercase().contains("too many requests")
}

// ============================================================================
// Yahoo Adapter
// ============================================================================

/// Live Yahoo Finance adapter.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    config: YahooConfig,
    crumb: Arc<CrumbCache>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, config: YahooConfig) -> Self {
        let circuit_breaker = Arc::new(CircuitBreaker::new(
            ProviderId::Yahoo,
            config.circuit_breaker,
        ));
        Self {
            http_client,
            config,
            crumb: Arc::new(CrumbCache::default()),
            circuit_breaker,
        }
    }

    /// GET a crumb-authenticated Yahoo endpoint through the breaker.
    ///
    /// Returns the final response, which may be a 404 carrying Yahoo's
    /// "not found" payload; every other non-2xx status is an error.
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, SourceError> {
        self.circuit_breaker.acquire()?;

        let result = self.get_with_retry(&request).await;
        self.circuit_breaker.record(&result);
        result
    }

    async fn get_with_retry(&self, template: &HttpRequest) -> Result<HttpResponse, SourceError> {
        let policy = &self.config.retry;
        let mut attempt = 0_u32;
        let mut auth_refreshed = false;

        loop {
            let crumb = match self.crumb.get(self.http_client.as_ref(), &self.config).await {
                Ok(crumb) => crumb,
                Err(error) if error.retryable() && attempt < policy.max_retries => {
                    self.back_off(&mut attempt, &error).await;
                    continue;
                }
                Err(error) => return Err(error),
            };
            let request = template
                .clone()
                .with_query("crumb", crumb)
                .with_header("referer", REFERER)
                .with_cookie(self.config.cookie.as_deref())
                .with_timeout_ms(self.config.timeout_ms);

            let failure = match self.http_client.execute(request).await {
                Ok(response) if response.is_success() || response.status == 404 => {
                    return Ok(response);
                }
                Ok(response) if matches!(response.status, 401 | 429) && !auth_refreshed => {
                    debug!(status = response.status, "yahoo rejected crumb; refreshing");
                    self.crumb.invalidate().await;
                    auth_refreshed = true;
                    continue;
                }
                Ok(response) => {
                    if !policy.should_retry_status(response.status) {
                        return Err(status_error(response.status));
                    }
                    status_error(response.status)
                }
                Err(error) => {
                    let source_error = SourceError::unavailable(format!(
                        "yahoo transport error: {}",
                        error.message()
                    ));
                    if !policy.should_retry_error(&error) {
                        return Err(source_error);
                    }
                    source_error
                }
            };

            if attempt >= policy.max_retries {
                return Err(failure);
            }
            self.back_off(&mut attempt, &failure).await;
        }
    }

    async fn back_off(&self, attempt: &mut u32, failure: &SourceError) {
        let delay = self.config.retry.delay_for_attempt(*attempt);
        *attempt += 1;
        warn!(
            attempt = *attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %failure,
            "retrying yahoo request"
        );
        tokio::time::sleep(delay).await;
    }

    fn quote_summary_request(symbol: &Symbol, modules: &str) -> HttpRequest {
        HttpRequest::get(format!(
            "{QUOTE_SUMMARY_URL}/{}",
            urlencoding::encode(symbol.as_str())
        ))
        .with_query("modules", modules)
    }

    async fn fetch_instrument_info(&self, symbol: &Symbol) -> Result<InstrumentInfo, SourceError> {
        let response = self
            .get(Self::quote_summary_request(symbol, INFO_MODULES))
            .await?;
        parse_instrument_info(symbol, &response.body)
    }

    async fn fetch_daily_bars(&self, req: &BarsRequest) -> Result<BarSeries, SourceError> {
        let period2 = OffsetDateTime::now_utc().unix_timestamp();
        let period1 = period2 - i64::from(req.lookback_days) * SECONDS_PER_DAY;
        let request = HttpRequest::get(format!(
            "{CHART_URL}/{}",
            urlencoding::encode(req.symbol.as_str())
        ))
        .with_query("period1", period1)
        .with_query("period2", period2)
        .with_query("interval", "1d");

        let response = self.get(request).await?;
        parse_daily_bars(&req.symbol, &response.body)
    }

    async fn fetch_earnings_calendar(
        &self,
        symbol: &Symbol,
    ) -> Result<EarningsCalendar, SourceError> {
        let response = self
            .get(Self::quote_summary_request(symbol, CALENDAR_MODULES))
            .await?;
        parse_earnings_calendar(symbol, &response.body, self.config.utc_offset)
    }
}

impl DataSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn instrument_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, InstrumentInfo> {
        Box::pin(self.fetch_instrument_info(symbol))
    }

    fn daily_bars<'a>(&'a self, req: BarsRequest) -> SourceFuture<'a, BarSeries> {
        Box::pin(async move { self.fetch_daily_bars(&req).await })
    }

    fn earnings_calendar<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, EarningsCalendar> {
        Box::pin(self.fetch_earnings_calendar(symbol))
    }
}

fn status_error(status: u16) -> SourceError {
    match status {
        429 => SourceError::rate_limited("yahoo returned status 429"),
        400..=499 => SourceError::invalid_request(format!("yahoo returned status {status}")),
        _ => SourceError::unavailable(format!("yahoo returned status {status}")),
    }
}

fn api_error(symbol: &Symbol, error: YahooApiError) -> SourceError {
    let description = error.description.unwrap_or_default();
    if error.code.eq_ignore_ascii_case("not found") {
        SourceError::not_found(format!("yahoo has no instrument '{symbol}': {description}"))
    } else {
        SourceError::unavailable(format!(
            "yahoo API error for '{symbol}': {} {description}",
            error.code
        ))
    }
}

// ============================================================================
// Response parsing
// ============================================================================

fn parse_quote_summary(symbol: &Symbol, body: &str) -> Result<YahooQuoteSummaryResult, SourceError> {
    let response: YahooQuoteSummaryResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::internal(format!("failed to parse yahoo quoteSummary: {e}"))
    })?;

    if let Some(error) = response.quote_summary.error {
        return Err(api_error(symbol, error));
    }

    response
        .quote_summary
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::not_found(format!("yahoo returned no data for '{symbol}'")))
}

fn parse_instrument_info(symbol: &Symbol, body: &str) -> Result<InstrumentInfo, SourceError> {
    let result = parse_quote_summary(symbol, body)?;
    let price = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();

    Ok(InstrumentInfo {
        regular_market_price: raw_f64(&price.regular_market_price),
        long_name: non_empty(price.long_name),
        short_name: non_empty(price.short_name),
        volume: raw_u64(&detail.volume).or_else(|| raw_u64(&price.regular_market_volume)),
        market_cap: raw_f64(&price.market_cap).or_else(|| raw_f64(&detail.market_cap)),
        beta: raw_f64(&detail.beta).or_else(|| raw_f64(&stats.beta)),
        trailing_pe: raw_f64(&detail.trailing_pe),
        trailing_eps: raw_f64(&stats.trailing_eps),
        book_value: raw_f64(&stats.book_value),
    })
}

fn parse_daily_bars(symbol: &Symbol, body: &str) -> Result<BarSeries, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(api_error(symbol, error));
    }

    let Some(result) = response.chart.result.unwrap_or_default().into_iter().next() else {
        return Ok(BarSeries::new(symbol.clone(), Vec::new()));
    };

    let gmt_offset = result.meta.and_then(|meta| meta.gmtoffset).unwrap_or(0);
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let bars = timestamps
        .iter()
        .enumerate()
        .filter_map(|(index, ts)| {
            let close = value_at(&quote.close, index)?;
            let date = date_from_unix(ts + gmt_offset)?;
            let open = value_at(&quote.open, index).unwrap_or(close);
            let high = value_at(&quote.high, index).unwrap_or(close);
            let low = value_at(&quote.low, index).unwrap_or(close);
            let volume = quote
                .volume
                .get(index)
                .copied()
                .flatten()
                .and_then(|v| u64::try_from(v).ok());
            Bar::new(date, open, high, low, close, volume).ok()
        })
        .collect();

    Ok(BarSeries::new(symbol.clone(), bars))
}

fn parse_earnings_calendar(
    symbol: &Symbol,
    body: &str,
    offset: UtcOffset,
) -> Result<EarningsCalendar, SourceError> {
    let result = parse_quote_summary(symbol, body)?;
    let dates = result
        .calendar_events
        .and_then(|events| events.earnings)
        .map(|earnings| earnings.earnings_date)
        .unwrap_or_default()
        .iter()
        .filter_map(YahooRawValue::as_f64)
        .filter_map(|seconds| date_from_unix_at(seconds as i64, offset))
        .collect();

    Ok(EarningsCalendar::from_dates(dates))
}

fn value_at(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten().filter(|v| v.is_finite())
}

fn raw_f64(value: &Option<YahooRawValue>) -> Option<f64> {
    value.as_ref().and_then(YahooRawValue::as_f64)
}

fn raw_u64(value: &Option<YahooRawValue>) -> Option<u64> {
    raw_f64(value)
        .filter(|v| *v >= 0.0)
        .map(|v| v.round() as u64)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Yahoo Finance API response structures

#[derive(Debug, Clone, Deserialize)]
struct YahooApiError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

/// Yahoo wraps numbers as `{ "raw": 1.0, "fmt": "1.00" }`, sends `{}` for
/// missing values and occasionally a string such as `"Infinity"`.
#[derive(Debug, Clone, Default, Deserialize)]
struct YahooRawValue {
    #[serde(default)]
    raw: Option<serde_json::Value>,
}

impl YahooRawValue {
    fn as_f64(&self) -> Option<f64> {
        self.raw
            .as_ref()
            .and_then(serde_json::Value::as_f64)
            .filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: YahooQuoteSummaryData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryData {
    #[serde(default)]
    result: Option<Vec<YahooQuoteSummaryResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct YahooQuoteSummaryResult {
    price: Option<YahooPriceModule>,
    summary_detail: Option<YahooSummaryDetailModule>,
    default_key_statistics: Option<YahooKeyStatisticsModule>,
    calendar_events: Option<YahooCalendarEventsModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct YahooPriceModule {
    regular_market_price: Option<YahooRawValue>,
    regular_market_volume: Option<YahooRawValue>,
    market_cap: Option<YahooRawValue>,
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct YahooSummaryDetailModule {
    volume: Option<YahooRawValue>,
    market_cap: Option<YahooRawValue>,
    beta: Option<YahooRawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<YahooRawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct YahooKeyStatisticsModule {
    beta: Option<YahooRawValue>,
    trailing_eps: Option<YahooRawValue>,
    book_value: Option<YahooRawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct YahooCalendarEventsModule {
    earnings: Option<YahooEarningsEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct YahooEarningsEvent {
    earnings_date: Vec<YahooRawValue>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct YahooChartQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpError, HttpErrorKind};
    use crate::retry::Backoff;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use time::macros::date;

    const GTLB_SUMMARY: &str = r#"{
        "quoteSummary": {
            "result": [{
                "price": {
                    "regularMarketPrice": {"raw": 52.31, "fmt": "52.31"},
                    "regularMarketVolume": {"raw": 1800000, "fmt": "1.8M"},
                    "marketCap": {"raw": 8300000000, "fmt": "8.3B"},
                    "longName": "GitLab Inc.",
                    "shortName": "GitLab Inc."
                },
                "summaryDetail": {
                    "volume": {"raw": 2100000, "fmt": "2.1M"},
                    "beta": {"raw": 0.62, "fmt": "0.62"},
                    "trailingPE": {}
                },
                "defaultKeyStatistics": {
                    "trailingEps": {"raw": -0.85, "fmt": "-0.85"},
                    "bookValue": {"raw": 4.9, "fmt": "4.90"}
                }
            }],
            "error": null
        }
    }"#;

    const NOT_FOUND_SUMMARY: &str = r#"{
        "quoteSummary": {
            "result": null,
            "error": {"code": "Not Found", "description": "Quote not found for symbol: ZZZZ"}
        }
    }"#;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    #[test]
    fn parses_instrument_info_with_fallbacks() {
        let info = parse_instrument_info(&symbol("GTLB"), GTLB_SUMMARY).expect("must parse");

        assert_eq!(info.regular_market_price, Some(52.31));
        assert_eq!(info.long_name.as_deref(), Some("GitLab Inc."));
        assert_eq!(info.volume, Some(2_100_000));
        assert_eq!(info.market_cap, Some(8_300_000_000.0));
        assert_eq!(info.beta, Some(0.62));
        assert_eq!(info.trailing_pe, None, "empty wrapper means absent");
        assert_eq!(info.trailing_eps, Some(-0.85));
        assert_eq!(info.book_value, Some(4.9));
    }

    #[test]
    fn non_numeric_raw_values_are_absent() {
        let body = r#"{"quoteSummary":{"result":[{
            "summaryDetail": {"trailingPE": {"raw": "Infinity", "fmt": "∞"}},
            "price": {"shortName": "Fund"}
        }],"error":null}}"#;
        let info = parse_instrument_info(&symbol("FUND"), body).expect("must parse");
        assert_eq!(info.trailing_pe, None);
        assert!(info.is_known());
    }

    #[test]
    fn not_found_payload_maps_to_not_found_error() {
        let error =
            parse_instrument_info(&symbol("ZZZZ"), NOT_FOUND_SUMMARY).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::NotFound);
    }

    #[test]
    fn parses_daily_bars_in_exchange_time() {
        // 2024-06-03 and 2024-06-04 13:30 UTC, New York offset -4h.
        let body = r#"{"chart":{"result":[{
            "meta": {"gmtoffset": -14400},
            "timestamp": [1717421400, 1717507800],
            "indicators": {"quote": [{
                "open": [190.0, 194.6],
                "high": [194.9, 195.3],
                "low": [189.5, 193.0],
                "close": [194.0, null],
                "volume": [50000000, null]
            }]}
        }],"error":null}}"#;

        let series = parse_daily_bars(&symbol("AAPL"), body).expect("must parse");
        assert_eq!(series.bars.len(), 1, "bar without close is dropped");
        assert_eq!(series.bars[0].date, date!(2024 - 06 - 03));
        assert_eq!(series.latest_close(), Some(194.0));
    }

    #[test]
    fn parses_earnings_dates_from_calendar_events() {
        let body = r#"{"quoteSummary":{"result":[{
            "calendarEvents": {"earnings": {"earningsDate": [
                {"raw": 1738270800, "fmt": "2025-01-30"},
                {"raw": 1893456000, "fmt": "2030-01-01"}
            ]}}
        }],"error":null}}"#;

        let calendar =
            parse_earnings_calendar(&symbol("AAPL"), body, UtcOffset::UTC).expect("must parse");
        assert_eq!(
            calendar,
            EarningsCalendar::MultipleDates(vec![date!(2025 - 01 - 30), date!(2030 - 01 - 01)])
        );
    }

    #[test]
    fn earnings_dates_follow_the_configured_offset() {
        // 2024-07-25T21:00:00Z, an after-close release seen from Sydney.
        let body = r#"{"quoteSummary":{"result":[{
            "calendarEvents": {"earnings": {"earningsDate": [{"raw": 1721941200}]}}
        }],"error":null}}"#;
        let sydney = UtcOffset::from_hms(10, 0, 0).expect("valid offset");

        let utc = parse_earnings_calendar(&symbol("AAPL"), body, UtcOffset::UTC).expect("parse");
        let local = parse_earnings_calendar(&symbol("AAPL"), body, sydney).expect("parse");

        assert_eq!(utc, EarningsCalendar::SingleDate(date!(2024 - 07 - 25)));
        assert_eq!(local, EarningsCalendar::SingleDate(date!(2024 - 07 - 26)));
    }

    #[test]
    fn missing_calendar_module_means_no_earnings_data() {
        let body = r#"{"quoteSummary":{"result":[{}],"error":null}}"#;
        let calendar =
            parse_earnings_calendar(&symbol("SPY"), body, UtcOffset::UTC).expect("must parse");
        assert_eq!(calendar, EarningsCalendar::NoEarningsData);
    }

    #[test]
    fn quote_summary_request_encodes_symbol_and_modules() {
        let request = YahooAdapter::quote_summary_request(&symbol("^GSPC"), INFO_MODULES);
        assert_eq!(
            request.full_url(),
            format!(
                "{QUOTE_SUMMARY_URL}/%5EGSPC?modules=price%2CsummaryDetail%2CdefaultKeyStatistics"
            )
        );

        let request = YahooAdapter::quote_summary_request(&symbol("m&m.ns"), CALENDAR_MODULES);
        assert_eq!(
            request.full_url(),
            format!("{QUOTE_SUMMARY_URL}/M%26M.NS?modules=calendarEvents")
        );
    }

    /// Replays canned responses in order and records requested URLs.
    struct ScriptedHttpClient {
        responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedHttpClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().expect("urls lock").clone()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.urls.lock().expect("urls lock").push(request.full_url());
            let next = self
                .responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::new(HttpErrorKind::Other, "script exhausted")));
            Box::pin(async move { next })
        }
    }

    fn fast_config() -> YahooConfig {
        YahooConfig {
            retry: RetryPolicy {
                max_retries: 1,
                backoff: Backoff::Fixed(Duration::ZERO),
                ..RetryPolicy::default()
            },
            ..YahooConfig::default()
        }
    }

    #[tokio::test]
    async fn negotiates_crumb_then_fetches_instrument_info() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::ok("crumb123")),
            Ok(HttpResponse::ok(GTLB_SUMMARY)),
        ]));
        let adapter = YahooAdapter::new(client.clone(), fast_config());

        let info = adapter
            .instrument_info(&symbol("GTLB"))
            .await
            .expect("lookup succeeds");
        assert_eq!(info.short_name.as_deref(), Some("GitLab Inc."));

        let urls = client.urls();
        assert_eq!(urls[0], COOKIE_URL);
        assert_eq!(urls[1], CRUMB_URLS[0]);
        assert!(urls[2].contains("/quoteSummary/GTLB?modules="));
        assert!(urls[2].ends_with("&crumb=crumb123"));
    }

    #[tokio::test]
    async fn unauthorized_response_refreshes_crumb_once() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::ok("stale")),
            Ok(HttpResponse::new(401, "")),
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::ok("fresh")),
            Ok(HttpResponse::ok(GTLB_SUMMARY)),
        ]));
        let adapter = YahooAdapter::new(client.clone(), fast_config());

        adapter
            .instrument_info(&symbol("GTLB"))
            .await
            .expect("lookup succeeds after refresh");
        assert!(client.urls()[5].ends_with("&crumb=fresh"));
    }

    #[tokio::test]
    async fn cookie_timeout_is_retried_before_giving_up() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Err(HttpError::new(HttpErrorKind::Timeout, "cookie timeout")),
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::ok("crumb123")),
            Ok(HttpResponse::ok(GTLB_SUMMARY)),
        ]));
        let adapter = YahooAdapter::new(client.clone(), fast_config());

        let info = adapter
            .instrument_info(&symbol("GTLB"))
            .await
            .expect("second attempt succeeds");
        assert_eq!(info.short_name.as_deref(), Some("GitLab Inc."));

        let urls = client.urls();
        assert_eq!(urls.len(), 4);
        assert_eq!(urls[0], COOKIE_URL);
        assert_eq!(urls[1], COOKIE_URL);
        assert!(urls[3].ends_with("&crumb=crumb123"));
    }

    #[tokio::test]
    async fn rate_limited_crumb_endpoint_uses_the_retry_budget() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::new(429, "Too Many Requests")),
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::new(429, "Too Many Requests")),
        ]));
        let adapter = YahooAdapter::new(client.clone(), fast_config());

        let error = adapter
            .instrument_info(&symbol("GTLB"))
            .await
            .expect_err("retries exhausted");
        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
        assert_eq!(client.urls().len(), 4, "one retry after the first negotiation");
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_reported_unavailable() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::ok("crumb")),
            Ok(HttpResponse::new(503, "")),
            Ok(HttpResponse::new(503, "")),
        ]));
        let adapter = YahooAdapter::new(client.clone(), fast_config());

        let error = adapter
            .instrument_info(&symbol("GTLB"))
            .await
            .expect_err("retries exhausted");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert_eq!(client.urls().len(), 4, "one retry after the first attempt");
    }

    #[tokio::test]
    async fn not_found_symbol_does_not_trip_breaker() {
        let mut responses = vec![Ok(HttpResponse::new(404, "")), Ok(HttpResponse::ok("c"))];
        for _ in 0..6 {
            responses.push(Ok(HttpResponse::new(404, NOT_FOUND_SUMMARY)));
        }
        let client = Arc::new(ScriptedHttpClient::new(responses));
        let adapter = YahooAdapter::new(client, fast_config());

        for _ in 0..6 {
            let error = adapter
                .instrument_info(&symbol("ZZZZ"))
                .await
                .expect_err("unknown symbol");
            assert_eq!(error.kind(), SourceErrorKind::NotFound);
        }
    }

    #[tokio::test]
    async fn breaker_opens_after_repeated_transport_failures() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::ok("crumb")),
            Err(HttpError::new(HttpErrorKind::Connect, "refused")),
            Err(HttpError::new(HttpErrorKind::Connect, "refused")),
        ]));
        let config = YahooConfig {
            retry: RetryPolicy::no_retry(),
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: 2,
                cool_down: Duration::from_secs(60),
            },
            ..YahooConfig::default()
        };
        let adapter = YahooAdapter::new(client.clone(), config);

        for _ in 0..2 {
            adapter
                .instrument_info(&symbol("MSFT"))
                .await
                .expect_err("transport failure");
        }

        let error = adapter
            .instrument_info(&symbol("MSFT"))
            .await
            .expect_err("breaker blocks");
        assert!(error.message().contains("circuit breaker is open"));
        assert_eq!(client.urls().len(), 4, "no request issued while open");
    }
}
