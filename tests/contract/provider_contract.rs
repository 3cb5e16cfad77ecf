use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::executor::block_on;
use tickerlens_core::{
    Bar, BarsRequest, DataSource, EarningsCalendar, FixtureInstrument, FixtureSource, HttpClient,
    HttpError, HttpRequest, HttpResponse, InstrumentInfo, ProviderId, RetryPolicy,
    SourceErrorKind, Symbol, YahooAdapter, YahooConfig,
};
use time::macros::date;
use time::UtcOffset;

const AAPL_SUMMARY: &str = r#"{"quoteSummary":{"result":[{
    "price": {"regularMarketPrice": {"raw": 190.5}, "longName": "Apple Inc.", "shortName": "Apple"},
    "summaryDetail": {"volume": {"raw": 52000000}, "beta": {"raw": 1.25}, "trailingPE": {"raw": 29.4}},
    "defaultKeyStatistics": {"trailingEps": {"raw": 6.43}, "bookValue": {"raw": 4.4}}
}],"error":null}}"#;

// 2024-05-31 and 2024-06-03 at 13:30 UTC.
const AAPL_CHART: &str = r#"{"chart":{"result":[{
    "meta": {"gmtoffset": -14400},
    "timestamp": [1717421400, 1717162200],
    "indicators": {"quote": [{
        "open": [193.0, 191.0], "high": [195.0, 192.5], "low": [192.0, 190.0],
        "close": [194.0, 192.2], "volume": [50000000, 48000000]
    }]}
}],"error":null}}"#;

const AAPL_CALENDAR: &str = r#"{"quoteSummary":{"result":[{
    "calendarEvents": {"earnings": {"earningsDate": [{"raw": 1721908800}]}}
}],"error":null}}"#;

const NOT_FOUND_SUMMARY: &str = r#"{"quoteSummary":{"result":null,
    "error":{"code":"Not Found","description":"Quote not found"}}}"#;

const NOT_FOUND_CHART: &str = r#"{"chart":{"result":null,
    "error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;

/// Answers Yahoo endpoints by URL, the way the live service would for AAPL
/// and an unknown ticker.
struct YahooRoutes;

impl HttpClient for YahooRoutes {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let url = request.full_url();
        let response = if url.contains("fc.yahoo.com") {
            HttpResponse::new(404, "")
        } else if url.contains("/getcrumb") {
            HttpResponse::ok("contract-crumb")
        } else if url.contains("/quoteSummary/AAPL?modules=calendarEvents") {
            HttpResponse::ok(AAPL_CALENDAR)
        } else if url.contains("/quoteSummary/AAPL?") {
            HttpResponse::ok(AAPL_SUMMARY)
        } else if url.contains("/chart/AAPL?") {
            HttpResponse::ok(AAPL_CHART)
        } else if url.contains("/chart/") {
            HttpResponse::new(404, NOT_FOUND_CHART)
        } else {
            HttpResponse::new(404, NOT_FOUND_SUMMARY)
        };
        Box::pin(async move { Ok(response) })
    }
}

fn fixture_source() -> FixtureSource {
    let bar = |day, close| Bar::new(day, close, close, close, close, None).expect("valid bar");
    FixtureSource::new().with_instrument(
        symbol("AAPL"),
        FixtureInstrument {
            info: InstrumentInfo {
                regular_market_price: Some(190.5),
                long_name: Some("Apple Inc.".to_owned()),
                ..InstrumentInfo::default()
            },
            bars: vec![bar(date!(2024 - 06 - 03), 194.0), bar(date!(2024 - 05 - 31), 192.2)],
            calendar: EarningsCalendar::SingleDate(date!(2024 - 07 - 25)),
            ..FixtureInstrument::default()
        },
    )
}

struct ProviderCase {
    id: ProviderId,
    source: Arc<dyn DataSource>,
}

fn provider_cases() -> Vec<ProviderCase> {
    let yahoo_config = YahooConfig {
        retry: RetryPolicy::no_retry(),
        utc_offset: UtcOffset::UTC,
        ..YahooConfig::default()
    };
    vec![
        ProviderCase {
            id: ProviderId::Fixture,
            source: Arc::new(fixture_source()),
        },
        ProviderCase {
            id: ProviderId::Yahoo,
            source: Arc::new(YahooAdapter::new(Arc::new(YahooRoutes), yahoo_config)),
        },
    ]
}

fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

#[test]
fn providers_identify_themselves() {
    for case in provider_cases() {
        assert_eq!(case.source.id(), case.id);
    }
}

#[test]
fn known_instrument_has_price_or_name_for_all_providers() {
    for case in provider_cases() {
        let info = block_on(case.source.instrument_info(&symbol("AAPL")))
            .unwrap_or_else(|error| panic!("provider '{}' info failed: {error}", case.id));
        assert!(info.is_known(), "provider '{}': known instrument", case.id);
        assert_eq!(info.regular_market_price, Some(190.5), "provider '{}'", case.id);
        assert_eq!(info.display_name(), Some("Apple Inc."), "provider '{}'", case.id);
    }
}

#[test]
fn unknown_instrument_is_not_found_for_all_providers() {
    for case in provider_cases() {
        let error = block_on(case.source.instrument_info(&symbol("ZZZZ")))
            .expect_err("unknown instrument must fail");
        assert_eq!(
            error.kind(),
            SourceErrorKind::NotFound,
            "provider '{}': {error}",
            case.id
        );
    }
}

#[test]
fn daily_bars_are_oldest_first_for_all_providers() {
    for case in provider_cases() {
        let request = BarsRequest::new(symbol("AAPL"), 5).expect("valid request");
        let series = block_on(case.source.daily_bars(request))
            .unwrap_or_else(|error| panic!("provider '{}' bars failed: {error}", case.id));

        assert_eq!(series.symbol, symbol("AAPL"));
        assert_eq!(series.bars.len(), 2, "provider '{}': bar count", case.id);
        assert!(
            series.bars.windows(2).all(|pair| pair[0].date < pair[1].date),
            "provider '{}': bars must be sorted",
            case.id
        );
        assert_eq!(series.latest_close(), Some(194.0), "provider '{}'", case.id);
    }
}

#[test]
fn earnings_calendar_reports_upcoming_date_for_all_providers() {
    for case in provider_cases() {
        let calendar = block_on(case.source.earnings_calendar(&symbol("AAPL")))
            .unwrap_or_else(|error| panic!("provider '{}' calendar failed: {error}", case.id));
        assert_eq!(
            calendar.dates(),
            &[date!(2024 - 07 - 25)],
            "provider '{}'",
            case.id
        );
    }
}
