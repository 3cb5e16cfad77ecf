mod report;
mod validate;

use std::io::{BufRead, Write};
use std::sync::Arc;

use tickerlens_core::{
    AggregatorConfig, DataSource, FailurePolicy, FixtureSource, ReqwestHttpClient, RetryPolicy,
    TickerValidator, YahooAdapter, YahooConfig,
};
use tracing::info;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run<R, P, W>(
    cli: &Cli,
    input: &mut R,
    prompt_out: &mut P,
    out: &mut W,
) -> Result<(), CliError>
where
    R: BufRead,
    P: Write,
    W: Write,
{
    let source = build_source(cli)?;
    let validator =
        TickerValidator::new(source.clone()).with_concurrency(usize::from(cli.concurrency));

    match &cli.command {
        Command::Report(args) => {
            report::run(args, cli, source, &validator, input, prompt_out, out).await
        }
        Command::Validate(args) => validate::run(args, cli, &validator, out).await,
    }
}

fn build_source(cli: &Cli) -> Result<Arc<dyn DataSource>, CliError> {
    if let Some(path) = &cli.fixture {
        info!(path = %path.display(), "serving provider data from fixture");
        return Ok(Arc::new(FixtureSource::from_path(path)?));
    }

    let config = YahooConfig {
        timeout_ms: cli.timeout_ms,
        retry: RetryPolicy::with_max_retries(cli.retries),
        cookie: cli.yahoo_cookie.clone(),
        ..YahooConfig::default()
    };
    let http_client = Arc::new(ReqwestHttpClient::new()?);
    Ok(Arc::new(YahooAdapter::new(http_client, config)))
}

fn aggregator_config(cli: &Cli) -> AggregatorConfig {
    AggregatorConfig {
        concurrency: usize::from(cli.concurrency),
        price_lookback_days: cli.lookback_days,
        failure_policy: if cli.skip_failed {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        },
    }
}
