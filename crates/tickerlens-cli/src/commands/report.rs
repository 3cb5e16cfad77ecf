use std::io::{BufRead, Write};
use std::sync::Arc;

use tickerlens_core::{Aggregator, DataSource, TickerValidator};

use crate::cli::{joined_tickers, Cli, ReportArgs};
use crate::error::CliError;
use crate::{output, prompt};

pub async fn run<R, P, W>(
    args: &ReportArgs,
    cli: &Cli,
    source: Arc<dyn DataSource>,
    validator: &TickerValidator,
    input: &mut R,
    prompt_out: &mut P,
    out: &mut W,
) -> Result<(), CliError>
where
    R: BufRead,
    P: Write,
    W: Write,
{
    let tickers = if args.tickers.is_empty() {
        prompt::prompt_until_valid(validator, input, prompt_out).await?
    } else {
        let outcome = validator.validate(&joined_tickers(&args.tickers)).await;
        if !outcome.is_complete() {
            return Err(CliError::TickersNotFound(outcome.rejected));
        }
        outcome.valid
    };

    let aggregator = Aggregator::new(source, super::aggregator_config(cli));
    let report = match cli.as_of {
        Some(as_of) => aggregator.aggregate_as_of(&tickers, as_of).await?,
        None => aggregator.aggregate(&tickers).await?,
    };

    output::render_report(out, &report, cli.format, cli.pretty)
}
