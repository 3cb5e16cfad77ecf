use std::io::Write;

use tickerlens_core::TickerValidator;

use crate::cli::{joined_tickers, Cli, ValidateArgs};
use crate::error::CliError;
use crate::output;

pub async fn run<W: Write>(
    args: &ValidateArgs,
    cli: &Cli,
    validator: &TickerValidator,
    out: &mut W,
) -> Result<(), CliError> {
    let outcome = validator.validate(&joined_tickers(&args.tickers)).await;
    output::render_validation(out, &outcome, cli.format, cli.pretty)?;

    if outcome.is_complete() {
        Ok(())
    } else {
        Err(CliError::TickersNotFound(outcome.rejected))
    }
}
