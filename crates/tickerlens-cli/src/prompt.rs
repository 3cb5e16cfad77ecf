//! Interactive ticker entry.

use std::io::{BufRead, Write};

use tickerlens_core::{Symbol, TickerValidator};
use tracing::debug;

use crate::error::CliError;

pub const PROMPT: &str = "Enter your portfolio tickers separated by a comma (e.g., AAPL,GOOGL): ";

/// Ask for a ticker list until every entry is found.
///
/// A round with any unknown ticker is reported and the whole list is asked
/// for again. There is no attempt limit; end of input is
/// [`CliError::InputClosed`].
pub async fn prompt_until_valid<R, W>(
    validator: &TickerValidator,
    input: &mut R,
    output: &mut W,
) -> Result<Vec<Symbol>, CliError>
where
    R: BufRead,
    W: Write,
{
    let mut round = 0_u32;
    loop {
        round += 1;
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(CliError::InputClosed);
        }

        let outcome = validator.validate(line.trim_end_matches(['\r', '\n'])).await;
        debug!(round, complete = outcome.is_complete(), "prompt round validated");
        if outcome.is_complete() {
            let accepted: Vec<&str> = outcome.valid.iter().map(Symbol::as_str).collect();
            writeln!(output, "All tickers are valid: {}", accepted.join(", "))?;
            return Ok(outcome.valid);
        }

        writeln!(
            output,
            "The following tickers were not found: {}",
            outcome.rejected.join(", ")
        )?;
        writeln!(output, "Please review them and try again.")?;
    }
}
