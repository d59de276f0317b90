mod analysis;
mod company;
mod market;
mod sentiment;

use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    match &cli.command {
        Command::Market => market::run().await,
        Command::Company { ticker } => company::run(ticker).await,
        Command::Sentiment => sentiment::run().await,
        Command::Analysis { ticker } => analysis::run(ticker).await,
    }
}
