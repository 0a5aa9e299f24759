use clap::{Parser, Subcommand};

use self::{predict::PredictArg, train::TrainArg};

mod predict;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train a network on a labeled dataset using a genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Run a trained model over a dataset
    Predict(#[clap(flatten)] PredictArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Predict(arg) => predict::run(&arg)?,
    }
    Ok(())
}
