use std::path::PathBuf;

use neuroevo_nn::Network as _;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PredictArg {
    /// Trained model JSON file
    #[arg(long)]
    model: PathBuf,
    /// Labeled dataset JSON file (XOR truth table when omitted)
    #[arg(long)]
    dataset: Option<PathBuf>,
}

pub(crate) fn run(arg: &PredictArg) -> anyhow::Result<()> {
    let model = util::read_model_file(&arg.model)?;
    let net = model.to_network()?;
    let dataset = util::load_dataset(arg.dataset.as_deref())?;
    anyhow::ensure!(
        dataset.inputs().iter().all(|row| row.len() == net.input_len()),
        "Dataset rows must have {} inputs to match model {}",
        net.input_len(),
        model.name
    );

    let score = dataset.score(&net);
    for (input, target) in dataset.inputs().iter().zip(dataset.targets()) {
        let output = net.forward(input);
        println!("{input:?} => {:.3} (target {target})", output[0]);
    }
    eprintln!(
        "Model {} scored {score:.3} out of {}",
        model.name,
        dataset.len()
    );
    Ok(())
}
