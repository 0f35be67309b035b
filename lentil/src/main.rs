mod run_fit;
mod run_simulate;

use clap::{Parser, Subcommand};
use log::info;
use run_fit::*;
use run_simulate::*;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LENTIL",
    long_about = "Latent Dirichlet Allocation by batch and online variational Bayes\n\
		  Count data of either `.mtx` (sparse) or `.tsv`/`.csv` (dense) format,\n\
		  documents in rows unless `--docs-in-columns`."
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Simulate a corpus from the LDA generative model",
        long_about = "Sample topic-word and document-topic distributions\n\
		      from Dirichlet priors and Poisson word counts.\n"
    )]
    Simulate(SimulateArgs),

    #[command(
        about = "Fit a topic model",
        long_about = "Estimate topic-word parameters by variational Bayes:\n\
		      (1) online: mini-batch updates with a decaying step size\n\
		      (2) batch: full E-step and M-step over all the documents\n\
		      and infer document-topic parameters of the same data.\n"
    )]
    Fit(FitArgs),

    #[command(
        about = "Infer document topics with given topic-word parameters",
        long_about = "Run the E-step on new documents with topic-word\n\
		      parameters (`{out}.components.tsv.gz`) of a previous fit.\n"
    )]
    Transform(TransformArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Simulate(args) => {
            run_simulate(args)?;
        }
        Commands::Fit(args) => {
            run_fit(args)?;
        }
        Commands::Transform(args) => {
            run_transform(args)?;
        }
    }

    info!("Done");
    Ok(())
}

/// Route `log` to stderr, `info` and above if `verbose`
fn init_logger(verbose: bool) {
    if verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
}

/// Size the global rayon pool
fn init_threads(threads: Option<usize>) -> anyhow::Result<()> {
    let max_threads = threads.unwrap_or_else(num_cpus::get).max(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(max_threads)
        .build_global()?;
    info!("will use {} threads", rayon::current_num_threads());
    Ok(())
}
