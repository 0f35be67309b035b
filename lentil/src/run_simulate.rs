use crate::{init_logger, init_threads};
use clap::Args;
use lentil::simulate::{generate_lda_data_mtx, SimArgs};
use log::info;
use matrix_util::common_io::mkdir;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[arg(long, default_value_t = 1000, help = "Number of documents")]
    docs: usize,

    #[arg(long, default_value_t = 500, help = "Vocabulary size")]
    words: usize,

    #[arg(long, short = 'k', default_value_t = 5, help = "Number of topics")]
    topics: usize,

    #[arg(
        long,
        default_value_t = 200,
        help = "Expected number of words per document"
    )]
    depth: usize,

    #[arg(long, default_value_t = 0.1, help = "Document-topic concentration")]
    alpha: f64,

    #[arg(long, default_value_t = 0.01, help = "Topic-word concentration")]
    eta: f64,

    #[arg(long, default_value_t = 42, help = "Random seed")]
    seed: u64,

    #[arg(long, help = "Number of threads (default: all cores)")]
    threads: Option<usize>,

    #[arg(
        long,
        short,
        required = true,
        help = "Output header",
        long_help = "Output header for results:\n\
		     - {out}.mtx.gz: documents by words\n\
		     - {out}.topic_word.tsv.gz: true topic-word distributions\n\
		     - {out}.doc_topic.tsv.gz: true document-topic distributions\n"
    )]
    out: Box<str>,

    #[arg(long, short)]
    verbose: bool,
}

pub fn run_simulate(args: &SimulateArgs) -> anyhow::Result<()> {
    init_logger(args.verbose);
    init_threads(args.threads)?;

    let mtx_file = format!("{}.mtx.gz", args.out);
    let topic_word_file = format!("{}.topic_word.tsv.gz", args.out);
    let doc_topic_file = format!("{}.doc_topic.tsv.gz", args.out);
    mkdir(&mtx_file)?;

    let sim_args = SimArgs {
        docs: args.docs,
        words: args.words,
        topics: args.topics,
        depth: args.depth,
        alpha: args.alpha,
        eta: args.eta,
        rseed: args.seed,
    };

    generate_lda_data_mtx(&sim_args, &mtx_file, &topic_word_file, &doc_topic_file)?;
    info!("simulated {} documents: {}", args.docs, mtx_file);
    Ok(())
}
