use crate::{init_logger, init_threads};
use clap::Args;
use lentil::corpus_io::CorpusData;
use lentil::model::TopicWordModel;
use lentil::{DocRatio, LatentDirichletAllocation, LdaConfig, LearningMethod};
use log::info;
use matrix_util::common_io::{mkdir, write_lines};
use matrix_util::traits::{IoOps, MatOps};
use ndarray::prelude::*;

#[derive(Args, Debug)]
pub struct FitArgs {
    #[arg(
        required = true,
        help = "Data file",
        long_help = "Document by word count matrix.\n\
		     `.mtx[.gz]` is read as a sparse matrix,\n\
		     `.tsv[.gz]`, `.csv[.gz]` as a dense one."
    )]
    data_file: Box<str>,

    #[arg(
        long,
        short,
        required = true,
        help = "Output header",
        long_help = "Output header for results:\n\
		     - {out}.components.tsv.gz: topic-word parameters (λ)\n\
		     - {out}.doc_topic.tsv.gz: document-topic parameters (γ)\n\
		     - {out}.proportions.tsv.gz: normalized γ\n\
		     - {out}.perplexity.tsv: perplexity at each evaluation\n\
		     - {out}.config.json: the configuration used\n"
    )]
    out: Box<str>,

    #[arg(
        long,
        help = "JSON configuration",
        long_help = "Configuration file (JSON) of the estimator.\n\
		     Command line options override its values."
    )]
    config: Option<Box<str>>,

    #[arg(long, short = 'k', help = "Number of topics (default: 10)")]
    topics: Option<usize>,

    #[arg(long, value_enum, help = "Learning method (default: online)")]
    method: Option<LearningMethod>,

    #[arg(long, short = 'i', help = "Number of passes over the data (default: 10)")]
    max_iter: Option<usize>,

    #[arg(long, short = 'b', help = "Documents per mini-batch (default: 128)")]
    batch_size: Option<usize>,

    #[arg(
        long,
        help = "Evaluate perplexity every this many passes",
        long_help = "Evaluate perplexity every this many passes.\n\
		     0 turns it off; training stops early once perplexity\n\
		     changes by less than `--perp-tol`."
    )]
    evaluate_every: Option<usize>,

    #[arg(
        long,
        value_enum,
        help = "Denominator of the online update's document ratio",
        long_help = "Denominator of `total_samples / ...` in the online update:\n\
		     - batch-rows: documents in the current mini-batch (default)\n\
		     - batch-size: the nominal `--batch-size`"
    )]
    doc_ratio: Option<DocRatio>,

    #[arg(long, help = "Perplexity tolerance (default: 0.1)")]
    perp_tol: Option<f64>,

    #[arg(long, help = "Learning rate decay κ (default: 0.7)")]
    learning_decay: Option<f64>,

    #[arg(long, help = "Learning rate offset τ0 (default: 10)")]
    learning_offset: Option<f64>,

    #[arg(long, help = "Document-topic prior α (default: 1/K)")]
    doc_topic_prior: Option<f64>,

    #[arg(long, help = "Topic-word prior η (default: 1/K)")]
    topic_word_prior: Option<f64>,

    #[arg(long, help = "Random seed")]
    seed: Option<u64>,

    #[arg(long, help = "Number of threads (default: all cores)")]
    threads: Option<usize>,

    #[arg(long, default_value_t = false, help = "Documents are columns")]
    docs_in_columns: bool,

    #[arg(long, default_value_t = false, help = "Show a progress bar")]
    show_progress: bool,

    #[arg(long, short)]
    verbose: bool,
}

impl FitArgs {
    fn lda_config(&self) -> anyhow::Result<LdaConfig> {
        let mut config = match self.config.as_deref() {
            Some(json_file) => LdaConfig::from_json_file(json_file)?,
            None => LdaConfig::default(),
        };

        if let Some(k) = self.topics {
            config.n_topics = k;
        }
        if let Some(method) = self.method {
            config.learning_method = method;
        }
        if let Some(max_iter) = self.max_iter {
            config.max_iter = max_iter;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(doc_ratio) = self.doc_ratio {
            config.doc_ratio = doc_ratio;
        }
        if let Some(evaluate_every) = self.evaluate_every {
            config.evaluate_every = evaluate_every;
        }
        if let Some(perp_tol) = self.perp_tol {
            config.perp_tol = perp_tol;
        }
        if let Some(decay) = self.learning_decay {
            config.learning_decay = decay;
        }
        if let Some(offset) = self.learning_offset {
            config.learning_offset = offset;
        }
        if self.doc_topic_prior.is_some() {
            config.doc_topic_prior = self.doc_topic_prior;
        }
        if self.topic_word_prior.is_some() {
            config.topic_word_prior = self.topic_word_prior;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.verbose |= self.verbose;
        config.show_progress |= self.show_progress;

        config.validate()?;
        Ok(config)
    }
}

pub fn run_fit(args: &FitArgs) -> anyhow::Result<()> {
    init_logger(args.verbose);
    init_threads(args.threads)?;

    let config = args.lda_config()?;
    let corpus = CorpusData::read_file(&args.data_file, args.docs_in_columns)?;

    info!(
        "{:?} LDA with {} topics, {} passes",
        config.learning_method, config.n_topics, config.max_iter
    );

    let mut lda = LatentDirichletAllocation::new(config);
    let doc_topic = lda.fit_transform(&corpus)?;
    let perplexity = lda.perplexity(&corpus, Some(&doc_topic), false)?;
    info!("final perplexity: {:.4}", perplexity);

    let components_file = format!("{}.components.tsv.gz", args.out);
    mkdir(&components_file)?;

    lda.components()?.to_tsv(&components_file)?;
    write_doc_topic(&doc_topic, &args.out)?;

    let trace_file = format!("{}.perplexity.tsv", args.out);
    let mut trace = lda.perplexity_trace().to_vec();
    trace.push(perplexity);
    write_lines(&trace, &trace_file)?;

    lda.config().to_json_file(&format!("{}.config.json", args.out))?;

    info!("wrote {}, {}", components_file, trace_file);
    Ok(())
}

#[derive(Args, Debug)]
pub struct TransformArgs {
    #[arg(required = true, help = "Data file (.mtx, .tsv, .csv)")]
    data_file: Box<str>,

    #[arg(
        long,
        short,
        required = true,
        help = "Topic-word parameters",
        long_help = "Topic-word parameters (topics by words), e.g.,\n\
		     `{out}.components.tsv.gz` of `lentil fit`."
    )]
    components: Box<str>,

    #[arg(
        long,
        short,
        required = true,
        help = "Output header",
        long_help = "Output header for results:\n\
		     - {out}.doc_topic.tsv.gz: document-topic parameters (γ)\n\
		     - {out}.proportions.tsv.gz: normalized γ\n"
    )]
    out: Box<str>,

    #[arg(
        long,
        help = "JSON configuration",
        long_help = "Configuration file (JSON) used in the fit,\n\
		     for the priors and E-step tolerances."
    )]
    config: Option<Box<str>>,

    #[arg(long, help = "Document-topic prior α (default: 1/K)")]
    doc_topic_prior: Option<f64>,

    #[arg(long, help = "Number of threads (default: all cores)")]
    threads: Option<usize>,

    #[arg(long, default_value_t = false, help = "Documents are columns")]
    docs_in_columns: bool,

    #[arg(long, short)]
    verbose: bool,
}

pub fn run_transform(args: &TransformArgs) -> anyhow::Result<()> {
    init_logger(args.verbose);
    init_threads(args.threads)?;

    let components = Array2::<f64>::from_tsv(&args.components, None)?;
    let mut config = match args.config.as_deref() {
        Some(json_file) => LdaConfig::from_json_file(json_file)?,
        None => LdaConfig::default(),
    };
    config.n_topics = components.nrows();
    if args.doc_topic_prior.is_some() {
        config.doc_topic_prior = args.doc_topic_prior;
    }
    config.validate()?;

    let model = TopicWordModel::from_components(components, config.priors(), config.schedule())?;
    info!(
        "{} topics over {} words from {}",
        model.n_topics(),
        model.n_words(),
        args.components
    );

    let corpus = CorpusData::read_file(&args.data_file, args.docs_in_columns)?;
    let lda = LatentDirichletAllocation::from_model(config, model);
    let doc_topic = lda.transform(&corpus)?;
    info!(
        "perplexity: {:.4}",
        lda.perplexity(&corpus, Some(&doc_topic), false)?
    );

    mkdir(&format!("{}.doc_topic.tsv.gz", args.out))?;
    write_doc_topic(&doc_topic, &args.out)
}

fn write_doc_topic(doc_topic: &Array2<f64>, out: &str) -> anyhow::Result<()> {
    let doc_topic_file = format!("{}.doc_topic.tsv.gz", out);
    let prop_file = format!("{}.proportions.tsv.gz", out);
    doc_topic.to_tsv(&doc_topic_file)?;
    doc_topic.sum_to_one_rows().to_tsv(&prop_file)?;
    info!("wrote {}, {}", doc_topic_file, prop_file);
    Ok(())
}
