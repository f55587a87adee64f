use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, LevelFilter};

use chat_topics::{
    logging, CoherenceMeasure, CsvMessageSource, JsonlTopicStore, MemoryTopicStore,
    PassthroughCleaner, Period, Pipeline, PipelineConfig, RegexCleaner, RunOutcome, RunRequest,
    TextCleaner, TopicStore,
};

#[derive(Parser, Debug)]
#[command(version, about = "Discover the topics of one month of merchant chat history", long_about = None)]
struct Args {
    #[arg(short, long, env = "CHAT_TOPICS_MONTH")]
    month: u32,
    #[arg(short, long, env = "CHAT_TOPICS_YEAR")]
    year: i32,
    #[arg(long, env = "CHAT_TOPICS_MERCHANT", help = "Merchant name; defaults to the sender of the first message")]
    merchant: Option<String>,
    #[arg(long, env = "CHAT_TOPICS_INPUT_DIR", default_value = "resource/dataset", help = "Directory holding {month}_{year}.csv files")]
    input_dir: PathBuf,
    #[arg(long, env = "CHAT_TOPICS_INPUT_FILE", help = "Read this CSV whatever the period (overrides --input-dir)")]
    input_file: Option<PathBuf>,
    #[arg(short, long, env = "CHAT_TOPICS_OUTPUT", default_value = "topics.jsonl")]
    output: PathBuf,
    #[arg(long, help = "Keep records in memory instead of writing them")]
    dry_run: bool,
    #[arg(short, long, env = "CHAT_TOPICS_CONFIG", help = "JSON file with pipeline settings")]
    config: Option<PathBuf>,
    #[arg(long)]
    min_topics: Option<usize>,
    #[arg(long, env = "CHAT_TOPICS_MAX_TOPICS")]
    max_topics: Option<usize>,
    #[arg(long, help = "Terms persisted per topic cluster")]
    top_n: Option<usize>,
    #[arg(long, env = "CHAT_TOPICS_WORKERS")]
    workers: Option<usize>,
    #[arg(long, help = "Coherence measure: c_v, u_mass or c_npmi")]
    coherence: Option<CoherenceMeasure>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, help = "Content is already cleaned; only split on whitespace")]
    no_clean: bool,
    #[arg(long, default_value_t = 3)]
    min_word_len: usize,
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_level);

    let outcome = run(&args).inspect_err(|err| error!("Run failed: {:#}", err))?;
    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}

fn run(args: &Args) -> Result<RunOutcome> {
    let config = build_config(args)?;
    let request = RunRequest {
        period: Period::new(args.year, args.month)?,
        merchant: args.merchant.clone(),
    };

    let source = match &args.input_file {
        Some(path) => CsvMessageSource::File(path.clone()),
        None => CsvMessageSource::Directory(args.input_dir.clone()),
    };
    let cleaner: Box<dyn TextCleaner> = if args.no_clean {
        Box::new(PassthroughCleaner)
    } else {
        Box::new(RegexCleaner::new(args.min_word_len).context("failed to build text cleaner")?)
    };
    let store: Box<dyn TopicStore> = if args.dry_run {
        Box::new(MemoryTopicStore::new())
    } else {
        Box::new(JsonlTopicStore::new(&args.output))
    };

    let mut pipeline = Pipeline::new(source, cleaner, store, config);
    pipeline
        .run(&request)
        .with_context(|| format!("topic run for {} failed", request.period))
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(min) = args.min_topics {
        config.min_topic_count = min;
    }
    if let Some(max) = args.max_topics {
        config.max_topic_count = max;
    }
    if let Some(top_n) = args.top_n {
        config.top_n_terms = top_n;
    }
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    if let Some(measure) = args.coherence {
        config.coherence_measure = measure;
    }
    if args.seed.is_some() {
        config.lda.random_seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}
