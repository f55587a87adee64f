use std::cell::{Cell, RefCell};
use std::fs;
use std::process::Command;

use chat_topics::{
    CandidateModel, CoherenceMeasure, CoherenceModel, CoherenceScorer, Corpus, CsvMessageSource,
    JsonlTopicStore, LdaConfig, LdaTrainer, MemoryTopicStore, Message, MessageSource,
    ModelSelector, PassthroughCleaner, Period, Pipeline, PipelineConfig, PipelineError,
    RegexCleaner, RunOutcome, RunRequest, SelectionError, SourceError, TopicTermRecord,
    TopicTrainer, TrainError,
};
use tempfile::TempDir;

struct FixedSource(Vec<Message>);

impl MessageSource for FixedSource {
    fn fetch(&self, _period: Period) -> Result<Vec<Message>, SourceError> {
        Ok(self.0.clone())
    }
}

struct CountingTrainer {
    inner: LdaTrainer,
    calls: RefCell<Vec<usize>>,
}

impl TopicTrainer for CountingTrainer {
    fn train(&self, corpus: &Corpus, num_topics: usize) -> Result<CandidateModel, TrainError> {
        self.calls.borrow_mut().push(num_topics);
        self.inner.train(corpus, num_topics)
    }
}

struct CountingScorer<F> {
    inner: CoherenceModel,
    calls: Cell<usize>,
    keep: F,
}

impl<F: Fn(usize) -> bool> CoherenceScorer for CountingScorer<F> {
    fn score(&self, model: &CandidateModel, corpus: &Corpus) -> Option<f64> {
        self.calls.set(self.calls.get() + 1);
        let score = self.inner.score(model, corpus);
        if (self.keep)(model.num_topics) {
            score
        } else {
            None
        }
    }
}

fn five_messages() -> Vec<Message> {
    [
        "order late courier delivery",
        "courier lost order package",
        "refund card payment declined",
        "payment refund bank transfer",
        "delivery package courier address",
    ]
    .iter()
    .map(|text| Message::new("acme", text))
    .collect()
}

fn config(max_topic_count: usize) -> PipelineConfig {
    let mut config = PipelineConfig {
        max_topic_count,
        top_n_terms: 4,
        worker_count: 2,
        ..PipelineConfig::default()
    };
    config.lda.random_seed = Some(42);
    config
}

fn period() -> Period {
    Period::new(2018, 12).unwrap()
}

fn selector<F: Fn(usize) -> bool>(
    max: usize,
    keep: F,
) -> ModelSelector<CountingTrainer, CountingScorer<F>> {
    let lda = LdaConfig {
        random_seed: Some(42),
        ..LdaConfig::default()
    };
    ModelSelector::new(
        CountingTrainer {
            inner: LdaTrainer::new(lda, 2).unwrap(),
            calls: RefCell::new(Vec::new()),
        },
        CountingScorer {
            inner: CoherenceModel::new(CoherenceMeasure::CV, 20),
            calls: Cell::new(0),
            keep,
        },
        1,
        max,
    )
}

fn request(merchant: Option<&str>) -> RunRequest {
    RunRequest {
        period: period(),
        merchant: merchant.map(str::to_string),
    }
}

#[test]
fn five_messages_three_candidates() {
    let mut pipeline = Pipeline::new(
        FixedSource(five_messages()),
        PassthroughCleaner,
        MemoryTopicStore::new(),
        config(3),
    );
    let selector = selector(3, |_| true);
    let outcome = pipeline.run_with(&request(Some("acme")), &selector).expect("run");

    assert_eq!(*selector.trainer().calls.borrow(), vec![1, 2, 3]);
    assert_eq!(selector.scorer().calls.get(), 3);

    let RunOutcome::Persisted(summary) = outcome else {
        panic!("expected persisted outcome, got {outcome:?}");
    };
    assert_eq!(summary.candidates, 3);
    assert_eq!(summary.messages, 5);

    let records: &[TopicTermRecord] = &pipeline.store().records;
    assert_eq!(records.len(), summary.topic_count * 4);
    assert_eq!(summary.records, records.len());
    for cluster in 1..=summary.topic_count {
        let scores: Vec<f64> = records
            .iter()
            .filter(|r| r.topic_cluster == cluster)
            .map(|r| r.score)
            .collect();
        assert_eq!(scores.len(), 4);
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
    }
    assert!(records
        .iter()
        .all(|r| r.merchant_name == "acme" && r.year == 2018 && r.month == 12));
}

#[test]
fn winner_scores_at_least_every_candidate() {
    let corpus = Corpus::build(&five_messages());
    let selector = selector(3, |_| true);
    let selection = selector.select(&corpus).expect("selection");

    let scores: Vec<f64> = selection
        .evaluations
        .iter()
        .map(|eval| eval.score.expect("viable"))
        .collect();
    assert_eq!(scores.len(), 3);
    assert!(scores.iter().all(|s| selection.winner_score() >= *s));
}

#[test]
fn only_viable_candidate_is_selected() {
    let corpus = Corpus::build(&five_messages());
    let selector = selector(3, |k| k == 2);
    let selection = selector.select(&corpus).expect("selection");
    assert_eq!(selection.winner().topic_count, 2);
    assert_eq!(selector.trainer().calls.borrow().len(), 3);
}

#[test]
fn no_viable_model_fails_the_run_without_persisting() {
    let mut pipeline = Pipeline::new(
        FixedSource(five_messages()),
        PassthroughCleaner,
        MemoryTopicStore::new(),
        config(3),
    );
    let selector = selector(3, |_| false);
    let result = pipeline.run_with(&request(None), &selector);
    assert!(matches!(
        result,
        Err(PipelineError::Selection(SelectionError::NoViableModel { evaluated: 3 }))
    ));
    assert!(pipeline.store().records.is_empty());
}

#[test]
fn empty_batch_makes_no_training_or_persistence_calls() {
    let mut pipeline = Pipeline::new(
        FixedSource(Vec::new()),
        PassthroughCleaner,
        MemoryTopicStore::new(),
        config(3),
    );
    let selector = selector(3, |_| true);
    let outcome = pipeline.run_with(&request(None), &selector).expect("run");
    assert!(matches!(outcome, RunOutcome::NoMessages { .. }));
    assert!(selector.trainer().calls.borrow().is_empty());
    assert!(pipeline.store().records.is_empty());
}

#[test]
fn csv_to_jsonl_end_to_end() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("12_2018.csv"),
        "name,content,create_at,channel,sender_role,sender_id\n\
         acme,Where is my order? The courier is late,2018-12-01,chat,buyer,1\n\
         acme,Courier lost my package please help,2018-12-02,chat,buyer,2\n\
         acme,Refund to my card after payment declined,2018-12-03,chat,buyer,3\n\
         acme,Payment refund via bank transfer,2018-12-04,chat,buyer,4\n",
    )
    .expect("write csv");
    let output = dir.path().join("out").join("topics.jsonl");

    let mut pipeline = Pipeline::new(
        CsvMessageSource::Directory(dir.path().to_path_buf()),
        RegexCleaner::new(3).unwrap(),
        JsonlTopicStore::new(&output),
        config(2),
    );
    let outcome = pipeline.run(&request(None)).expect("run");
    let RunOutcome::Persisted(summary) = outcome else {
        panic!("expected persisted outcome");
    };

    let rows: Vec<TopicTermRecord> = fs::read_to_string(&output)
        .expect("output written")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json row"))
        .collect();
    assert_eq!(rows.len(), summary.records);
    assert!(rows.iter().all(|r| r.merchant_name == "acme"));
    assert!(rows.iter().all(|r| r.topic_cluster >= 1 && r.topic_cluster <= summary.topic_count));
}

#[test]
fn cli_reports_empty_period() {
    let dir = TempDir::new().expect("temp dir");
    let output = Command::new(env!("CARGO_BIN_EXE_chat-topics"))
        .args(["--month", "1", "--year", "2019", "--dry-run", "--log-level", "off"])
        .arg("--input-dir")
        .arg(dir.path())
        .output()
        .expect("run CLI");

    assert!(
        output.status.success(),
        "cli exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let summary: serde_json::Value =
        serde_json::from_str(stdout.lines().last().expect("summary line")).expect("json");
    assert_eq!(summary["outcome"], "no_messages");
    assert_eq!(summary["month"], 1);
}

#[test]
fn cli_fails_on_missing_input_dir() {
    let dir = TempDir::new().expect("temp dir");
    let output = Command::new(env!("CARGO_BIN_EXE_chat-topics"))
        .args(["--month", "1", "--year", "2019", "--dry-run", "--log-level", "off"])
        .arg("--input-dir")
        .arg(dir.path().join("typo"))
        .output()
        .expect("run CLI");
    assert!(!output.status.success());
}

#[test]
fn cli_rejects_invalid_month() {
    let dir = TempDir::new().expect("temp dir");
    let output = Command::new(env!("CARGO_BIN_EXE_chat-topics"))
        .args(["--month", "13", "--year", "2019", "--dry-run", "--log-level", "off"])
        .arg("--input-dir")
        .arg(dir.path())
        .output()
        .expect("run CLI");
    assert!(!output.status.success());
}
