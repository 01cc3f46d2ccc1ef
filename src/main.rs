use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;

use review_topics::coherence::DEFAULT_TOP_N;
use review_topics::corpus::build_corpus;
use review_topics::dataset::{self, NO_TOPIC};
use review_topics::normalize::Normalizer;
use review_topics::persistence::{self, ModelArtifact};
use review_topics::selection::ModelSelector;
use review_topics::{Result, TopicsError};

#[derive(Parser, Debug)]
#[command(version, about = "Discover review topics and pick the best topic count by coherence", long_about = None)]
struct Args {
    /// Review CSV with a header row.
    path: PathBuf,
    #[clap(short, long, default_value = "review", help = "Name of the review text column")]
    text_column: String,
    #[clap(long, default_value_t = 4, help = "Smallest topic count to try")]
    min_topics: usize,
    #[clap(long, default_value_t = 20, help = "Largest topic count to try")]
    max_topics: usize,
    #[clap(long, default_value_t = 2, help = "Step between candidate topic counts")]
    step: usize,
    #[clap(short, long, default_value_t = 5, help = "Training sweeps over the corpus")]
    passes: usize,
    #[clap(short, long, default_value_t = 42, help = "Seed for reproducible training")]
    seed: u64,
    #[clap(long, default_value_t = DEFAULT_TOP_N, help = "Top words per topic entering the coherence score")]
    top_n: usize,
    #[clap(short, long, help = "Worker threads (defaults to all cores)")]
    workers: Option<usize>,
    #[clap(long, default_value = "topic_labeled.csv", help = "Labeled rows output")]
    labeled_out: PathBuf,
    #[clap(long, default_value = "coherence_scores.csv", help = "Per-candidate score report")]
    scores_out: PathBuf,
    #[clap(long, default_value = "lda_model.json", help = "Trained model artifact")]
    model_out: PathBuf,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    if let Some(workers) = args.workers {
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build_global()
            .map_err(|e| TopicsError::InvalidParameter {
                param: "workers",
                reason: e.to_string(),
            })?;
    }
    if args.step == 0 {
        return Err(TopicsError::InvalidParameter {
            param: "step",
            reason: "must be a positive integer".to_string(),
        });
    }
    let candidates: Vec<usize> = (args.min_topics..=args.max_topics)
        .step_by(args.step)
        .collect();

    println!("Loading reviews from {}", args.path.display());
    let table = dataset::load_reviews(&args.path, &args.text_column)?;
    println!("Loaded {} reviews.", table.len());

    let normalizer = Normalizer::new();
    let documents: Vec<Vec<String>> = table
        .texts()
        .map(|text| normalizer.normalize(text))
        .collect();
    let empty = documents.iter().filter(|doc| doc.is_empty()).count();
    if empty > 0 {
        println!("{empty} reviews normalized to no usable tokens.");
    }

    let (vocabulary, corpus) = build_corpus(&documents);
    println!(
        "Built corpus: {} documents, {} vocabulary terms.",
        corpus.len(),
        vocabulary.len()
    );

    println!("Evaluating topic counts {candidates:?}...");
    let outcome = ModelSelector::new(candidates)
        .with_passes(args.passes)
        .with_seed(args.seed)
        .with_top_n(args.top_n)
        .select(&corpus, &vocabulary)?;

    for score in &outcome.scores {
        println!(
            "Num Topics = {}, Coherence Score = {:.4}",
            score.num_topics, score.coherence
        );
    }
    for failure in &outcome.failures {
        eprintln!(
            "Skipped candidate {}: {}",
            failure.num_topics, failure.reason
        );
    }

    let Some((best_num_topics, model)) = &outcome.best else {
        return Err(TopicsError::InvalidInput(
            "no candidate produced a usable model".to_string(),
        ));
    };
    println!("\nOptimal number of topics: {best_num_topics}");

    println!("\nTop topics discovered:");
    for (topic, words) in model.top_words(&vocabulary, args.top_n)?.iter().enumerate() {
        let rendered: Vec<String> = words
            .iter()
            .map(|(word, weight)| format!("{weight:.3}*{word}"))
            .collect();
        println!("Topic {topic}: {}", rendered.join(" + "));
    }

    println!("\nAssigning dominant topic to each review...");
    let assignments = model.dominant_topics(&corpus)?;
    let mut histogram: HashMap<i64, usize> = HashMap::new();
    for assignment in &assignments {
        *histogram
            .entry(assignment.map_or(NO_TOPIC, |t| t as i64))
            .or_insert(0) += 1;
    }
    let mut counts: Vec<(i64, usize)> = histogram.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (topic, count) in counts {
        println!("topic {topic:>3}: {count} reviews");
    }

    dataset::write_labeled(&args.labeled_out, &table, &assignments)?;
    println!("Labeled reviews written to {}", args.labeled_out.display());

    dataset::write_score_report(&args.scores_out, &outcome.scores)?;
    println!("Coherence report written to {}", args.scores_out.display());

    let best_score = outcome
        .scores
        .iter()
        .find(|s| s.num_topics == *best_num_topics)
        .map(|s| s.coherence);
    let artifact = ModelArtifact::from_model(model, &vocabulary, args.passes, best_score)?;
    persistence::save_artifact(&artifact, &args.model_out)?;
    println!("Model artifact written to {}", args.model_out.display());

    println!("\nTopic modeling completed.");
    Ok(())
}
