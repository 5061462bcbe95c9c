use anyhow::{Context, Result};
use clap::Parser;
use funkrec::services::training::TrainingService;
use funkrec::utils::metrics::RatingEvaluator;
use funkrec::utils::{parse_ratings, split_holdout};
use funkrec::{init_tracing, Config};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Ratings file; overrides `data.ratings_path` from the config
    #[arg(short, long)]
    ratings: Option<String>,

    /// Fraction of ratings held out to score the fitted model
    #[arg(long, default_value_t = 0.0)]
    holdout: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Write the fitted model as JSON
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };
    info!("Training configuration loaded: {:?}", config.training);

    let path = args.ratings.unwrap_or_else(|| config.data.ratings_path.clone());
    let input = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read ratings from {}", path))?;
    let ratings = parse_ratings(&input, config.data.delimiter)?;
    info!("Loaded {} ratings from {}", ratings.len(), path);

    let (train, test) = split_holdout(&ratings, args.holdout, args.seed);
    let service = TrainingService::new(config.training.clone())?;
    let model = service.train_ratings(&train)?;

    println!("{}", serde_json::to_string_pretty(&model.report)?);

    if !test.is_empty() {
        let evaluator = RatingEvaluator::new();
        let latent = evaluator.evaluate(&model.engine(), &test);
        let baseline = evaluator.evaluate(&model.baseline, &test);
        info!("Latent model on holdout: {:?}", latent);
        info!("Baseline on holdout: {:?}", baseline);
    }

    if let Some(output) = args.output {
        let json = serde_json::to_string_pretty(&model.snapshot())?;
        std::fs::write(&output, json)
            .with_context(|| format!("Failed to write model to {}", output))?;
        info!("Model written to {}", output);
    }

    Ok(())
}
