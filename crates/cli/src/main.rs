use anyhow::{anyhow, Context, Result};
use candle_core::Device;
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{Catalog, MovieLens, UserId};
use model::{
    hit_rate_at_k, ModelConfig, SequentialRetrievalModel, Trainer, TrainingConfig,
    TrainingHistory,
};
use pipeline::filters::MinimumRatingFilter;
use pipeline::{
    batch_examples, group_by_user, pad_context, prepare_examples, train_test_split,
    FilterPipeline, ItemId, SequenceConfig, PADDING_ITEM_ID,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// SeqRec - Sequential movie retrieval
#[derive(Parser)]
#[command(name = "seqrec")]
#[command(about = "Next-movie retrieval with a two-tower GRU model", long_about = None)]
struct Cli {
    /// Path to MovieLens dataset directory
    #[arg(short, long, default_value = "data/ml-1m")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model, evaluate it and show a sample recommendation
    Train {
        /// Number of past interactions fed to the query tower
        #[arg(long, default_value = "10")]
        max_context_length: usize,

        /// Users with fewer interactions are skipped
        #[arg(long, default_value = "3")]
        min_sequence_length: usize,

        /// Share of examples used for training
        #[arg(long, default_value = "0.9")]
        train_fraction: f32,

        /// Ratings below this are dropped
        #[arg(long, default_value = "2")]
        min_rating: f32,

        #[arg(long, default_value = "2048")]
        batch_size: usize,

        #[arg(long, default_value = "2048")]
        test_batch_size: usize,

        #[arg(long, default_value = "128")]
        embedding_dim: usize,

        #[arg(long, default_value = "10")]
        epochs: usize,

        #[arg(long, default_value = "0.05")]
        learning_rate: f64,

        /// Number of movies to retrieve
        #[arg(long, default_value = "10")]
        top_k: usize,

        /// Seed for the train/test shuffle
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Write the trained model to this safetensors file
        #[arg(long)]
        save_model: Option<PathBuf>,

        /// Write per-epoch losses to this JSON file
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Recommend movies for a user with a saved model
    Recommend {
        /// Saved model file
        #[arg(long)]
        model: PathBuf,

        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Ratings below this are ignored
        #[arg(long, default_value = "2")]
        min_rating: f32,
    },
}

struct TrainArgs {
    max_context_length: usize,
    min_sequence_length: usize,
    train_fraction: f32,
    min_rating: f32,
    batch_size: usize,
    test_batch_size: usize,
    embedding_dim: usize,
    epochs: usize,
    learning_rate: f64,
    top_k: usize,
    seed: u64,
    save_model: Option<PathBuf>,
    history: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("Loading MovieLens dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let data = MovieLens::load_from_files(&cli.data_dir)
        .context("Failed to load MovieLens dataset")?;
    let (users, movies, ratings) = data.counts();
    println!(
        "{} Loaded {} ratings of {} movies by {} users in {:?}",
        "✓".green(),
        ratings,
        movies,
        users,
        start.elapsed()
    );

    match cli.command {
        Commands::Train {
            max_context_length,
            min_sequence_length,
            train_fraction,
            min_rating,
            batch_size,
            test_batch_size,
            embedding_dim,
            epochs,
            learning_rate,
            top_k,
            seed,
            save_model,
            history,
        } => handle_train(
            &data,
            TrainArgs {
                max_context_length,
                min_sequence_length,
                train_fraction,
                min_rating,
                batch_size,
                test_batch_size,
                embedding_dim,
                epochs,
                learning_rate,
                top_k,
                seed,
                save_model,
                history,
            },
        )?,
        Commands::Recommend {
            model,
            user_id,
            min_rating,
        } => handle_recommend(&data, &model, user_id, min_rating)?,
    }

    Ok(())
}

/// Handle the 'train' command
fn handle_train(data: &MovieLens, args: TrainArgs) -> Result<()> {
    let device = Device::Cpu;

    let ratings = FilterPipeline::new()
        .add_filter(MinimumRatingFilter::new(args.min_rating))
        .apply(data.ratings().to_vec())
        .context("Failed to filter ratings")?;

    let sequence_config = SequenceConfig::new(args.max_context_length, args.min_sequence_length)
        .context("Invalid sequence configuration")?;
    let examples = prepare_examples(&ratings, &sequence_config);

    let mut rng = StdRng::seed_from_u64(args.seed);
    let (train, test) = train_test_split(examples, args.train_fraction, &mut rng);
    info!(train = train.len(), test = test.len(), "Split examples");

    let train_batches =
        batch_examples(&train, args.batch_size).context("Failed to batch training examples")?;
    let test_batches =
        batch_examples(&test, args.test_batch_size).context("Failed to batch test examples")?;

    if let Some(first) = train_batches.first() {
        println!("\n{}", "==> Sample batch:".bold().blue());
        print!("{}", first);
    }

    let model_config = ModelConfig::new(data.num_items(), args.embedding_dim)
        .top_k(args.top_k)
        .context_length(args.max_context_length);
    let model = SequentialRetrievalModel::new(model_config, &device)
        .context("Failed to build model")?;

    let training_config = TrainingConfig::default()
        .epochs(args.epochs)
        .learning_rate(args.learning_rate);
    let mut trainer = Trainer::new(&model, training_config)?;

    let start = Instant::now();
    let history = trainer
        .fit(&train_batches, &test_batches)
        .context("Training failed")?;
    println!(
        "{} Trained {} epochs in {:?}",
        "✓".green(),
        history.epochs.len(),
        start.elapsed()
    );
    print_history(&history);

    let hit_rate = hit_rate_at_k(&model, &test_batches).context("Evaluation failed")?;
    println!("Test hit rate @{}: {:.4}", args.top_k, hit_rate);

    if let Some(path) = &args.save_model {
        model
            .save(path)
            .with_context(|| format!("Failed to save model to {}", path.display()))?;
        println!("{} Saved model to {}", "✓".green(), path.display());
    }
    if let Some(path) = &args.history {
        let json = serde_json::to_string_pretty(&history)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write history to {}", path.display()))?;
    }

    // Show one held-out sequence and what the model retrieves for it
    let Some(example) = test.first() else {
        return Ok(());
    };
    print_watched(data.catalog(), &example.context_item_ids);
    let retrieved = model.predict_examples(std::slice::from_ref(example))?;
    let recommended = retrieved.item_ids.into_iter().next().unwrap_or_default();
    print_recommendations(data.catalog(), &recommended);

    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(
    data: &MovieLens,
    model_path: &Path,
    user_id: UserId,
    min_rating: f32,
) -> Result<()> {
    let model = SequentialRetrievalModel::load(model_path, &Device::Cpu)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;

    let user_ratings: Vec<_> = data
        .ratings()
        .iter()
        .filter(|r| r.user_id == user_id)
        .copied()
        .collect();
    let ratings = FilterPipeline::new()
        .add_filter(MinimumRatingFilter::new(min_rating))
        .apply(user_ratings)?;

    let sequence = group_by_user(&ratings)
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("User {} has no ratings of at least {}", user_id, min_rating))?;
    let items: Vec<ItemId> = sequence.item_ids().collect();
    // The window length is the one the model was trained with
    let context = pad_context(&items, model.config().context_length);

    println!("{}", format!("User ID: {}", user_id).bold().blue());
    print_watched(data.catalog(), &context);
    print_recommendations(data.catalog(), &model.recommend(&items)?);

    Ok(())
}

fn print_history(history: &TrainingHistory) {
    for metrics in &history.epochs {
        let validation = metrics
            .validation_loss
            .map(|loss| format!("{:.4}", loss))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  epoch {:>3}  loss {:.4}  val_loss {}  lr {:.5}",
            metrics.epoch, metrics.train_loss, validation, metrics.learning_rate
        );
    }
}

/// Titles of the context, padding skipped
fn print_watched(catalog: &Catalog, context: &[ItemId]) {
    let titles: Vec<&str> = context
        .iter()
        .filter(|&&id| id != PADDING_ITEM_ID)
        .map(|&id| catalog.title(id))
        .collect();
    println!("\n{}", "==> Movies the user has watched:".bold().blue());
    println!("{}", titles.join(", "));
}

fn print_recommendations(catalog: &Catalog, item_ids: &[ItemId]) {
    println!("\n{}", "==> Recommended movies for the above sequence:".bold().blue());
    for (rank, &id) in item_ids.iter().enumerate() {
        let genres = catalog
            .get_movie(id)
            .map(|movie| {
                movie
                    .genres
                    .iter()
                    .map(|g| format!("{:?}", g))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!(
            "{}. {} [{}]",
            (rank + 1).to_string().green(),
            catalog.title(id),
            genres
        );
    }
}
