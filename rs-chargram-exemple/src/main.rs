use std::path::PathBuf;

use clap::Parser;

use rs_chargram_core::io::{load_or_build, read_corpus};
use rs_chargram_core::{GenerationConfig, Generator, LanguageModel, ModelConfig};

#[derive(Parser)]
#[command(name = "rs-chargram-exemple")]
#[command(about = "Build a character n-gram model from a corpus and generate text")]
#[command(version)]
struct Args {
    /// Path to the training corpus (plain text)
    #[arg(value_name = "CORPUS")]
    corpus: PathBuf,

    /// Gram width in characters
    #[arg(short, default_value_t = 5)]
    n: usize,

    /// Number of most frequent grams to keep
    #[arg(long, default_value_t = 10_000)]
    top_k: usize,

    /// Number of characters to generate
    #[arg(short, long, default_value_t = 1000)]
    length: usize,

    /// Text to start from
    #[arg(short, long, default_value = "")]
    seed: String,

    /// Seed of the random source, for reproducible output
    #[arg(long)]
    rng_seed: Option<u64>,

    /// Counting workers (0 = one per CPU)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Reuse (or write) a `.bin` model next to the corpus
    #[arg(long)]
    cache: bool,
}

fn run(args: Args) -> Result<String, Box<dyn std::error::Error>> {
    let model_config = ModelConfig { n: args.n, top_k: args.top_k, threads: args.threads };
    let generation_config = GenerationConfig { length: args.length, rng_seed: args.rng_seed };

    // Build the model, or load it from the cache written by a previous run
    let model: LanguageModel = if args.cache {
        load_or_build(&args.corpus, &model_config)?
    } else {
        let corpus = read_corpus(&args.corpus)?;
        model_config.builder()?.build(&corpus)?
    };
    log::info!("model ready: n = {}, {} grams", model.n(), model.len());

    // The most frequent grams and their probabilities
    for (gram, probability) in model.grams().take(5) {
        log::debug!("{gram:?}: {probability:.5}");
    }

    // Generation consumes only the random source; the model is read-only
    let mut rng = generation_config.rng();
    let generator = Generator::new(&model);
    Ok(generator.generate(&args.seed, generation_config.length, &mut rng))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let text = run(Args::parse())?;
    println!("{text}");

    Ok(())
}
