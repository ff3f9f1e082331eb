use std::path::PathBuf;

use actix_web::middleware::Logger;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;

use serde::{Deserialize, Serialize};
use rs_chargram_core::io::{load_or_build, read_corpus};
use rs_chargram_core::{GenerationConfig, Generator, LanguageModel, ModelConfig};

/// Upper bound of `length` for a single request.
const MAX_LENGTH: usize = 10_000;

/// Default `length` when the query does not give one.
const DEFAULT_LENGTH: usize = 100;

/// Number of grams listed by `/v1/model`.
const MODEL_INFO_TOP: usize = 10;

#[derive(Parser)]
#[command(name = "rs-chargram-server")]
#[command(about = "Serve text generated by a character n-gram model")]
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

	/// Counting workers (0 = one per CPU)
	#[arg(long, default_value_t = 0)]
	threads: usize,

	/// Reuse (or write) a `.bin` model next to the corpus
	#[arg(long)]
	cache: bool,

	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	#[arg(long, default_value_t = 5000)]
	port: u16,
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	seed: Option<String>,
	length: Option<usize>,
	rng_seed: Option<u64>,
}

/// Body of the `/v1/model` endpoint
#[derive(Serialize, Deserialize, Debug)]
struct ModelInfo {
	n: usize,
	size: usize,
	top: Vec<(String, f64)>,
}

/// HTTP GET endpoint `/v1/generate`
///
/// Extends `seed` (default empty) by `length` characters and returns the
/// whole text as the response body. Each request draws from its own
/// random source; `rng_seed` makes the answer reproducible.
#[get("/v1/generate")]
async fn get_generated(model: web::Data<LanguageModel>, query: web::Query<GenerateParams>) -> impl Responder {
	let config = GenerationConfig {
		length: query.length.unwrap_or(DEFAULT_LENGTH),
		rng_seed: query.rng_seed,
	};
	if config.length > MAX_LENGTH {
		return HttpResponse::BadRequest().body(format!("length must be <= {MAX_LENGTH}"));
	}

	let seed = query.seed.as_deref().unwrap_or_default();
	let mut rng = config.rng();
	let text = Generator::new(&model).generate(seed, config.length, &mut rng);
	HttpResponse::Ok().body(text)
}

/// HTTP GET endpoint `/v1/model`
///
/// Describes the served model: its order, its size and its most frequent grams.
#[get("/v1/model")]
async fn get_model(model: web::Data<LanguageModel>) -> impl Responder {
	HttpResponse::Ok().json(ModelInfo {
		n: model.n(),
		size: model.len(),
		top: model.grams().take(MODEL_INFO_TOP).map(|(gram, p)| (gram.to_owned(), p)).collect(),
	})
}

/// Builds (or loads) the model described by the command line.
fn load_model(args: &Args) -> Result<LanguageModel, rs_chargram_core::ModelError> {
	let config = ModelConfig { n: args.n, top_k: args.top_k, threads: args.threads };
	if args.cache {
		return load_or_build(&args.corpus, &config);
	}
	let corpus = read_corpus(&args.corpus)?;
	config.builder()?.build(&corpus)
}

/// Main entry point for the server.
///
/// Builds the model once, then shares it read-only between all workers.
/// The model is never mutated, so no lock is needed.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();
	let args = Args::parse();

	let model = load_model(&args).map_err(std::io::Error::other)?;
	log::info!("serving model: n = {}, {} grams", model.n(), model.len());
	let shared_model = web::Data::new(model);

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(get_model)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}
