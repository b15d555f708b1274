use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};
use env_logger::Env;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

use markov_core::{Chain, ChainError};
use markov_text::corpus::{file_stem, ingest_text, list_files, load_chain};
use markov_text::{SplitMode, TextError, Tokenizer};

const DEFAULT_BIND: &str = "127.0.0.1:5000";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_ORDER: usize = 2;
const MAX_ORDER: usize = 16;
const DEFAULT_COUNT: usize = 50;
const MAX_COUNT: usize = 10_000;
const CORPUS_EXTENSION: &str = "txt";

/// Server settings, read from the environment.
#[derive(Clone, Debug)]
struct ServerConfig {
	bind: String,
	data_dir: PathBuf,
}

impl ServerConfig {
	fn from_env() -> Self {
		Self {
			bind: env::var("MARKOV_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_owned()),
			data_dir: env::var("MARKOV_DATA_DIR")
				.map(PathBuf::from)
				.unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
		}
	}
}

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	count: Option<usize>,
	seed: Option<u64>,
	delimiter: Option<String>,
}

#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>,
	order: Option<usize>,
	mode: Option<String>,
}

#[derive(Deserialize)]
struct IngestQuery {
	mode: Option<String>,
}

/// The chain being served and how its input was split.
struct SharedData {
	chain: Chain<String>,
	mode: SplitMode,
	model_names: Vec<String>,
}

impl SharedData {
	fn new() -> Result<Self, ChainError> {
		Ok(Self {
			chain: Chain::new(DEFAULT_ORDER, String::new())?,
			mode: SplitMode::Word,
			model_names: Vec::new(),
		})
	}
}

fn parse_mode(mode: Option<&str>, default: SplitMode) -> Result<SplitMode, HttpResponse> {
	match mode {
		None => Ok(default),
		Some(s) => s.parse().map_err(|e: TextError| HttpResponse::BadRequest().body(e.to_string())),
	}
}

fn chain_error_response(e: &ChainError) -> HttpResponse {
	match e {
		ChainError::Untrained | ChainError::NoTokens => HttpResponse::Conflict().body(e.to_string()),
		ChainError::ZeroOrder | ChainError::SentinelToken { .. } => HttpResponse::BadRequest().body(e.to_string()),
		_ => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

fn text_error_response(e: &TextError) -> HttpResponse {
	match e {
		TextError::Chain(e) => chain_error_response(e),
		TextError::Io { .. } => HttpResponse::NotFound().body(format!("Failed to load model: {e}")),
		TextError::UnknownMode(_) => HttpResponse::BadRequest().body(e.to_string()),
		_ => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `count` tokens from the current chain and returns them
/// joined by `delimiter` (the split mode's default if absent).
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let count = query.count.unwrap_or(DEFAULT_COUNT);
	if count > MAX_COUNT {
		return HttpResponse::BadRequest().body(format!("count must be at most {MAX_COUNT}"));
	}
	let rng = match query.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let delimiter = query.delimiter.as_deref().unwrap_or(shared_data.mode.delimiter());
	match shared_data.chain.generate(count, rng) {
		Ok(tokens) => HttpResponse::Ok().body(tokens.join(delimiter)),
		Err(e) => chain_error_response(&e),
	}
}

/// HTTP GET endpoint `/v1/models`
///
/// Lists the corpora available in the data directory.
#[get("/v1/models")]
async fn get_models(config: web::Data<ServerConfig>) -> impl Responder {
	match list_files(&config.data_dir, CORPUS_EXTENSION) {
		Ok(files) => {
			let names: Vec<String> = files.iter().filter_map(|f| file_stem(f).ok()).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(e) => {
			warn!("cannot list {}: {e}", config.data_dir.display());
			HttpResponse::InternalServerError().body("Failed to list models")
		}
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.model_names.join("\n"))
}

/// HTTP PUT endpoint `/v1/load_models`
///
/// Replaces the served chain with one built from the named corpora.
#[put("/v1/load_models")]
async fn put_model(
	data: web::Data<Mutex<SharedData>>,
	config: web::Data<ServerConfig>,
	query: web::Query<ModelQuery>,
) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};

	let model_names: Vec<String> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.map(str::to_owned)
		.collect();

	if model_names.iter().any(|name| name.contains(['/', '\\']) || name.contains("..")) {
		return HttpResponse::BadRequest().body("Model names must not contain paths");
	}

	let order = query.order.unwrap_or(DEFAULT_ORDER);
	if order == 0 || order > MAX_ORDER {
		return HttpResponse::BadRequest().body(format!("order must be between 1 and {MAX_ORDER}"));
	}

	let mode = match parse_mode(query.mode.as_deref(), SplitMode::Word) {
		Ok(mode) => mode,
		Err(response) => return response,
	};
	let tokenizer = match Tokenizer::new(mode) {
		Ok(t) => t,
		Err(e) => return text_error_response(&e),
	};

	let paths: Vec<PathBuf> = model_names
		.iter()
		.map(|name| config.data_dir.join(format!("{name}.{CORPUS_EXTENSION}")))
		.collect();

	// Built off the async workers and before locking, so generation keeps running meanwhile.
	let chain = match web::block(move || load_chain(order, &paths, &tokenizer)).await {
		Ok(Ok(chain)) => chain,
		Ok(Err(e)) => return text_error_response(&e),
		Err(_) => return HttpResponse::InternalServerError().body("Model loading was interrupted"),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	shared_data.chain = chain;
	shared_data.mode = mode;
	shared_data.model_names = model_names;
	info!("serving {} ({} mode)", shared_data.model_names.join(", "), mode);

	HttpResponse::Ok().body("Models loaded successfully")
}

/// HTTP PUT endpoint `/v1/ingest`
///
/// Tokenizes the request body and ingests it as one more sequence.
/// The body must be split the same way as the rest of the chain.
#[put("/v1/ingest")]
async fn put_ingest(data: web::Data<Mutex<SharedData>>, query: web::Query<IngestQuery>, body: String) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let mode = match parse_mode(query.mode.as_deref(), shared_data.mode) {
		Ok(mode) => mode,
		Err(response) => return response,
	};
	if mode != shared_data.mode {
		return HttpResponse::BadRequest()
			.body(format!("chain is split in {} mode, cannot ingest {} tokens", shared_data.mode, mode));
	}
	let tokenizer = match Tokenizer::new(mode) {
		Ok(t) => t,
		Err(e) => return text_error_response(&e),
	};

	match ingest_text(&mut shared_data.chain, &tokenizer, &body) {
		Ok(count) => HttpResponse::Ok().body(format!("Ingested {count} tokens")),
		Err(e) => text_error_response(&e),
	}
}

/// Main entry point for the server.
///
/// Starts with an empty chain wrapped in a `Mutex`; corpora are loaded
/// through `/v1/load_models` or pushed through `/v1/ingest`.
///
/// # Notes
/// - `MARKOV_BIND` sets the address (default 127.0.0.1:5000).
/// - `MARKOV_DATA_DIR` sets the corpus directory (default ./data).
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

	let config = ServerConfig::from_env();
	let shared_data = SharedData::new().map_err(io::Error::other)?;
	let shared_model = web::Data::new(Mutex::new(shared_data));
	let shared_config = web::Data::new(config.clone());

	info!("listening on {}, corpora in {}", config.bind, config.data_dir.display());
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.app_data(shared_config.clone())
			.service(get_generated)
			.service(get_models)
			.service(put_model)
			.service(get_loaded_models)
			.service(put_ingest)
	})
		.bind(config.bind.as_str())?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::{body, test};
	use std::fs;
	use std::process;

	fn test_config(name: &str) -> ServerConfig {
		let data_dir = env::temp_dir().join(format!("markov-server-{}-{}", process::id(), name));
		let _ = fs::remove_dir_all(&data_dir);
		fs::create_dir_all(&data_dir).unwrap();
		ServerConfig { bind: DEFAULT_BIND.to_owned(), data_dir }
	}

	macro_rules! app {
		($config:expr) => {
			test::init_service(
				App::new()
					.app_data(web::Data::new(Mutex::new(SharedData::new().unwrap())))
					.app_data(web::Data::new($config))
					.service(get_generated)
					.service(get_models)
					.service(put_model)
					.service(get_loaded_models)
					.service(put_ingest),
			)
			.await
		};
	}

	async fn text(response: actix_web::dev::ServiceResponse) -> String {
		let bytes = body::to_bytes(response.into_body()).await.unwrap();
		String::from_utf8(bytes.to_vec()).unwrap()
	}

	#[actix_web::test]
	async fn generate_before_training_conflicts() {
		let app = app!(test_config("untrained"));
		let req = test::TestRequest::get().uri("/v1/generate?count=3").to_request();
		let response = test::call_service(&app, req).await;
		assert_eq!(response.status(), StatusCode::CONFLICT);
	}

	#[actix_web::test]
	async fn ingest_then_generate() {
		let app = app!(test_config("ingest"));
		let req = test::TestRequest::put()
			.uri("/v1/ingest")
			.set_payload("red green blue")
			.to_request();
		let response = test::call_service(&app, req).await;
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(text(response).await, "Ingested 3 tokens");

		let req = test::TestRequest::get().uri("/v1/generate?count=4&seed=1").to_request();
		let response = test::call_service(&app, req).await;
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(text(response).await, "red green blue red");
	}

	#[actix_web::test]
	async fn blank_body_leaves_nothing_to_generate() {
		let app = app!(test_config("blank"));
		let req = test::TestRequest::put().uri("/v1/ingest").set_payload("   ").to_request();
		let response = test::call_service(&app, req).await;
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(text(response).await, "Ingested 0 tokens");

		let req = test::TestRequest::get().uri("/v1/generate?count=2").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
	}

	#[actix_web::test]
	async fn ingest_rejects_other_split_mode() {
		let app = app!(test_config("mode"));
		let req = test::TestRequest::put()
			.uri("/v1/ingest?mode=char")
			.set_payload("abc")
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put()
			.uri("/v1/ingest?mode=word")
			.set_payload("one two")
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/generate?count=2&seed=3").to_request();
		assert_eq!(text(test::call_service(&app, req).await).await, "one two");
	}

	#[actix_web::test]
	async fn load_models_from_data_dir() {
		let config = test_config("load");
		fs::write(config.data_dir.join("colors.txt"), "cyan magenta yellow").unwrap();
		fs::write(config.data_dir.join("shapes.txt"), "circle square").unwrap();
		let app = app!(config);

		let req = test::TestRequest::get().uri("/v1/models").to_request();
		assert_eq!(text(test::call_service(&app, req).await).await, "colors\nshapes");

		let req = test::TestRequest::put()
			.uri("/v1/load_models?names=colors&order=1")
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/loaded_models").to_request();
		assert_eq!(text(test::call_service(&app, req).await).await, "colors");

		let req = test::TestRequest::get().uri("/v1/generate?count=3&delimiter=-").to_request();
		assert_eq!(text(test::call_service(&app, req).await).await, "cyan-magenta-yellow");
	}

	#[actix_web::test]
	async fn load_models_rejects_bad_input() {
		let config = test_config("bad");
		fs::write(config.data_dir.join("tiny.txt"), "just one line").unwrap();
		let app = app!(config);

		for uri in [
			"/v1/load_models",
			"/v1/load_models?names=../etc",
			"/v1/load_models?names=x&mode=line",
			"/v1/load_models?names=x&order=0",
			"/v1/load_models?names=tiny&order=17",
			"/v1/load_models?names=tiny&order=1000000000000",
			"/v1/load_models?names=tiny&order=18446744073709551615",
		] {
			let req = test::TestRequest::put().uri(uri).to_request();
			let response = test::call_service(&app, req).await;
			assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
		}

		let req = test::TestRequest::put().uri("/v1/load_models?names=absent").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
	}
}
