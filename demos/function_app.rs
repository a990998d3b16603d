//! Calls a deployed (or locally running) function app the way a scheduled caller would: checks
//! `alive`, then posts a batch of random numbers to `process_numbers` and reports the match count.
//!
//! Reads `.env` for `CALLER_APP_ENV`, `CALLER_APP_URL_BASE_LOCAL`/`CALLER_APP_URL_BASE_AZURE`,
//! `AZURE_FUNCTION_APP_CLIENT_ID`, and the `AZURE_TENANT_ID`/`AZURE_CLIENT_ID`/
//! `AZURE_CLIENT_SECRET` service principal. Set `RUST_LOG=debug` to see cache decisions.

// std
use std::process::ExitCode;
// crates.io
use color_eyre::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
// self
use function_app_client::{
	client::FunctionAppClient, config::ClientConfig, credential::ClientSecretCredential,
	executor::Outcome,
};

const NUMBER_COUNT: usize = 10_000;
const NUMBERS_TO_COMPARE: usize = 2_000;
const DIGITS: u32 = 5;

#[derive(Debug, Serialize)]
struct ProcessNumbers<'a> {
	numbers: &'a [u64],
	numbers_to_compare: usize,
	digits: u32,
}

#[derive(Debug, Deserialize)]
struct ProcessedNumbers {
	count: u64,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
	color_eyre::install()?;
	dotenv::dotenv().ok();
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
		.init();

	let config = ClientConfig::from_env()?;
	let credential = ClientSecretCredential::from_env()?;
	let client = <FunctionAppClient<ClientSecretCredential>>::new(config, credential)?;

	tracing::info!("Checking alive status of the function app.");

	let alive = client.get("alive", None).await?;

	tracing::info!("Alive check: {} {}", alive.status(), alive.body());

	if !alive.is_success() {
		return Ok(ExitCode::FAILURE);
	}

	tracing::info!(
		"POST request to 'process_numbers': {NUMBER_COUNT} numbers to match against \
		 {NUMBERS_TO_COMPARE} numbers, {DIGITS} digits."
	);

	let numbers = create_numbers(NUMBER_COUNT, DIGITS);
	let payload = ProcessNumbers {
		numbers: &numbers,
		numbers_to_compare: NUMBERS_TO_COMPARE,
		digits: DIGITS,
	};
	let payload_bytes = serde_json::to_vec(&payload)?.len();

	tracing::info!("Size of the payload in MB: {:.4}", payload_bytes as f64 / 1024_f64.powi(2));

	match client.post("process_numbers", Some(&payload), None).await? {
		Outcome::Success(response) => {
			let processed = response.json::<ProcessedNumbers>()?;

			tracing::info!("Process Numbers: {} {}", response.status, processed.count);

			Ok(ExitCode::SUCCESS)
		},
		Outcome::Failure(failure) => {
			tracing::error!("Request failed: {failure}");

			Ok(ExitCode::FAILURE)
		},
	}
}

/// Draws `n` numbers uniformly from `0..=10^digits`.
fn create_numbers(n: usize, digits: u32) -> Vec<u64> {
	let upper = 10_u64.saturating_pow(digits);
	let mut rng = rand::rng();
	let numbers = (0..n).map(|_| rng.random_range(0..=upper)).collect::<Vec<_>>();

	if let Some(first) = numbers.first() {
		tracing::debug!("Created {} random numbers, first number: {first}", numbers.len());
	}

	numbers
}
