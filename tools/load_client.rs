//! Load Client
//!
//! Generates synthetic DPR records and posts them to a running classifier.
//!
//! Usage: load_client [base_url] [count] [at_risk_rate] [concurrency]

use chrono::{Duration, Local, NaiveDate};
use dpr_risk_classifier::types::{PredictionResponse, ProjectRequest};
use futures::stream::{self, StreamExt};
use rand::Rng;
use std::collections::HashMap;
use tracing::{info, warn};

const STATES: &[&str] = &[
    "ARUNACHAL PRADESH",
    "ASSAM",
    "MANIPUR",
    "MEGHALAYA",
    "MIZORAM",
    "NAGALAND",
    "SIKKIM",
    "TRIPURA",
];

const SECTORS: &[&str] = &[
    "Transport and Communication",
    "Power",
    "Water Supply",
    "Health",
    "Education",
    "Agriculture and Allied",
];

/// Random project generator
struct ProjectGenerator {
    rng: rand::rngs::ThreadRng,
    today: NaiveDate,
}

impl ProjectGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            today: Local::now().date_naive(),
        }
    }

    /// Project spending in line with its schedule
    fn generate_on_track(&mut self) -> ProjectRequest {
        let approved_cost = self.rng.gen_range(5.0..200.0);
        let sanctioned = self.today - Duration::days(self.rng.gen_range(200..1500));
        let scheduled = sanctioned + Duration::days(self.rng.gen_range(900..2000));
        let completed = scheduled < self.today;
        let expenditure = approved_cost * self.rng.gen_range(0.6..1.0);

        ProjectRequest {
            state: self.random_choice(STATES).to_string(),
            sector: self.random_choice(SECTORS).to_string(),
            present_status: if completed { "Completed" } else { "Ongoing" }.to_string(),
            approved_cost: round2(approved_cost),
            total_financial_expenditure: round2(expenditure),
            uc_received: round2(expenditure * self.rng.gen_range(0.9..1.0)),
            sanctioned_date: format_date(sanctioned),
            scheduled_completion_date: format_date(scheduled),
        }
    }

    /// Overdue project with little money spent or certified
    fn generate_at_risk(&mut self) -> ProjectRequest {
        let approved_cost = self.rng.gen_range(5.0..200.0);
        let sanctioned = self.today - Duration::days(self.rng.gen_range(1500..4000));
        let scheduled = sanctioned + Duration::days(self.rng.gen_range(365..1200));
        let expenditure = approved_cost * self.rng.gen_range(0.05..0.5);

        ProjectRequest {
            state: self.random_choice(STATES).to_string(),
            sector: self.random_choice(SECTORS).to_string(),
            present_status: self
                .random_choice(&["Delayed", "Ongoing", "Not Started"])
                .to_string(),
            approved_cost: round2(approved_cost),
            total_financial_expenditure: round2(expenditure),
            uc_received: round2(expenditure * self.rng.gen_range(0.0..0.6)),
            sanctioned_date: format_date(sanctioned),
            scheduled_completion_date: format_date(scheduled),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rejects rates outside 0.0..=1.0, which `gen_bool` would panic on.
fn check_rate(at_risk_rate: f64) -> anyhow::Result<f64> {
    if !(0.0..=1.0).contains(&at_risk_rate) {
        anyhow::bail!("at_risk_rate must be between 0.0 and 1.0, got {at_risk_rate}");
    }
    Ok(at_risk_rate)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("load_client=info".parse()?),
        )
        .init();

    info!("Starting DPR load client");

    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| "http://127.0.0.1:8000".to_string());
    let count: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let at_risk_rate = check_rate(args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.3))?;
    let concurrency: usize = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(4);

    info!(
        base_url = %base_url,
        count = count,
        at_risk_rate = at_risk_rate,
        concurrency = concurrency,
        "Configuration loaded"
    );

    let mut generator = ProjectGenerator::new();
    let mut rng = rand::thread_rng();
    let requests: Vec<ProjectRequest> = (0..count)
        .map(|_| {
            if rng.gen_bool(at_risk_rate) {
                generator.generate_at_risk()
            } else {
                generator.generate_on_track()
            }
        })
        .collect();

    let client = reqwest::Client::new();
    if let Err(e) = client.get(format!("{base_url}/health")).send().await {
        warn!(error = %e, "Classifier unreachable. Running in dry-run mode.");
        return run_dry_mode(&requests);
    }

    let url = format!("{base_url}/predict");
    let results: Vec<Result<PredictionResponse, String>> = stream::iter(requests)
        .map(|request| {
            let client = client.clone();
            let url = url.clone();
            async move {
                let response = client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| e.to_string())?;
                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(format!("{status}: {body}"));
                }
                response
                    .json::<PredictionResponse>()
                    .await
                    .map_err(|e| e.to_string())
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut by_label: HashMap<String, usize> = HashMap::new();
    let mut failures = 0;
    for result in &results {
        match result {
            Ok(resp) => *by_label.entry(resp.prediction.to_string()).or_insert(0) += 1,
            Err(e) => {
                failures += 1;
                warn!(error = %e, "Prediction request failed");
            }
        }
    }

    info!(
        sent = results.len(),
        failed = failures,
        labels = ?by_label,
        "Completed"
    );

    Ok(())
}

fn run_dry_mode(requests: &[ProjectRequest]) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no classifier connection)");

    for (i, request) in requests.iter().enumerate() {
        if i == 0 || (i + 1) % 10 == 0 {
            let json = serde_json::to_string_pretty(request)?;
            info!("Sample request {}:\n{}", i + 1, json);
        }
    }

    Ok(())
}
