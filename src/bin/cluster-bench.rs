use std::time::{Duration, Instant};

use clap::Parser;
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};

use cluster_proxy::query::Strategy;

#[derive(Parser)]
#[command(name = "cluster-bench")]
#[command(about = "Load generator for the gatekeeper /validate endpoint", long_about = None)]
struct Cli {
    /// Gatekeeper validate URL.
    #[arg(short, long, default_value = "http://localhost:8000/validate")]
    url: String,

    /// Requests per payload and strategy.
    #[arg(short = 'n', long, default_value_t = 1000)]
    requests: usize,

    /// Requests in flight at once.
    #[arg(short, long, default_value_t = 32)]
    concurrency: usize,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    #[arg(long, default_value = "SELECT * FROM actor LIMIT 10;")]
    read_query: String,

    #[arg(
        long,
        default_value = "INSERT INTO actor (first_name, last_name, last_update) VALUES ('BENCH', 'USER', NOW());"
    )]
    write_query: String,

    /// Send a few writes, one per strategy, and read them back before measuring.
    #[arg(long)]
    warm_up: bool,
}

#[derive(Debug, Default)]
struct Outcome {
    successes: usize,
    errors: usize,
    first_error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()?;

    if cli.warm_up {
        warm_up(&client, &cli.url).await;
    }

    for (kind, query) in [("read", &cli.read_query), ("write", &cli.write_query)] {
        for strategy in Strategy::ALL {
            let payload = json!({
                "type": kind,
                "query": query,
                "strategy": strategy.as_str(),
            });

            let start = Instant::now();
            let outcome = run(&client, &cli.url, &payload, cli.requests, cli.concurrency).await;
            let elapsed = start.elapsed();

            println!(
                "{:<5} {:<10} {} requests in {:.2}s ({:.1} req/s): {} ok, {} errors",
                kind,
                strategy.as_str(),
                cli.requests,
                elapsed.as_secs_f64(),
                cli.requests as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
                outcome.successes,
                outcome.errors,
            );
            if let Some(err) = outcome.first_error {
                println!("      first error: {}", err);
            }
        }
    }

    Ok(())
}

async fn run(
    client: &reqwest::Client,
    url: &str,
    payload: &Value,
    requests: usize,
    concurrency: usize,
) -> Outcome {
    let results: Vec<Result<(), String>> = stream::iter(0..requests)
        .map(|_| send(client, url, payload))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut outcome = Outcome::default();
    for result in results {
        match result {
            Ok(()) => outcome.successes += 1,
            Err(e) => {
                outcome.errors += 1;
                outcome.first_error.get_or_insert(e);
            }
        }
    }
    outcome
}

/// One request. Transport failures, non-2xx statuses and bodies with an
/// `error` key all count as errors.
async fn send(client: &reqwest::Client, url: &str, payload: &Value) -> Result<(), String> {
    let res = client
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = res.status();
    let body: Value = res.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        return Err(format!("status {}: {}", status, body));
    }
    if let Some(err) = body.get("error") {
        return Err(err.to_string());
    }
    Ok(())
}

async fn warm_up(client: &reqwest::Client, url: &str) {
    let names = [("JOHN", "DOE"), ("JANE", "SMITH"), ("ALICE", "JOHNSON")];

    println!("Warming up with write requests...");
    for ((first, last), strategy) in names.iter().zip(Strategy::ALL) {
        let payload = json!({
            "type": "write",
            "query": format!(
                "INSERT INTO actor (first_name, last_name, last_update) VALUES ('{}', '{}', NOW());",
                first, last
            ),
            "strategy": strategy.as_str(),
        });
        report("write", send_verbose(client, url, &payload).await);
    }

    println!("Warming up with read request...");
    let payload = json!({
        "type": "read",
        "query": "SELECT * FROM actor WHERE first_name IN ('JOHN', 'JANE', 'ALICE');",
        "strategy": "direct",
    });
    report("read", send_verbose(client, url, &payload).await);
}

async fn send_verbose(
    client: &reqwest::Client,
    url: &str,
    payload: &Value,
) -> Result<(u16, Value), reqwest::Error> {
    let res = client.post(url).json(payload).send().await?;
    let status = res.status().as_u16();
    let body = res.json().await.unwrap_or(Value::Null);
    Ok((status, body))
}

fn report(kind: &str, result: Result<(u16, Value), reqwest::Error>) {
    match result {
        Ok((status, body)) => println!("{} warm-up response: {}, {}", kind, status, body),
        Err(e) => eprintln!("{} warm-up failed: {}", kind, e),
    }
}
