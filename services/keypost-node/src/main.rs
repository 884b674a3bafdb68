//! `keypost`: run a Bob/Alice RSA exchange and time its operations.

use anyhow::{Context, Result};
use clap::Parser;
use keypost_bench::{renderer_for, repeated, single_pass, DEFAULT_TITLE};
use keypost_core::{logging, Config};
use keypost_exchange::{
    ExchangeOutcome, ExchangeSettings, KeyTransport, LoopbackTransport, MessageExchange,
    ResendTransport,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Recipient used when the exchange stays in-process.
const LOOPBACK_RECIPIENT: &str = "alice@localhost";

#[derive(Parser, Debug)]
#[command(name = "keypost", version, about = "RSA signing and encryption exchange with timing")]
struct Args {
    /// Message to sign and encrypt; words are joined with spaces
    message: Vec<String>,

    /// TOML configuration file
    #[arg(short, long, env = "KEYPOST_CONFIG")]
    config: Option<PathBuf>,

    /// RSA modulus size in bits
    #[arg(long)]
    bits: Option<usize>,

    /// Iterations for the repeated benchmark
    #[arg(long)]
    iterations: Option<usize>,

    /// Directory for chart output
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Skip the benchmark suites
    #[arg(long)]
    no_bench: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    let config = load_config(&args)?;
    info!(
        key_bits = config.exchange.key_bits,
        iterations = config.bench.iterations,
        transport = if config.transport_enabled() { "resend" } else { "loopback" },
        "Starting keypost"
    );

    let outcome = run_exchange(&config)?;
    print_outcome(&outcome);

    if config.bench.enabled {
        run_benchmarks(&config)?;
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default_config(),
    };
    config.apply_env();

    if !args.message.is_empty() {
        config.exchange.message = args.message.join(" ");
    }
    if let Some(bits) = args.bits {
        config.exchange.key_bits = bits;
    }
    if let Some(iterations) = args.iterations {
        config.bench.iterations = iterations;
    }
    if let Some(dir) = &args.output_dir {
        config.bench.output_dir = dir.clone();
    }
    if args.no_bench {
        config.bench.enabled = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run_exchange(config: &Config) -> Result<ExchangeOutcome> {
    let mut settings = ExchangeSettings::from(&config.exchange);

    let transport: Box<dyn KeyTransport> = match ResendTransport::from_config(&config.transport)? {
        Some(resend) if config.transport_enabled() => Box::new(resend),
        _ => {
            if settings.recipients.is_empty() {
                settings.recipients = vec![LOOPBACK_RECIPIENT.to_string()];
            }
            Box::new(LoopbackTransport::new())
        }
    };

    let mut exchange = MessageExchange::new(transport, settings);
    let outcome = exchange.run().context("Message exchange failed")?;
    Ok(outcome)
}

fn print_outcome(outcome: &ExchangeOutcome) {
    println!("Chave pública de Bob (enviada para Alice):\n{}", outcome.public_key);
    println!("[Impressão digital]: {}", outcome.fingerprint);
    println!("Bob assinou a mensagem com sucesso!");
    println!("[Assinatura (em bytes)]: {}\n", outcome.signature.to_hex());
    println!("Alice cifrou a mensagem com a chave pública de Bob.");
    println!("[Mensagem cifrada]: {}\n", outcome.ciphertext.to_hex());
    println!("Alice verificou a autenticidade da mensagem com sucesso!");
    println!("Bob decifrou a mensagem com sucesso!");
    println!("[Mensagem recebida]: {}\n", outcome.recovered);
}

fn run_benchmarks(config: &Config) -> Result<()> {
    let bits = config.exchange.key_bits;
    let message = &config.exchange.message;
    let output_dir = &config.bench.output_dir;

    println!("{}", "-".repeat(114));
    println!("[TEMPO MEDIO]:");
    let report = single_pass(bits, message).context("Single pass benchmark failed")?;
    for step in &report.steps {
        println!("Tempo para {}: {} ms", step.step, step.elapsed.as_millis());
    }
    println!("Tempo total: {} ms", report.total().as_millis());

    println!("\n[TEMPO MEDIO EXECUTADO {} VEZES]:", config.bench.iterations);
    let repeated_report = repeated(bits, config.bench.iterations, message)
        .context("Repeated benchmark failed")?;
    for m in &repeated_report.measurements {
        println!(
            "Tempo médio para {}: {} ms (mediana {:.3} ms, p95 {:.3} ms)",
            m.operation,
            m.average_ms(),
            m.median().unwrap_or_default().as_secs_f64() * 1000.0,
            m.percentile(95).unwrap_or_default().as_secs_f64() * 1000.0
        );
    }

    render(
        &output_dir.join(&config.bench.single_pass_chart),
        &report.series_ms(),
    );
    render(
        &output_dir.join(&config.bench.repeated_chart),
        &repeated_report.timeline_ms(),
    );
    Ok(())
}

/// Charts are best effort; a failure never changes the printed results.
fn render(path: &Path, points: &[(f64, f64)]) {
    match renderer_for(path).render(DEFAULT_TITLE, points, path) {
        Ok(()) => println!("Gráfico salvo em {}", path.display()),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to render chart"),
    }
}
