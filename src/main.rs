use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::warn;

use segsieve::storage::ExecutionRecord;
use segsieve::{DEFAULT_NUM_THREADS, DEFAULT_SEGMENT_LEN, SieveConfig, SieveEngine, reference, storage};

#[derive(Parser)]
#[command(name = "segsieve")]
#[command(about = "Segmented multi-threaded prime sieve", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Find all primes in [lower, upper] and write them to a file")]
    Primes {
        #[arg(help = "The upper limit to search for primes")]
        upper: usize,
        #[arg(short, long, default_value = "0", help = "The lower limit to search for primes")]
        lower: usize,
        #[arg(
            short,
            long,
            default_value_t = DEFAULT_NUM_THREADS,
            help = "Number of worker threads"
        )]
        workers: usize,
        #[arg(long, conflicts_with = "workers", help = "Run with a single worker")]
        sequential: bool,
        #[arg(
            long,
            default_value_t = DEFAULT_SEGMENT_LEN,
            help = "Numbers per segment (multiple of 32)"
        )]
        segment_len: usize,
        #[arg(
            short,
            long,
            help = "Output file (default: primes.txt in the data directory)"
        )]
        output: Option<PathBuf>,
        #[arg(long, help = "Read the output back and compare it with a sequential reference sieve")]
        verify: bool,
    },
    #[command(about = "Create an empty data file")]
    Create {
        #[arg(help = "Path of the file to create")]
        path: PathBuf,
    },
}

/// Diagnostics go to stderr, filtered by RUST_LOG
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Primes {
            upper,
            lower,
            workers,
            sequential,
            segment_len,
            output,
            verify,
        } => {
            if lower > upper {
                bail!("lower limit {} is greater than upper limit {}", lower, upper);
            }

            let output = match output {
                Some(path) => path,
                None => storage::default_output_path().context("Error preparing data directory")?,
            };

            let mut config = SieveConfig::new(lower, upper)
                .with_num_threads(workers)
                .with_segment_len(segment_len);
            if sequential {
                config = config.sequential();
            }
            let num_threads = config.num_threads;

            println!(
                "Finding primes in [{}, {}] with {} worker thread(s)...",
                lower, upper, num_threads
            );

            let start = Instant::now();

            let mut engine = SieveEngine::new(config).context("Error initializing sieve")?;
            let mut sink = segsieve::file_sink(&output)
                .with_context(|| format!("Error opening {}", output.display()))?;
            engine
                .get_primes(&mut sink)
                .with_context(|| format!("Error writing primes to {}", output.display()))?;
            drop(sink);

            let duration = start.elapsed();
            let duration_us = duration.as_micros();
            let prime_count = engine.prime_count();

            println!("\nSaved all primes to {}", output.display());
            println!("Total: {} primes found", prime_count);
            println!(
                "Execution time: {}us ({:.2}ms)",
                duration_us,
                duration_us as f64 / 1000.0
            );

            if verify {
                let written = storage::load_primes(&output)
                    .with_context(|| format!("Error reading back {}", output.display()))?;
                let expected = reference::primes_in_range(lower, upper);
                if let Some(pos) = written.iter().zip(&expected).position(|(w, e)| w != e) {
                    bail!(
                        "verification failed at line {}: wrote {}, reference sieve has {}",
                        pos + 1,
                        written[pos],
                        expected[pos]
                    );
                }
                if written.len() != expected.len() || expected.len() as u64 != prime_count {
                    bail!(
                        "verification failed: file has {} primes, engine counted {}, reference sieve found {}",
                        written.len(),
                        prime_count,
                        expected.len()
                    );
                }
                println!("Verified against reference sieve: {} primes", expected.len());
            }

            let record = ExecutionRecord {
                lower_lim: lower,
                upper_lim: upper,
                num_threads,
                segment_len,
                prime_count,
                elapsed: duration,
            };
            if let Err(e) = storage::log_execution(&record) {
                warn!("Failed to log execution: {}", e);
            }
        }
        Commands::Create { path } => {
            storage::create_data_file(&path)
                .with_context(|| format!("Error creating {}", path.display()))?;
            println!("Created {}", path.display());
        }
    }

    Ok(())
}
