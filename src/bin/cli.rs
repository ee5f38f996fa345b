use bloomfile::{
    BloomFilter, BloomFilterOps, BloomFilterStats, LoadDiagnostic, Severity,
    common::{ASCII_PREVIEW_LEN, ascii_preview, bits2hr, hex_dump, raw_hex},
    optimal_parameters,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a .bf file from a text file, one element per line
    Create {
        /// Text file with one element per line
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (defaults to the input path with a .bf extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// False positive rate (between 0 and 1)
        #[arg(short, long, default_value = "0.00000000000001")]
        error_rate: f64,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the bit count and hash count for a planned filter
    Params {
        /// Expected number of elements
        #[arg(short, long)]
        count: usize,

        /// False positive rate (between 0 and 1)
        #[arg(short, long, default_value = "0.01")]
        error_rate: f64,
    },

    /// Display header and statistics of a .bf file
    Info {
        file: PathBuf,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether elements may be in the filter
    Check {
        file: PathBuf,

        #[arg(required = true)]
        elements: Vec<String>,
    },

    /// Insert elements and write the filter back
    Insert {
        file: PathBuf,

        #[arg(required = true)]
        elements: Vec<String>,
    },

    /// Dump the raw bit array
    Dump {
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = DumpMode::Hex)]
        mode: DumpMode,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DumpMode {
    /// Offset, hex and ASCII columns
    Hex,
    /// ASCII preview of the first 64 bytes
    Ascii,
    /// Continuous hex string
    Raw,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Create {
            input,
            output,
            error_rate,
            force,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("bf"));
            if output.exists() && !force {
                return Err(format!(
                    "{} already exists, use --force to overwrite it",
                    output.display()
                )
                .into());
            }

            let reader = BufReader::new(File::open(&input)?);
            let filter = BloomFilter::from_reader(reader, error_rate)?;
            filter.save_to_path(&output)?;

            info!(path = %output.display(), "Bloom filter created");
            println!("Created {}", output.display());
            print_header(&filter);
        }
        Commands::Params { count, error_rate } => {
            let (m, k) = optimal_parameters(count, error_rate)?;
            println!("Bits (m): {m}");
            println!("Hash functions (k): {k}");
            println!("Memory: {}", bits2hr(m));
        }
        Commands::Info { file, json } => {
            let filter = load(&file)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&filter.stats())?);
            } else {
                println!("File: {}", file.display());
                print_header(&filter);
                let stats = filter.stats();
                println!("Active bits (1s): {}", stats.set_bits);
                println!("Density: {:.6}%", stats.density * 100.0);
                println!("Bit array: {}", bits2hr(stats.byte_len * 8));
                println!("Estimated false positive rate: {:e}", stats.estimated_fpr);
            }
        }
        Commands::Check { file, elements } => {
            let filter = load(&file)?;
            for element in &elements {
                if filter.contains(element)? {
                    println!("Element '{element}' may exist in the filter");
                } else {
                    println!("Element '{element}' does not exist in the filter");
                }
            }
        }
        Commands::Insert { file, elements } => {
            let mut filter = load(&file)?;
            for element in &elements {
                filter.insert(element)?;
            }
            filter.save_to_path(&file)?;
            println!(
                "Inserted {} element(s), filter now holds {}",
                elements.len(),
                filter.insert_count()
            );
        }
        Commands::Dump { file, mode } => {
            let filter = load(&file)?;
            let bytes = filter.as_bytes();
            match mode {
                DumpMode::Hex => {
                    for line in hex_dump(bytes) {
                        println!("{line}");
                    }
                }
                DumpMode::Ascii => {
                    println!("{}", ascii_preview(bytes, ASCII_PREVIEW_LEN))
                }
                DumpMode::Raw => println!("{}", raw_hex(bytes)),
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<BloomFilter, Box<dyn std::error::Error>> {
    let (filter, diagnostics) = BloomFilter::load_from_path(path)?;
    report(&diagnostics);
    Ok(filter)
}

fn report(diagnostics: &[LoadDiagnostic]) {
    for diagnostic in diagnostics {
        let label = match diagnostic.severity() {
            Severity::Warning => "warning",
            Severity::Info => "note",
        };
        eprintln!("{label}: {diagnostic}");
    }
}

fn print_header(filter: &BloomFilter) {
    println!("Size (bits): {}", filter.m());
    println!("Number of hash functions: {}", filter.k());
    println!("Number of elements: {}", filter.n());
    println!("Error rate: {}", filter.error_rate());
}
