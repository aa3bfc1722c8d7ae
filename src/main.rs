use clap::{Parser, Subcommand};
use qetag::backends::backend_and_path;
use std::process::ExitCode;

/// Command-line interface for qetag
#[derive(Parser, Debug)]
#[command(name = "qetag", version, about = "Block-hashed content Etags for object-storage uploads")]
struct Cli {
    /// Number of threads to use (global)
    #[arg(short, long, value_name = "THREADS", global = true, default_value_t = num_cpus::get())]
    threads: usize,

    /// Regex for files to include when walking directories (global)
    #[arg(short, long, value_name = "INCLUDE", global = true)]
    include: Option<String>,

    /// Regex for files to exclude when walking directories (global)
    #[arg(short, long, value_name = "EXCLUDE", global = true)]
    exclude: Option<String>,

    /// Disables the progress bar (global)
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the Etag of each file (directories are walked recursively)
    Sum {
        /// Paths (e.g., file:///path/to/file or a plain path)
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Compare a file's Etag against an expected value
    Check {
        /// Expected Etag
        etag: String,
        /// File path
        path: String,
    },
}

fn parse_regex(pattern: Option<&String>) -> Result<Option<regex::Regex>, regex::Error> {
    pattern.map(|p| regex::Regex::new(p)).transpose()
}

fn main() -> ExitCode {
    // Initialize logging using env_logger and QETAG_LOG
    env_logger::Builder::from_env(env_logger::Env::new().filter("QETAG_LOG")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sum { paths } => {
            let mut normalized = Vec::with_capacity(paths.len());
            let mut backend = None;
            for path in &paths {
                match backend_and_path(path) {
                    Ok((b, p)) => {
                        backend.get_or_insert(b);
                        normalized.push(p.to_path_buf());
                    }
                    Err(e) => {
                        eprintln!("Invalid path {}: {}", path, e);
                        return ExitCode::FAILURE;
                    }
                }
            }
            let Some(backend) = backend else {
                return ExitCode::FAILURE;
            };

            // Prepare regex filters
            let include_re = match parse_regex(cli.include.as_ref()) {
                Ok(re) => re,
                Err(e) => {
                    eprintln!("Invalid include regex: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            let exclude_re = match parse_regex(cli.exclude.as_ref()) {
                Ok(re) => re,
                Err(e) => {
                    eprintln!("Invalid exclude regex: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            let options = qetag::SumOptions {
                threads: cli.threads,
                include: include_re.as_ref(),
                exclude: exclude_re.as_ref(),
                no_progress: cli.no_progress,
            };

            let mut failed = 0usize;
            for file in qetag::sum_paths(backend, &normalized, &options) {
                match file.result {
                    Ok(etag) => println!("{}  {}", etag, file.path.display()),
                    Err(e) => {
                        eprintln!("{}: {}", file.path.display(), e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                eprintln!("{} files failed", failed);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Commands::Check { etag, path } => {
            let (backend, path) = match backend_and_path(&path) {
                Ok((b, p)) => (b, p),
                Err(e) => {
                    eprintln!("Invalid path: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            match qetag::sum_with(backend.as_ref(), path) {
                Ok(actual) if actual == etag.as_str() => {
                    println!("{}: OK", path.display());
                    ExitCode::SUCCESS
                }
                Ok(actual) => {
                    println!(
                        "{}: MISMATCH (expected {}, got {})",
                        path.display(),
                        etag,
                        actual
                    );
                    ExitCode::FAILURE
                }
                Err(e) => {
                    eprintln!("{}: {}", path.display(), e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
