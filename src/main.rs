use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::Parser;
use mimalloc::MiMalloc;
use template::compiler::{CompileOptions, Delimiters};
use template::{DiagnosticKind, DiagnosticSink, RenderError, web};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Compile a template to render code and optionally render it with data.
#[derive(Parser)]
#[command(name = "tplc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Template file to compile
    template: PathBuf,

    /// JSON file with render data; prints rendered HTML when given
    data: Option<PathBuf>,

    /// Report errors with a code frame
    #[arg(long)]
    ranges: bool,

    /// Keep comments in the output
    #[arg(long)]
    comments: bool,

    /// Skip static subtree hoisting
    #[arg(long)]
    no_optimize: bool,

    /// Interpolation delimiters, e.g. `--delimiters '${' '}'`
    #[arg(long, num_args = 2, value_names = ["OPEN", "CLOSE"])]
    delimiters: Option<Vec<String>>,
}

impl Cli {
    fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            output_source_range: Some(self.ranges),
            comments: Some(self.comments),
            optimize: Some(!self.no_optimize),
            delimiters: self
                .delimiters
                .as_deref()
                .and_then(|pair| match pair {
                    [open, close] => Some(Delimiters::new(open, close)),
                    _ => None,
                }),
            ..CompileOptions::default()
        }
    }
}

#[derive(Debug)]
enum CliError {
    Io { path: PathBuf, source: io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    Compile { errors: usize },
    Render(RenderError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            CliError::Json { path, source } => write!(f, "invalid JSON in {}: {source}", path.display()),
            CliError::Compile { errors } => write!(f, "template has {errors} error(s)"),
            CliError::Render(err) => write!(f, "render failed: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CliError::Io { source, .. } => Some(source),
            CliError::Json { source, .. } => Some(source),
            CliError::Compile { .. } => None,
            CliError::Render(err) => Some(err),
        }
    }
}

/// Prints reports to stderr and counts errors.
#[derive(Debug, Default)]
struct StderrSink {
    errors: AtomicUsize,
}

impl DiagnosticSink for StderrSink {
    fn report(&self, message: &str, kind: DiagnosticKind, context: Option<&str>) {
        let label = match kind {
            DiagnosticKind::Error => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                "error"
            }
            DiagnosticKind::Tip => "tip",
        };
        match context {
            Some(context) => eprintln!("[{label}] {context}: {message}"),
            None => eprintln!("[{label}] {message}"),
        }
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let template = read(&cli.template)?;
    let sink = Arc::new(StderrSink::default());
    let compiler = web::create_compiler().with_sink(sink.clone());
    let options = cli.compile_options();

    let compiled = compiler.compile(&template, Some(&options));
    println!("render: {}", compiled.render);
    for (index, code) in compiled.static_render_fns.iter().enumerate() {
        println!("static[{index}]: {code}");
    }

    let context = cli.template.display().to_string();
    let functions = compiler.compile_to_functions(&template, Some(&options), Some(&context));
    let errors = sink.errors.load(Ordering::Relaxed);
    log::debug!(target: "tplc", "compiled {context}: errors={errors}");
    if errors > 0 {
        return Err(CliError::Compile { errors });
    }

    let Some(data_path) = &cli.data else {
        return Ok(());
    };
    let data: serde_json::Value = serde_json::from_str(&read(data_path)?).map_err(|source| CliError::Json {
        path: data_path.clone(),
        source,
    })?;
    let html = functions.render(&data).map_err(CliError::Render)?;
    println!("{html}");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tplc: {err}");
            ExitCode::FAILURE
        }
    }
}
