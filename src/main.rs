use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pagefill::{Bindings, Config, HtmlRenderer, PdfRenderer, TypstRenderer};

#[derive(Parser)]
#[command(name = "pagefill", version)]
#[command(about = "Fill a Markdown page template with variables and render it")]
struct Cli {
    /// Input Markdown template
    template: PathBuf,

    /// TOML file of variables (name = "value")
    #[arg(long)]
    vars: Option<PathBuf>,

    /// Set a variable, overriding the variables file (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    assignments: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Output file (defaults to stdout; PDF defaults to the template name with .pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file
    #[arg(long, default_value = "pagefill.toml")]
    config: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Typst,
    Pdf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let template = fs::read_to_string(&cli.template)
        .with_context(|| format!("failed to read {}", cli.template.display()))?;

    let mut bindings = match &cli.vars {
        Some(path) => Bindings::load(path)?,
        None => Bindings::new(),
    };
    for assignment in &cli.assignments {
        bindings.assign(assignment)?;
    }
    tracing::info!(variables = bindings.len(), "loaded variables");

    for name in pagefill::missing_variables(&template, &bindings) {
        tracing::warn!("no value for {{{name}}}");
    }

    let config = Config::load(&cli.config);
    let tables = config.tables.clone();

    let bytes = match cli.format {
        Format::Html => pagefill::render_with(&template, &bindings, &tables, &HtmlRenderer)?
            .into_bytes(),
        Format::Typst => {
            pagefill::render_with(&template, &bindings, &tables, &TypstRenderer::new(config))?
                .into_bytes()
        }
        Format::Pdf => {
            pagefill::render_with(&template, &bindings, &tables, &PdfRenderer::new(config))?
        }
    };

    let output = match (cli.output, cli.format) {
        (Some(path), _) => Some(path),
        (None, Format::Pdf) => Some(cli.template.with_extension("pdf")),
        (None, _) => None,
    };

    match output {
        Some(path) => {
            fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Created {}", path.display());
        }
        None => io::stdout().write_all(&bytes)?,
    }

    Ok(())
}
