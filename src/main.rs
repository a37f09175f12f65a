//! Docview CLI application entry point
//!
//! This is the main executable for docview. It plays the host around a
//! preview pane: it builds the request from the command line, runs the load,
//! and prints whatever the pane ends up showing.
//!
//! # Usage
//!
//! ```bash
//! # Preview a document
//! docview show https://files.example.com/minutes.docx
//!
//! # Show the third sheet of a workbook as JSON
//! docview show book.xlsx --sheet 2 --format json
//!
//! # Open a PDF in the system viewer
//! docview show https://files.example.com/scan.pdf --open
//!
//! # Show or create the configuration file
//! docview config show
//! docview config init
//! ```
//!
//! # Configuration
//!
//! Settings live in the user's config directory
//! (`~/.config/docview/config.toml` on Linux) and can be overridden with
//! `DOCVIEW_*` environment variables.

use byte_unit::{Byte, UnitType};
use docview::{
    DocviewError,
    cli::{Cli, Commands, ConfigCommands, ShowArgs},
    config::{DocviewConfig, OutputFormat},
    logging, output,
    preview::{FormatFamily, HttpFetcher, PreviewPane, SourceFetcher},
};
use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

type Result<T> = std::result::Result<T, DocviewError>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = DocviewConfig::load()?;
    if !config.color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Show(args) => handle_show_command(&args, &config, cli.quiet).await,
        Commands::Config { command } => {
            handle_config_command(command, &config, cli.quiet)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Handle the show command - load one preview and print it
///
/// # Errors
///
/// Returns `DocviewError` if the fetcher cannot be built, the requested sheet
/// does not exist, or output/export fails. A failed load is not an error
/// here; it is printed and reported through the exit code.
async fn handle_show_command(args: &ShowArgs, config: &DocviewConfig, quiet: bool) -> Result<ExitCode> {
    let request = args.to_request();
    let http = HttpFetcher::new(&config.user_agent, config.request_timeout())?;
    let mut pane = PreviewPane::with_max_file_size(
        Arc::new(SourceFetcher::new(http)),
        config.max_file_size,
    );

    pane.load(request.clone()).await;

    if pane.state().error().is_none() && args.sheet != 0 {
        pane.select_sheet(args.sheet)?;
    }

    let format = args.format.unwrap_or(config.output);
    match format {
        OutputFormat::Json => println!("{}", output::render_json(&pane)?),
        OutputFormat::Text => {
            let max_rows = args.max_rows.unwrap_or(config.max_rows);
            println!("{}", output::render_text(&pane, max_rows));
            if !quiet {
                print_sheet_summary(&pane);
            }
        }
    }

    if let Some(path) = &args.export {
        let sheet = pane.active_sheet().ok_or_else(|| {
            DocviewError::InvalidInput("No sheet loaded to export".to_string())
        })?;
        output::export_sheet_csv(sheet, BufWriter::new(File::create(path)?))?;
        if !quiet {
            println!("Exported '{}' to {}", sheet.name, path.display());
        }
    }

    if args.open && pane.state().error().is_none() {
        match request.declared_type().family() {
            FormatFamily::Embed | FormatFamily::Unsupported => {
                info!(source = request.source_url(), "opening with system handler");
                open::that(request.source_url())?;
            }
            FormatFamily::Document | FormatFamily::Spreadsheet | FormatFamily::Delimited => {
                debug!("--open ignored: rendered in place");
            }
        }
    }

    Ok(if pane.state().error().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_sheet_summary(pane: &PreviewPane) {
    let state = pane.state();
    if let Some(sheet) = state.active_sheet() {
        let cells: usize = sheet.rows.iter().map(Vec::len).sum();
        let approx = Byte::from_u64(sheet.rows.iter().flatten().map(|c| c.len() as u64).sum())
            .get_appropriate_unit(UnitType::Binary);
        println!(
            "\nSheet {}/{}: {} rows x {} columns, {} cells ({approx} of text)",
            state.active_sheet_index() + 1,
            state.sheets().len(),
            sheet.rows.len(),
            sheet.width(),
            cells,
        );
    }
}

/// Handle config subcommands
///
/// # Errors
///
/// Returns `DocviewError` if the config file location cannot be determined,
/// serialized, or written.
fn handle_config_command(command: ConfigCommands, config: &DocviewConfig, quiet: bool) -> Result<()> {
    match command {
        ConfigCommands::Show => print!("{}", config.to_toml()?),
        ConfigCommands::Path => println!("{}", DocviewConfig::config_path()?.display()),
        ConfigCommands::Init => {
            let path = DocviewConfig::config_path()?;
            let written = DocviewConfig::init_at(&path)?;
            if !quiet {
                if written {
                    println!("Wrote default configuration to {}", path.display());
                } else {
                    println!("Configuration already exists at {}", path.display());
                }
            }
        }
    }
    Ok(())
}
