use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use eloquent_client::LanguageToolClient;
use eloquent_core::{
    DEFAULT_LANGUAGE, EditorHandle, EditorSnapshot, load_languages, segments_to_html,
    sort_languages, spawn_editor, status_line,
};
use miette::{IntoDiagnostic, Result};

mod config;
mod output;
mod telemetry;

use config::ServerArgs;
use output::{Format, JsonReport};

#[derive(Parser)]
#[command(version, about = "Eloquent - grammar and spelling annotations from a LanguageTool server", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the languages the server supports
    Languages,
    /// Check a file (or stdin) and report issues
    Check {
        /// File to check; reads stdin when omitted or `-`
        file: Option<PathBuf>,

        /// Language code, e.g. en-GB or de-DE
        #[arg(short, long, env = "ELOQUENT_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
        language: String,

        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },
    /// Apply the first suggestion for each issue until the text is clean
    Fix {
        /// File to fix; reads stdin when omitted or `-`
        file: Option<PathBuf>,

        /// Language code, e.g. en-GB or de-DE
        #[arg(short, long, env = "ELOQUENT_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
        language: String,

        /// Stop after this many corrections
        #[arg(long, default_value_t = 50)]
        max_rounds: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    telemetry::init();

    let cli = Cli::parse();
    let client = LanguageToolClient::new(cli.server.client_config()?)?;

    match cli.command {
        Commands::Languages => list_languages(&client, &cli.server).await?,
        Commands::Check {
            file,
            language,
            format,
        } => {
            let text = read_input(file.as_deref())?;
            let editor = spawn_editor(client, cli.server.editor_config(&language));
            let outcome = check(&editor, &text, format).await;
            editor.shutdown().await;
            outcome?;
        }
        Commands::Fix {
            file,
            language,
            max_rounds,
        } => {
            let text = read_input(file.as_deref())?;
            let editor = spawn_editor(client, cli.server.editor_config(&language));
            let outcome = fix(&editor, &text, max_rounds).await;
            editor.shutdown().await;
            outcome?;
        }
    }

    Ok(())
}

async fn list_languages(client: &LanguageToolClient, server: &ServerArgs) -> Result<()> {
    let mut languages = load_languages(client, server.language_retry()).await?;
    sort_languages(&mut languages);
    for language in &languages {
        println!("{:<12} {}", language.selection_value(), language.name);
    }
    Ok(())
}

/// Replace the buffer with `text`, check it right away and wait for the
/// result to land.
async fn check_text(editor: &EditorHandle, text: &str) -> Result<EditorSnapshot> {
    let before = editor.snapshot().version;
    editor.edit(text)?;
    editor.check_now()?;
    Ok(editor
        .wait_for(|s| s.version > before && s.is_settled())
        .await?)
}

fn fail_on_error(snapshot: &EditorSnapshot) -> Result<()> {
    match snapshot.status.error_message() {
        Some(message) => Err(miette::miette!("{message}")),
        None => Ok(()),
    }
}

async fn check(editor: &EditorHandle, text: &str, format: Format) -> Result<()> {
    let snapshot = check_text(editor, text).await?;
    fail_on_error(&snapshot)?;

    match format {
        Format::Text => print!("{}", output::listing(&snapshot)),
        Format::Html => println!("{}", segments_to_html(&snapshot.segments).into_diagnostic()?),
        Format::Json => println!(
            "{}",
            serde_json::to_string_pretty(&JsonReport::new(&snapshot)).into_diagnostic()?
        ),
    }

    let blank = text.trim().is_empty();
    if let Some(line) = status_line(&snapshot.status, snapshot.summary, blank, true) {
        eprintln!("{line}");
    }
    Ok(())
}

async fn fix(editor: &EditorHandle, text: &str, max_rounds: usize) -> Result<()> {
    let mut snapshot = check_text(editor, text).await?;
    fail_on_error(&snapshot)?;

    let mut rounds = 0;
    while rounds < max_rounds {
        let Some((index, replacement)) = snapshot
            .spans
            .iter()
            .enumerate()
            .find_map(|(i, span)| span.replacements.first().map(|r| (i, r.clone())))
        else {
            break;
        };
        let before = snapshot.version;
        editor.apply_correction(index, replacement).await?;
        snapshot = editor
            .wait_for(|s| s.version > before && s.is_settled())
            .await?;
        fail_on_error(&snapshot)?;
        rounds += 1;
    }

    print!("{}", snapshot.text);
    eprintln!(
        "{rounds} correction{} applied, {} issue{} left",
        if rounds == 1 { "" } else { "s" },
        snapshot.summary.total(),
        if snapshot.summary.total() == 1 { "" } else { "s" },
    );
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .into_diagnostic()
            .map_err(|e| e.wrap_err(format!("failed to read {}", path.display()))),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .into_diagnostic()?;
            Ok(text)
        }
    }
}

fn init_miette() {
    let hook = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    if hook.is_ok() {
        miette::set_panic_hook();
    }
}
