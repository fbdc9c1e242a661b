use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use tracing::info;

use ttsvault::core::voices::{STYLES, VOICES};
use ttsvault::{
    AppConfig, ConversionRequest, ConversionWorkflow, HttpSynthesizer, Outcome, ProgressState,
    RecordStore,
};

const USAGE: &str = "\
ttsvault: text-to-speech conversion with local history

USAGE:
    ttsvault init
    ttsvault voices
    ttsvault convert <text> [--voice LABEL] [--style STYLE] [--out PATH]
    ttsvault settings show
    ttsvault settings set [--api-key KEY] [--region REGION] [--endpoint URL] [--folder DIR]
    ttsvault history list
    ttsvault history show <id>
    ttsvault history open <id>
    ttsvault history download <id> <dest>
    ttsvault history regen <id> [--text TEXT] [--voice LABEL] [--style STYLE] [--out PATH]
    ttsvault history delete <id>

Pause markers: write [p-2] inside the text for a two-second pause.
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = env::args();
    let _ = args.next();
    let command = match args.next() {
        Some(command) => command,
        None => {
            print!("{USAGE}");
            return Ok(());
        }
    };

    let config = AppConfig::from_env();

    match command.as_str() {
        "init" => {
            let _ = open_store(&config).await?;
            println!("Initialized database at {}", config.db_path.display());
            Ok(())
        }
        "voices" => {
            print_voices();
            Ok(())
        }
        "convert" => run_convert(&config, &mut args).await,
        "settings" => run_settings(&config, &mut args).await,
        "history" => run_history(&config, &mut args).await,
        "help" | "--help" | "-h" => {
            print!("{USAGE}");
            Ok(())
        }
        other => bail!("Unknown command '{other}'. Run `ttsvault help` for usage."),
    }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<RecordStore> {
    RecordStore::open(&config.db_path, &config.output_dir)
        .await
        .with_context(|| format!("opening record store at {}", config.db_path.display()))
}

fn print_voices() {
    println!("Voices:");
    for voice in &VOICES {
        println!(
            "  {:<28} {}  {:<6}  {}",
            voice.label, voice.language, voice.gender, voice.voice_name
        );
    }
    println!("Styles: {}", STYLES.join(", "));
}

/// Arguments shared by `convert` and `history regen`.
#[derive(Default)]
struct ConvertArgs {
    text: Option<String>,
    voice: Option<String>,
    style: Option<String>,
    out: Option<PathBuf>,
}

impl ConvertArgs {
    fn parse_flags(args: &mut env::Args) -> anyhow::Result<Self> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--text" => {
                    parsed.text = Some(args.next().ok_or_else(|| anyhow!("--text requires a value"))?)
                }
                "--voice" => {
                    parsed.voice =
                        Some(args.next().ok_or_else(|| anyhow!("--voice requires a value"))?)
                }
                "--style" => {
                    parsed.style =
                        Some(args.next().ok_or_else(|| anyhow!("--style requires a value"))?)
                }
                "--out" => {
                    parsed.out = Some(PathBuf::from(
                        args.next().ok_or_else(|| anyhow!("--out requires a value"))?,
                    ))
                }
                other => bail!("Unknown option '{other}'"),
            }
        }
        Ok(parsed)
    }
}

async fn run_workflow(
    store: RecordStore,
    request: ConversionRequest,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let synthesizer = HttpSynthesizer::new().context("building HTTP client")?;
    let workflow = ConversionWorkflow::new(store, synthesizer);

    // Surface the in-flight indicator as log lines.
    let mut progress = workflow.subscribe_progress();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            match *progress.borrow() {
                ProgressState::InFlight => info!("synthesis request in flight"),
                ProgressState::Idle => info!("synthesis request finished"),
            }
        }
    });

    let outcome = workflow
        .run(&request, |proposed| Some(out.unwrap_or(proposed)))
        .await;
    watcher.abort();

    match outcome? {
        Outcome::Completed {
            entry_id,
            path,
            audio_bytes,
        } => {
            println!(
                "Saved {} bytes to {} (history entry {})",
                audio_bytes,
                path.display(),
                entry_id
            );
        }
        Outcome::Reused { path } => {
            println!(
                "A file for the same text/voice/style already exists: {}\nNo new file was created.",
                path.display()
            );
        }
        Outcome::Cancelled => println!("Cancelled; nothing was created."),
    }
    Ok(())
}

async fn run_convert(config: &AppConfig, args: &mut env::Args) -> anyhow::Result<()> {
    let text = args
        .next()
        .ok_or_else(|| anyhow!("convert requires the text as its first argument"))?;
    let flags = ConvertArgs::parse_flags(args)?;

    let request = ConversionRequest {
        text: flags.text.unwrap_or(text),
        voice: flags.voice.unwrap_or_else(|| VOICES[0].label.to_string()),
        style: flags.style.unwrap_or_else(|| "default".to_string()),
    };

    let store = open_store(config).await?;
    run_workflow(store, request, flags.out).await
}

async fn run_settings(config: &AppConfig, args: &mut env::Args) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let action = args
        .next()
        .ok_or_else(|| anyhow!("settings requires `show` or `set`"))?;

    match action.as_str() {
        "show" => {
            let settings = store.load_settings().await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        "set" => {
            let mut settings = store.load_settings().await?;
            let mut endpoint_given = false;
            let mut region_given = false;

            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--api-key" => {
                        settings.api_key = args
                            .next()
                            .ok_or_else(|| anyhow!("--api-key requires a value"))?
                    }
                    "--region" => {
                        settings.region = args
                            .next()
                            .ok_or_else(|| anyhow!("--region requires a value"))?;
                        region_given = true;
                    }
                    "--endpoint" => {
                        settings.endpoint = args
                            .next()
                            .ok_or_else(|| anyhow!("--endpoint requires a value"))?;
                        endpoint_given = true;
                    }
                    "--folder" => {
                        settings.default_folder = PathBuf::from(
                            args.next().ok_or_else(|| anyhow!("--folder requires a value"))?,
                        )
                    }
                    other => bail!("Unknown option '{other}'"),
                }
            }

            // Changing the region implies the matching endpoint unless one
            // was given explicitly.
            if region_given && !endpoint_given {
                settings.endpoint = ttsvault::synth::tts_rest_url(&settings.region);
            }

            store.save_settings(&settings).await?;
            println!("Settings updated.");
            Ok(())
        }
        other => bail!("Unknown settings action '{other}'"),
    }
}

async fn run_history(config: &AppConfig, args: &mut env::Args) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let action = args
        .next()
        .ok_or_else(|| anyhow!("history requires an action (list, show, open, download, regen, delete)"))?;

    match action.as_str() {
        "list" => {
            let listings = store.list_history().await?;
            if listings.is_empty() {
                println!("History is empty.");
                return Ok(());
            }
            for item in listings {
                println!(
                    "{:>5}  {}  {:<28} {:<12} {}\n       {}",
                    item.id,
                    item.created_at,
                    item.voice,
                    item.style,
                    item.file_path.display(),
                    item.preview
                );
            }
            Ok(())
        }
        "show" => {
            let id = parse_id(args)?;
            let entry = store
                .get_history_item(id)
                .await?
                .ok_or_else(|| anyhow!("history entry {id} not found"))?;
            println!("id:          {}", entry.id);
            println!("created:     {}", entry.created_at);
            println!("voice:       {}", entry.voice);
            println!("style:       {}", entry.style);
            println!("format:      {}", entry.output_format);
            println!("fingerprint: {}", entry.fingerprint);
            println!("file:        {}", entry.file_path.display());
            println!("text:        {}", entry.text);
            Ok(())
        }
        "open" => {
            let id = parse_id(args)?;
            let entry = store
                .get_history_item(id)
                .await?
                .ok_or_else(|| anyhow!("history entry {id} not found"))?;
            if !entry.file_path.exists() {
                bail!("file not found on disk: {}", entry.file_path.display());
            }
            ttsvault::utils::open_file(&entry.file_path)
                .with_context(|| format!("opening {}", entry.file_path.display()))?;
            Ok(())
        }
        "download" => {
            let id = parse_id(args)?;
            let dest = PathBuf::from(
                args.next()
                    .ok_or_else(|| anyhow!("download requires a destination path"))?,
            );
            let entry = store
                .get_history_item(id)
                .await?
                .ok_or_else(|| anyhow!("history entry {id} not found"))?;
            if !entry.file_path.exists() {
                bail!("file not found on disk: {}", entry.file_path.display());
            }
            std::fs::copy(&entry.file_path, &dest)
                .with_context(|| format!("copying to {}", dest.display()))?;
            println!("Saved to {}", dest.display());
            Ok(())
        }
        "regen" => {
            let id = parse_id(args)?;
            let flags = ConvertArgs::parse_flags(args)?;
            let entry = store
                .get_history_item(id)
                .await?
                .ok_or_else(|| anyhow!("history entry {id} not found"))?;

            let request = ConversionRequest {
                text: flags.text.unwrap_or(entry.text),
                voice: flags.voice.unwrap_or(entry.voice),
                style: flags.style.unwrap_or(entry.style),
            };
            run_workflow(store, request, flags.out).await
        }
        "delete" => {
            let id = parse_id(args)?;
            store.delete_history_item(id).await?;
            println!("Deleted history entry {id}.");
            Ok(())
        }
        other => bail!("Unknown history action '{other}'"),
    }
}

fn parse_id(args: &mut env::Args) -> anyhow::Result<i64> {
    let raw = args
        .next()
        .ok_or_else(|| anyhow!("expected a history entry id"))?;
    raw.parse()
        .map_err(|_| anyhow!("'{raw}' is not a valid history entry id"))
}
