mod cli;

use cinecache::{
    config::{self, Config},
    ingest::{self, IngestSettings},
    library::{Library, LibraryView},
    metadata::{
        providers::{CinemetaCatalog, ImdbSuggestResolver},
        Identifier,
    },
    server::{self, AppContext},
    subtitles::{SubdlArchive, SubtitleArchive, SubtitleSource, Transcriber, WhisperTranscriber},
    tools, watch,
};
use cinecache_subtitles::{rewrite_srt_file, srt, Segmenter};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn build_identifier(config: &Config) -> Result<Identifier> {
    let timeout = Duration::from_secs(config.catalog.timeout_secs);
    let rps = config.catalog.requests_per_second;
    let resolver = ImdbSuggestResolver::new(&config.catalog.suggest_url, timeout, rps)?;
    let catalog = CinemetaCatalog::new(&config.catalog.cinemeta_url, timeout, rps)?;
    Ok(Identifier::new(Arc::new(resolver), Arc::new(catalog)))
}

fn build_source(config: &Config) -> Result<SubtitleSource> {
    let a = &config.archive;
    let archive: Option<Arc<dyn SubtitleArchive>> = if a.enabled {
        let key = a
            .api_key
            .clone()
            .context("archive.api_key is required when the archive is enabled")?;
        Some(Arc::new(SubdlArchive::new(
            key,
            &a.api_url,
            &a.download_url,
            a.per_page,
            Duration::from_secs(a.download_timeout_secs),
        )?))
    } else {
        None
    };

    let t = &config.transcription;
    let transcriber: Option<Arc<dyn Transcriber>> = t.enabled.then(|| {
        Arc::new(
            WhisperTranscriber::new(&t.model)
                .with_whisper_path(t.whisper_path.clone())
                .with_ffmpeg_path(t.ffmpeg_path.clone())
                .with_translate(t.translate)
                .with_threads(t.threads),
        ) as Arc<dyn Transcriber>
    });

    Ok(SubtitleSource::new(
        archive,
        transcriber,
        Segmenter::new(config.subtitles.policy()),
        &config.archive.languages,
    ))
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting cinecache");
    tracing::info!(
        "Media: {:?}, subtitles: {:?}",
        config.library.media_dir,
        config.library.subtitles_dir
    );

    let library = Arc::new(Library::new());
    let (events, _) = tokio::sync::broadcast::channel(256);

    let (handle, worker) = ingest::spawn_pipeline(
        library.clone(),
        build_identifier(&config)?,
        build_source(&config)?,
        IngestSettings::from_config(&config),
        events.clone(),
    );

    let scan_handle = handle.clone();
    let media_dir = config.library.media_dir.clone();
    let queued = tokio::task::spawn_blocking(move || ingest::initial_scan(&scan_handle, &media_dir))
        .await
        .context("Initial scan panicked")?;
    tracing::info!("Initial scan queued {} files", queued);

    let mut watcher = watch::FileWatcher::new(config.library.clone(), handle.clone());
    watcher.start().await?;

    let view: Arc<dyn LibraryView> = library;
    let ctx = AppContext::new(view, config, events);
    let server_result = server::start_server(ctx).await;

    tracing::info!("Shutting down...");
    watcher.stop();
    drop(handle);
    worker.abort();

    server_result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "cinecache=trace,cinecache_subtitles=debug,cinecache_parser=debug,tower_http=debug"
                .to_string()
        } else {
            "cinecache=info,cinecache_subtitles=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Normalize { name } => {
            let parsed = cinecache_parser::parse(&name);
            println!("Title: {}", parsed.title);
            if let Some(episode) = parsed.episode {
                println!("Episode: {}", episode);
            }
            Ok(())
        }
        Commands::Segment { input, output } => {
            segment_file(&input, output.as_deref(), cli.config.as_deref())
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("cinecache {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn segment_file(input: &Path, output: Option<&Path>, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let segmenter = Segmenter::new(config.subtitles.policy());

    match output {
        None => {
            let count = rewrite_srt_file(input, &segmenter)
                .with_context(|| format!("Failed to rewrite {:?}", input))?;
            println!("Wrote {} segments to {}", count, input.display());
        }
        Some(output) => {
            let content = std::fs::read_to_string(input)
                .with_context(|| format!("Failed to read {:?}", input))?;
            let lines = srt::parse(&content)?;
            let segments = segmenter.segment(&lines);
            std::fs::write(output, srt::format_segments(&segments))
                .with_context(|| format!("Failed to write {:?}", output))?;
            println!(
                "Merged {} lines into {} segments: {}",
                lines.len(),
                segments.len(),
                output.display()
            );
        }
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = tools::check_tools(
        config.transcription.ffmpeg_path.as_deref(),
        config.transcription.whisper_path.as_deref(),
    );
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };
        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    let model = &config.transcription.model;
    if model.exists() {
        println!("✓ whisper model - {}", model.display());
    } else {
        all_ok = false;
        println!("✗ whisper model - {} (missing)", model.display());
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Transcription fallback will be unavailable.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            config::validate_config(&config)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Auth enabled: {}", config.auth.enabled);
            println!("  Media dir: {:?}", config.library.media_dir);
            println!("  Subtitles dir: {:?}", config.library.subtitles_dir);
            println!("  Watch enabled: {}", config.library.watch);
            println!("  Archive enabled: {}", config.archive.enabled);
            println!("  Transcription enabled: {}", config.transcription.enabled);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }
    Ok(())
}
