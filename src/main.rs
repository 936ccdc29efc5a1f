mod cli;

use convid::{
    batch::{self, BatchOptions, BatchRunner, DiscoveryOptions, FfmpegConverter},
    config, probe,
    report::{BatchObserver, QuietReporter, TerminalReporter},
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use convid_av::{build_transcode_command, select_plan};
use std::path::{Path, PathBuf};

struct ConvertArgs {
    paths: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    overwrite: bool,
    no_recursive: bool,
    dry_run: bool,
    quiet: bool,
    strict: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "convid=debug,convid_av=debug".to_string()
        } else {
            "convid=info,convid_av=info".to_string()
        }
    });

    // Progress bars and summaries own stdout
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            paths,
            output_dir,
            overwrite,
            no_recursive,
            dry_run,
            quiet,
            strict,
        } => convert(
            ConvertArgs {
                paths,
                output_dir,
                overwrite,
                no_recursive,
                dry_run,
                quiet,
                strict,
            },
            cli.config.as_deref(),
        ),
        Commands::Probe { file, json } => probe_file(&file, json, cli.config.as_deref()),
        Commands::Plan { file } => plan_file(&file, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("convid {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn convert(args: ConvertArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // CLI flags override the config file
    if args.output_dir.is_some() {
        config.conversion.output_dir = args.output_dir;
    }
    if args.overwrite {
        config.conversion.overwrite = true;
    }
    if args.no_recursive {
        config.conversion.recursive = false;
    }

    let items = batch::discover(&args.paths, &DiscoveryOptions::from_config(&config.conversion))?;
    let eligible = items.iter().filter(|i| i.is_eligible()).count();
    tracing::info!(
        "Found {} file(s), {} with a supported extension",
        items.len(),
        eligible
    );

    let runner = BatchRunner::new(BatchOptions {
        overwrite: config.conversion.overwrite,
        dry_run: args.dry_run,
    });

    let mut terminal;
    let mut quiet;
    let observer: &mut dyn BatchObserver = if args.quiet {
        quiet = QuietReporter;
        &mut quiet
    } else {
        terminal = TerminalReporter::new();
        &mut terminal
    };

    let summary = runner.run(items, || FfmpegConverter::from_config(&config), observer)?;

    if args.strict && summary.has_failures() {
        anyhow::bail!("{} file(s) failed to convert", summary.failed);
    }

    Ok(())
}

fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let media_info = probe::probe_file(file, &config)?;

    if json {
        let json_str = serde_json::to_string_pretty(&media_info)?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("File: {}", media_info.file_path.display());
    println!("Container: {}", media_info.container);
    println!("Size: {} bytes", media_info.file_size);
    if let Some(ref duration) = media_info.duration {
        let secs = duration.as_secs();
        let mins = secs / 60;
        let hours = mins / 60;
        println!("Duration: {:02}:{:02}:{:02}", hours, mins % 60, secs % 60);
    }

    println!("\nVideo Tracks: {}", media_info.video_tracks.len());
    for (i, track) in media_info.video_tracks.iter().enumerate() {
        print!("  [{}] {} {}x{}", i, track.codec, track.width, track.height);
        if let Some(fps) = track.frame_rate {
            print!(", {:.3} fps", fps);
        }
        if let Some(bits) = track.bit_rate {
            print!(", {} kb/s", bits / 1000);
        }
        println!();
    }

    println!("\nAudio Tracks: {}", media_info.audio_tracks.len());
    for (i, track) in media_info.audio_tracks.iter().enumerate() {
        print!("  [{}] {} {}ch", i, track.codec, track.channels);
        if let Some(bits) = track.bit_rate {
            print!(", {} kb/s", bits / 1000);
        }
        if let Some(ref lang) = track.language {
            print!(" ({})", lang);
        }
        println!();
    }

    Ok(())
}

fn plan_file(file: &Path, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let media_info = probe::probe_file(file, &config)?;
    if media_info.video_tracks.is_empty() {
        anyhow::bail!("No video stream in {:?}", file);
    }

    let source = media_info.source_probe();
    println!("Source:");
    println!(
        "  Video: {} {}x{} @ {:.3} fps",
        source.video_codec, source.width, source.height, source.frame_rate
    );
    println!(
        "  Audio: {} {}ch{}",
        if source.audio_codec.is_empty() {
            "none"
        } else {
            source.audio_codec.as_str()
        },
        source.audio_channels,
        source
            .audio_bitrate
            .map(|b| format!(" {} kb/s", b / 1000))
            .unwrap_or_default()
    );

    let default_plan = select_plan(&source);
    let plan = config.policy.select_plan(&source);
    println!("\nPlan: {}", plan);
    if plan != default_plan {
        println!("  (built-in policy would use: {})", default_plan);
    }

    let output = DiscoveryOptions::from_config(&config.conversion).output_path(file, None);
    let ffmpeg = config
        .tools
        .ffmpeg_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("ffmpeg"));
    let command = build_transcode_command(&ffmpeg, &media_info, &config.policy, &output);
    println!("\nCommand:\n  {}", command);

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = probe::check_configured_tools(&config);
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
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to convert videos.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    let conversion = &config.conversion;
    println!("  Extensions: {}", conversion.extensions.join(", "));
    match conversion.output_dir {
        Some(ref dir) => println!("  Output dir: {}", dir.display()),
        None => println!("  Output dir: next to sources"),
    }
    println!("  Overwrite: {}", conversion.overwrite);
    println!("  Recursive: {}", conversion.recursive);
    println!("  Copy H.264 video: {}", config.policy.video.copy_h264);
    println!(
        "  Fallback video: crf {} preset {}",
        config.policy.video.fallback.crf, config.policy.video.fallback.preset
    );

    Ok(())
}
