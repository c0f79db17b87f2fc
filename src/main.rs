mod cli;

use datamosh::{config, pipeline};
use datamosh_av::ToolRegistry;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, MoshArgs};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "datamosh=trace,datamosh_av=trace,datamosh_stream=debug".to_string()
        } else {
            "datamosh=info,datamosh_av=info,datamosh_stream=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Mosh(args) => mosh(args, cli.config.as_deref()),
        Commands::CheckTools { json } => check_tools(cli.config.as_deref(), json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("datamosh {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Command-line flags win over the config file.
fn apply_overrides(config: &mut config::Config, args: &MoshArgs) {
    let mosh = &mut config.mosh;
    if let Some(v) = args.video_start {
        mosh.video_start = v;
    }
    if let Some(v) = args.video_end {
        mosh.video_end = v;
    }
    if let Some(v) = args.effect_start {
        mosh.effect_start = v;
    }
    if let Some(v) = args.effect_end {
        mosh.effect_end = v;
    }
    if let Some(v) = args.repeat_frames {
        mosh.repeat_count = v;
    }
    if let Some(v) = args.fps {
        mosh.fps = v;
    }

    let output = &mut config.output;
    if let Some(ref dir) = args.output_dir {
        output.dir = dir.clone();
    }
    if args.width.is_some() {
        output.width = args.width;
    }
    if args.keep_intermediates {
        output.keep_intermediates = true;
    }
}

fn mosh(args: MoshArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    apply_overrides(&mut config, &args);
    config::validate_config(&config)?;

    let pipeline = pipeline::MoshPipeline::from_config(&config, args.dry_run);
    let plan = pipeline.plan(&args.input)?;

    tracing::info!("Processing file: {:?}", plan.input);
    println!("{}", plan);

    let report = pipeline.execute(&plan)?;

    if args.dry_run {
        println!("\n[DRY RUN] Would execute {} steps", report.planned.len());
        for (i, step) in report.planned.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
        return Ok(());
    }

    if let Some(stats) = report.stats {
        println!(
            "\nFrames: {} in, {} out ({} repeated, {} keyframes dropped)",
            stats.frames_in, stats.frames_out, stats.repeated, stats.dropped_keyframes
        );
    }
    for kept in &report.kept {
        println!("Kept: {}", kept.display());
    }
    println!("Output: {}", report.output.display());

    Ok(())
}

fn check_tools(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("Checking external tools...\n");

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

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to mosh videos.");
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

    let mosh = &config.mosh;
    println!(
        "  Clip: {}s to {}s at {} fps",
        mosh.video_start, mosh.video_end, mosh.fps
    );
    println!(
        "  Effect: {}s to {}s, {} repeats",
        mosh.effect_start, mosh.effect_end, mosh.repeat_count
    );
    match mosh.resolve_window() {
        Ok(resolved) => println!("  Frames moshed: {}", resolved.window),
        Err(e) => println!("  ✗ {}", e),
    }
    println!("  Output dir: {}", config.output.dir.display());
    if let Some(width) = config.output.width {
        println!("  Width: {}", width);
    }

    Ok(())
}
