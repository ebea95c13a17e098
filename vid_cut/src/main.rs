use clap::{Parser, Subcommand};
use console::style;
use shared_utils::errors::CutterError;
use shared_utils::export_log::DEFAULT_EXPORT_LOG;
use shared_utils::ffmpeg_process::install_ctrlc_handler;
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::progress::{enable_quiet_mode, format_duration};
use shared_utils::timecode::{format_timecode, parse_timecode};
use shared_utils::tools::{tool_path, INSTALL_HINT};
use shared_utils::transform::Transform;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use vid_cut::{
    check_tools, export_video, probe_file, ExportConfig, ExportReport, ProbeReport,
    FAILURE_MESSAGE, SUCCESS_MESSAGE,
};

#[derive(Parser)]
#[command(name = "vid-cut")]
#[command(version, about = "Trim, rotate and mirror videos with ffmpeg", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Hide the progress bar
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Report ffmpeg, ffprobe and NVENC availability
    Check {
        #[arg(long, value_name = "PATH", default_value = DEFAULT_EXPORT_LOG)]
        export_log: PathBuf,
    },

    /// Show rotation, duration and stream info of a video
    Probe {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(long)]
        json: bool,
        #[arg(long, value_name = "PATH", default_value = DEFAULT_EXPORT_LOG)]
        export_log: PathBuf,
    },

    /// Export a trimmed and/or transformed copy
    Export {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        /// Defaults to <stem>_exported.<ext> next to the input
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// In point: hh:mm:ss[.fff], mm:ss[.fff] or seconds
        #[arg(long = "in", value_name = "TIME", value_parser = parse_time)]
        in_point: Option<Duration>,
        /// Out point: hh:mm:ss[.fff], mm:ss[.fff] or seconds
        #[arg(long = "out", value_name = "TIME", value_parser = parse_time)]
        out_point: Option<Duration>,
        /// normal, rotate90, rotate180, rotate270, mirror, mirror-rotate90, ...
        #[arg(short, long, default_value = "normal")]
        transform: Transform,
        /// Re-encode with the source codec instead of NVENC
        #[arg(long)]
        no_nvenc: bool,
        /// Print the ffmpeg command without running it
        #[arg(long)]
        dry_run: bool,
        #[arg(long, value_name = "PATH", default_value = DEFAULT_EXPORT_LOG)]
        export_log: PathBuf,
    },
}

fn parse_time(s: &str) -> Result<Duration, String> {
    parse_timecode(s).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let json_output = matches!(cli.command, Commands::Probe { json: true, .. });
    if let Err(e) = init_logging(
        "vid_cut",
        LogConfig::default()
            .with_verbose(cli.verbose)
            .with_stderr(!json_output),
    ) {
        eprintln!("⚠️  Could not initialize logging: {}", e);
    }
    if cli.quiet {
        enable_quiet_mode();
    }

    let code = match run(cli.command, cli.verbose) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", style("❌").red(), e);
            match e.downcast_ref::<CutterError>() {
                Some(err) if err.is_usage_error() => 2,
                _ => 1,
            }
        }
    };
    std::process::exit(code);
}

fn run(command: Commands, verbose: bool) -> anyhow::Result<i32> {
    match command {
        Commands::Check { export_log } => {
            let tools = check_tools(&export_log);

            println!("\n🔧 External Tools");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            for (name, found) in [("ffmpeg", tools.ffmpeg), ("ffprobe", tools.ffprobe)] {
                let location = tool_path(name)
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "not in PATH".to_string());
                println!(
                    "{} {:<8} {}",
                    if found { "✅" } else { "❌" },
                    name,
                    location
                );
            }
            println!("🎮 NVENC Support: {}", tools.nvenc_status());
            if !tools.nvenc_encoders.is_empty() {
                println!("   Encoders: {}", tools.nvenc_encoders.join(", "));
            }
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

            if tools.can_export() {
                Ok(0)
            } else {
                eprintln!("\n{}", style(INSTALL_HINT).yellow());
                Ok(1)
            }
        }

        Commands::Probe {
            input,
            json,
            export_log,
        } => {
            let report = probe_file(&input, &export_log)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_probe_human(&report);
            }
            Ok(0)
        }

        Commands::Export {
            input,
            output,
            in_point,
            out_point,
            transform,
            no_nvenc,
            dry_run,
            export_log,
        } => {
            let config = ExportConfig {
                output,
                in_point,
                out_point,
                transform,
                use_nvenc: !no_nvenc,
                dry_run,
                export_log,
                verbose,
            };

            if !config.dry_run {
                install_ctrlc_handler();
            }
            info!(input = %input.display(), transform = %config.transform, "🎬 Export");

            match export_video(&input, &config)? {
                ExportReport::DryRun {
                    output,
                    command,
                    opened,
                } => {
                    let (in_line, out_line) = opened.session.point_summary();
                    let (mirrored, degrees) = opened
                        .session
                        .transform
                        .preview_rotation(opened.session.initial_rotation);

                    println!("\n📋 Export Plan (dry run)");
                    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
                    println!("📁 Input:  {}", input.display());
                    println!("📦 Output: {}", output.display());
                    println!("⏱️  {} • {}", in_line, out_line);
                    println!(
                        "🔄 Transform: {} (shown {}° clockwise{})",
                        opened.session.transform,
                        degrees,
                        if mirrored { ", mirrored" } else { "" }
                    );
                    println!("🎬 Video: {}", command.encoder);
                    println!();
                    println!("{}", command.command_line());
                    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
                    Ok(0)
                }

                ExportReport::Finished {
                    output,
                    command,
                    outcome,
                } => {
                    if outcome.success {
                        println!("{}", style(format!("✅ {}", SUCCESS_MESSAGE)).green().bold());
                        println!("   Output: {}", output.display());
                        println!("   Time: {}", format_duration(outcome.elapsed));
                        return Ok(0);
                    }

                    if outcome.cancelled {
                        eprintln!("{}", style("⚠️  Export cancelled").yellow().bold());
                    } else {
                        eprintln!("{}", style(format!("❌ {}", FAILURE_MESSAGE)).red().bold());
                        eprint!("{}", outcome.error_report(&command.command_line()));
                    }
                    if let Some(last) = outcome.last_progress {
                        eprintln!(
                            "   Stopped at {} ({:.1}%)",
                            format_timecode(last.position),
                            last.percent
                        );
                    }
                    eprintln!("   📝 FFmpeg output: {}", config.export_log.display());
                    Ok(1)
                }
            }
        }
    }
}

fn print_probe_human(report: &ProbeReport) {
    println!("\n📊 Video Probe");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📁 File: {}", report.path.display());
    println!(
        "🔄 Rotation: {}° (normalized {}°)",
        report.rotation, report.rotation_normalized
    );
    match report
        .duration_secs
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    {
        Some(d) => println!(
            "⏱️  Duration: {} ({:.3}s)",
            format_timecode(d),
            d.as_secs_f64()
        ),
        None => println!("⏱️  Duration: unknown"),
    }
    if let Some(info) = &report.info {
        println!("📦 Format: {}", info.format_name);
        println!(
            "🎬 Codec: {}",
            info.video_codec.as_deref().unwrap_or("no video stream")
        );
        println!("📐 Resolution: {}x{}", info.width, info.height);
        println!(
            "📊 Bitrate: {}",
            info.video_bit_rate
                .as_deref()
                .map(|b| format!("{} bps", b))
                .unwrap_or_else(|| "unknown".to_string())
        );
        println!("🎵 Audio: {}", if info.has_audio { "yes" } else { "no" });
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
