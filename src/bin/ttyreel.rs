use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use ttyreel::{
    FsTransport, MediaAttributes, Player, PlayerEvent, Recording, StdoutSink, SystemClock,
    TICK_INTERVAL, format_time,
};

#[derive(Parser, Debug)]
#[command(name = "ttyreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a recording's metadata.
    Info(InfoArgs),
    /// List a recording's chunks with their time offsets.
    Dump(DumpArgs),
    /// Replay a recording in this terminal, in real time.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input ttyrec file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Emit machine-readable JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Input ttyrec file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Stop after this many chunks.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input ttyrec file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Playback rate (negative plays in reverse).
    #[arg(long, default_value_t = 1.0)]
    rate: f64,

    /// Start position in seconds.
    #[arg(long)]
    start: Option<f64>,

    /// Restart from the beginning on reaching the end.
    #[arg(long = "loop")]
    looping: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Dump(args) => cmd_dump(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn read_recording(path: &PathBuf) -> anyhow::Result<Recording> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("open recording '{}'", path.display()))?;
    let recording = Recording::decode(&bytes)
        .with_context(|| format!("decode recording '{}'", path.display()))?;
    Ok(recording)
}

#[derive(serde::Serialize)]
struct InfoReport {
    chunks: usize,
    duration_sec: f64,
    duration: String,
    dimensions: Option<ttyreel::TermSize>,
    recorded_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let recording = read_recording(&args.in_path)?;
    let report = InfoReport {
        chunks: recording.chunks.len(),
        duration_sec: recording.duration_sec(),
        duration: format_time(recording.duration_sec()),
        dimensions: recording.dimensions,
        recorded_at: recording.origin_timestamp,
    };

    if args.json {
        serde_json::to_writer_pretty(std::io::stdout(), &report)
            .with_context(|| "serialize info report")?;
        println!();
        return Ok(());
    }

    println!("chunks:      {}", report.chunks);
    println!("duration:    {} ({:.3}s)", report.duration, report.duration_sec);
    match report.dimensions {
        Some(size) => println!("terminal:    {}x{} (cols x rows)", size.cols, size.rows),
        None => println!("terminal:    (no size header)"),
    }
    match report.recorded_at {
        Some(at) => println!("recorded at: {at}"),
        None => println!("recorded at: (not a wall-clock recording)"),
    }
    Ok(())
}

fn cmd_dump(args: DumpArgs) -> anyhow::Result<()> {
    let recording = read_recording(&args.in_path)?;
    let limit = args.limit.unwrap_or(usize::MAX);
    for (index, chunk) in recording.chunks.iter().take(limit).enumerate() {
        println!(
            "{index:>6}  {:>10.3}s  {:>6}B  {}",
            chunk.time_sec,
            chunk.payload.len(),
            preview(&chunk.payload)
        );
    }
    let shown = recording.chunks.len().min(limit);
    if shown < recording.chunks.len() {
        eprintln!("... {} more chunks", recording.chunks.len() - shown);
    }
    Ok(())
}

fn preview(payload: &str) -> String {
    const MAX: usize = 48;
    let mut out = String::with_capacity(MAX + 4);
    let mut written = 0usize;
    for c in payload.chars().flat_map(char::escape_debug) {
        if written >= MAX {
            out.push('\u{2026}');
            break;
        }
        out.push(c);
        written += 1;
    }
    out
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let base_url = std::env::current_dir()
        .ok()
        .and_then(|dir| url::Url::from_directory_path(dir).ok());
    let attrs = MediaAttributes {
        src: Some(args.in_path.to_string_lossy().into_owned()),
        looping: args.looping,
        base_url,
        ..Default::default()
    };

    let mut player = Player::new(
        attrs,
        Box::new(FsTransport),
        Box::new(StdoutSink),
        Box::new(SystemClock),
    );
    player.set_default_playback_rate(args.rate);
    if let Some(start) = args.start {
        player.set_default_start_position(start);
    }

    player.load();
    player.pump();
    if let Some(code) = player.error() {
        anyhow::bail!(
            "failed to load '{}': {}",
            args.in_path.display(),
            code.explanation()
        );
    }

    player.play();
    loop {
        std::thread::sleep(TICK_INTERVAL);
        if player.tick().contains(&PlayerEvent::Ended) {
            break;
        }
    }
    Ok(())
}
