// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use once_cell::sync::OnceCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use yttrans::app_config::{Config, LogLevel};
use yttrans::app_controller::{self, Controller, Stage, StageProgressCallback};
use yttrans::language_utils;
use yttrans::ports::EmbedMode;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for EmbedMode to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEmbedMode {
    /// Selectable subtitle track
    Soft,
    /// Burned into the frames
    Hard,
}

impl From<CliEmbedMode> for EmbedMode {
    fn from(mode: CliEmbedMode) -> Self {
        match mode {
            CliEmbedMode::Soft => EmbedMode::Soft,
            CliEmbedMode::Hard => EmbedMode::Hard,
        }
    }
}

/// Options shared by the stage subcommands
#[derive(Args, Debug, Clone, Default)]
struct StageOptions {
    /// Source language code (e.g., 'en', 'ko', or 'auto' for Whisper detection)
    #[arg(short, long)]
    source: Option<String>,

    /// Target language code (e.g., 'ko', 'ja')
    #[arg(short, long)]
    target: Option<String>,

    /// Subtitle embedding mode
    #[arg(long, value_enum)]
    mode: Option<CliEmbedMode>,

    /// Workspace directory
    #[arg(long)]
    workspace: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download, extract, translate and embed in one go
    Run {
        /// Video URL
        url: String,

        #[command(flatten)]
        stage: StageOptions,
    },

    /// Download a video into the workspace
    Download {
        /// Video URL
        url: String,

        #[command(flatten)]
        stage: StageOptions,
    },

    /// Extract a subtitle from a downloaded video (existing captions or Whisper)
    Extract {
        /// Video file
        video: PathBuf,

        /// Output subtitle file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        stage: StageOptions,
    },

    /// Translate an SRT file
    Translate {
        /// SRT file to translate
        srt: PathBuf,

        /// Output subtitle file (default: <name>.<target>.srt next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        stage: StageOptions,
    },

    /// Embed a subtitle into a video
    Embed {
        /// Video file
        video: PathBuf,

        /// Subtitle file
        srt: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        stage: StageOptions,
    },

    /// List the languages of the configured translation provider
    Languages,

    /// Generate shell completions for yttrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// yttrans - translate the subtitles of online videos
///
/// Downloads a video, takes its captions (or transcribes it with Whisper),
/// translates them and embeds the translation back into the video.
#[derive(Parser, Debug)]
#[command(name = "yttrans")]
#[command(version)]
#[command(about = "Download, transcribe, translate and embed video subtitles")]
#[command(long_about = "yttrans downloads a video, obtains or generates its subtitles, translates them and embeds them back.

EXAMPLES:
    yttrans run https://youtu.be/dQw4w9WgXcQ            # Full pipeline with conf.json settings
    yttrans run -s en -t ja --mode hard <URL>           # English to Japanese, burned in
    yttrans download <URL>                              # Download only
    yttrans extract workspace/downloads/<ID>/video.mp4  # Captions or Whisper transcription
    yttrans translate -s en -t ko subs.srt              # Translate an SRT file
    yttrans embed video.mp4 subs.ko.srt -o out.mp4      # Mux a subtitle track
    yttrans languages                                   # Languages of the provider
    yttrans completions bash > yttrans.bash             # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

REQUIRED TOOLS:
    yt-dlp, ffmpeg, ffprobe, whisper (openai-whisper CLI), and either a
    LibreTranslate server or an Ollama server for translation.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json", env = "YTTRANS_CONFIG")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// Progress bars currently drawn; log lines are printed around them
static PROGRESS: OnceCell<MultiProgress> = OnceCell::new();

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let line = format!(
            "\x1B[{}m{} {} {}\x1B[0m",
            Self::get_color_for_level(record.level()),
            now,
            Self::get_emoji_for_level(record.level()),
            record.args()
        );

        let write = || {
            let _ = writeln!(std::io::stderr(), "{}", line);
        };
        match PROGRESS.get() {
            Some(multi) => multi.suspend(write),
            None => write(),
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

// @creates: Progress bar for one stage
fn stage_bar(multi: &MultiProgress, name: &str) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(100));
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix:>9} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{prefix} [{bar:40}] {pos}% {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style.progress_chars("█▓▒░"));
    bar.set_prefix(name.to_string());
    bar
}

// @returns: Progress callback drawing into `bar`
fn bar_callback(bar: ProgressBar) -> impl Fn(&str, f32) + Send + Sync + 'static {
    move |message: &str, percent: f32| {
        bar.set_position(percent.round().clamp(0.0, 100.0) as u64);
        bar.set_message(message.to_string());
    }
}

fn multi_progress() -> &'static MultiProgress {
    PROGRESS.get_or_init(MultiProgress::new)
}

/// Load the configuration and apply command line overrides
fn load_config(options: &CommandLineOptions, stage: &StageOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&options.config)?;

    if let Some(source) = &stage.source {
        config.source_language = source.clone();
    }
    if let Some(target) = &stage.target {
        config.target_language = target.clone();
    }
    if let Some(mode) = stage.mode {
        config.embed_mode = mode.into();
    }
    if let Some(workspace) = &stage.workspace {
        config.workspace_dir = workspace.clone();
    }
    if let Some(log_level) = options.log_level {
        config.log_level = log_level.into();
    }

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with trace so the max level alone decides
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let options = CommandLineOptions::parse();
    if let Some(level) = options.log_level {
        log::set_max_level(LogLevel::from(level).to_level_filter());
    }

    match &options.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(*shell, &mut cmd, "yttrans", &mut std::io::stdout());
            Ok(())
        }
        Commands::Run { url, stage } => run_pipeline(&options, stage, url).await,
        Commands::Download { url, stage } => {
            let controller = Controller::with_config(load_config(&options, stage)?)?;
            let on_progress = bar_callback(stage_bar(multi_progress(), "download"));
            let video = controller.download(url, Some(&on_progress)).await?;
            if let Some(path) = video.file_path() {
                println!("{}", path.display());
            }
            Ok(())
        }
        Commands::Extract { video, output, stage } => {
            let config = load_config(&options, stage)?;
            let language = config.source_language.clone();
            let controller = Controller::with_config(config)?;

            let video = app_controller::local_video(video)?;
            let on_progress = bar_callback(stage_bar(multi_progress(), "extract"));
            let subtitle = controller.extract(&video, &language, output.as_deref(), Some(&on_progress)).await?;
            if let Some(path) = subtitle.file_path() {
                println!("{}", path.display());
            }
            Ok(())
        }
        Commands::Translate { srt, output, stage } => {
            let config = load_config(&options, stage)?;
            let source = config.source_language.clone();
            let target = config.target_language.clone();
            let controller = Controller::with_config(config)?;

            let subtitle = app_controller::local_subtitle(srt, &source)?;
            let output = output.clone().unwrap_or_else(|| app_controller::translated_path_for(srt, &target));
            let on_progress = bar_callback(stage_bar(multi_progress(), "translate"));
            let translated = controller.translate_file(&subtitle, &target, Some(output.as_path()), Some(&on_progress)).await?;
            if let Some(path) = translated.file_path() {
                println!("{}", path.display());
            }
            Ok(())
        }
        Commands::Embed { video, srt, output, stage } => {
            let config = load_config(&options, stage)?;
            let language = config.target_language.clone();
            let mode = config.embed_mode;
            let controller = Controller::with_config(config)?;

            let output = output.clone().unwrap_or_else(|| default_embed_output(video));
            let video = app_controller::local_video(video)?;
            let subtitle = app_controller::local_subtitle(srt, &language)?;
            let on_progress = bar_callback(stage_bar(multi_progress(), "embed"));
            let embedded = controller.embed(&video, &subtitle, mode, Some(output.as_path()), Some(&on_progress)).await?;
            if let Some(path) = embedded.file_path() {
                println!("{}", path.display());
            }
            Ok(())
        }
        Commands::Languages => {
            let controller = Controller::with_config(load_config(&options, &StageOptions::default())?)?;
            for code in controller.supported_languages().await? {
                let name = language_utils::get_language_name(&code).unwrap_or_default();
                println!("{:<8} {}", code, name);
            }
            Ok(())
        }
    }
}

async fn run_pipeline(options: &CommandLineOptions, stage: &StageOptions, url: &str) -> Result<()> {
    let config = load_config(options, stage)?;
    info!(
        "Pipeline: {} -> {} ({} subtitles)",
        config.source_language, config.target_language, config.embed_mode
    );
    let controller = Controller::with_config(config)?;

    let multi = multi_progress();
    let bars = [
        (Stage::Download, stage_bar(multi, "download")),
        (Stage::Extract, stage_bar(multi, "extract")),
        (Stage::Translate, stage_bar(multi, "translate")),
        (Stage::Embed, stage_bar(multi, "embed")),
    ];
    let callback_bars = bars.clone();
    let on_progress: Arc<StageProgressCallback> = Arc::new(move |stage: Stage, message: &str, percent: f32| {
        if let Some((_, bar)) = callback_bars.iter().find(|(s, _)| *s == stage) {
            bar.set_position(percent.round().clamp(0.0, 100.0) as u64);
            bar.set_message(message.to_string());
        }
    });

    let outcome = controller.run_pipeline(url, Some(on_progress)).await?;

    for (stage, bar) in &bars {
        if outcome.timings.iter().any(|(s, _)| s == stage) {
            bar.finish();
        } else {
            bar.finish_with_message("skipped");
        }
    }

    if outcome.translated_subtitle.is_none() {
        warn!("Embedded the original subtitle; it was already in the target language");
    }
    for (stage, duration) in &outcome.timings {
        info!("{}: {}", stage, app_controller::format_duration(*duration));
    }
    if let Some(path) = outcome.output_path() {
        println!("{}", path.display());
    }
    Ok(())
}

// @returns: "<stem>_translated.<ext>" next to the input video
fn default_embed_output(video_path: &Path) -> PathBuf {
    let stem = video_path.file_stem().unwrap_or_default().to_string_lossy().to_string();
    let ext = video_path.extension().map(|e| e.to_string_lossy().to_string()).unwrap_or_else(|| "mp4".to_string());
    video_path.with_file_name(format!("{}_translated.{}", stem, ext))
}
