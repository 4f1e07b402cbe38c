//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::Section;
use color_eyre::eyre::{Report, Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use learngen_core::{
    BuildCourseConfig, BuildCourseResult, ProgressReporter, build_course, read_course,
};
use learngen_generation::{
    GeminiClient, evaluate_short_answer, generate_final_test, generate_quiz,
};
use learngen_shared::{
    AppConfig, GenerationConfig, LearnGenError, VideoConfig, init_config, load_config,
};
use learngen_video::{
    LessonQuery, SearchOptions, ThumbnailQuality, VideoEnricher, VideoService, extract_video_id,
    links, thumbnail_url,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// LearnGen: AI-generated courses with curated lesson videos.
#[derive(Parser)]
#[command(
    name = "learngen",
    version,
    about = "Generate courses, quizzes, and final tests, and find videos for each lesson.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a course outline for a topic and attach lesson videos.
    Course {
        /// What the course should teach.
        topic: String,

        /// Skip the video search.
        #[arg(long)]
        no_videos: bool,

        /// Also write the course JSON to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a quiz for one lesson.
    Quiz {
        /// Lesson title.
        #[arg(long)]
        title: String,

        /// Lesson content.
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,

        /// Read lesson content from a file.
        #[arg(long)]
        content_file: Option<PathBuf>,
    },

    /// Generate a final test for a course written by `course --output`.
    FinalTest {
        /// Path to the course JSON file.
        #[arg(long)]
        course: PathBuf,
    },

    /// Grade a short answer.
    Evaluate {
        #[arg(long)]
        question: String,

        #[arg(long)]
        answer: String,

        /// Expected keyword (repeatable).
        #[arg(long = "keyword")]
        keywords: Vec<String>,
    },

    /// Video search and URL helpers.
    Videos {
        #[command(subcommand)]
        action: VideosAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Video subcommands.
#[derive(Subcommand)]
pub(crate) enum VideosAction {
    /// Search for videos.
    Search {
        query: String,

        /// Maximum results (1-50).
        #[arg(short, long, default_value = "5")]
        limit: u32,

        /// Include non-educational results.
        #[arg(long)]
        any: bool,
    },
    /// Show full details for a video id or URL.
    Details { video: String },
    /// Find videos for several lessons at once.
    Course {
        /// Lesson keywords, one search per argument.
        #[arg(required = true)]
        lessons: Vec<String>,
    },
    /// Extract the video id from a URL.
    Id { url: String },
    /// Print the thumbnail URL for a video id or URL.
    Thumbnail {
        video: String,

        /// default, medium, high, standard, or maxres.
        #[arg(short, long, default_value = "high")]
        quality: String,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "learngen=info",
        1 => "learngen=debug",
        _ => "learngen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Course {
            topic,
            no_videos,
            output,
        } => cmd_course(topic, no_videos, output).await,
        Command::Quiz {
            title,
            content,
            content_file,
        } => cmd_quiz(&title, content, content_file.as_deref()).await,
        Command::FinalTest { course } => cmd_final_test(&course).await,
        Command::Evaluate {
            question,
            answer,
            keywords,
        } => cmd_evaluate(&question, &answer, &keywords).await,
        Command::Videos { action } => match action {
            VideosAction::Search { query, limit, any } => cmd_videos_search(&query, limit, any).await,
            VideosAction::Details { video } => cmd_videos_details(&video).await,
            VideosAction::Course { lessons } => cmd_videos_course(&lessons).await,
            VideosAction::Id { url } => cmd_videos_id(&url),
            VideosAction::Thumbnail { video, quality } => cmd_videos_thumbnail(&video, &quality),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn model_client(config: &AppConfig) -> Result<GeminiClient> {
    let settings = GenerationConfig::resolve(config)?;
    Ok(GeminiClient::new(&settings)?)
}

fn video_settings(config: &AppConfig) -> Result<(VideoConfig, VideoService)> {
    let settings = VideoConfig::resolve(config)?;
    let service = VideoService::new(&settings)?;
    Ok((settings, service))
}

const RATE_LIMIT_HINT: &str = "The model API is rate limiting requests. Wait a minute and try again.";

fn retry_hint(err: &LearnGenError) -> Option<&'static str> {
    err.is_rate_limited().then_some(RATE_LIMIT_HINT)
}

/// Attach a retry suggestion to rate-limit errors.
fn report(err: LearnGenError) -> Report {
    match retry_hint(&err) {
        Some(hint) => Report::new(err).suggestion(hint),
        None => Report::new(err),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Accept either a bare video id or any recognized video URL.
fn resolve_video_id(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if links::is_video_id(trimmed) {
        return Ok(trimmed.to_string());
    }
    extract_video_id(trimmed).ok_or_else(|| eyre!("'{input}' is not a video id or video URL"))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_course(topic: String, no_videos: bool, output: Option<PathBuf>) -> Result<()> {
    // Validate API keys before doing anything
    let config = load_config()?;
    let model = model_client(&config)?;
    let enricher = if no_videos {
        None
    } else {
        let (settings, service) = video_settings(&config)?;
        Some(VideoEnricher::new(service, &settings))
    };

    info!(topic = %topic, videos = !no_videos, "building course");

    let build_config = BuildCourseConfig { topic, output };
    let reporter = CliProgress::new();
    let result = match build_course(&build_config, &model, enricher.as_ref(), &reporter).await {
        Ok(result) => result,
        Err(e) => {
            reporter.spinner.finish_and_clear();
            return Err(report(e));
        }
    };

    print_json(&result.course)
}

async fn cmd_quiz(title: &str, content: Option<String>, content_file: Option<&Path>) -> Result<()> {
    let content = match (content, content_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|e| eyre!("cannot read '{}': {e}", path.display()))?,
        (None, None) => return Err(eyre!("provide --content or --content-file")),
    };

    let config = load_config()?;
    let model = model_client(&config)?;

    let quiz = generate_quiz(&model, &content, title).await.map_err(report)?;
    if quiz.questions.is_empty() {
        info!("model returned no usable questions");
    }
    print_json(&quiz)
}

async fn cmd_final_test(course_path: &Path) -> Result<()> {
    let course = read_course(course_path)?;
    let config = load_config()?;
    let model = model_client(&config)?;

    let test = generate_final_test(&model, &course.spec()).await.map_err(report)?;
    print_json(&test)
}

async fn cmd_evaluate(question: &str, answer: &str, keywords: &[String]) -> Result<()> {
    let config = load_config()?;
    let model = model_client(&config)?;

    let evaluation = evaluate_short_answer(&model, question, answer, keywords)
        .await
        .map_err(report)?;
    print_json(&evaluation)
}

async fn cmd_videos_search(query: &str, limit: u32, any: bool) -> Result<()> {
    let config = load_config()?;
    let (_, service) = video_settings(&config)?;

    let options = if any {
        SearchOptions::any()
    } else {
        SearchOptions::default()
    };
    let videos = service.search_videos(query, limit, &options).await?;
    print_json(&videos)
}

async fn cmd_videos_details(video: &str) -> Result<()> {
    let video_id = resolve_video_id(video)?;
    let config = load_config()?;
    let (_, service) = video_settings(&config)?;

    let details = service.get_video_details(&video_id).await?;
    print_json(&details)
}

async fn cmd_videos_course(lessons: &[String]) -> Result<()> {
    let config = load_config()?;
    let (settings, service) = video_settings(&config)?;
    let enricher = VideoEnricher::new(service, &settings);

    let queries: Vec<LessonQuery> = lessons.iter().map(|l| LessonQuery::from(l.as_str())).collect();
    let results = enricher.bulk_search_for_course(&queries).await;

    let stats = enricher.service().cache_stats();
    info!(
        video_cache = stats.video_cache_size,
        search_cache = stats.search_cache_size,
        ttl_hours = stats.cache_duration_hours,
        "cache statistics"
    );
    print_json(&results)
}

fn cmd_videos_id(url: &str) -> Result<()> {
    let id = extract_video_id(url);
    print_json(&serde_json::json!({ "url": url, "videoId": id }))
}

fn cmd_videos_thumbnail(video: &str, quality: &str) -> Result<()> {
    let video_id = resolve_video_id(video)?;
    let quality: ThumbnailQuality = quality.parse()?;
    println!("{}", thumbnail_url(&video_id, quality));
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn outline_ready(&self, title: &str, lessons: usize) {
        self.spinner.println(format!("  Outline: {title} ({lessons} lessons)"));
    }

    fn done(&self, result: &BuildCourseResult) {
        self.spinner.finish_and_clear();
        eprintln!(
            "  Course {} ready: {} lessons, {} with videos, {:.1}s{}",
            result.course.id,
            result.course.lessons.len(),
            result.lessons_with_videos,
            result.elapsed.as_secs_f64(),
            if result.used_fallback { " (fallback outline)" } else { "" },
        );
    }
}
