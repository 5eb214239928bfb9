use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use anyhow::Context;
use clap::{Parser, ValueEnum, ColorChoice, ArgAction, CommandFactory};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use is_terminal::IsTerminal;
mod error;
mod guide_xml;
mod html;
mod icons;
mod rows;
mod timestamp;

use crate::icons::IconTable;
use crate::rows::{Formatter, RowOptions};

static ENABLE_COLOR: OnceLock<bool> = OnceLock::new();

const DEFAULT_INPUT: &str = "TVGuide.xml";
const DEFAULT_IMG_DIR: &str = "imgs";
const DEFAULT_OUTPUT: &str = "EPGdata.html";
const DEFAULT_CONFIG: &str = "epg2html.toml";

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogLevel { Error, Warn, Info, Debug, Trace }

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogFormat { Text, Json }

#[derive(Parser, Debug, Default)]
#[command(
    name = "epg2html",
    about = "Render an XMLTV programme guide as a searchable HTML table",
    long_about = "Reads an XMLTV guide, joins programmes with their channels and icons, and writes one self-contained HTML page with a client-side channel filter.",
    after_long_help = "Examples:\n  epg2html\n  epg2html -i TVGuide.xml -o guide.html --img-dir imgs\n  epg2html --config epg2html.toml --document-icons -v\n  epg2html --strict --log-format json --log-path run.log",
    color = ColorChoice::Auto
)]
struct Args {
    /// Guide XML to read [default: TVGuide.xml]
    #[arg(long, short = 'i')]
    input: Option<String>,
    /// Directory prefixed to icon file names [default: imgs]
    #[arg(long)]
    img_dir: Option<String>,
    /// HTML file to write, replaced if present [default: EPGdata.html]
    #[arg(long, short = 'o')]
    output: Option<String>,
    /// Text for a missing title, description or rating [default: N/A]
    #[arg(long)]
    placeholder: Option<String>,
    #[arg(long, default_value_t = false, help = "Fail on programmes missing a title, description or rating")]
    strict: bool,
    #[arg(long, default_value_t = false, help = "Use the guide's <icon src> for channels without a mapped icon")]
    document_icons: bool,
    #[arg(long, default_value_t = false, help = "Open the page in the default browser when done")]
    open: bool,
    /// TOML config (default $EPG2HTML_CONFIG, then ./epg2html.toml)
    #[arg(long)]
    config: Option<String>,
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
    #[arg(short = 'q', long, default_value_t = false)]
    quiet: bool,
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
    #[arg(long)]
    log_path: Option<String>,
    #[arg(long, short = 'C', default_value_t = false)]
    no_color: bool,
    #[arg(long, value_enum)]
    completions: Option<Shell>,
    #[arg(long)]
    completions_out: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
struct AppConfig {
    input: Option<String>,
    img_dir: Option<String>,
    output: Option<String>,
    placeholder: Option<String>,
    strict: Option<bool>,
    document_icons: Option<bool>,
    open: Option<bool>,
    log_level: Option<LogLevel>,
    log_format: Option<LogFormat>,
    log_path: Option<String>,
    replace_icons: Option<bool>,
    icons: Option<BTreeMap<String, String>>,
}

/// Everything a run needs once flags, config and defaults are merged.
#[derive(Debug)]
struct Settings {
    input: PathBuf,
    img_dir: String,
    output: PathBuf,
    icons: IconTable,
    rows: RowOptions,
    open: bool,
}

fn main() {
    let mut args = Args::parse();
    if let Some(sh) = args.completions {
        write_completions(sh, args.completions_out.as_deref());
        return;
    }
    // Logging is not up yet, so config problems go straight to stderr.
    let cfg = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => { eprintln!("error: {:#}", e); std::process::exit(2); }
    };
    let settings = apply_config(&mut args, cfg);
    init_logging(&args);
    let term = std::env::var("TERM").unwrap_or_default();
    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let _ = ENABLE_COLOR.set(!args.no_color && std::io::stdout().is_terminal() && !no_color_env && term != "dumb");
    match run(&settings) {
        Ok(count) => {
            if !args.quiet { println!("{}", paint(&format!("HTML generated: {} ({} programmes)", settings.output.display(), count), "1;36")); }
            if settings.open { open_file_default(settings.output.clone()); }
        }
        Err(e) => {
            log::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

/// Writes to `out` when given, else stdout. Returns false when `out` could not be created.
fn write_completions(sh: Shell, out: Option<&str>) -> bool {
    let mut cmd = Args::command();
    if let Some(path) = out {
        match std::fs::File::create(path) {
            Ok(mut f) => { clap_complete::generate(sh, &mut cmd, "epg2html", &mut f); return true; }
            Err(e) => eprintln!("warning: cannot create {}: {}; writing completions to stdout", path, e),
        }
    }
    clap_complete::generate(sh, &mut cmd, "epg2html", &mut std::io::stdout());
    out.is_none()
}

/// Loads, renders and writes the page. Returns the number of rows written.
fn run(s: &Settings) -> anyhow::Result<usize> {
    let guide = guide_xml::load_guide(&s.input).with_context(|| format!("loading guide {}", s.input.display()))?;
    let icons = s.icons.resolve(&s.img_dir);
    log::debug!("Resolved {} channel icons under {}", s.icons.len(), s.img_dir);
    let formatter = Formatter::new(&guide, &icons, &s.rows);
    let rows = formatter.render_all(&guide.programmes).context("rendering programmes")?;
    let page = html::render_page(&rows);
    html::write_page(&s.output, &page)?;
    log::info!("Wrote {} rows ({} bytes) to {}", rows.len(), page.len(), s.output.display());
    Ok(rows.len())
}

fn load_config(explicit: Option<&str>) -> anyhow::Result<AppConfig> {
    let path = explicit.map(|s| s.to_string()).or_else(|| std::env::var("EPG2HTML_CONFIG").ok());
    if let Some(p) = path {
        let s = std::fs::read_to_string(&p).with_context(|| format!("reading config {}", p))?;
        return toml::from_str::<AppConfig>(&s).with_context(|| format!("parsing config {}", p));
    }
    let Ok(s) = std::fs::read_to_string(DEFAULT_CONFIG) else { return Ok(AppConfig::default()) };
    match toml::from_str::<AppConfig>(&s) {
        Ok(cfg) => Ok(cfg),
        Err(e) => { eprintln!("warning: ignoring {}: {}", DEFAULT_CONFIG, e); Ok(AppConfig::default()) }
    }
}

fn apply_config(args: &mut Args, cfg: AppConfig) -> Settings {
    if args.log_level.is_none() && let Some(v) = cfg.log_level { args.log_level = Some(v); }
    if args.log_format.is_none() && let Some(v) = cfg.log_format { args.log_format = Some(v); }
    if args.log_path.is_none() && let Some(v) = cfg.log_path { args.log_path = Some(v); }
    if !args.strict && let Some(v) = cfg.strict { args.strict = v; }
    if !args.document_icons && let Some(v) = cfg.document_icons { args.document_icons = v; }
    if !args.open && let Some(v) = cfg.open { args.open = v; }
    let mut icons = if cfg.replace_icons.unwrap_or(false) { IconTable::default() } else { IconTable::builtin() };
    if let Some(extra) = cfg.icons { icons.merge(extra); }
    Settings {
        input: PathBuf::from(args.input.clone().or(cfg.input).unwrap_or_else(|| DEFAULT_INPUT.to_string())),
        img_dir: args.img_dir.clone().or(cfg.img_dir).unwrap_or_else(|| DEFAULT_IMG_DIR.to_string()),
        output: PathBuf::from(args.output.clone().or(cfg.output).unwrap_or_else(|| DEFAULT_OUTPUT.to_string())),
        icons,
        rows: RowOptions {
            placeholder: args.placeholder.clone().or(cfg.placeholder).unwrap_or_else(|| RowOptions::default().placeholder),
            strict: args.strict,
            document_icons: args.document_icons,
        },
        open: args.open,
    }
}

fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if args.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if let Some(lvl) = args.log_level {
        let f = match lvl { LogLevel::Error => log::LevelFilter::Error, LogLevel::Warn => log::LevelFilter::Warn, LogLevel::Info => log::LevelFilter::Info, LogLevel::Debug => log::LevelFilter::Debug, LogLevel::Trace => log::LevelFilter::Trace };
        builder.filter_level(f);
    } else if args.verbose > 0 {
        let f = if args.verbose >= 3 { log::LevelFilter::Trace } else if args.verbose == 2 { log::LevelFilter::Debug } else { log::LevelFilter::Info };
        builder.filter_level(f);
    }
    if let Some(fmt) = args.log_format {
        match fmt {
            LogFormat::Json => {
                builder.format(|buf, record| {
                    use std::io::Write;
                    let ts = chrono::Local::now().to_rfc3339();
                    let obj = serde_json::json!({
                        "ts": ts,
                        "level": record.level().to_string(),
                        "target": record.target(),
                        "msg": record.args().to_string(),
                    });
                    writeln!(buf, "{}", obj)
                });
            }
            LogFormat::Text => {
                builder.format(|buf, record| {
                    use std::io::Write;
                    let ts = chrono::Local::now().format("%H:%M:%S");
                    writeln!(buf, "[{:<5} {}] {}", record.level(), ts, record.args())
                });
            }
        }
    }
    if let Some(path) = args.log_path.as_ref() {
        match std::fs::File::create(path) {
            Ok(f) => { builder.target(env_logger::Target::Pipe(Box::new(f))); }
            Err(e) => { eprintln!("Failed to open log file {}: {}", path, e); }
        }
    }
    builder.init();
}

fn paint(s: &str, code: &str) -> String {
    if *ENABLE_COLOR.get().unwrap_or(&false) { format!("\x1b[{}m{}\x1b[0m", code, s) } else { s.to_string() }
}

#[cfg(target_os = "windows")]
fn open_file_default(p: PathBuf) {
    let s = p.to_string_lossy().into_owned();
    let _ = std::process::Command::new("cmd").args(["/C", "start", "", &s]).spawn()
        .map_err(|e| log::error!("Failed to open file {}: {}", s, e));
}

#[cfg(target_os = "macos")]
fn open_file_default(p: PathBuf) {
    let s = p.to_string_lossy().into_owned();
    let _ = std::process::Command::new("open").arg(&s).spawn().map_err(|e| log::error!("Failed to open file {}: {}", s, e));
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn open_file_default(p: PathBuf) {
    let s = p.to_string_lossy().into_owned();
    let _ = std::process::Command::new("xdg-open").arg(&s).spawn().map_err(|e| log::error!("Failed to open file {}: {}", s, e));
}


#[cfg(test)]
mod tests_config {
    use super::*;

    #[test]
    fn defaults_without_flags_or_config() {
        let mut args = Args::default();
        let s = apply_config(&mut args, AppConfig::default());
        assert_eq!(s.input, PathBuf::from(DEFAULT_INPUT));
        assert_eq!(s.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(s.img_dir, DEFAULT_IMG_DIR);
        assert_eq!(s.rows.placeholder, "N/A");
        assert_eq!(s.icons, IconTable::builtin());
        assert!(!s.rows.strict && !s.open);
    }

    #[test]
    fn flags_win_over_config() {
        let cfg: AppConfig = toml::from_str(r#"
input = "cfg.xml"
output = "cfg.html"
img_dir = "logos"
strict = true
log_level = "debug"
"#).unwrap();
        let mut args = Args::try_parse_from(["epg2html", "-i", "cli.xml"]).unwrap();
        let s = apply_config(&mut args, cfg);
        assert_eq!(s.input, PathBuf::from("cli.xml"));
        assert_eq!(s.output, PathBuf::from("cfg.html"));
        assert_eq!(s.img_dir, "logos");
        assert!(s.rows.strict);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }

    #[test]
    fn icon_table_from_config() {
        let cfg: AppConfig = toml::from_str("[icons]\n1101 = \"tao-new.png\"\n9000 = \"X.png\"\n").unwrap();
        let s = apply_config(&mut Args::default(), cfg);
        let p = s.icons.resolve("imgs");
        assert_eq!(p.get("1101"), "imgs/tao-new.png");
        assert_eq!(p.get("9000"), "imgs/X.png");
        assert_eq!(p.get("1102"), "imgs/RTE2.png");

        let cfg: AppConfig = toml::from_str("replace_icons = true\n[icons]\n9000 = \"X.png\"\n").unwrap();
        let s = apply_config(&mut Args::default(), cfg);
        assert_eq!(s.icons.len(), 1);
        assert_eq!(s.icons.resolve("imgs").get("1101"), "");
    }

    #[test]
    fn unknown_config_keys_rejected() {
        assert!(toml::from_str::<AppConfig>("colour = true").is_err());
    }

    #[test]
    fn completions_file_written_or_reported() {
        let p = std::env::temp_dir().join("epg2html-completions.bash");
        assert!(write_completions(Shell::Bash, Some(&p.to_string_lossy())));
        assert!(std::fs::read_to_string(&p).unwrap().contains("epg2html"));
        let _ = std::fs::remove_file(&p);
        let bad = std::env::temp_dir().join("epg2html-no-such-dir").join("c.bash");
        assert!(!write_completions(Shell::Bash, Some(&bad.to_string_lossy())));
    }

    #[test]
    fn explicit_config_must_exist() {
        let p = std::env::temp_dir().join("epg2html-no-config.toml");
        let _ = std::fs::remove_file(&p);
        assert!(load_config(Some(&p.to_string_lossy())).is_err());
    }
}
