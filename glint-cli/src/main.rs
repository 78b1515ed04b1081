//! Command-line interface for glint
//! Highlights a source file with a registered grammar, or guesses the grammar first.
//!
//! Usage:
//!   glint `<path>` --language `<name>` [--format `<format>`]   - Highlight with a known grammar
//!   glint `<path>`                                             - Auto-detect, then highlight
//!   glint `<path>` --detect                                    - Print the two best guesses
//!   glint --list-languages                                     - List registered grammars
//!
//! `<path>` may be `-` or left out to read standard input. Settings come from the built-in
//! defaults, then `--config <file>`, then `GLINT_*` environment variables, then flags.
//! Log verbosity follows `GLINT_LOG` (default `warn`), or `debug` with `--verbose`.

use clap::{Arg, ArgAction, ArgMatches, Command};
use glint_config::{GlintConfig, Loader, OutputFormat};
use glint_engine::glint::bundled::register_bundled;
use glint_engine::{HtmlRenderer, Registry, ScanResult};
use std::error::Error;
use std::path::Path;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() {
    let matches = Command::new("glint")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A grammar-driven syntax highlighter")
        .arg(
            Arg::new("path")
                .help("File to highlight; `-` or nothing reads standard input")
                .index(1),
        )
        .arg(
            Arg::new("language")
                .long("language")
                .short('l')
                .help("Grammar name or alias; auto-detected when omitted"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format: html, json, spans or text (default from config: html)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("grammar")
                .long("grammar")
                .short('g')
                .help("Extra grammar file (.yaml, .yml or .json), named after its file stem")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("class-prefix")
                .long("class-prefix")
                .help("CSS class prefix for html output"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Fail on illegal lexemes instead of returning unhighlighted text")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("detect")
                .long("detect")
                .help("Only print the best and second best language guesses")
                .action(ArgAction::SetTrue)
                .conflicts_with("language"),
        )
        .arg(
            Arg::new("list-languages")
                .long("list-languages")
                .help("List registered grammars")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log scan decisions to standard error")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    if let Err(err) = run(&matches) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("GLINT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(matches: &ArgMatches) -> CliResult<()> {
    let config = load_config(matches)?;
    let registry = build_registry(&config, matches)?;

    if matches.get_flag("list-languages") {
        handle_list_languages_command(&registry);
        return Ok(());
    }

    let code = read_input(matches.get_one::<String>("path").map(String::as_str))?;

    if matches.get_flag("detect") {
        return handle_detect_command(&registry, &code);
    }

    let result = match matches.get_one::<String>("language") {
        Some(language) => registry.highlight(&code, language)?,
        None => {
            let detection = registry.detect(&code, &[])?;
            debug!(language = ?detection.best.language, relevance = detection.best.relevance, "detected");
            detection.best
        }
    };
    if let Some(context) = &result.illegal_by {
        warn!(%context, "illegal lexeme, output is not highlighted past it");
    }

    print!("{}", format_result(&result, &config)?);
    Ok(())
}

fn load_config(matches: &ArgMatches) -> CliResult<GlintConfig> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    loader = loader.with_env();
    if let Some(format) = matches.get_one::<String>("format") {
        loader = loader.set_override("render.format", format.as_str())?;
    }
    if let Some(prefix) = matches.get_one::<String>("class-prefix") {
        loader = loader.set_override("render.class_prefix", prefix.as_str())?;
    }
    if matches.get_flag("strict") {
        loader = loader.set_override("highlight.permissive", false)?;
    }
    Ok(loader.build()?)
}

fn build_registry(config: &GlintConfig, matches: &ArgMatches) -> CliResult<Registry> {
    let mut registry = Registry::with_config(config.highlight.clone());
    if config.grammars.bundled {
        register_bundled(&mut registry)?;
    }

    let extra = matches
        .get_many::<String>("grammar")
        .into_iter()
        .flatten()
        .map(Path::new);
    for path in config.grammars.paths.iter().map(|path| path.as_path()).chain(extra) {
        register_grammar_file(&mut registry, path)?;
    }
    Ok(registry)
}

fn register_grammar_file(registry: &mut Registry, path: &Path) -> CliResult<()> {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| format!("cannot name a grammar after {}", path.display()))?;
    let source = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read grammar {}: {}", path.display(), err))?;
    let loaded = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => registry.register_json(name, &source),
        _ => registry.register_yaml(name, &source),
    };
    loaded.map_err(|err| format!("grammar {}: {}", path.display(), err))?;
    debug!(language = name, path = %path.display(), "loaded grammar file");
    Ok(())
}

fn read_input(path: Option<&str>) -> CliResult<String> {
    match path {
        None | Some("-") => Ok(std::io::read_to_string(std::io::stdin())?),
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| format!("cannot read {}: {}", path, err).into()),
    }
}

fn format_result(result: &ScanResult, config: &GlintConfig) -> CliResult<String> {
    let tree = &result.tree;
    let formatted = match config.render.format {
        OutputFormat::Html => HtmlRenderer::new(config.render.class_prefix.as_str()).render(tree),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "language": result.language,
                "relevance": result.relevance,
                "illegal": result.illegal,
                "tree": tree.root(),
            });
            format!("{}\n", serde_json::to_string_pretty(&value)?)
        }
        OutputFormat::Spans => tree
            .spans()
            .iter()
            .map(|span| {
                let scopes = if span.scopes.is_empty() {
                    "-".to_string()
                } else {
                    span.scopes.join(" > ")
                };
                format!("{}\t{:?}\n", scopes, span.text)
            })
            .collect(),
        OutputFormat::Text => tree.text(),
    };
    Ok(formatted)
}

/// Handle the list-languages command
fn handle_list_languages_command(registry: &Registry) {
    for name in registry.list_languages() {
        let Some(language) = registry.get_language(&name) else {
            continue;
        };
        let mut line = format!("{}\t{}", name, language.display_name());
        if !language.aliases().is_empty() {
            line.push_str(&format!(" ({})", language.aliases().join(", ")));
        }
        if language.disable_autodetect() {
            line.push_str(" [no autodetect]");
        }
        println!("{}", line);
    }
}

/// Handle the detect command
fn handle_detect_command(registry: &Registry, code: &str) -> CliResult<()> {
    let detection = registry.detect(code, &[])?;
    let describe = |result: &ScanResult| {
        format!(
            "{}\t{}",
            result.language.as_deref().unwrap_or("plaintext"),
            result.relevance
        )
    };
    println!("{}", describe(&detection.best));
    if let Some(second) = &detection.second_best {
        println!("{}", describe(second));
    }
    Ok(())
}
