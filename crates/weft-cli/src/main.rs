use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, NamedSource, Report, Result, WrapErr, miette};
use weft_editor_core::{AttributeBag, Editor, EditorConfig, Format, MediaKind};

#[derive(Parser)]
#[command(version, about = "Weft - rich-text HTML editing engine", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Editor configuration file (TOML)
    #[arg(long, global = true, env = "WEFT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the number of undo entries kept
    #[arg(long, global = true)]
    history_size: Option<usize>,

    /// Do not record undo history
    #[arg(long, global = true)]
    no_history: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load markup and print it back in canonical form
    Roundtrip {
        /// Input file; stdin when omitted
        input: Option<PathBuf>,
    },
    /// Print markup with block elements on indented lines
    Format { input: Option<PathBuf> },
    /// Remove source formatting whitespace from markup
    Strip { input: Option<PathBuf> },
    /// Apply an edit script to markup and print the result
    Edit {
        /// Script with one command per line
        script: PathBuf,

        input: Option<PathBuf>,

        /// Print the saved editor state as JSON instead of markup
        #[arg(long)]
        state: bool,
    },
}

fn main() -> Result<()> {
    init_miette()?;
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.history_size, cli.no_history)?;

    match cli.command {
        Commands::Roundtrip { input } => {
            let (name, markup) = read_input(input.as_deref())?;
            let editor = load_editor(&name, &markup, config)?;
            println!("{}", editor.to_html(false));
        }
        Commands::Format { input } => {
            let (name, markup) = read_input(input.as_deref())?;
            let editor = load_editor(&name, &markup, config)?;
            println!("{}", editor.to_formatted_html());
        }
        Commands::Strip { input } => {
            let (_, markup) = read_input(input.as_deref())?;
            println!("{}", Editor::strip_formatting(&markup));
        }
        Commands::Edit {
            script,
            input,
            state,
        } => {
            let source = std::fs::read_to_string(&script)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading script {}", script.display()))?;
            let commands = parse_script(&script.display().to_string(), &source)?;
            let (name, markup) = read_input(input.as_deref())?;
            let mut editor = load_editor(&name, &markup, config)?;
            for command in &commands {
                command.run(&mut editor);
            }
            if state {
                let json = serde_json::to_string_pretty(&editor.save_state()).into_diagnostic()?;
                println!("{json}");
            } else {
                println!("{}", editor.to_html(false));
            }
        }
    }

    Ok(())
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .context_lines(2)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(
    path: Option<&Path>,
    history_size: Option<usize>,
    no_history: bool,
) -> Result<EditorConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading config {}", path.display()))?;
            toml::from_str::<EditorConfig>(&raw)
                .into_diagnostic()
                .wrap_err_with(|| format!("parsing config {}", path.display()))?
        }
        None => EditorConfig::default(),
    };
    if let Some(size) = history_size {
        config.history_size = size;
    }
    if no_history {
        config.history_enabled = false;
    }
    config.validate()?;
    tracing::debug!(?config, "editor configuration");
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<(String, String)> {
    match path {
        Some(path) => {
            let markup = std::fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading {}", path.display()))?;
            Ok((path.display().to_string(), markup))
        }
        None => {
            let mut markup = String::new();
            std::io::stdin()
                .read_to_string(&mut markup)
                .into_diagnostic()?;
            Ok(("<stdin>".to_owned(), markup))
        }
    }
}

/// Load `markup`, rendering every markup warning to stderr.
fn load_editor(name: &str, markup: &str, config: EditorConfig) -> Result<Editor> {
    let mut editor = Editor::new(config)?;
    let warnings = editor.load_from_html(markup).to_vec();
    if !warnings.is_empty() {
        let parsed = Editor::strip_formatting(markup);
        for warning in warnings {
            let report = Report::new(warning)
                .with_source_code(NamedSource::new(name, parsed.clone()));
            eprintln!("{report:?}");
        }
    }
    Ok(editor)
}

/// One line of an edit script.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ScriptCommand {
    Select(usize, usize),
    Caret(usize),
    Type(String),
    Backspace,
    Toggle(Format),
    Link { url: String, anchor: String },
    Unlink,
    Image(String),
    Undo,
    Redo,
}

impl ScriptCommand {
    fn run(&self, editor: &mut Editor) {
        tracing::debug!(command = ?self, "running script command");
        match self {
            ScriptCommand::Select(anchor, head) => editor.set_selection(*anchor, *head),
            ScriptCommand::Caret(offset) => editor.set_caret(*offset),
            ScriptCommand::Type(text) => editor.type_text(text),
            ScriptCommand::Backspace => editor.backspace(),
            ScriptCommand::Toggle(format) => editor.toggle_format(*format),
            ScriptCommand::Link { url, anchor } => editor.link(url, anchor),
            ScriptCommand::Unlink => {
                editor.remove_link();
            }
            ScriptCommand::Image(src) => {
                editor.insert_media(MediaKind::Image, AttributeBag::new().with("src", src.as_str()))
            }
            ScriptCommand::Undo => {
                if !editor.undo() {
                    tracing::warn!("nothing to undo");
                }
            }
            ScriptCommand::Redo => {
                if !editor.redo() {
                    tracing::warn!("nothing to redo");
                }
            }
        }
    }
}

/// Parse an edit script. Blank lines and lines starting with `#` are
/// skipped; in `type` text, `\n` stands for a line break.
fn parse_script(name: &str, source: &str) -> Result<Vec<ScriptCommand>> {
    let mut commands = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = parse_command(line)
            .map_err(|err| miette!("{name}:{}: {err}", index + 1))?;
        commands.push(command);
    }
    Ok(commands)
}

fn parse_command(line: &str) -> Result<ScriptCommand, String> {
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let offset = |s: &str| {
        s.parse::<usize>()
            .map_err(|_| format!("expected an offset, found `{s}`"))
    };
    Ok(match verb {
        "select" => {
            let (anchor, head) = rest
                .split_once(' ')
                .ok_or_else(|| "select takes two offsets".to_owned())?;
            ScriptCommand::Select(offset(anchor.trim())?, offset(head.trim())?)
        }
        "caret" => ScriptCommand::Caret(offset(rest)?),
        "type" => ScriptCommand::Type(rest.replace("\\n", "\n")),
        "backspace" => ScriptCommand::Backspace,
        "toggle" => ScriptCommand::Toggle(rest.parse::<Format>().map_err(|e| e.to_string())?),
        "link" => {
            let (url, anchor) = rest.split_once(' ').unwrap_or((rest, ""));
            ScriptCommand::Link {
                url: url.to_owned(),
                anchor: anchor.trim().to_owned(),
            }
        }
        "unlink" => ScriptCommand::Unlink,
        "image" => ScriptCommand::Image(rest.to_owned()),
        "undo" => ScriptCommand::Undo,
        "redo" => ScriptCommand::Redo,
        other => return Err(format!("unknown command `{other}`")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(markup: &str, script: &str) -> String {
        let mut editor = Editor::from_html(markup, EditorConfig::default()).unwrap();
        for command in parse_script("test", script).unwrap() {
            command.run(&mut editor);
        }
        editor.to_html(false)
    }

    #[test]
    fn parses_commands() {
        let script = "# comment\nselect 0 3\n\ntype a\\nb\ntoggle h2\nlink https://x.io here";
        assert_eq!(
            parse_script("s", script).unwrap(),
            vec![
                ScriptCommand::Select(0, 3),
                ScriptCommand::Type("a\nb".into()),
                ScriptCommand::Toggle(Format::Heading(weft_editor_core::HeadingLevel::H2)),
                ScriptCommand::Link {
                    url: "https://x.io".into(),
                    anchor: "here".into(),
                },
            ]
        );
    }

    #[test]
    fn reports_line_of_bad_command() {
        let err = parse_script("s", "caret 1\ncaret x").unwrap_err();
        assert!(err.to_string().starts_with("s:2:"));
        assert!(parse_script("s", "toggle sparkle").is_err());
    }

    #[test]
    fn script_edits_markup() {
        assert_eq!(run("hello", "select 0 5\ntoggle bold"), "<b>hello</b>");
        assert_eq!(
            run("", "toggle ul\ntype a\\nb\nundo"),
            "<ul><li></li></ul>"
        );
        assert_eq!(run("ab", "caret 1\nimage p.png"), r#"a<img src="p.png" />b"#);
    }

    #[test]
    fn flags_override_config() {
        let config = load_config(None, Some(3), false).unwrap();
        assert_eq!(config.history_size, 3);
        assert!(!load_config(None, None, true).unwrap().history_enabled);
        assert!(load_config(None, Some(0), false).is_err());
    }
}
