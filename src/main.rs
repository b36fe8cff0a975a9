use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use md2mrkdwn::{Config, Error, HeadingStyle, Result};

/// Config file picked up from the working directory when no `--config` is given.
const LOCAL_CONFIG: &str = "md2mrkdwn.toml";

#[derive(Parser)]
#[command(name = "md2mrkdwn", version)]
#[command(about = "Convert Markdown to Slack mrkdwn")]
struct Cli {
    /// Input Markdown file (reads stdin when absent or `-`)
    input: Option<PathBuf>,

    /// Output file (writes stdout when absent)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file (defaults to ./md2mrkdwn.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Heading style: bold-only, bold-with-marker, plain or prefix
    #[arg(long)]
    heading_style: Option<String>,

    /// Bullet used for unordered list items
    #[arg(long)]
    list_bullet: Option<String>,

    /// Log conversion details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let markdown = read_input(cli.input.as_deref())?;
    let mrkdwn = md2mrkdwn::convert_with_config(&markdown, &config);
    write_output(cli.output.as_deref(), &mrkdwn)
}

/// Config file first, then command line overrides on top.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => {
            let local = Path::new(LOCAL_CONFIG);
            if local.is_file() {
                Config::load(local)?
            } else {
                Config::default()
            }
        }
    };

    if let Some(style) = &cli.heading_style {
        config.headings.style = style.parse::<HeadingStyle>()?;
    }
    if let Some(bullet) = &cli.list_bullet {
        config.lists.bullet.clone_from(bullet);
    }
    config.validate()?;
    Ok(config)
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).map_err(|source| Error::InputRead {
                source_name: path.display().to_string(),
                source,
            })
        }
        _ => {
            let mut markdown = String::new();
            io::stdin()
                .read_to_string(&mut markdown)
                .map_err(|source| Error::InputRead {
                    source_name: "<stdin>".to_string(),
                    source,
                })?;
            Ok(markdown)
        }
    }
}

fn write_output(output: Option<&Path>, mrkdwn: &str) -> Result<()> {
    let mut text = mrkdwn.to_string();
    if !text.is_empty() {
        text.push('\n');
    }

    match output {
        Some(path) => fs::write(path, text).map_err(|source| Error::OutputWrite {
            path: path.to_path_buf(),
            source,
        }),
        None => io::stdout()
            .write_all(text.as_bytes())
            .map_err(|source| Error::OutputWrite {
                path: PathBuf::from("<stdout>"),
                source,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("md2mrkdwn").chain(args.iter().copied()))
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[lists]\nbullet = \"-\"\n\n[rules]\nlength = 3\n").unwrap();

        let path_arg = path.to_str().unwrap();
        let config = load_config(&cli(&["-c", path_arg, "--list-bullet", "→"])).unwrap();
        assert_eq!(config.lists.bullet, "→");
        assert_eq!(config.rules.length, 3);

        let config = load_config(&cli(&["-c", path_arg, "--heading-style", "plain"])).unwrap();
        assert_eq!(config.headings.style, HeadingStyle::Plain);
        assert_eq!(config.lists.bullet, "-");
    }

    #[test]
    fn bad_heading_style_is_rejected() {
        let err = load_config(&cli(&["--heading-style", "fancy"])).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedOption {
                option: "heading-style",
                ..
            }
        ));
    }

    #[test]
    fn empty_bullet_is_rejected() {
        let err = load_config(&cli(&["--list-bullet", ""])).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedOption {
                option: "list-bullet",
                ..
            }
        ));
    }

    #[test]
    fn missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.md");
        let err = read_input(Some(missing.as_path())).unwrap_err();
        assert!(matches!(err, Error::InputRead { .. }));
        assert!(err.to_string().contains("nope.md"));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.md");
        let output = dir.path().join("out.txt");
        fs::write(&input, "# Hi\n\n**there**\n").unwrap();

        let markdown = read_input(Some(input.as_path())).unwrap();
        let mrkdwn = md2mrkdwn::convert(&markdown);
        write_output(Some(output.as_path()), &mrkdwn).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "*Hi*\n\n*there*\n");
    }

    #[test]
    fn empty_output_has_no_newline() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        write_output(Some(output.as_path()), "").unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "");
    }
}
