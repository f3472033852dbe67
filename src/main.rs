use clap::Parser;
use ecfg::ResolveOptions;
use semver::Version;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecfg")]
#[command(about = "Resolve EditorConfig properties for file paths")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Print version information and exit
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Configuration file name to search for instead of .editorconfig
    #[arg(short = 'f', value_name = "NAME")]
    config_name: Option<String>,

    /// Behave as the given specification version
    #[arg(short = 'b', value_name = "VERSION")]
    develop_version: Option<String>,

    /// Target files to resolve
    #[arg(value_name = "FILEPATH", required_unless_present = "version")]
    paths: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    if cli.version {
        println!("ecfg version {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }
    let develop_version = match cli.develop_version.as_deref() {
        None => None,
        Some(text) => match parse_version(text) {
            Some(version) => Some(version),
            None => {
                eprintln!("ecfg: invalid version `{text}`");
                return ExitCode::from(2);
            },
        },
    };
    let options = ResolveOptions {
        config_file_name: cli.config_name,
        develop_version,
    };
    let many = cli.paths.len() > 1;
    for path in &cli.paths {
        let properties = match ecfg::resolve(path, &options) {
            Ok(properties) => properties,
            Err(error) => {
                eprintln!("ecfg: {error}");
                return ExitCode::from(1);
            },
        };
        if many {
            println!("[{path}]");
        }
        for (key, value) in properties.iter() {
            println!("{key}={value}");
        }
    }
    ExitCode::SUCCESS
}

/// Accepts `major[.minor[.patch]]` with an optional pre-release suffix,
/// padding missing components.
fn parse_version(text: &str) -> Option<Version> {
    let text = text.trim();
    let (numbers, suffix) = match text.split_once('-') {
        Some((numbers, suffix)) => (numbers, Some(suffix)),
        None => (text, None),
    };
    let mut padded = numbers.to_owned();
    for _ in numbers.split('.').count()..3 {
        padded.push_str(".0");
    }
    if let Some(suffix) = suffix {
        padded.push('-');
        padded.push_str(suffix);
    }
    Version::parse(&padded).ok()
}

#[cfg(test)]
mod tests {
    use semver::Version;

    use crate::parse_version;

    #[test]
    fn versions_are_padded() {
        assert_eq!(parse_version("0.9"), Some(Version::new(0, 9, 0)));
        assert_eq!(parse_version("1"), Some(Version::new(1, 0, 0)));
        assert_eq!(parse_version("0.8.1"), Some(Version::new(0, 8, 1)));
    }

    #[test]
    fn suffixes_survive_padding() {
        let version = parse_version("0.9-final").expect("version should parse");
        assert_eq!((version.major, version.minor, version.patch), (0, 9, 0));
        assert!(!version.pre.is_empty());
    }

    #[test]
    fn nonsense_is_rejected() {
        assert_eq!(parse_version("banana"), None);
        assert_eq!(parse_version(""), None);
    }
}
