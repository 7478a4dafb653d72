use std::path::PathBuf;

use tracing::Level;

const HELP: &str = "HN-Ticker - Rotate Hacker News top stories through a status line.

  --version, -V        Show version and exit
  --help,    -h        Show this help message
  --once               Fetch stories once, print them and exit
  --config <path>      Use this config file instead of the default
  --debug              Enable debug logging";

fn main() {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => return,
        Err(message) => {
            eprintln!("error: {message}\n\n{HELP}");
            std::process::exit(2);
        }
    };

    if let Err(err) = hn_ticker::run(options) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> Result<Option<hn_ticker::app::Options>, String> {
    let mut options = hn_ticker::app::Options::default();
    let mut debug = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("HN-Ticker {}", hn_ticker::VERSION);
                return Ok(None);
            }
            "--help" | "-h" => {
                println!("{HELP}");
                return Ok(None);
            }
            "--once" => options.once = true,
            "--debug" => debug = true,
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--config requires a path".to_string())?;
                options.config_file = Some(PathBuf::from(path));
            }
            other => return Err(format!("unknown argument {other:?}")),
        }
    }

    init_logging(debug);
    Ok(Some(options))
}

fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
