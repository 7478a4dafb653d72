use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::data::{self, StorySource};
use crate::hackernews;
use crate::host::story_text;
use crate::runtime::Ticker;
use crate::terminal::TerminalHost;

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub config_file: Option<PathBuf>,
    pub once: bool,
}

const COMMANDS_HELP: &str =
    "commands: r=refresh  o=open  c=click  t=toggle  reload  s=status  q=quit";

pub fn run(options: Options) -> Result<()> {
    let load_options = config::LoadOptions {
        config_file: options.config_file.clone(),
        env_prefix: None,
    };
    let config_path = options.config_file.clone().or_else(config::default_path);
    let cfg = config::load(load_options.clone()).context("load config")?;
    match config_path.as_ref().filter(|path| path.exists()) {
        Some(path) => info!(path = %path.display(), "loaded configuration"),
        None => info!("no config file found, using defaults"),
    }
    let source: Arc<dyn StorySource> = Arc::new(build_client(&cfg)?);

    if options.once {
        return print_once(&cfg, source.as_ref());
    }

    let mut ticker_cfg = cfg.ticker.clone();
    let mut ticker = Ticker::spawn(ticker_cfg.clone(), source, TerminalHost::stdout())
        .context("start ticker")?;
    eprintln!("{COMMANDS_HELP}");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("read command")?;
        match line.trim() {
            "" => {}
            "r" | "refresh" => ticker.refresh()?,
            "o" | "open" => ticker.open_current()?,
            "c" | "click" => ticker.click()?,
            "t" | "toggle" => {
                ticker_cfg.enabled = !ticker_cfg.enabled;
                info!(enabled = ticker_cfg.enabled, "toggled ticker");
                ticker.reconfigure(ticker_cfg.clone())?;
            }
            "reload" => match config::load(load_options.clone()) {
                Ok(reloaded) => {
                    ticker_cfg = reloaded.ticker;
                    info!("configuration reloaded");
                    ticker.reconfigure(ticker_cfg.clone())?;
                }
                Err(err) => warn!(error = %format!("{err:#}"), "configuration reload failed"),
            },
            "s" | "status" => {
                let status = ticker.status();
                println!(
                    "{:?}: {} | {}",
                    status.kind,
                    status.text,
                    status.tooltip.replace('\n', " ")
                );
            }
            "q" | "quit" => break,
            other => eprintln!("unknown command {other:?}; {COMMANDS_HELP}"),
        }
    }

    ticker.shutdown();
    Ok(())
}

fn build_client(cfg: &Config) -> Result<hackernews::Client> {
    let user_agent = if cfg.hackernews.user_agent.trim().is_empty() {
        format!("hn-ticker/{}", crate::VERSION)
    } else {
        cfg.hackernews.user_agent.clone()
    };

    hackernews::Client::new(hackernews::ClientConfig {
        user_agent,
        base_url: Some(cfg.hackernews.api_base.clone()),
        item_url: Some(cfg.hackernews.item_url.clone()),
        timeout: Some(cfg.hackernews.timeout),
        http_client: None,
    })
    .context("initialize Hacker News client")
}

fn print_once(cfg: &Config, source: &dyn StorySource) -> Result<()> {
    let stories = data::fetch_top_stories(
        source,
        cfg.ticker.feed,
        cfg.ticker.effective_max_items(),
    )
    .context("fetch stories")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(
        out,
        "Hacker News {} ({} stories)",
        cfg.ticker.feed.display_name(),
        stories.len()
    )?;
    for (index, story) in stories.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {}\n     {}",
            index + 1,
            story_text(story, cfg.ticker.show_score),
            story.link()
        )?;
    }
    Ok(())
}
