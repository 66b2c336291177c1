use crate::crawler::bitcoinabuse::BitcoinabuseCrawler;
use crate::crawler::chainabuse::ChainabuseCrawler;
use crate::crawler::walletexplorer::WalletexplorerCrawler;
use crate::crawler::CrawlContext;
use crate::crawler::Crawler;
use crate::crawler::StoreTarget;
use anyhow::Error;
use clap::ArgAction;
use clap::Parser;
use clap::ValueEnum;
use labelwatch_lib::config::Config;
use labelwatch_lib::database::memory::MemoryStore;
use log::info;
use simplelog::CombinedLogger;
use simplelog::*;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::mpsc::Sender;
use std::sync::Arc;

mod crawler;
extern crate log;
extern crate simplelog;

/// Crawls address labels and abuse reports from public Bitcoin sites into a database.
#[derive(Parser, Debug)]
#[command(name = "labelwatch", version)]
struct Args {
    /// Walk the complete Bitcoinabuse report listing once before switching to daily updates.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    init: bool,

    /// Crawlers to run; may be repeated. Runs all of them if omitted.
    #[arg(long = "crawler", value_enum)]
    crawlers: Vec<CrawlerKind>,

    /// File debug logs are appended to.
    #[arg(long, default_value = "labelwatch.log")]
    log_file: PathBuf,

    /// Keep crawled data in memory instead of writing it to the database.
    #[arg(long)]
    dry_run: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CrawlerKind {
    Bitcoinabuse,
    Walletexplorer,
    Chainabuse,
}

enum ThreadStatus {
    Abort(String),
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    init_logger(&args)?;

    let (config, target) = match args.dry_run {
        true => (Config::without_database()?, StoreTarget::Memory(MemoryStore::new())),
        false => (Config::new()?, StoreTarget::Database),
    };

    let ctx = CrawlContext::new(config, target);

    let (tx, rx) = mpsc::channel();
    start_crawler_threads(build_crawlers(&args, &ctx), &tx);

    // This blocks until we receive a message, which in turn we only receive if a crawler failed
    match rx.recv() {
        Ok(msg) => match msg {
            ThreadStatus::Abort(why) => anyhow::bail!("{why}"),
        },

        Err(why) => anyhow::bail!("{why}"),
    }
}

fn init_logger(args: &Args) -> Result<(), Error> {
    let log_file = std::fs::OpenOptions::new().create(true).append(true).open(&args.log_file)?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::max(),
            ConfigBuilder::new()
                .add_filter_allow_str("labelwatch")
                .set_time_format_str("[%d.%m.%Y; %T]")
                .build(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(
            LevelFilter::Debug,
            ConfigBuilder::new()
                .add_filter_allow_str("labelwatch")
                .set_time_format_str("[%d.%m.%Y; %T]")
                .build(),
            log_file,
        ),
    ])?;

    Ok(())
}

fn selected_crawlers(args: &Args) -> Vec<CrawlerKind> {
    match args.crawlers.is_empty() {
        true => vec![CrawlerKind::Bitcoinabuse, CrawlerKind::Walletexplorer, CrawlerKind::Chainabuse],
        false => {
            let mut kinds = Vec::new();
            for kind in &args.crawlers {
                if !kinds.contains(kind) {
                    kinds.push(*kind);
                }
            }

            kinds
        }
    }
}

fn build_crawlers(args: &Args, ctx: &Arc<CrawlContext>) -> Vec<Box<dyn Crawler + Send>> {
    selected_crawlers(args)
        .into_iter()
        .map(|kind| -> Box<dyn Crawler + Send> {
            match kind {
                CrawlerKind::Bitcoinabuse => Box::new(BitcoinabuseCrawler::new(Arc::clone(ctx), args.init)),
                CrawlerKind::Walletexplorer => Box::new(WalletexplorerCrawler::new(Arc::clone(ctx))),
                CrawlerKind::Chainabuse => Box::new(ChainabuseCrawler::new(Arc::clone(ctx))),
            }
        })
        .collect()
}

fn start_crawler_threads(crawlers: Vec<Box<dyn Crawler + Send>>, tx: &Sender<ThreadStatus>) {
    for crawler in crawlers {
        let tx_abort_channel = tx.clone();

        std::thread::spawn(move || {
            info!("Starting crawler {}", crawler.name());

            if let Err(why) = crawler.start() {
                // The receiver only disappears once main is already returning
                let _ = tx_abort_channel.send(ThreadStatus::Abort(format!("Crawler {} failed; {why:#}", crawler.name())));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["labelwatch"]).unwrap();

        assert!(args.init);
        assert!(!args.dry_run);
        assert_eq!(args.log_file, PathBuf::from("labelwatch.log"));
        assert_eq!(selected_crawlers(&args).len(), 3);
    }

    #[test]
    fn init_takes_explicit_value() {
        let args = Args::try_parse_from(["labelwatch", "--init", "false"]).unwrap();
        assert!(!args.init);

        assert!(Args::try_parse_from(["labelwatch", "--init", "maybe"]).is_err());
    }

    #[test]
    fn crawler_selection_deduplicated() {
        let args = Args::try_parse_from([
            "labelwatch",
            "--crawler",
            "chainabuse",
            "--crawler",
            "walletexplorer",
            "--crawler",
            "chainabuse",
            "--dry-run",
        ])
        .unwrap();

        assert!(args.dry_run);
        assert_eq!(selected_crawlers(&args), vec![CrawlerKind::Chainabuse, CrawlerKind::Walletexplorer]);
        assert!(Args::try_parse_from(["labelwatch", "--crawler", "etherscan"]).is_err());
    }

    #[test]
    fn crawlers_share_the_context() {
        let args = Args::try_parse_from(["labelwatch", "--dry-run"]).unwrap();
        let ctx = CrawlContext::new(Config::without_database().unwrap(), StoreTarget::Memory(MemoryStore::new()));

        let crawlers = build_crawlers(&args, &ctx);
        let names: Vec<&str> = crawlers.iter().map(|crawler| crawler.name()).collect();

        assert_eq!(names, vec!["bitcoinabuse", "walletexplorer", "chainabuse"]);
        assert_eq!(Arc::strong_count(&ctx), 4);
    }
}
