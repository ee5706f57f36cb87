mod config;
mod export;
mod html;
mod ingest;
mod store;

use anyhow::Context;
use article_filter::builder::page_file;
use article_filter::snapshot::FileSnapshot;
use article_filter::{DeliverySelector, PrecomputedPages, Site, SnapshotProvider};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utils_common::Taxonomy;

use crate::config::{load_config, Config};
use crate::ingest::{Ingestor, Topic};
use crate::store::ArticleStore;

fn cli() -> Command {
    Command::new("article-indexer-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("生成文章快照和预计算分面页面，并接收 CMS webhook")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径 (TOML)，省略时使用内置默认配置")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("显示详细信息")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("build")
                .about("从存储生成快照、分面主数据和预计算页面")
                .arg(
                    Arg::new("workers")
                        .short('j')
                        .long("workers")
                        .value_name("N")
                        .help("并行构建线程数")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("ingest")
                .about("处理一个 webhook 事件")
                .arg(
                    Arg::new("topic")
                        .long("topic")
                        .value_parser(["create", "update", "delete"])
                        .required(true),
                )
                .arg(
                    Arg::new("body")
                        .long("body")
                        .value_name("FILE")
                        .help("请求体文件")
                        .value_parser(value_parser!(PathBuf))
                        .required(true),
                )
                .arg(
                    Arg::new("hmac")
                        .long("hmac")
                        .value_name("SIGNATURE")
                        .help("x-shopify-hmac-sha256 请求头的值"),
                ),
        )
        .subcommand(
            Command::new("route")
                .about("按路由交付页面，例如 /blogs/languages/Python")
                .arg(Arg::new("route").required(true)),
        )
        .subcommand(Command::new("facets").about("显示已导出的分面主数据"))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    if let Err(e) = run(&matches) {
        tracing::error!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("build", sub)) => cmd_build(&config, sub),
        Some(("ingest", sub)) => cmd_ingest(&config, sub),
        Some(("route", sub)) => cmd_route(&config, sub),
        Some(("facets", _)) => cmd_facets(&config),
        _ => anyhow::bail!("未知的子命令"),
    }
}

fn cmd_build(config: &Config, sub: &ArgMatches) -> anyhow::Result<()> {
    let workers = sub.get_one::<usize>("workers").copied();
    let report = export::build_site(config, workers)?;

    tracing::info!(
        "✅ 构建完成: 文章 {} 篇，预计算页面 {} 个，页面包 {} 字节",
        report.articles,
        report.pages,
        report.bundle_bytes
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_ingest(config: &Config, sub: &ArgMatches) -> anyhow::Result<()> {
    let topic: Topic = sub
        .get_one::<String>("topic")
        .map(String::as_str)
        .unwrap_or_default()
        .parse()
        .map_err(anyhow::Error::msg)?;
    let body_path = sub
        .get_one::<PathBuf>("body")
        .context("缺少 --body")?;
    let body = fs::read(body_path).with_context(|| format!("无法读取 {}", body_path.display()))?;

    let store = ArticleStore::open(&config.paths.store_dir)?;
    let ingestor = Ingestor::new(&store, config.webhook.secret(), config.site.store_domain.clone());

    match ingestor.handle(topic, &body, sub.get_one::<String>("hmac").map(String::as_str)) {
        Ok(outcome) => {
            println!("{}", serde_json::json!({ "status": 200, "body": outcome }));
            Ok(())
        }
        Err(e) => {
            println!(
                "{}",
                serde_json::json!({ "status": e.status(), "body": { "error": e.to_string() } })
            );
            Err(e.into())
        }
    }
}

#[derive(Serialize)]
struct RouteSummary<'a> {
    mode: article_filter::DeliveryMode,
    route: String,
    title: &'a str,
    total: usize,
    counts: BTreeMap<String, Vec<(String, usize)>>,
    page_file: Option<PathBuf>,
}

fn cmd_route(config: &Config, sub: &ArgMatches) -> anyhow::Result<()> {
    let route = sub.get_one::<String>("route").context("缺少路由")?;
    let data_dir = config.paths.data_dir();

    let bundle_path = data_dir.join(export::BUNDLE_FILE);
    let pages = match fs::read(&bundle_path) {
        Ok(data) => PrecomputedPages::from_bundle(&data)
            .with_context(|| format!("无法解析 {}", bundle_path.display()))?,
        Err(e) => {
            tracing::warn!("⚠️ 页面包不可用 ({}): {}，全部按需计算", bundle_path.display(), e);
            PrecomputedPages::new()
        }
    };

    let site = Site::new(
        config.site.section_root.clone(),
        DeliverySelector::default(),
        pages,
        SnapshotProvider::new(FileSnapshot::new(data_dir.join(export::SNAPSHOT_FILE))),
    );

    let resolution = site.resolve_route(route).map_err(|e| {
        if e.is_client_error() {
            anyhow::anyhow!("404 {}: {}", route, e)
        } else {
            anyhow::anyhow!("503 {}: {}", route, e)
        }
    })?;

    let page = resolution.page.as_ref();
    let counts: BTreeMap<String, Vec<(String, usize)>> = page
        .counts
        .iter()
        .map(|(dim, entries)| {
            let entries = entries.iter().map(|c| (c.value.clone(), c.count)).collect();
            (dim.to_string(), entries)
        })
        .collect();
    let pages_dir = config.paths.pages_dir(site.section_root());
    let summary = RouteSummary {
        mode: resolution.mode,
        route: page.path.to_route(site.section_root()),
        title: &page.title,
        total: page.total,
        counts,
        page_file: Some(page_file(&pages_dir, &page.path)).filter(|file| file.exists()),
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_facets(config: &Config) -> anyhow::Result<()> {
    let path = config.paths.data_dir().join(export::FACETS_FILE);
    let data = fs::read(&path).with_context(|| format!("无法读取 {}，请先执行 build", path.display()))?;
    let taxonomy: Taxonomy = serde_json::from_slice(&data)?;

    for (dim, values) in taxonomy.iter() {
        println!("{} ({}): {}", dim, dim.tag_prefix(), values.join(", "));
    }
    Ok(())
}
