use anyhow::Context;
use clap::Parser;
use guest_timeline::session::DEFAULT_API_BASE;
use guest_timeline::tokens::DEFAULT_WEB_BASE;
use guest_timeline::{
    ClientOptions, Credentials, ScrapingTokenProvider, TimelineClient, TokenProvider,
    DEFAULT_COUNT,
};
use reqwest::{Client, Url};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

#[derive(Parser, Debug)]
#[clap(version)]
struct Args {
    /// Screen name of the user whose tweets to print
    username: String,
    /// Number of tweets to print, most recent first
    #[clap(short, long, default_value_t = DEFAULT_COUNT)]
    count: usize,
    /// JSON file with `guest_token`, `bearer_token` and `query_id`, instead of scraping them
    #[clap(short, long)]
    auth: Option<PathBuf>,
    /// Base URL of the API
    #[clap(long, default_value = DEFAULT_API_BASE)]
    api_base: String,
    /// Base URL of the web client the session values are scraped from
    #[clap(long, default_value = DEFAULT_WEB_BASE)]
    web_base: Url,
    /// Request timeout in seconds
    #[clap(long, default_value_t = 10)]
    timeout: u64,
    /// Print each tweet as a JSON object with its id
    #[clap(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = main2().await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn main2() -> anyhow::Result<()> {
    let args: Args = Args::parse();
    let timeout = Duration::from_secs(args.timeout);

    let tokens: Box<dyn TokenProvider> = match &args.auth {
        Some(path) => {
            log::info!("Using session values from {}", path.display());
            let auth = fs::read_to_string(path)
                .await
                .context("Unable to read auth file")?;
            let credentials = serde_json::from_str::<Credentials>(&auth)
                .context("Unable to deserialize auth file")?;
            Box::new(credentials)
        }
        None => {
            log::info!("Scraping session values from {}", args.web_base);
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .context("Unable to build HTTP client")?;
            Box::new(ScrapingTokenProvider::new(client, args.web_base.clone()))
        }
    };

    let options = ClientOptions {
        api_base: args.api_base.clone(),
        timeout,
    };
    let timeline = TimelineClient::connect(&args.username, tokens.as_ref(), options)
        .await
        .with_context(|| format!("Unable to get tweets for {}", args.username))?;
    let posts = timeline
        .fetch_posts(args.count)
        .await
        .with_context(|| format!("Unable to get tweets for {}", args.username))?;
    log::info!("Got {} tweets for {}", posts.len(), args.username);

    let mut stdout = std::io::stdout().lock();
    for post in posts {
        let line = if args.json {
            serde_json::to_string(&post)?
        } else {
            post.text
        };
        if let Err(e) = writeln!(stdout, "{}", line) {
            match e.kind() {
                std::io::ErrorKind::BrokenPipe => break,
                _ => return Err(e).context("Unable to write to stdout"),
            }
        }
    }
    Ok(())
}
