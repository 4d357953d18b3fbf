use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tweetline::{CliArgs, Command, Config, Credentials};

#[derive(Parser)]
#[command(name = "tweetline")]
#[command(about = "OAuth 1.0a signed requests and line streams against the Twitter API")]
struct Cli {
    #[arg(short, long, global = true, help = "Increase verbosity")]
    verbose: bool,

    #[arg(short, long, global = true, help = "Path to a TOML or JSON config file")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Override the User-Agent header")]
    user_agent: Option<String>,

    #[arg(long, global = true, help = "Do not send Accept-Encoding: gzip")]
    no_gzip: bool,

    #[arg(long, env = "TWEETLINE_CONSUMER_KEY", hide_env_values = true)]
    consumer_key: String,

    #[arg(long, env = "TWEETLINE_CONSUMER_SECRET", hide_env_values = true)]
    consumer_secret: String,

    #[arg(long, env = "TWEETLINE_ACCESS_TOKEN", hide_env_values = true, default_value = "")]
    access_token: String,

    #[arg(long, env = "TWEETLINE_ACCESS_TOKEN_SECRET", hide_env_values = true, default_value = "")]
    access_token_secret: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Signed GET, prints the response body
    Get { url: String },
    /// Signed POST, prints the response body
    Post { url: String },
    /// Print each line of a streaming endpoint until it closes
    Stream {
        url: String,
        #[arg(long, help = "Stop after this many lines")]
        max_lines: Option<usize>,
    },
    /// Upload a file as multipart media, prints the media id
    Upload {
        url: String,
        file: PathBuf,
        #[arg(long, help = "Multipart boundary (random if omitted)")]
        boundary: Option<String>,
    },
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Get { url } => Command::Get { url },
            Commands::Post { url } => Command::Post { url },
            Commands::Stream { url, max_lines } => Command::Stream { url, max_lines },
            Commands::Upload {
                url,
                file,
                boundary,
            } => Command::Upload {
                url,
                file,
                boundary,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config_file: cli.config.clone(),
        user_agent: cli.user_agent.clone(),
        no_gzip: cli.no_gzip,
        log_level: cli.verbose.then(|| "debug".to_string()),
    };
    let config = Config::load_with_cli(&args)?;
    config.validate()?;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let credentials = Credentials::new(
        cli.consumer_key,
        cli.consumer_secret,
        cli.access_token,
        cli.access_token_secret,
    );

    tweetline::run(config, credentials, cli.command.into()).await
}
