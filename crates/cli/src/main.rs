use clap::{Parser, Subcommand};
use relay::api::{PerguntaRequest, RespostaResponse};

#[derive(Parser)]
#[command(name = "zap-relay")]
#[command(about = "WhatsApp webhook to LLM reply relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Write a default configuration file if none exists.
    Init {
        /// Config file path (default: ZAP_RELAY_CONFIG_PATH or ~/.zap-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the HTTP server (POST /webhook, POST /perguntar).
    Serve {
        /// Config file path (default: ZAP_RELAY_CONFIG_PATH or ~/.zap-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 127.0.0.1)
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Ask a running server a question through POST /perguntar and print the answer.
    Ask {
        /// Config file path, used to find the server port when --url is not given.
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Server base URL (default: http://127.0.0.1:<server.port>)
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// The question.
        #[arg(required = true)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let dotenv_path = dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Some(path) = dotenv_path {
        log::debug!("loaded environment from {}", path.display());
    }

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("zap-relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port, bind }) => {
            if let Err(e) = run_serve(config, port, bind).await {
                log::error!("server failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ask {
            config,
            url,
            message,
        }) => {
            if let Err(e) = run_ask(config, url, message.join(" ")).await {
                log::error!("ask failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(relay::config::default_config_path);
    if relay::config::write_default_config(&path)? {
        println!("wrote default configuration to {}", path.display());
    } else {
        println!("configuration already exists at {}", path.display());
    }
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, path) = relay::config::load_config(config_path)?;
    log::debug!("using config {}", path.display());
    if let Some(p) = port {
        config.server.port = p;
    }
    if let Some(b) = bind {
        config.server.bind = b;
    }
    log::info!("starting server on {}:{}", config.server.bind, config.server.port);
    relay::api::run_server(config).await
}

async fn run_ask(
    config_path: Option<std::path::PathBuf>,
    url: Option<String>,
    message: String,
) -> anyhow::Result<()> {
    let base = match url {
        Some(u) => u.trim_end_matches('/').to_string(),
        None => {
            let (config, _) = relay::config::load_config(config_path)?;
            format!("http://127.0.0.1:{}", config.server.port)
        }
    };
    let res = reqwest::Client::new()
        .post(format!("{}/perguntar", base))
        .json(&PerguntaRequest { mensagem: message })
        .send()
        .await?;
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        anyhow::bail!("server answered {}: {}", status, body);
    }
    let reply: RespostaResponse = res.json().await?;
    println!("{}", reply.resposta.trim());
    Ok(())
}
