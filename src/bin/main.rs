//! Spellstr CLI
//!
//!   spellstr serve              → Start HTTP server
//!   spellstr redeem <token>     → Swap a token into the wallet, output {success, amount, message}
//!   spellstr balance            → {"balance": 21}
//!   spellstr proofs             → {"count": 3, "proofs": [{amount, keyset_id}]}
//!   spellstr sweep              → {"amount": 21, "token": "cashuA..."}
//!
//! Configuration comes from flags, then environment, then `.env`:
//!   MINT_URL, WALLET_DB, ADMIN_NPUB, SPELLSTR_PORT, SPELLSTR_WORDS,
//!   SPELLSTR_WALLET (cashu|memory), SPELLSTR_MINT_TIMEOUT_SECS, RUST_LOG

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use spellstr::config::load_dotenv;
use spellstr::logging::init_logging;
use spellstr::{create_router, install_signal_handlers, AppState, ServerConfig, WalletBackend};
use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::info;

fn main() {
    load_dotenv(std::path::Path::new(".env"));
    init_logging();
    #[cfg(feature = "cashu")]
    let _ = rustls::crypto::ring::default_provider().install_default();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("spellstr {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("serve") => cmd_serve(&opts),
        Some("redeem") => cmd_redeem(&opts),
        Some("balance") => cmd_balance(&opts),
        Some("proofs") => cmd_proofs(&opts),
        Some("sweep") => cmd_sweep(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || std::io::stdout().is_terminal();
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{:#}", e)}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    token: Option<String>,
    port: Option<u16>,
    mint_url: Option<String>,
    wallet_db: Option<String>,
    wallet: Option<String>,
    words: Option<String>,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let value = args.get(i + 1).cloned();
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--pretty" => opts.pretty = true,
                "--port" | "-p" => {
                    opts.port = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "--mint" | "-m" => {
                    opts.mint_url = value;
                    i += 1;
                }
                "--wallet-db" | "-d" => {
                    opts.wallet_db = value;
                    i += 1;
                }
                "--wallet" | "-w" => {
                    opts.wallet = value;
                    i += 1;
                }
                "--words" => {
                    opts.words = value;
                    i += 1;
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        if !positional.is_empty() {
            opts.token = Some(positional.join(""));
        }
        opts
    }

    /// Environment config with CLI flags applied on top.
    fn config(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::from_env()?;
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = &self.mint_url {
            config.mint_url = url.clone();
        }
        if let Some(path) = &self.wallet_db {
            config.wallet_db = PathBuf::from(path);
        }
        if let Some(words) = &self.words {
            config.words_file = PathBuf::from(words);
        }
        if let Some(wallet) = &self.wallet {
            config.wallet_backend = WalletBackend::from_str(wallet).ok_or_else(|| anyhow!("Unknown wallet backend: {}", wallet))?;
        }
        Ok(config)
    }
}

fn print_usage() {
    println!(
        r#"spellstr - spelling sessions paid with Cashu eCash

USAGE:
    spellstr <command> [token] [options]

COMMANDS:
    serve                   Start HTTP server
    redeem <token>          Swap a cashuA token into the wallet
    balance                 Owned sats
    proofs                  Owned proofs (amount, keyset)
    sweep                   Move every owned proof into one outgoing token

OPTIONS:
    --port, -p <port>       Server port (default: 8000, env: SPELLSTR_PORT)
    --mint, -m <url>        Default mint (env: MINT_URL)
    --wallet-db, -d <path>  Proof storage directory (env: WALLET_DB)
    --wallet, -w <backend>  cashu|memory (env: SPELLSTR_WALLET)
    --words <path>          Word list JSON (env: SPELLSTR_WORDS)
    --pretty                Pretty-print JSON
    --version, -V           Print version

ADMIN:
    Set ADMIN_NPUB and send it as the x-npub header to /admin/*.

EXAMPLES:
    spellstr serve --port 8000
    spellstr redeem cashuAeyJ0b2tlbiI6...
    spellstr sweep --pretty | jq -r .token
"#
    );
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to create runtime")
}

fn cmd_serve(opts: &ParsedArgs) -> Result<Value> {
    let config = opts.config()?;
    let rt = runtime()?;

    rt.block_on(async {
        let shutdown = install_signal_handlers();
        let state = AppState::from_config(&config)?;
        let router = create_router(state);
        let addr = format!("0.0.0.0:{}", config.port);

        info!(
            wallet = config.wallet_backend.as_str(),
            mint = %config.mint_url,
            "Spellstr listening on http://{}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(&addr).await
            .with_context(|| format!("Failed to bind {}", addr))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await
            .context("Server error")?;

        info!("Server stopped");
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(json!({"status": "stopped"}))
}

fn cmd_redeem(opts: &ParsedArgs) -> Result<Value> {
    let token = opts.token.as_deref().context("Usage: spellstr redeem <token>")?;
    let wallet = opts.config()?.open_wallet()?;
    let outcome = runtime()?.block_on(wallet.redeem(token));
    Ok(serde_json::to_value(outcome)?)
}

fn cmd_balance(opts: &ParsedArgs) -> Result<Value> {
    let wallet = opts.config()?.open_wallet()?;
    let balance = runtime()?.block_on(wallet.balance())?;
    Ok(json!({"balance": balance, "unit": "sat", "wallet_db": wallet.storage_location()}))
}

fn cmd_proofs(opts: &ParsedArgs) -> Result<Value> {
    let wallet = opts.config()?.open_wallet()?;
    let proofs = runtime()?.block_on(wallet.list_proofs())?;
    Ok(json!({"count": proofs.len(), "proofs": proofs}))
}

fn cmd_sweep(opts: &ParsedArgs) -> Result<Value> {
    let wallet = opts.config()?.open_wallet()?;
    let swept = runtime()?.block_on(wallet.sweep())?;
    Ok(json!({"success": true, "amount": swept.amount, "token": swept.token}))
}
