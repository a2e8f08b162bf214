use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing::{debug, info};

use gridbot_client::api::split_by_visibility;
use gridbot_client::session::{View, LOGIN_ROUTE};
use gridbot_client::types::{Bot, BotCreate, BotStatus, BotUpdate, Credentials};
use gridbot_client::{
    ApiClient, AuthApi, BotsApi, Config, CookieJarStore, Navigator, RouteWatch, StatsSummary,
};

#[derive(Parser)]
#[command(name = "botctl", about = "Manage grid trading bots and their statistics")]
struct Cli {
    /// Load config from a specific .env file
    #[arg(long, global = true)]
    config_file: Option<String>,

    /// Override API_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session tokens
    Login(LoginArgs),
    /// Create an account and store the session tokens
    Register(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show whether a session is stored
    Whoami,
    /// Bot configuration
    #[command(subcommand)]
    Bots(BotsCommand),
    /// Profitability across all bots
    Stats {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long, short)]
    username: String,

    #[arg(long, short, env = "BOTCTL_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum BotsCommand {
    /// List bots
    List {
        /// Only public bots
        #[arg(long, conflicts_with = "mine")]
        public: bool,
        /// Only your own bots
        #[arg(long)]
        mine: bool,
        #[arg(long)]
        json: bool,
    },
    /// Create a bot
    Create {
        #[arg(long)]
        name: String,
        /// Trading pair, e.g. BTCUSDT
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        deposit: Decimal,
        #[arg(long)]
        profit_percentage: Decimal,
        #[arg(long)]
        num_orders: u32,
        #[arg(long)]
        grid_length: Decimal,
    },
    /// Change fields of one of your bots
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        deposit: Option<Decimal>,
        #[arg(long)]
        profit_percentage: Option<Decimal>,
        #[arg(long)]
        num_orders: Option<u32>,
        #[arg(long)]
        grid_length: Option<Decimal>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Delete one of your bots
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Active,
    Pause,
}

impl From<StatusArg> for BotStatus {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::Active => BotStatus::Active,
            StatusArg::Pause => BotStatus::Pause,
        }
    }
}

impl Command {
    /// The dashboard view this command corresponds to
    fn view(&self) -> View {
        match self {
            Command::Login(_) | Command::Logout => View::Login,
            Command::Register(_) => View::Register,
            Command::Whoami | Command::Bots(_) => View::Bots,
            Command::Stats { .. } => View::Stats,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::from_env_file(cli.config_file.as_deref())?;
    if let Some(url) = cli.base_url.as_deref() {
        cfg = cfg.with_base_url(url)?;
    }
    debug!("API: {} | credentials: {}", cfg.api_base_url, cfg.credentials_path);

    let store = Arc::new(
        CookieJarStore::open(&cfg.credentials_path, &cfg.base_url()?)
            .context("Open credential store")?,
    );
    let view = cli.command.view();
    let nav = Arc::new(RouteWatch::new(view.route()));
    let routes = nav.subscribe();
    let client = Arc::new(ApiClient::from_config(&cfg, store, nav.clone())?);
    let auth = AuthApi::new(client.clone());
    let bots = BotsApi::new(client);

    let outcome = match auth.guard(view) {
        Ok(()) => run(cli.command, &auth, &bots).await,
        Err(e) => Err(e.into()),
    };

    // The client only navigates when a token refresh fails
    if routes.has_changed().unwrap_or(false) && nav.current_route() == LOGIN_ROUTE {
        eprintln!("Session expired. Run `botctl login` to sign in again.");
    }
    outcome
}

async fn run(command: Command, auth: &AuthApi, bots: &BotsApi) -> Result<()> {
    match command {
        Command::Login(args) => {
            let user = auth.login(&credentials(args)).await.context("Login failed")?;
            println!("Logged in as {}", user.username);
        }
        Command::Register(args) => {
            let user = auth.register(&credentials(args)).await.context("Registration failed")?;
            println!("Registered and logged in as {}", user.username);
        }
        Command::Logout => {
            auth.logout()?;
            println!("Logged out");
        }
        Command::Whoami => {
            println!("Session stored");
        }
        Command::Bots(cmd) => run_bots(cmd, bots).await?,
        Command::Stats { json } => {
            let stats = bots.statistics().await.context("Load statistics")?;
            let summary = StatsSummary::from_statistics(&stats);
            if json {
                let out = serde_json::json!({ "summary": summary, "bots": stats });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_stats(&summary, &stats);
            }
        }
    }
    Ok(())
}

async fn run_bots(cmd: BotsCommand, bots: &BotsApi) -> Result<()> {
    match cmd {
        BotsCommand::List { public, mine, json } => {
            let all = bots.list().await.context("Load bots")?;
            let (public_bots, my_bots) = split_by_visibility(all.clone());
            let shown = if public {
                public_bots
            } else if mine {
                my_bots
            } else {
                all
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                print_bots(&shown);
            }
        }
        BotsCommand::Create { name, symbol, deposit, profit_percentage, num_orders, grid_length } => {
            let bot = bots
                .create(&BotCreate { name, symbol, deposit, profit_percentage, num_orders, grid_length })
                .await
                .context("Create bot")?;
            println!("Created {} ({})", bot.name, bot.id);
        }
        BotsCommand::Update { id, name, symbol, deposit, profit_percentage, num_orders, grid_length, status } => {
            let update = BotUpdate {
                id,
                name,
                status: status.map(BotStatus::from),
                symbol,
                deposit,
                profit_percentage,
                num_orders,
                grid_length,
                is_public: None,
            };
            if update.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }
            let bot = bots.update_own(&update).await.context("Update bot")?;
            println!("Updated {} ({}) [{}]", bot.name, bot.id, bot.status);
        }
        BotsCommand::Delete { id } => {
            bots.delete_own(&id).await.context("Delete bot")?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

fn credentials(args: LoginArgs) -> Credentials {
    info!("Authenticating {}", args.username);
    Credentials {
        username: args.username,
        password: args.password,
    }
}

fn print_bots(bots: &[Bot]) {
    if bots.is_empty() {
        println!("No bots");
        return;
    }
    println!(
        "{:<12} {:<20} {:<7} {:<10} {:>12} {:>8} {:>7} {:>8} {:<6}",
        "ID", "NAME", "STATUS", "SYMBOL", "DEPOSIT", "PROFIT%", "ORDERS", "GRID%", "PUBLIC"
    );
    for b in bots {
        println!(
            "{:<12} {:<20} {:<7} {:<10} {:>12} {:>8} {:>7} {:>8} {:<6}",
            truncate(&b.id, 12),
            truncate(&b.name, 20),
            b.status.to_string(),
            b.symbol,
            b.deposit.round_dp(2),
            b.profit_percentage,
            b.num_orders,
            b.grid_length,
            if b.is_public { "yes" } else { "no" },
        );
    }
}

fn print_stats(summary: &StatsSummary, stats: &[gridbot_client::types::BotStatistic]) {
    println!("Bots: {} ({} profitable)", summary.active_bots, summary.profitable_bots);
    println!("Total deposit: ${}", summary.total_deposit.round_dp(2));
    println!("Total profit:  ${}", summary.total_profit.round_dp(2));
    println!("Avg profit:    {}%", summary.avg_profit_percentage);
    println!("Cycles:        {}", summary.total_cycles);

    if stats.is_empty() {
        return;
    }
    println!();
    println!(
        "{:<20} {:<10} {:>8} {:>12} {:>12} {:>9}",
        "NAME", "SYMBOL", "CYCLES", "DEPOSIT", "PROFIT", "PROFIT%"
    );
    for s in stats {
        println!(
            "{:<20} {:<10} {:>8} {:>12} {:>12} {:>8}%",
            truncate(&s.name, 20),
            s.symbol,
            s.cycles_completed,
            s.deposit_usdt.round_dp(2),
            s.profit_usdt.round_dp(2),
            s.profit_percentage.round_dp(2),
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max - 1).chain(std::iter::once('…')).collect()
    }
}
