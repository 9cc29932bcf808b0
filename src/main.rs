use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use holiday_calendar::commands::{self, events::EventInput};
use holiday_calendar::config::Config;
use holiday_calendar::error::AppResult;
use holiday_calendar::services::{
    api::HttpCalendarApi,
    countries::CountryFilter,
    overlay::Viewport,
    token_store::FileTokenStore,
    validation::{LoginForm, SignupForm},
};
use holiday_calendar::AppState;

#[derive(Parser)]
#[command(name = "holiday-calendar")]
#[command(about = "Browse holidays by month and country, and manage your own events")]
struct Cli {
    /// Countries to hide for this run, by id (0 Iran, 1 Canada, 2 Ukraine,
    /// 3 China, 4 Korea, 5 Indigenous)
    #[arg(long = "hide-country", global = true, value_delimiter = ',')]
    hide_country: Vec<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a month grid
    Month {
        /// Month number, 1 to 12 (defaults to the current month)
        #[arg(short, long)]
        month: Option<u32>,
    },
    /// List the events on one day
    Day {
        #[arg(short, long)]
        month: Option<u32>,
        /// Day of the month (defaults to today)
        #[arg(short, long)]
        day: Option<u8>,
    },
    /// List countries and whether they are shown
    Countries,
    /// Show the details panel for an event
    Show {
        id: String,
        /// Click position in pixels
        #[arg(long, default_value_t = 0.0)]
        x: f64,
        #[arg(long, default_value_t = 0.0)]
        y: f64,
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 800.0)]
        height: f64,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Add an event
    Add(AddArgs),
    /// Change one of your events
    Edit {
        id: String,
        #[command(flatten)]
        changes: EditArgs,
    },
    /// Delete one of your events
    Remove { id: String },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
    /// Country id
    #[arg(long)]
    country: i64,
    /// Month number, 1 to 12
    #[arg(long)]
    month: i64,
    /// Day of the month, starting at 1
    #[arg(long)]
    day: i64,
    #[arg(long)]
    holiday: bool,
    /// Link to a page about the event
    #[arg(long)]
    source: Option<String>,
}

#[derive(Args)]
struct EditArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    country: Option<i64>,
    #[arg(long)]
    month: Option<i64>,
    #[arg(long)]
    day: Option<i64>,
    #[arg(long)]
    holiday: Option<bool>,
    #[arg(long)]
    source: Option<String>,
}

impl From<AddArgs> for EventInput {
    fn from(args: AddArgs) -> Self {
        Self {
            name: Some(args.name),
            description: args.description,
            country: Some(args.country),
            month: Some(args.month),
            day: Some(args.day),
            holiday: Some(args.holiday),
            source: args.source,
        }
    }
}

impl From<EditArgs> for EventInput {
    fn from(args: EditArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            country: args.country,
            month: args.month,
            day: args.day,
            holiday: args.holiday,
            source: args.source,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Initialize tracing
    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "holiday_calendar=info".into()),
        )
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .init();

    let today = chrono::Local::now().date_naive();
    let api = Arc::new(HttpCalendarApi::new(&config.api)?);
    let tokens = Arc::new(FileTokenStore::new(&config.session.token_path));
    tracing::debug!("Using calendar server at {}", config.api.base_url);

    let mut state = AppState::new(config, api, tokens, today);
    state.countries = CountryFilter::with_hidden(&cli.hide_country);
    state.load(today).await;

    match run(&mut state, cli.command).await {
        Ok(output) => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
            Ok(())
        }
        Err(e) => {
            for line in commands::error_lines(&e) {
                eprintln!("{}", line);
            }
            std::process::exit(1);
        }
    }
}

async fn run(state: &mut AppState, command: Commands) -> AppResult<String> {
    match command {
        Commands::Month { month } => commands::calendar::month(state, month),
        Commands::Day { month, day } => commands::calendar::day(state, month, day),
        Commands::Countries => Ok(commands::calendar::countries(state)),
        Commands::Show {
            id,
            x,
            y,
            width,
            height,
        } => commands::calendar::show(state, &id, x, y, Viewport { width, height }),
        Commands::Signup {
            email,
            username,
            password,
            confirm_password,
        } => {
            let form = SignupForm {
                email,
                username,
                password,
                confirm_password,
            };
            commands::auth::signup(state, form).await
        }
        Commands::Login { email, password } => {
            commands::auth::login(state, LoginForm { email, password }).await
        }
        Commands::Logout => commands::auth::logout(state),
        Commands::Whoami => Ok(commands::auth::whoami(state)),
        Commands::Add(args) => commands::events::add(state, args.into()).await,
        Commands::Edit { id, changes } => commands::events::edit(state, &id, changes.into()).await,
        Commands::Remove { id } => commands::events::remove(state, &id).await,
    }
}
