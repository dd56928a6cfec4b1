//! Foodcourt CLI - browse the menu, manage the cart, and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password from --password or FOODCOURT_PASSWORD)
//! fc-cli login -u mario
//!
//! # Browse and fill the cart
//! fc-cli products --category pizza --sort price
//! fc-cli cart add 3 --size large --crust thin --topping mushrooms
//!
//! # Place the order with the default address
//! fc-cli checkout --notes "Ring twice"
//! ```
//!
//! # Environment Variables
//!
//! - `FOODCOURT_API_URL` - Backend base URL
//! - `FOODCOURT_DATA_DIR` - Directory for the local state files
//! - `SENTRY_DSN` - Error reporting, honoured unless consent was declined

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Args, Parser, Subcommand, ValueEnum};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use foodcourt_client::storage::{self, FileStore, LocalCacheExt};
use foodcourt_client::{AppState, ClientConfig};
use foodcourt_core::{
    AddressId, Crust, Money, ProductCategory, ProductFilter, ProductId, ProductSortKey, Size,
};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "fc-cli")]
#[command(author, version, about = "Foodcourt ordering client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to an existing account
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "FOODCOURT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in
    Signup {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "FOODCOURT_PASSWORD", hide_env_values = true)]
        password: String,

        /// Repeat the password
        #[arg(long)]
        confirm: String,
    },
    /// Log out
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List the menu
    Products {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Show a product and record the view
    Product { id: ProductId },
    /// List the reviews of a product
    Reviews { id: ProductId },
    /// Review a product
    Review {
        id: ProductId,

        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,

        #[arg(short, long, default_value = "")]
        comment: String,
    },
    /// Add or remove a favorite
    Favorite { id: ProductId },
    /// List favorites
    Favorites,
    /// List recently viewed products
    Recent {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order with the cart contents
    Checkout {
        /// Saved address to deliver to (default address otherwise)
        #[arg(short, long)]
        address: Option<AddressId>,

        #[arg(short, long, default_value = "")]
        notes: String,
    },
    /// List past orders
    Orders,
    /// Loyalty points, rewards, and achievements
    Loyalty {
        #[command(subcommand)]
        action: Option<LoyaltyAction>,
    },
    /// Manage shopping lists
    Lists {
        #[command(subcommand)]
        action: Option<ListAction>,
    },
    /// Suggest products
    Recommend {
        #[arg(short, long, default_value_t = foodcourt_core::recommend::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Send a message to the restaurant
    Contact {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        subject: String,

        #[arg(short, long)]
        message: String,

        #[arg(long)]
        phone: Option<String>,
    },
    /// List users (admin only)
    Users,
    /// Accept or decline error reporting
    Consent {
        #[arg(value_enum)]
        choice: ConsentChoice,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Text to look for in names and descriptions
    #[arg(short, long)]
    query: Option<String>,

    /// Only show these categories (pizza, burger, ...), repeatable
    #[arg(short, long = "category")]
    categories: Vec<ProductCategory>,

    /// Lowest price in euros
    #[arg(long)]
    min_price: Option<Money>,

    /// Highest price in euros
    #[arg(long)]
    max_price: Option<Money>,

    /// Lowest average rating
    #[arg(long)]
    min_rating: Option<f64>,

    /// Hide products that cannot be ordered
    #[arg(long)]
    available: bool,

    /// Sort by name, price, or rating
    #[arg(short, long)]
    sort: Option<ProductSortKey>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,
}

impl From<SearchArgs> for ProductFilter {
    fn from(args: SearchArgs) -> Self {
        Self {
            query: args.query,
            categories: args.categories,
            min_price: args.min_price,
            max_price: args.max_price,
            min_rating: args.min_rating,
            available_only: args.available,
            sort_key: args.sort,
            reverse: args.desc,
        }
    }
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        id: ProductId,

        #[command(flatten)]
        customize: CustomizeArgs,
    },
    /// Remove a line (1-based position)
    Remove { line: usize },
    /// Set the quantity of a line; 0 or less removes it
    Set {
        line: usize,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Args)]
struct CustomizeArgs {
    #[arg(long, value_enum)]
    size: Option<SizeArg>,

    #[arg(long, value_enum)]
    crust: Option<CrustArg>,

    /// Topping id, repeatable
    #[arg(long = "topping")]
    toppings: Vec<String>,

    /// Extra id, repeatable
    #[arg(long = "extra")]
    extras: Vec<String>,

    #[arg(long)]
    instructions: Option<String>,
}

impl CustomizeArgs {
    const fn is_empty(&self) -> bool {
        self.size.is_none()
            && self.crust.is_none()
            && self.toppings.is_empty()
            && self.extras.is_empty()
            && self.instructions.is_none()
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SizeArg {
    Small,
    Medium,
    Large,
    Xlarge,
}

impl From<SizeArg> for Size {
    fn from(size: SizeArg) -> Self {
        match size {
            SizeArg::Small => Self::Small,
            SizeArg::Medium => Self::Medium,
            SizeArg::Large => Self::Large,
            SizeArg::Xlarge => Self::ExtraLarge,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CrustArg {
    Classic,
    Thin,
    Thick,
    Stuffed,
}

impl From<CrustArg> for Crust {
    fn from(crust: CrustArg) -> Self {
        match crust {
            CrustArg::Classic => Self::Classic,
            CrustArg::Thin => Self::Thin,
            CrustArg::Thick => Self::Thick,
            CrustArg::Stuffed => Self::Stuffed,
        }
    }
}

#[derive(Subcommand)]
enum LoyaltyAction {
    /// Show points, tier, rewards, and achievements
    Show,
    /// Redeem a reward
    Claim { reward: String },
}

#[derive(Subcommand)]
enum ListAction {
    /// Show all lists, or the items of one
    Show { list: Option<String> },
    /// Create a list
    Create { name: String },
    /// Delete a list
    Delete { list: String },
    /// Make a list the current one
    Select { list: String },
    /// Add a product to a list
    Add {
        list: String,
        product: ProductId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove an item (1-based position)
    Remove { list: String, item: usize },
    /// Set the quantity of an item; 0 removes it
    Set { list: String, item: usize, quantity: u32 },
    /// Tick or untick an item
    Toggle { list: String, item: usize },
    /// Drop ticked items
    Tidy { list: String },
    /// Put the unticked items into the cart
    ToCart { list: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConsentChoice {
    Accept,
    Decline,
}

/// Initialize Sentry unless the user declined error reporting.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let consent = FileStore::new(&config.data_dir)
        .load::<bool>(storage::COOKIE_CONSENT)
        .ok()
        .flatten();
    if consent == Some(false) {
        return None;
    }

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry before the subscriber so the layer has a client to report to
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "foodcourt_client=info,foodcourt_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        if e.is_server_error() {
            tracing::error!("Command failed: {e}");
        } else {
            tracing::info!("Command failed: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CommandError> {
    let mut state = AppState::open(config).await?;
    let result = dispatch(&mut state, cli.command).await;
    // Persist even after a failure: a failed token refresh ends the session.
    state.save().await?;
    result
}

async fn dispatch(state: &mut AppState, command: Commands) -> Result<(), CommandError> {
    match command {
        Commands::Login { username, password } => {
            commands::account::login(state, &username, &password).await?;
        }
        Commands::Signup {
            username,
            email,
            password,
            confirm,
        } => commands::account::signup(state, username, email, password, confirm).await?,
        Commands::Logout => commands::account::logout(state).await?,
        Commands::Whoami => commands::account::whoami(state),
        Commands::Products { search } => commands::catalog::products(state, &search.into()).await?,
        Commands::Product { id } => commands::catalog::product(state, id).await?,
        Commands::Reviews { id } => commands::catalog::reviews(state, id).await?,
        Commands::Review {
            id,
            rating,
            comment,
        } => commands::catalog::review(state, id, rating, comment).await?,
        Commands::Favorite { id } => commands::catalog::favorite(state, id).await?,
        Commands::Favorites => commands::catalog::favorites(state),
        Commands::Recent { limit } => commands::catalog::recent(state, limit),
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state),
            CartAction::Add { id, customize } => commands::cart::add(state, id, customize).await?,
            CartAction::Remove { line } => commands::cart::remove(state, line)?,
            CartAction::Set { line, quantity } => commands::cart::set(state, line, quantity)?,
            CartAction::Clear => commands::cart::clear(state),
        },
        Commands::Checkout { address, notes } => {
            commands::cart::checkout(state, address, &notes).await?;
        }
        Commands::Orders => commands::orders::list(state).await?,
        Commands::Loyalty { action } => match action.unwrap_or(LoyaltyAction::Show) {
            LoyaltyAction::Show => commands::loyalty::show(state)?,
            LoyaltyAction::Claim { reward } => commands::loyalty::claim(state, &reward)?,
        },
        Commands::Lists { action } => match action.unwrap_or(ListAction::Show { list: None }) {
            ListAction::Show { list } => commands::lists::show(state, list.as_deref())?,
            ListAction::Create { name } => commands::lists::create(state, &name)?,
            ListAction::Delete { list } => commands::lists::delete(state, &list)?,
            ListAction::Select { list } => commands::lists::select(state, &list)?,
            ListAction::Add {
                list,
                product,
                quantity,
            } => commands::lists::add(state, &list, product, quantity).await?,
            ListAction::Remove { list, item } => commands::lists::remove(state, &list, item)?,
            ListAction::Set {
                list,
                item,
                quantity,
            } => commands::lists::set(state, &list, item, quantity)?,
            ListAction::Toggle { list, item } => commands::lists::toggle(state, &list, item)?,
            ListAction::Tidy { list } => commands::lists::tidy(state, &list)?,
            ListAction::ToCart { list } => commands::lists::to_cart(state, &list)?,
        },
        Commands::Recommend { limit } => commands::catalog::recommend(state, limit).await?,
        Commands::Contact {
            name,
            email,
            subject,
            message,
            phone,
        } => {
            commands::account::contact(state, name, email, subject, message, phone.as_deref())
                .await?;
        }
        Commands::Users => commands::account::users(state).await?,
        Commands::Consent { choice } => {
            commands::account::consent(state, matches!(choice, ConsentChoice::Accept));
        }
    }
    Ok(())
}
