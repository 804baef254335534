//! Subify command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse and search the catalog
//! subify products --limit 20
//! subify search "phone"
//! subify product 1
//!
//! # Local cart
//! subify cart add 1
//! subify cart show
//! subify cart remove 0
//!
//! # Checkout, using a typed address or a reverse-geocoded position
//! subify checkout --address "221B Baker Street" --payment upi
//! subify checkout --lat 12.97 --lon 77.59
//!
//! # Account
//! subify whoami
//! subify profile upload-picture ./me.png
//! subify logout
//! ```
//!
//! Every invocation bootstraps the session first, the way the storefront
//! does on start, and prints the notifications recorded while it ran.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use subify_core::{PaymentMode, ProductId};
use subify_storefront::config::StorefrontConfig;
use subify_storefront::{AppError, AppState};
use tracing_subscriber::Layer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use output::Output;

#[derive(Parser)]
#[command(name = "subify")]
#[command(author, version, about = "Subify storefront")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who is signed in and the cart badge
    Whoami,
    /// List catalog products
    Products {
        /// Page size
        #[arg(short, long, default_value_t = subify_storefront::catalog::DEFAULT_PAGE_SIZE)]
        limit: u32,

        /// Number of products to skip
        #[arg(short, long, default_value_t = 0)]
        skip: u32,
    },
    /// Search product titles
    Search {
        /// Text to look for in product titles
        text: String,

        /// Number of catalog products to search through
        #[arg(short, long, default_value_t = subify_storefront::catalog::DEFAULT_PAGE_SIZE)]
        limit: u32,
    },
    /// Show one product
    Product {
        /// Catalog product id
        id: ProductId,
    },
    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the cart kept by the Subify API
    RemoteCart {
        #[command(subcommand)]
        action: RemoteCartAction,
    },
    /// Place an order for the local cart
    Checkout {
        /// Delivery address
        #[arg(short, long, conflicts_with_all = ["lat", "lon"])]
        address: Option<String>,

        /// Latitude to reverse-geocode into the delivery address
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude to reverse-geocode into the delivery address
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Payment mode (`cod`, `upi`, `card`, `netbanking`)
        #[arg(short, long, default_value_t = PaymentMode::default())]
        payment: PaymentMode,
    },
    /// Manage the signed-in user's profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Sign out
    Logout,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a catalog product to the cart
    Add {
        /// Catalog product id
        product_id: ProductId,
    },
    /// Remove the line at a position (as listed by `cart show`)
    Remove {
        /// Zero-based line position
        index: usize,
    },
}

#[derive(Subcommand)]
enum RemoteCartAction {
    /// Show the server-side cart
    Show,
    /// Add a catalog product to the server-side cart
    Add {
        /// Catalog product id
        product_id: ProductId,
    },
    /// Remove a product from the server-side cart
    Remove {
        /// Catalog product id
        product_id: ProductId,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show profile details
    Show,
    /// Upload a new display picture
    UploadPicture {
        /// Image file
        path: PathBuf,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

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

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "subify_storefront=warn,subify_cli=info".into());

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let out = Output::new(cli.json);

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            out.failure(&AppError::from(e));
            return ExitCode::FAILURE;
        }
    };

    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.log_json);

    match run(cli.command, config, &out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            out.failure(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: StorefrontConfig, out: &Output) -> Result<(), AppError> {
    let state = AppState::new(config).await?;
    state.context().bootstrap().await;

    let result = dispatch(command, &state, out).await;

    // Writes scheduled by cart mutations must land before the process exits.
    state.context().flush().await;
    out.notifications(&state.notifications().drain());
    result
}

async fn dispatch(command: Commands, state: &AppState, out: &Output) -> Result<(), AppError> {
    match command {
        Commands::Whoami => commands::account::whoami(state, out).await,
        Commands::Products { limit, skip } => {
            commands::catalog::products(state, out, limit, skip).await
        }
        Commands::Search { text, limit } => commands::catalog::search(state, out, &text, limit).await,
        Commands::Product { id } => commands::catalog::product(state, out, id).await,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state, out).await,
            CartAction::Add { product_id } => commands::cart::add(state, out, product_id).await,
            CartAction::Remove { index } => commands::cart::remove(state, out, index).await,
        },
        Commands::RemoteCart { action } => match action {
            RemoteCartAction::Show => commands::remote_cart::show(state, out).await,
            RemoteCartAction::Add { product_id } => {
                commands::remote_cart::add(state, out, product_id).await
            }
            RemoteCartAction::Remove { product_id } => {
                commands::remote_cart::remove(state, out, product_id).await
            }
        },
        Commands::Checkout {
            address,
            lat,
            lon,
            payment,
        } => {
            let destination = match (address, lat, lon) {
                (Some(address), _, _) => commands::checkout::Destination::Address(address),
                (None, Some(lat), Some(lon)) => commands::checkout::Destination::Locate { lat, lon },
                _ => {
                    return Err(AppError::BadRequest(
                        "pass --address, or --lat and --lon".to_string(),
                    ));
                }
            };
            commands::checkout::place_order(state, out, destination, payment).await
        }
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::account::profile(state, out).await,
            ProfileAction::UploadPicture { path } => {
                commands::account::upload_picture(state, out, &path).await
            }
        },
        Commands::Logout => commands::account::logout(state, out).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_checkout_args() {
        let cli = Cli::try_parse_from([
            "subify", "checkout", "--lat", "-33.86", "--lon", "151.2", "--payment", "upi",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        match cli.command {
            Commands::Checkout {
                address,
                lat,
                lon,
                payment,
            } => {
                assert!(address.is_none());
                assert_eq!(lat, Some(-33.86));
                assert_eq!(lon, Some(151.2));
                assert_eq!(payment, PaymentMode::Upi);
            }
            _ => panic!("expected checkout"),
        }
    }

    #[test]
    fn test_checkout_rejects_address_with_position() {
        assert!(
            Cli::try_parse_from(["subify", "checkout", "--address", "x", "--lat", "1", "--lon", "2"])
                .is_err()
        );
    }

    #[test]
    fn test_cart_remove_index() {
        let cli = Cli::try_parse_from(["subify", "--json", "cart", "remove", "3"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Cart {
                action: CartAction::Remove { index: 3 }
            }
        ));
    }
}
