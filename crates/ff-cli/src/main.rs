use anyhow::Result;
use clap::{Parser, Subcommand};
use ff_schemas::{ItemRequest, OrderStatus, Role, Vehicle};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "ff")]
#[command(about = "FoodFleet command line", long_about = None)]
struct Cli {
    /// Bearer token from `ff auth login`.
    #[arg(long, env = "FF_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Layered config inspection
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },

    /// Sign up, sign in, inspect the current session
    Auth {
        #[command(subcommand)]
        cmd: AuthCmd,
    },

    /// Catalogue
    Product {
        #[command(subcommand)]
        cmd: ProductCmd,
    },

    /// Customer orders and kitchen actions
    Order {
        #[command(subcommand)]
        cmd: OrderCmd,
    },

    /// Accounts
    User {
        #[command(subcommand)]
        cmd: UserCmd,
    },

    /// Driver actions
    Delivery {
        #[command(subcommand)]
        cmd: DeliveryCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    /// Apply embedded SQL migrations.
    Migrate,
}

#[derive(Subcommand)]
enum ConfigCmd {
    /// Compute layered config hash + print canonical JSON
    Hash {
        /// Paths in merge order (base -> local -> ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Validate the typed config and list keys a surface does not read
    Check {
        #[arg(required = true)]
        paths: Vec<String>,

        /// daemon | cli | maintenance
        #[arg(long, default_value = "daemon")]
        surface: String,

        /// Fail when unused keys exist
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum AuthCmd {
    /// Create a customer account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long, env = "FF_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
    },

    /// Print a bearer token for later commands (export it as FF_TOKEN)
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "FF_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the account behind --token
    Whoami,
}

#[derive(Subcommand)]
enum ProductCmd {
    /// Available products; --all (admin) includes hidden ones
    List {
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    Show {
        id: Uuid,
    },
    Add {
        #[arg(long)]
        name: String,
        /// Decimal amount, e.g. 8.50
        #[arg(long, value_parser = commands::parse_price)]
        price: i64,
        #[arg(long, default_value_t = 0)]
        stock: i32,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "type", default_value = "")]
        product_type: String,
        /// Create hidden from the public catalogue
        #[arg(long, default_value_t = false)]
        unavailable: bool,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = commands::parse_price)]
        price: Option<i64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "type")]
        product_type: Option<String>,
        #[arg(long)]
        available: Option<bool>,
    },
    /// Adjust stock by a signed delta
    Restock {
        id: Uuid,
        #[arg(long, allow_hyphen_values = true)]
        delta: i32,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum OrderCmd {
    Place {
        #[arg(long)]
        street: String,
        #[arg(long)]
        postal_code: String,
        #[arg(long)]
        city: String,
        /// <product_id>[:<quantity>], repeatable
        #[arg(long = "item", required = true, value_parser = commands::parse_item)]
        items: Vec<ItemRequest>,
    },
    AddItem {
        order_id: Uuid,
        #[arg(long)]
        product: Uuid,
        #[arg(long, default_value_t = 1)]
        qty: i32,
    },
    RemoveItem {
        order_id: Uuid,
        #[arg(long)]
        product: Uuid,
        #[arg(long, default_value_t = 1)]
        qty: i32,
    },
    Cancel {
        order_id: Uuid,
    },
    /// Your orders; --status (admin) filters all orders
    List {
        #[arg(long, value_parser = commands::parse_status)]
        status: Option<OrderStatus>,
    },
    Show {
        order_id: Uuid,
    },
    /// Kitchen is done (admin)
    Ready {
        order_id: Uuid,
    },
}

#[derive(Subcommand)]
enum UserCmd {
    List {
        #[arg(long, value_parser = commands::parse_role)]
        role: Option<Role>,
    },
    /// Create an account of any role (admin)
    Create {
        #[arg(long, value_parser = commands::parse_role)]
        role: Role,
        #[arg(long)]
        username: String,
        #[arg(long, env = "FF_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_parser = commands::parse_vehicle)]
        vehicle: Option<Vehicle>,
    },
    Delete {
        user_id: Uuid,
    },
    /// Change your own profile
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Change your own password
    Password {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },
}

#[derive(Subcommand)]
enum DeliveryCmd {
    /// Orders waiting for a driver
    Available,
    Take {
        order_id: Uuid,
    },
    Deliver {
        order_id: Uuid,
    },
    /// Route from the restaurant to the customer
    Itinerary {
        order_id: Uuid,
    },
    /// Show or change your vehicle
    Vehicle {
        #[arg(long, value_parser = commands::parse_vehicle)]
        set: Option<Vehicle>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    let token = cli.token;

    match cli.cmd {
        Commands::Db { cmd } => match cmd {
            DbCmd::Status => commands::maintenance::db_status().await?,
            DbCmd::Migrate => commands::maintenance::db_migrate().await?,
        },

        Commands::Config { cmd } => match cmd {
            ConfigCmd::Hash { paths } => commands::maintenance::config_hash(&paths)?,
            ConfigCmd::Check {
                paths,
                surface,
                strict,
            } => commands::maintenance::config_check(&paths, &surface, strict)?,
        },

        Commands::Auth { cmd } => match cmd {
            AuthCmd::Register {
                username,
                password,
                first_name,
                last_name,
                email,
            } => {
                commands::account::register(ff_service::RegisterRequest {
                    username,
                    password,
                    first_name,
                    last_name,
                    email,
                })
                .await?
            }
            AuthCmd::Login { username, password } => {
                commands::account::login(&username, &password).await?
            }
            AuthCmd::Whoami => commands::account::whoami(token.as_deref()).await?,
        },

        Commands::Product { cmd } => {
            let t = token.as_deref();
            match cmd {
                ProductCmd::List { all } => commands::shop::product_list(t, all).await?,
                ProductCmd::Show { id } => commands::shop::product_show(id).await?,
                ProductCmd::Add {
                    name,
                    price,
                    stock,
                    description,
                    product_type,
                    unavailable,
                } => {
                    commands::shop::product_add(
                        t,
                        ff_service::ProductInput {
                            name,
                            description,
                            product_type,
                            price_cents: price,
                            stock,
                            is_available: !unavailable,
                        },
                    )
                    .await?
                }
                ProductCmd::Update {
                    id,
                    name,
                    price,
                    description,
                    product_type,
                    available,
                } => {
                    commands::shop::product_update(
                        t,
                        id,
                        ff_service::ProductUpdate {
                            name,
                            description,
                            product_type,
                            price_cents: price,
                            is_available: available,
                        },
                    )
                    .await?
                }
                ProductCmd::Restock { id, delta } => {
                    commands::shop::product_restock(t, id, delta).await?
                }
                ProductCmd::Delete { id } => commands::shop::product_delete(t, id).await?,
            }
        }

        Commands::Order { cmd } => {
            let t = token.as_deref();
            match cmd {
                OrderCmd::Place {
                    street,
                    postal_code,
                    city,
                    items,
                } => {
                    commands::shop::order_place(
                        t,
                        ff_service::PlaceOrderRequest {
                            address: ff_schemas::AddressInput {
                                street,
                                postal_code,
                                city,
                            },
                            items,
                        },
                    )
                    .await?
                }
                OrderCmd::AddItem {
                    order_id,
                    product,
                    qty,
                } => commands::shop::order_add_item(t, order_id, product, qty).await?,
                OrderCmd::RemoveItem {
                    order_id,
                    product,
                    qty,
                } => commands::shop::order_remove_item(t, order_id, product, qty).await?,
                OrderCmd::Cancel { order_id } => commands::shop::order_cancel(t, order_id).await?,
                OrderCmd::List { status } => commands::shop::order_list(t, status).await?,
                OrderCmd::Show { order_id } => commands::shop::order_show(t, order_id).await?,
                OrderCmd::Ready { order_id } => commands::shop::order_ready(t, order_id).await?,
            }
        }

        Commands::User { cmd } => {
            let t = token.as_deref();
            match cmd {
                UserCmd::List { role } => commands::account::user_list(t, role).await?,
                UserCmd::Create {
                    role,
                    username,
                    password,
                    first_name,
                    last_name,
                    email,
                    vehicle,
                } => {
                    commands::account::user_create(
                        t,
                        ff_service::NewUserRequest {
                            role,
                            username,
                            password,
                            first_name,
                            last_name,
                            email,
                            vehicle,
                        },
                    )
                    .await?
                }
                UserCmd::Delete { user_id } => commands::account::user_delete(t, user_id).await?,
                UserCmd::Update {
                    first_name,
                    last_name,
                    email,
                } => {
                    commands::account::user_update(
                        t,
                        ff_service::ProfileUpdate {
                            first_name,
                            last_name,
                            email,
                        },
                    )
                    .await?
                }
                UserCmd::Password { old, new } => {
                    commands::account::user_password(t, &old, &new).await?
                }
            }
        }

        Commands::Delivery { cmd } => {
            let t = token.as_deref();
            match cmd {
                DeliveryCmd::Available => commands::delivery::available(t).await?,
                DeliveryCmd::Take { order_id } => commands::delivery::take(t, order_id).await?,
                DeliveryCmd::Deliver { order_id } => {
                    commands::delivery::deliver(t, order_id).await?
                }
                DeliveryCmd::Itinerary { order_id } => {
                    commands::delivery::itinerary(t, order_id).await?
                }
                DeliveryCmd::Vehicle { set } => commands::delivery::vehicle(t, set).await?,
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays `key=value`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
