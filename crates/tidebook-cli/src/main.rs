//! tidebook — the booking desk CLI.
//!
//! Wires the state store, identity, and the admission core together:
//!
//! ```text
//! tidebook operator seed
//! tidebook user seed
//! tidebook admit --people 4 --token <session>
//! tidebook summary
//! ```
//!
//! The service's reference time zone is the host's local offset,
//! captured once at startup and passed down explicitly.

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tidebook_state::{Role, StateStore};

mod commands;

#[derive(Parser)]
#[command(
    name = "tidebook",
    about = "Tidebook — least-loaded tour booking desk",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Data directory for the state database.
    #[arg(long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Admit a group booking, auto-assigning the least-loaded operator.
    Admit {
        /// People in the group.
        #[arg(long)]
        people: f64,
        /// Session token of the seller recording the sale.
        #[arg(long)]
        token: Option<String>,
        /// Sales channel (direct, online, hotel, agency, ...).
        #[arg(long)]
        kind: Option<String>,
        /// Departure time, HH:MM.
        #[arg(long)]
        departure: Option<String>,
    },
    /// Book a group with a specific operator (capacity still enforced).
    Book {
        /// Operator id, e.g. op-1.
        #[arg(long)]
        operator: String,
        #[arg(long)]
        people: f64,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        departure: Option<String>,
    },
    /// Manage tour operators.
    Operator {
        #[command(subcommand)]
        action: OperatorAction,
    },
    /// List a day's reservations.
    Reservations {
        /// Date to list, YYYY-MM-DD (default: today).
        #[arg(long)]
        date: Option<String>,
    },
    /// Today's per-operator load, slack, and utilization.
    Summary,
    /// Manage user accounts and sessions.
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Generate random bookings through the real admission path.
    Simulate {
        /// Number of bookings to attempt.
        #[arg(long, default_value = "1")]
        count: u32,
    },
}

#[derive(Subcommand)]
enum OperatorAction {
    /// Register a new operator.
    Add {
        #[arg(long)]
        name: String,
        /// Total headcount servable per day.
        #[arg(long)]
        capacity: u32,
        /// Boats as "Name:capacity", repeatable.
        #[arg(long = "boat", required = true)]
        boats: Vec<String>,
        #[arg(long, default_value = "0")]
        staff: u32,
        /// Departure schedules, HH:MM, repeatable.
        #[arg(long = "schedule")]
        schedules: Vec<String>,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        specialty: String,
    },
    /// List operators.
    List,
    /// Delete an operator and all of its reservations.
    Remove {
        #[arg(long)]
        id: String,
    },
    /// Load operators from a TOML seed file (default: the demo fleet).
    Seed {
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Install the demo accounts.
    Seed,
    /// Create an account and print its session token.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum)]
        role: RoleArg,
    },
    /// Sign in and print a session token.
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Require the account to have this role.
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
    },
    /// Revoke a session token.
    Signout {
        #[arg(long)]
        token: String,
    },
    /// Change an account's role.
    SetRole {
        #[arg(long)]
        email: String,
        #[arg(long, value_enum)]
        role: RoleArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    Seller,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Role::Admin,
            RoleArg::Seller => Role::Seller,
        }
    }
}

/// Default log filter: info for the binary and every tidebook library
/// target, overridable through `RUST_LOG`.
fn log_filter() -> anyhow::Result<tracing_subscriber::EnvFilter> {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for target in ["tidebook", "tidebook_core", "tidebook_state", "tidebook_auth"] {
        filter = filter.add_directive(format!("{target}=info").parse()?);
    }
    Ok(filter)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter()?).init();

    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.data_dir)?;
    let store = StateStore::open(&cli.data_dir.join("tidebook.redb"))?;
    let offset = *Local::now().offset();

    match cli.command {
        Commands::Admit {
            people,
            token,
            kind,
            departure,
        } => commands::admit::admit(&store, offset, people, token.as_deref(), kind, departure),
        Commands::Book {
            operator,
            people,
            token,
            kind,
            departure,
        } => commands::admit::book(
            &store,
            offset,
            &operator,
            people,
            token.as_deref(),
            kind,
            departure,
        ),
        Commands::Operator { action } => match action {
            OperatorAction::Add {
                name,
                capacity,
                boats,
                staff,
                schedules,
                phone,
                email,
                address,
                specialty,
            } => commands::operators::add(
                &store, &name, capacity, &boats, staff, schedules, phone, email, address,
                specialty,
            ),
            OperatorAction::List => commands::operators::list(&store),
            OperatorAction::Remove { id } => commands::operators::remove(&store, &id),
            OperatorAction::Seed { file } => {
                commands::operators::seed(&store, file.as_deref())
            }
        },
        Commands::Reservations { date } => {
            commands::report::reservations(&store, offset, date.as_deref())
        }
        Commands::Summary => commands::report::summary(&store, offset),
        Commands::User { action } => match action {
            UserAction::Seed => commands::users::seed(&store),
            UserAction::Signup {
                email,
                password,
                role,
            } => commands::users::signup(&store, &email, &password, role.into()),
            UserAction::Signin {
                email,
                password,
                role,
            } => commands::users::signin(&store, &email, &password, role.map(Into::into)),
            UserAction::Signout { token } => commands::users::signout(&store, &token),
            UserAction::SetRole { email, role } => {
                commands::users::set_role(&store, &email, role.into())
            }
        },
        Commands::Simulate { count } => commands::simulate::simulate(&store, offset, count),
    }
}
