use crate::core::auth::MIN_PASSWORD_LEN;
use crate::models::staff::StaffRole;
use crate::models::user::UserListFilter;
use clap::{Parser, Subcommand};

/// Command-line interface for VolunteerHub
#[derive(Parser)]
#[command(
    name = "volunteerhub",
    version = env!("CARGO_PKG_VERSION"),
    about = "Volunteer and donor management: check-in/out, hours, waivers, analytics and CSV exports",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or a second site)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Staff username or e-mail for staff-only commands.
    /// The password is read from VOLUNTEERHUB_PASSWORD or prompted for.
    #[arg(global = true, long = "staff", value_name = "USER")]
    pub staff: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the configuration file and database
    Init,

    /// View, check or edit the configuration file
    Config {
        #[arg(long = "print", help = "Print the effective configuration")]
        print_config: bool,

        #[arg(long = "check", help = "List fields missing from the configuration file")]
        check: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(long = "editor", help = "Editor to use with --edit")]
        editor: Option<String>,
    },

    /// Database maintenance
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the audit trail
    Log {
        #[arg(long = "print", help = "Print rows from the audit log")]
        print: bool,

        #[arg(long = "limit", help = "Only the most recent N rows")]
        limit: Option<usize>,
    },

    /// Register, find and maintain volunteers and donors
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Check a volunteer in
    Checkin {
        user_id: i64,
    },

    /// Check a volunteer out; the session is rounded to the quarter hour
    Checkout {
        user_id: i64,
    },

    /// List volunteers currently on site
    Active,

    /// Record a donation
    Donate {
        user_id: i64,

        #[arg(long = "bags", help = "Number of bags donated (>= 1)")]
        bags: i64,
    },

    /// Session history and staff corrections
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Scheduled end-of-day checkout
    AutoCheckout {
        #[command(subcommand)]
        action: AutoCheckoutAction,
    },

    /// Dashboard statistics
    Stats {
        #[arg(
            long,
            value_name = "RANGE",
            help = "today, this_week, this_month, last_month, this_year, last_30_days, all, YYYY[-MM[-DD]] or FROM:TO"
        )]
        range: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD", requires = "to", conflicts_with = "range")]
        from: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD", requires = "from")]
        to: Option<String>,

        #[arg(long, help = "Print as JSON")]
        json: bool,
    },

    /// Export the filtered user list to CSV
    Export {
        #[arg(long, value_name = "DIR", conflicts_with = "file")]
        dir: Option<String>,

        #[arg(long, value_name = "FILE")]
        file: Option<String>,

        #[arg(long, value_name = "RANGE", help = "Date window for 'Hours in Period'")]
        range: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD", requires = "to", conflicts_with = "range")]
        from: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD", requires = "from")]
        to: Option<String>,

        #[arg(long)]
        profession: Option<String>,

        #[arg(long = "min-age")]
        min_age: Option<i32>,

        #[arg(long = "max-age")]
        max_age: Option<i32>,

        #[arg(long = "min-hours")]
        min_hours: Option<f64>,

        #[arg(long = "max-hours")]
        max_hours: Option<f64>,

        #[arg(long = "min-bags")]
        min_bags: Option<i64>,

        #[arg(long = "max-bags")]
        max_bags: Option<i64>,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Liability waivers
    Waiver {
        #[command(subcommand)]
        action: WaiverAction,
    },

    /// Staff accounts
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },

    /// List queued e-mails not yet relayed
    Outbox,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a new volunteer (or donor with --donor)
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: String,

        #[arg(long, default_value = "")]
        city: String,

        #[arg(long, default_value = "")]
        organization: String,

        #[arg(long, default_value = "")]
        profession: String,

        #[arg(long, value_name = "YYYY-MM-DD")]
        dob: Option<String>,

        #[arg(long = "allow-communication")]
        allow_communication: bool,

        #[arg(long = "parent-email")]
        parent_email: Option<String>,

        #[arg(
            long = "accept-waiver",
            help = "Adult acknowledges the waiver, or guardian pre-agrees for a minor"
        )]
        accept_waiver: bool,

        #[arg(long, help = "Parent/guardian name (required for minors)")]
        guardian: Option<String>,

        #[arg(long = "guardian-present", help = "Guardian is at the desk and signs now")]
        guardian_present: bool,

        #[arg(long, help = "Register as donor; the waiver is collected at first volunteer check-in")]
        donor: bool,

        #[arg(long, value_name = "N", requires = "donor", help = "Record a first donation of N bags")]
        bags: Option<i64>,
    },

    /// List users
    List {
        #[arg(long, value_enum, default_value = "all")]
        filter: UserListFilter,

        #[arg(long, help = "Only users who agreed to be contacted")]
        communication: bool,
    },

    /// Search by name, e-mail, phone or organization
    Search { term: String },

    /// Show one user with session history
    Show { id: i64 },

    /// Edit profile fields (staff)
    Edit {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        organization: Option<String>,

        #[arg(long)]
        profession: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD")]
        dob: Option<String>,

        #[arg(long = "allow-communication")]
        allow_communication: Option<bool>,
    },

    /// Delete a user with sessions, donations and waiver requests (staff)
    Delete {
        id: i64,

        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// A user's sessions, active one first
    List { user_id: i64 },

    /// Change a closed session's times (staff)
    Edit {
        session_id: i64,

        #[arg(long = "in", value_name = "TIMESTAMP")]
        check_in: String,

        #[arg(long = "out", value_name = "TIMESTAMP")]
        check_out: String,
    },

    /// Delete a closed session (staff)
    Delete { session_id: i64 },

    /// Move the start of a user's active session (staff)
    EditActive {
        user_id: i64,

        #[arg(long = "in", value_name = "TIMESTAMP")]
        check_in: String,
    },
}

#[derive(Subcommand)]
pub enum AutoCheckoutAction {
    /// Run now if office hours are over (--force ignores the schedule)
    Run {
        #[arg(long)]
        force: bool,
    },

    /// Show the schedule
    Show,

    /// Enable auto-checkout (staff)
    Enable,

    /// Disable auto-checkout (staff)
    Disable,

    /// Set one weekday's office hours (staff)
    SetDay {
        /// monday..sunday (or mon..sun)
        day: String,

        #[arg(long, value_name = "HH:MM")]
        start: String,

        #[arg(long, value_name = "HH:MM")]
        end: String,

        #[arg(long, help = "Keep the hours but disable the day")]
        off: bool,
    },

    /// Set the IANA timezone office hours are written in (staff)
    SetTimezone {
        /// e.g. America/Chicago, Europe/Rome, UTC
        timezone: String,
    },
}

#[derive(Subcommand)]
pub enum WaiverAction {
    /// Waiver state of a user and pending guardian links
    Status { user_id: i64 },

    /// Sign in person at the desk
    Sign {
        user_id: i64,

        #[arg(long, help = "Typed name of the person signing")]
        signer: String,

        #[arg(long, help = "Name of the present parent/guardian (minors)")]
        guardian: Option<String>,
    },

    /// E-mail a signing link to the guardian
    Request {
        user_id: i64,

        #[arg(long = "parent-email")]
        parent_email: Option<String>,
    },

    /// What the public link shows for a token
    Show { token: String },

    /// Sign through a guardian link
    Complete {
        token: String,

        #[arg(long, help = "Guardian's typed full name")]
        signature: String,
    },
}

#[derive(Subcommand)]
pub enum StaffAction {
    /// Create a staff account (the first one needs no --staff)
    Create {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        #[arg(long, value_enum, default_value = "staff")]
        role: StaffRole,
    },

    /// Verify the --staff credentials
    Login,

    /// Change the --staff password
    #[command(
        about = format!("Change the --staff password (min {MIN_PASSWORD_LEN} chars; VOLUNTEERHUB_NEW_PASSWORD or prompt)")
    )]
    Passwd,
}
