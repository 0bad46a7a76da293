use crate::cli::parser::{Cli, Commands, UserAction};
use crate::config::Config;
use crate::core::donations::DonationLogic;
use crate::core::registry::RegistryLogic;
use crate::core::sessions::SessionLogic;
use crate::core::waiver::{WaiverIntake, WaiverLogic, WaiverState};
use crate::errors::{AppError, AppResult};
use crate::models::session::Session;
use crate::models::user::{NewUser, User, UserPatch};
use crate::ui::messages::{field, header, info, success, warning};
use crate::utils::colors::{colorize_optional, colorize_status, colorize_waiver};
use crate::utils::date::parse_date;
use crate::utils::formatting::format_hours;
use crate::utils::table::Table;
use crate::utils::time::display_local;
use chrono::{NaiveDate, Utc};
use std::io::{self, IsTerminal, Write};

fn parse_dob(s: Option<&str>) -> AppResult<Option<NaiveDate>> {
    s.map(|d| parse_date(d).ok_or_else(|| AppError::InvalidDate(d.to_string())))
        .transpose()
}

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::User { action } = &cli.command else {
        return Ok(());
    };
    let pool = super::open_pool(cfg)?;
    let now = Utc::now();

    match action {
        UserAction::Register {
            name,
            email,
            phone,
            city,
            organization,
            profession,
            dob,
            allow_communication,
            parent_email,
            accept_waiver,
            guardian,
            guardian_present,
            donor,
            bags,
        } => {
            let ctx = super::desk_context(cli, cfg, &pool)?;
            let new = NewUser {
                name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
                city: city.clone(),
                organization: organization.clone(),
                profession: profession.clone(),
                date_of_birth: parse_dob(dob.as_deref())?,
                allow_communication: *allow_communication,
                parent_email: parent_email.clone(),
            };

            let user = if *donor {
                match bags {
                    Some(n) => {
                        let (donation, user) =
                            DonationLogic::register_donor_and_donate(&pool, &new, *n, now, &ctx)?;
                        success(format!(
                            "Donation of {} bag(s) recorded for {}",
                            donation.bag_count, user.name
                        ));
                        user
                    }
                    None => RegistryLogic::register_user(&pool, &new, None, now, &ctx)?,
                }
            } else {
                let intake = WaiverIntake {
                    accepted: *accept_waiver,
                    guardian_name: guardian.clone(),
                    guardian_present: *guardian_present,
                };
                RegistryLogic::register_user(&pool, &new, Some(&intake), now, &ctx)?
            };

            success(format!("Registered {} with id {}", user.name, user.id));
            if !user.waiver_signed {
                warning(format!(
                    "Waiver: {}. Complete it with `volunteerhub waiver sign {}` before check-in.",
                    WaiverState::of(&user).label(),
                    user.id
                ));
            }
        }

        UserAction::List {
            filter,
            communication,
        } => {
            let users = if *communication {
                RegistryLogic::communication_list(&pool)?
            } else {
                RegistryLogic::list_users(&pool, *filter, now)?
            };
            print_users(&users);
        }

        UserAction::Search { term } => {
            let users = RegistryLogic::find_users(&pool, term)?;
            print_users(&users);
        }

        UserAction::Show { id } => {
            let user = RegistryLogic::get_user(&pool, *id)?;
            print_user(&user, now.date_naive());

            let sessions = SessionLogic::user_sessions(&pool, *id)?;
            header("Sessions");
            if sessions.is_empty() {
                info("No sessions yet.");
            } else {
                print_sessions(&sessions);
            }
        }

        UserAction::Edit {
            id,
            name,
            email,
            phone,
            city,
            organization,
            profession,
            dob,
            allow_communication,
        } => {
            let ctx = super::staff_context(cli, cfg, &pool)?;
            let patch = UserPatch {
                name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
                city: city.clone(),
                organization: organization.clone(),
                profession: profession.clone(),
                date_of_birth: parse_dob(dob.as_deref())?,
                allow_communication: *allow_communication,
            };
            let user = RegistryLogic::update_user_info(&pool, *id, &patch, now, &ctx)?;
            success(format!("Updated user {} ({})", user.id, user.name));
        }

        UserAction::Delete { id, yes } => {
            let ctx = super::staff_context(cli, cfg, &pool)?;
            let user = RegistryLogic::get_user(&pool, *id)?;
            if !*yes && !confirm(&format!("Delete {} and all their history?", user.name))? {
                info("Nothing deleted.");
                return Ok(());
            }
            RegistryLogic::delete_user(&pool, *id, &ctx)?;
            success(format!("Deleted user {} ({})", user.id, user.name));
        }
    }

    Ok(())
}

/// `[y/N]` on a terminal; anything non-interactive counts as "no".
fn confirm(question: &str) -> AppResult<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }
    print!("{question} [y/N]: ");
    io::stdout().flush().ok();
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

pub(crate) fn print_users(users: &[User]) {
    if users.is_empty() {
        info("No users found.");
        return;
    }
    let mut table = Table::new([
        "ID", "Name", "Email", "Phone", "Profession", "Hours", "Bags", "Waiver", "Status",
    ]);
    for u in users {
        table.add_row(vec![
            u.id.to_string(),
            u.name.clone(),
            u.email.clone(),
            u.phone.clone(),
            colorize_optional(&u.profession),
            format_hours(u.total_hours),
            u.total_bags.to_string(),
            colorize_waiver(u.waiver_signed),
            colorize_status(u.is_checked_in),
        ]);
    }
    print!("{}", table.render());
}

fn print_user(u: &User, today: NaiveDate) {
    header(format!("User {}", u.id));
    field("Name", &u.name);
    field("Email", &u.email);
    field("Phone", &u.phone);
    field("City", colorize_optional(&u.city));
    field("Organization", colorize_optional(&u.organization));
    field("Profession", colorize_optional(&u.profession));
    field(
        "Age",
        u.age_on(today)
            .map(|a| a.to_string())
            .unwrap_or_else(|| colorize_optional("")),
    );
    if u.is_minor {
        field(
            "Guardian",
            colorize_optional(u.parent_guardian_name.as_deref().unwrap_or("")),
        );
    }
    field("Waiver", WaiverState::of(u).label());
    field("Total hours", format_hours(u.total_hours));
    field("Total bags", u.total_bags);
    field("Status", colorize_status(u.is_checked_in));
    if let Some(since) = u.last_check_in {
        field("Checked in at", display_local(&since));
    }
    field("Registered", display_local(&u.created_at));
    if WaiverLogic::gate_check_in(u).is_err() {
        warning("Check-in is blocked until the waiver is complete.");
    }
}

pub(crate) fn print_sessions(sessions: &[Session]) {
    let mut table = Table::new(["ID", "Check-in", "Check-out", "Hours", "Notes"]);
    for s in sessions {
        match s {
            Session::Active { check_in_time, .. } => table.add_row(vec![
                "-".into(),
                display_local(check_in_time),
                colorize_status(true),
                "-".into(),
                String::new(),
            ]),
            Session::Closed(c) => table.add_row(vec![
                c.id.to_string(),
                display_local(&c.check_in_time),
                display_local(&c.check_out_time),
                format_hours(c.hours_worked),
                c.notes.clone().unwrap_or_default(),
            ]),
        }
    }
    print!("{}", table.render());
}
