use crate::cli::parser::{Cli, Commands, StaffAction};
use crate::config::Config;
use crate::core::auth::{AuthLogic, NewStaff};
use crate::errors::AppResult;
use crate::mail::OutboxMailer;
use crate::ui::messages::{field, success, warning};
use chrono::Utc;

const NEW_PASSWORD_ENV: &str = "VOLUNTEERHUB_NEW_PASSWORD";

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::Staff { action } = &cli.command else {
        return Ok(());
    };
    let pool = super::open_pool(cfg)?;

    match action {
        StaffAction::Create {
            username,
            email,
            name,
            role,
        } => {
            // without --staff only the first account of a fresh install succeeds
            let ctx = super::desk_context(cli, cfg, &pool)?;
            let mailer = OutboxMailer::new(&pool.conn, cfg.mail_from.clone());
            let created = AuthLogic::create_staff_account(
                &pool,
                &mailer,
                &ctx,
                &NewStaff {
                    username: username.clone(),
                    email: email.clone(),
                    display_name: name.clone(),
                    role: *role,
                },
                &cfg.organization_name,
                Utc::now(),
            )?;
            success(format!(
                "Created {} account '{}'",
                created.identity.role.to_db_str(),
                created.identity.username
            ));
            field("Temporary password", &created.temporary_password);
            warning("The password must be changed at first login (`staff passwd`).");
        }

        StaffAction::Login => {
            let ctx = super::staff_context(cli, cfg, &pool)?;
            if let Some(me) = ctx.identity() {
                success(format!(
                    "Signed in as {} ({})",
                    me.display_name,
                    me.role.to_db_str()
                ));
                if me.requires_password_change {
                    warning("First login: please change your password with `staff passwd`.");
                }
            }
        }

        StaffAction::Passwd => {
            let ctx = super::staff_context(cli, cfg, &pool)?;
            let new_password = super::read_secret(NEW_PASSWORD_ENV, "New password: ")?;
            let me = AuthLogic::change_password(&pool, &ctx, &new_password)?;
            success(format!("Password changed for {}", me.username));
        }
    }

    Ok(())
}
