use crate::cli::parser::{Cli, Commands, WaiverAction};
use crate::config::Config;
use crate::core::registry::RegistryLogic;
use crate::core::waiver::{WaiverLink, WaiverLogic, WaiverState, waiver_link};
use crate::errors::AppResult;
use crate::mail::OutboxMailer;
use crate::ui::messages::{field, header, info, success, warning};
use crate::utils::time::display_local;
use chrono::Utc;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::Waiver { action } = &cli.command else {
        return Ok(());
    };
    let pool = super::open_pool(cfg)?;
    let now = Utc::now();

    match action {
        WaiverAction::Status { user_id } => {
            let user = RegistryLogic::get_user(&pool, *user_id)?;
            header(format!("Waiver of {}", user.name));
            field("State", WaiverState::of(&user).label());
            if let Some(at) = user.waiver_signed_at {
                field("Signed at", display_local(&at));
            }
            for r in WaiverLogic::pending_requests(&pool, *user_id)? {
                let state = if r.is_usable(now) { "pending" } else { "expired" };
                field(
                    "Guardian link",
                    format!(
                        "{} to {} ({state}, expires {})",
                        waiver_link(&cfg.public_base_url, &r.token),
                        r.parent_email,
                        display_local(&r.expires_at)
                    ),
                );
            }
        }

        WaiverAction::Sign {
            user_id,
            signer,
            guardian,
        } => {
            let ctx = super::desk_context(cli, cfg, &pool)?;
            let user = WaiverLogic::complete_in_person(
                &pool,
                *user_id,
                signer,
                guardian.as_deref(),
                now,
                &ctx,
            )?;
            success(format!("Waiver complete for {}", user.name));
        }

        WaiverAction::Request {
            user_id,
            parent_email,
        } => {
            let ctx = super::desk_context(cli, cfg, &pool)?;
            let mailer = OutboxMailer::new(&pool.conn, cfg.mail_from.clone());
            let req = WaiverLogic::request_guardian_waiver(
                &pool,
                &mailer,
                *user_id,
                parent_email.as_deref(),
                &cfg.public_base_url,
                cfg.waiver_token_ttl_days,
                &cfg.organization_name,
                now,
                &ctx,
            )?;
            success(format!("Waiver link queued for {}", req.parent_email));
            field("Link", waiver_link(&cfg.public_base_url, &req.token));
            field("Expires", display_local(&req.expires_at));
        }

        WaiverAction::Show { token } => match WaiverLogic::resolve_waiver_link(&pool, token, now)? {
            WaiverLink::Form(req) => {
                header(format!("Liability waiver for {}", req.volunteer_name));
                field("Guardian e-mail", &req.parent_email);
                field("Expires", display_local(&req.expires_at));
                info(format!(
                    "Sign with `volunteerhub waiver complete {} --signature \"<full name>\"`",
                    req.token
                ));
            }
            WaiverLink::Expired => {
                warning("This waiver link has expired or was already used.");
            }
        },

        WaiverAction::Complete { token, signature } => {
            let user = WaiverLogic::sign_remote(&pool, token, signature, now)?;
            success(format!("Thank you. {} may now check in.", user.name));
        }
    }

    Ok(())
}
