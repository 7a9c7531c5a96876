//! Auth command handlers.

use leadkit_core::{Dashboard, User};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

fn detail(user: &User) -> String {
    [
        format!("ID:     {}", user.id),
        format!("Email:  {}", user.email),
        format!("Name:   {}", user.name.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

pub async fn handle(
    dashboard: &Dashboard,
    args: AuthArgs,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let paint = Painter::new(global);

    match args.command {
        AuthCommand::Signup { email, name } => {
            let email = util::email_or_prompt(email)?;
            let password = util::password_from_env_or_prompt()?;
            let user = dashboard.signup(&email, &password, name).await?;
            output::status(
                global,
                &paint.success(&format!("✓ Account created, logged in as {}", user.email)),
            );
            Ok(())
        }

        AuthCommand::Login { email } => {
            let email = util::email_or_prompt(email)?;
            let password = util::password_from_env_or_prompt()?;
            let user = dashboard.login(&email, &password).await?;
            output::status(
                global,
                &paint.success(&format!(
                    "✓ Logged in as {} (profile '{}')",
                    user.email, resolved.profile_name
                )),
            );
            Ok(())
        }

        AuthCommand::Logout => {
            let was_logged_in = dashboard.is_authenticated();
            dashboard.logout()?;
            if was_logged_in {
                output::status(global, "✓ Logged out");
            } else {
                output::status(global, "Not logged in");
            }
            Ok(())
        }

        AuthCommand::Whoami => {
            let user = util::require_session(dashboard, resolved)?;
            let out = output::render_single(global.output, &user, detail, |u| u.email.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
