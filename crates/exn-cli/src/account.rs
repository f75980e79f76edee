//! # Account Subcommand
//!
//! - `signup`: Register; a verification email is sent.
//! - `login` / `logout`: Start or end the local session.
//! - `whoami`: Show the signed-in profile.
//! - `verify`: Check the session produced by the verification link.
//! - `forgot` / `reset`: Password recovery.
//! - `resend`: Send the verification email again.

use anyhow::Result;
use clap::{Args, Subcommand};

use exn_client::AccountError;
use exn_core::{AccountForm, ExamType, Notice};

use crate::{report, CliContext};

/// Arguments for the `exn account` subcommand.
#[derive(Args, Debug)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommand,
}

/// Account subcommands.
#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Create an account.
    Signup {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        /// 10-digit mobile number.
        #[arg(long)]
        mobile: String,
        /// PO, CLERK, SO, GRADE B, INSURANCE or OTHER.
        #[arg(long, default_value = "PO")]
        exam_type: ExamType,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// Accept the terms and conditions.
        #[arg(long)]
        accept_terms: bool,
    },

    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out and clear the local session.
    Logout,

    /// Show the signed-in user.
    Whoami,

    /// Confirm an account after following the verification link.
    Verify {
        /// Access token from the link; defaults to the stored session.
        #[arg(long)]
        access_token: Option<String>,
    },

    /// Email a password reset link.
    Forgot {
        #[arg(long)]
        email: String,
    },

    /// Set a new password using the token from the reset link.
    Reset {
        /// Access token from the reset link; defaults to the stored session.
        #[arg(long)]
        access_token: Option<String>,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },

    /// Send the verification email again.
    Resend {
        #[arg(long)]
        email: String,
    },
}

/// Execute the account subcommand.
pub async fn run_account(args: &AccountArgs, ctx: &CliContext) -> Result<u8> {
    match &args.command {
        AccountCommand::Signup {
            full_name,
            email,
            mobile,
            exam_type,
            password,
            confirm_password,
            accept_terms,
        } => {
            let form = AccountForm {
                full_name: full_name.clone(),
                email: email.clone(),
                mobile: mobile.clone(),
                exam_type: Some(*exam_type),
                password: password.clone(),
                confirm_password: confirm_password.clone(),
                accept_terms: *accept_terms,
            };
            match ctx.client()?.account().sign_up(&form).await {
                Ok(done) => {
                    println!("User ID: {}", done.user_id);
                    Ok(report(&done.notice))
                }
                Err(e) => Ok(report_failure(&e)),
            }
        }

        AccountCommand::Login { email, password } => {
            let form = AccountForm {
                email: email.clone(),
                password: password.clone(),
                ..AccountForm::default()
            };
            match ctx.client()?.account().sign_in(&form).await {
                Ok(done) => {
                    let mut state = ctx.store.load()?;
                    state.sign_in(done.profile, done.session);
                    ctx.store.save(&state)?;
                    Ok(report(&done.notice))
                }
                Err(e) => Ok(report_failure(&e)),
            }
        }

        AccountCommand::Logout => cmd_logout(ctx).await,

        AccountCommand::Whoami => cmd_whoami(ctx),

        AccountCommand::Verify { access_token } => {
            let state = ctx.store.load()?;
            let token = access_token.as_deref().or(state.access_token());
            let notice = ctx.client()?.account().verify(token).await;
            Ok(report(&notice))
        }

        AccountCommand::Forgot { email } => {
            let form = AccountForm {
                email: email.clone(),
                ..AccountForm::default()
            };
            outcome(ctx.client()?.account().request_password_reset(&form).await)
        }

        AccountCommand::Reset {
            access_token,
            password,
            confirm_password,
        } => {
            let state = ctx.store.load()?;
            let Some(token) = access_token.as_deref().or(state.access_token()) else {
                return Ok(report(&Notice::error(
                    "Invalid reset link. Please request a new password reset.",
                )));
            };
            let form = AccountForm {
                password: password.clone(),
                confirm_password: confirm_password.clone(),
                ..AccountForm::default()
            };
            outcome(ctx.client()?.account().update_password(token, &form).await)
        }

        AccountCommand::Resend { email } => {
            outcome(ctx.client()?.account().resend_verification(email).await)
        }
    }
}

async fn cmd_logout(ctx: &CliContext) -> Result<u8> {
    let mut state = ctx.store.load()?;
    if let Some(token) = state.access_token() {
        // The local session is cleared even when revocation fails.
        if let Err(e) = ctx.client()?.account().sign_out(token).await {
            tracing::warn!("session revocation failed: {e}");
        }
    }
    state.sign_out();
    ctx.store.save(&state)?;
    Ok(report(&Notice::success("Logged out")))
}

fn cmd_whoami(ctx: &CliContext) -> Result<u8> {
    let state = ctx.store.load()?;
    match (&state.user, state.is_logged_in) {
        (Some(user), true) => {
            println!("User ID:   {}", user.user_id);
            println!("Name:      {}", user.full_name);
            println!("Email:     {}", user.email);
            println!("Mobile:    {}", user.mobile);
            println!("Exam type: {}", user.exam_type);
            Ok(0)
        }
        _ => {
            println!("Not logged in.");
            Ok(1)
        }
    }
}

fn outcome(result: Result<Notice, AccountError>) -> Result<u8> {
    Ok(match result {
        Ok(notice) => report(&notice),
        Err(e) => report_failure(&e),
    })
}

/// Print every failing field, or the service notice.
fn report_failure(err: &AccountError) -> u8 {
    match err {
        AccountError::Invalid(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("ERROR: {}: {message}", field.as_str());
            }
            1
        }
        AccountError::Failed { notice, source } => {
            tracing::debug!("{source}");
            report(notice)
        }
    }
}
