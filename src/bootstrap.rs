use crate::app::{AppOverrides, Application, create_app};
use crate::config::{ADMIN_ROLE_DESCRIPTION, ADMIN_ROLE_NAME, AdminAccount, Config};
use crate::db::models::{NewUser, Role, User};
use crate::db::store::IdentityStore;
use crate::error::{BootstrapError, IsRetryable};
use crate::password::PasswordHasher;
use backon::{ConstantBuilder, Retryable};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a successful run did.
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    /// Attempts used, including the successful one.
    pub attempts: u32,
    pub role: Role,
    pub role_created: bool,
    pub previous_user_removed: bool,
    pub user: User,
}

/// Build the application from `config.app_config` and bootstrap it.
///
/// A broken application config fails here, before any attempt is made.
pub async fn run(config: &Config) -> Result<BootstrapReport, BootstrapError> {
    info!(path = %config.app_config.display(), "Creating app");
    let app = create_app(&config.app_config, AppOverrides::bootstrap())?;
    info!(
        database_url = %app.settings().database_url,
        captcha_enabled = app.captcha_enabled(),
        "Application created"
    );
    bootstrap(&app, config).await
}

/// Create the schema, ensure the administrator role and recreate the admin
/// user, retrying transient failures with a fixed delay.
pub async fn bootstrap<A: Application>(
    app: &A,
    config: &Config,
) -> Result<BootstrapReport, BootstrapError> {
    config.validate()?;
    let hasher = PasswordHasher::new(config.bcrypt_cost)?;
    let max_attempts = config.retry.max_attempts;
    let retry_policy = ConstantBuilder::default()
        .with_delay(config.retry.delay())
        .with_max_times(max_attempts.saturating_sub(1) as usize);

    info!(max_attempts, bcrypt_cost = hasher.cost(), "Connecting to database");

    let attempts = AtomicU32::new(0);
    let counter = &attempts;
    let hasher = &hasher;
    let outcome = (|| async move {
        let attempt = counter.fetch_add(1, Ordering::Relaxed) + 1;
        attempt_once(app, &config.admin, hasher)
            .await
            .inspect_err(|e| {
                warn!(attempt, max_attempts, error = %e, "Database initialization attempt failed");
            })
    })
    .retry(retry_policy)
    .when(|e: &BootstrapError| e.is_retryable())
    .notify(|err: &BootstrapError, dur: Duration| {
        debug!("retrying after error {}, sleeping {:?}", err, dur);
    })
    .await;

    let attempts = attempts.load(Ordering::Relaxed);
    match outcome {
        Ok(mut report) => {
            report.attempts = attempts;
            log_report(&report, &config.admin, config.print_credentials);
            Ok(report)
        }
        Err(e) if e.is_retryable() => Err(BootstrapError::RetriesExhausted {
            attempts,
            source: Box::new(e),
        }),
        Err(e) => Err(e),
    }
}

/// One pass inside a scoped application context. The context is left on
/// every path out.
async fn attempt_once<A: Application>(
    app: &A,
    admin: &AdminAccount,
    hasher: &PasswordHasher,
) -> Result<BootstrapReport, BootstrapError> {
    let ctx = app.enter().await?;
    let result = initialize(&ctx, admin, hasher).await;
    app.leave(ctx).await;
    result
}

async fn initialize<S: IdentityStore>(
    store: &S,
    admin: &AdminAccount,
    hasher: &PasswordHasher,
) -> Result<BootstrapReport, BootstrapError> {
    store.create_all_schema().await?;
    info!("Database schema created successfully");

    let (role, role_created) = match store.find_role_by_name(ADMIN_ROLE_NAME).await? {
        Some(role) => (role, false),
        None => {
            let role = store
                .insert_role(ADMIN_ROLE_NAME, ADMIN_ROLE_DESCRIPTION)
                .await?;
            info!(role_id = role.id, "Created {} role", ADMIN_ROLE_NAME);
            (role, true)
        }
    };

    // Reset rather than merge: whatever the previous row held is discarded.
    let previous_user_removed = match store.find_user_by_username(&admin.username).await? {
        Some(existing) => {
            store.delete_user(existing.id).await?;
            info!(
                username = %admin.username,
                user_id = existing.id,
                "Removed existing admin user (for fresh creation)"
            );
            true
        }
        None => false,
    };

    let password_hash = hasher.hash(&admin.password).await?;
    let user = store
        .insert_user(NewUser {
            username: admin.username.clone(),
            password_hash,
            firstname: admin.firstname.clone(),
            lastname: admin.lastname.clone(),
            email: admin.email.clone(),
            otp_secret: None,
            role_id: role.id,
            confirmed: true,
        })
        .await?;

    Ok(BootstrapReport {
        attempts: 0,
        role,
        role_created,
        previous_user_removed,
        user,
    })
}

fn log_report(report: &BootstrapReport, admin: &AdminAccount, print_credentials: bool) {
    let password = if print_credentials {
        admin.password.as_str()
    } else {
        "<hidden>"
    };
    info!(
        username = %report.user.username,
        password = %password,
        email = %report.user.email,
        user_id = report.user.id,
        "Created fresh admin user"
    );
    info!(
        attempts = report.attempts,
        role_created = report.role_created,
        previous_user_removed = report.previous_user_removed,
        "Database initialization completed successfully"
    );
}
