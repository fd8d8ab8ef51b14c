use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use rosecandle::api::session::LoginError;
use rosecandle::api::{ApiClient, Authenticator, RecoveryFlow, RecoveryStep, ResourceApi, SessionStore};
use rosecandle::browse::{prompt, run_browse, StdinConfirm};
use rosecandle::cli::{Cli, Commands};
use rosecandle::config::Config;
use rosecandle::controller::{Paginated, ResourceForm, ResourceListController};
use rosecandle::models::Resource;
use rosecandle::profile::ProfileEditor;
use rosecandle::screens::{AssumeYes, Confirm, ListIntent, ListScreen, ScreenAction};
use rosecandle::{dashboard, output};
use rosecandle::notify::{NoticeKind, Notifier};

/// Client carrying the stored session, if any
fn session_client(config: &Config) -> Result<ApiClient> {
    let store = SessionStore::new(&config.session_path);
    let session = store.load()?;
    Ok(ApiClient::new(config)?.with_session(session.as_ref()))
}

fn controller(config: &Config, resource: Resource) -> Result<ResourceListController<ApiClient>> {
    let client = session_client(config)?;
    Ok(ResourceListController::new(Arc::new(client), resource, config.page_size))
}

/// Print pending notices, errors on stderr
fn show(notifier: &mut Notifier) {
    for notice in notifier.drain() {
        match notice.kind {
            NoticeKind::Error => eprintln!("{}", notice),
            _ => println!("{}", notice),
        }
    }
}

fn apply_assignments(form: &mut ResourceForm, assignments: &[String]) -> Result<()> {
    for (key, value) in Commands::parse_assignments(assignments)? {
        form.set(&key, &value)?;
    }
    Ok(())
}

async fn recover(config: &Config, email: &str) -> Result<()> {
    let client = ApiClient::new(&Config {
        api_base: config.recovery_base.clone(),
        ..config.clone()
    })?;
    let mut flow = RecoveryFlow::new(client);
    let mut notifier = Notifier::new();

    let requested = flow.request_code(email).await;
    notifier.toast_result(&requested);
    show(&mut notifier);
    requested?;
    loop {
        match flow.step() {
            RecoveryStep::VerifyCode => {
                let code = prompt("Code from the e-mail (or 'resend'): ").await?;
                let result = if code.trim() == "resend" {
                    flow.resend_code().await
                } else {
                    flow.verify_code(&code).await
                };
                notifier.toast_result(&result);
            }
            RecoveryStep::NewPassword => {
                let password = prompt("New password: ").await?;
                let confirmation = prompt("Confirm password: ").await?;
                let result = flow.update_password(&password, &confirmation).await;
                notifier.toast_result(&result);
            }
            RecoveryStep::Done => return Ok(()),
            RecoveryStep::RequestCode => {
                let email = prompt("E-mail: ").await?;
                let result = flow.request_code(&email).await;
                notifier.toast_result(&result);
            }
        }
        show(&mut notifier);
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::List { resource, page } => {
            let mut controller = controller(&config, resource)?;
            controller.load().await?;
            controller.set_page(page);
            println!("{}", output::format_page(&controller));
        }

        Commands::Show { resource, id } => {
            let item = session_client(&config)?.fetch(resource, &id).await?;
            println!("{}", output::format_item(&item));
        }

        Commands::Create { resource, set, json } => {
            let mut controller = controller(&config, resource)?;
            let created = match json {
                Some(body) => controller.create(Commands::parse_json_body(&body)?).await?,
                None => {
                    let mut form = ResourceForm::for_create(controller.schema());
                    apply_assignments(&mut form, &set)?;
                    form.submit(&mut controller).await?
                }
            };
            match created {
                Some(item) => println!("{}", output::format_item(&item)),
                None => println!("Created {}", resource.singular()),
            }
        }

        Commands::Update { resource, id, set, json } => {
            let mut controller = controller(&config, resource)?;
            let updated = match json {
                Some(body) => controller.update(&id, Commands::parse_json_body(&body)?).await?,
                None => {
                    let current = controller.fetch_one(&id).await?;
                    let mut form = ResourceForm::for_edit(controller.schema(), &current)?;
                    apply_assignments(&mut form, &set)?;
                    form.submit(&mut controller).await?
                }
            };
            match updated {
                Some(item) => println!("{}", output::format_item(&item)),
                None => println!("Updated {} {}", resource.singular(), id),
            }
        }

        Commands::Delete { resource, id, yes } => {
            let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
            let mut screen = ListScreen::new(controller(&config, resource)?, tx);
            screen.controller_mut().load().await?;
            let mut notifier = Notifier::new();
            let mut confirm: Box<dyn Confirm> = if yes { Box::new(AssumeYes) } else { Box::new(StdinConfirm) };
            let action = screen.handle(ListIntent::Delete(id), &mut notifier, confirm.as_mut()).await;
            let notices = notifier.drain();
            for notice in &notices {
                println!("{}", notice);
            }
            match action {
                ScreenAction::SetError(e) => return Err(anyhow::anyhow!(e)),
                ScreenAction::SetStatus(status) if notices.is_empty() => println!("{}", status),
                _ => {}
            }
        }

        Commands::Browse { resource } => {
            run_browse(session_client(&config)?, resource, config.page_size).await?;
        }

        Commands::Login { user, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ").await?,
            };
            let mut auth = Authenticator::new(ApiClient::new(&config)?, SessionStore::new(&config.session_path));
            match auth.login(&user, &password).await {
                Ok(session) => println!("Signed in as {}", session.username().unwrap_or(user.as_str())),
                Err(LoginError::Rejected(errors)) => return Err(anyhow::anyhow!("{}", errors)),
                Err(LoginError::Api(e)) => return Err(anyhow::anyhow!("{}", e.user_message())),
            }
        }

        Commands::Logout => {
            let mut auth = Authenticator::new(ApiClient::new(&config)?, SessionStore::new(&config.session_path));
            auth.logout()?;
            println!("Signed out");
        }

        Commands::Whoami => {
            let mut auth = Authenticator::new(ApiClient::new(&config)?, SessionStore::new(&config.session_path));
            match auth.restore().await? {
                Some(session) => println!("Signed in as {}", session.username().unwrap_or("unknown user")),
                None => println!("Not signed in"),
            }
        }

        Commands::Profile { set } => {
            let mut profile = ProfileEditor::load(session_client(&config)?).await?;
            if !set.is_empty() {
                for (key, value) in Commands::parse_assignments(&set)? {
                    profile.set(&key, &value)?;
                }
                let mut notifier = Notifier::new();
                let saved = profile.submit(&mut notifier).await;
                show(&mut notifier);
                if !saved {
                    println!("{}", output::format_form(profile.form()));
                    return Err(anyhow::anyhow!("Profile was not saved"));
                }
            }
            println!("{}", output::format_form(profile.form()));
        }

        Commands::Dashboard { json } => {
            let summary = dashboard::load_dashboard(&session_client(&config)?).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", output::format_dashboard(&summary));
            }
        }

        Commands::Recover { email } => {
            recover(&config, &email).await?;
            info!("Password recovery finished");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "rosecandle=info");
    }

    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "rosecandle.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.validate()?;

    if let Err(e) = run(cli, config).await {
        error!("{}", e);
        return Err(e);
    }
    Ok(())
}
