//! Subcommand execution
//!
//! Each command builds the controller it needs, awaits the operation's
//! handle, then reads the controller's state to report the outcome. Failure
//! messages published by a controller become the command's error.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::debug;

use tracker_core::{
    AuthController, AuthGateway, AuthState, DataGateway, InMemoryGateway, PreferenceStore,
    TaskListController, TaskUpdate, ThemeController, TrackerConfig,
};

use crate::render;
use crate::{Command, ThemeMode};

const OFFLINE_EMAIL: &str = "offline@localhost";
const OFFLINE_PASSWORD: &str = "offline";

/// Start a local session on the in-process backend
pub async fn sign_in_offline(gateway: &InMemoryGateway) -> Result<()> {
    gateway.add_account(OFFLINE_EMAIL, OFFLINE_PASSWORD);
    gateway.sign_in(OFFLINE_EMAIL, OFFLINE_PASSWORD).await?;
    Ok(())
}

/// Auth controller with its initial session check finished
async fn settled_auth<G>(gateway: &Arc<G>) -> Result<AuthController<G>>
where
    G: AuthGateway + 'static,
{
    let auth = AuthController::new(Arc::clone(gateway));
    auth.auth_state()
        .wait_for(|state| *state != AuthState::Loading)
        .await?;
    Ok(auth)
}

async fn require_user<G>(gateway: &Arc<G>) -> Result<AuthController<G>>
where
    G: AuthGateway + 'static,
{
    let auth = settled_auth(gateway).await?;
    if !auth.state().is_authenticated() {
        bail!("Not signed in (run `tracker sign-in <email> <password>`)");
    }
    Ok(auth)
}

fn check<G>(tasks: &TaskListController<G>) -> Result<()>
where
    G: AuthGateway + DataGateway + 'static,
{
    match tasks.error_message() {
        Some(message) => bail!(message),
        None => Ok(()),
    }
}

/// Run an account or task command against `gateway`
pub async fn run<G>(gateway: Arc<G>, config: &TrackerConfig, command: Command) -> Result<()>
where
    G: AuthGateway + DataGateway + 'static,
{
    match command {
        Command::SignUp { email, password } => {
            let auth = settled_auth(&gateway).await?;
            let Some(handle) = auth.sign_up(&email, &password) else {
                bail!(auth.error().unwrap_or_default());
            };
            handle.await?;
            report_auth(&auth)
        }

        Command::SignIn { email, password } => {
            let auth = settled_auth(&gateway).await?;
            let Some(handle) = auth.sign_in(&email, &password) else {
                bail!(auth.error().unwrap_or_default());
            };
            handle.await?;
            report_auth(&auth)
        }

        Command::SignOut => {
            let auth = settled_auth(&gateway).await?;
            auth.sign_out().await?;
            if let Some(message) = auth.error() {
                // The local session is gone either way
                eprintln!("warning: {message}");
            }
            println!("Signed out");
            Ok(())
        }

        Command::Whoami => {
            let auth = settled_auth(&gateway).await?;
            match auth.current_user() {
                Some(user) => println!("{} ({})", user.email, user.id),
                None => println!("Not signed in"),
            }
            Ok(())
        }

        Command::List { completed, active } => {
            require_user(&gateway).await?;
            let tasks = TaskListController::new(gateway, config.task_list());
            tasks.load_tasks().await?;
            check(&tasks)?;

            let list = if completed {
                tasks.completed_tasks()
            } else if active {
                tasks.active_tasks()
            } else {
                tasks.snapshot()
            };
            print!("{}", render::task_table(&list));
            Ok(())
        }

        Command::Add {
            title,
            description,
            priority,
            due,
        } => {
            require_user(&gateway).await?;
            let tasks = TaskListController::new(gateway, config.task_list());
            if let Some(handle) = tasks.add_task(&title, &description, priority, due) {
                handle.await?;
            }
            check(&tasks)?;
            print!("{}", render::task_table(&tasks.snapshot()));
            Ok(())
        }

        Command::Update {
            id,
            title,
            description,
            priority,
            due,
        } => {
            let mut update = TaskUpdate::new();
            if let Some(title) = title {
                if title.trim().is_empty() {
                    bail!(tracker_core::tasks::EMPTY_TITLE_MESSAGE);
                }
                update = update.title(title);
            }
            if let Some(description) = description {
                update = update.description(description);
            }
            if let Some(priority) = priority {
                update = update.priority(priority);
            }
            if let Some(due) = due {
                update = update.due_date(due);
            }
            if update.is_empty() {
                bail!("Nothing to update");
            }

            require_user(&gateway).await?;
            let tasks = TaskListController::new(gateway, config.task_list());
            tasks.update_task(&id, update).await?;
            check(&tasks)?;
            print!("{}", render::task_table(&tasks.snapshot()));
            Ok(())
        }

        Command::Done { id, undo } => {
            require_user(&gateway).await?;
            let tasks = TaskListController::new(gateway, config.task_list());
            tasks
                .update_task(&id, TaskUpdate::new().completed(!undo))
                .await?;
            check(&tasks)?;
            print!("{}", render::task_table(&tasks.snapshot()));
            Ok(())
        }

        Command::Delete { ids } => {
            require_user(&gateway).await?;
            let tasks = TaskListController::new(gateway, config.task_list());

            if let [id] = ids.as_slice() {
                tasks.delete_task(id).await?;
            } else {
                for id in &ids {
                    if !tasks.selected().contains(id) {
                        tasks.toggle_task_selection(id);
                    }
                }
                debug!(count = tasks.selected().len(), "Deleting selected tasks");
                tasks.delete_selected_tasks().await?;
            }
            check(&tasks)?;
            print!("{}", render::task_table(&tasks.snapshot()));
            Ok(())
        }

        Command::Theme { .. } => bail!("theme does not use the backend"),
    }
}

fn report_auth<G>(auth: &AuthController<G>) -> Result<()>
where
    G: AuthGateway + 'static,
{
    if let Some(message) = auth.error() {
        bail!(message);
    }
    if let Some(user) = auth.current_user() {
        println!("Signed in as {}", user.email);
    }
    Ok(())
}

/// Show or change the theme preference
pub async fn theme<P>(store: Arc<P>, mode: Option<ThemeMode>) -> Result<()>
where
    P: PreferenceStore + 'static,
{
    let controller = ThemeController::new(store);
    match mode {
        Some(ThemeMode::Dark) => controller.set_dark_mode(true).await?,
        Some(ThemeMode::Light) => controller.set_dark_mode(false).await?,
        Some(ThemeMode::System) => controller.enable_system_theme().await?,
        None => {}
    }
    println!("{}", render::theme_line(&controller.preference()));
    Ok(())
}
