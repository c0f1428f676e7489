use anyhow::Context;
use chrono::Utc;
use colored::Colorize;
use recess_entity::time_management::parse_day;
use recess_entity::{AddTimeOff, DeleteTimeOff, PasswordChange, TimeManagementService, UserService};
use recess_server::{AppState, RecessServer, ServerConfig};
use recess_types::{Document, DocumentId};
use serde_json::Value;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::User(args) => cmd_user(&config, format, args.action).await,
        Command::TimeOff(args) => cmd_time_off(&config, format, args.action).await,
        Command::Passphrase(args) => cmd_passphrase(&config, format, args),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!(
        "Recess server on {} (data: {})",
        config.bind_addr.to_string().bold(),
        config.data_dir.display()
    );
    RecessServer::new(config).serve().await?;
    Ok(())
}

fn open(config: &ServerConfig) -> anyhow::Result<AppState> {
    AppState::open(config)
        .with_context(|| format!("failed to open data directory {}", config.data_dir.display()))
}

async fn find_user(state: &AppState, username: &str) -> anyhow::Result<(DocumentId, Document)> {
    let doc = state
        .users
        .find_by_username(username)
        .await
        .with_context(|| format!("no user named '{username}'"))?;
    let id = doc.id().context("stored user has no valid _id")?;
    Ok((id, doc))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_user(doc: &Document) {
    let field = |name: &str| doc.get_str(name).unwrap_or("-").to_string();
    println!("{}  {}", field("username").bold(), field("_id").dimmed());
    println!("  Name: {}", field("displayName"));
    println!("  Email: {}", field("email"));
    if let Some(roles) = doc.get_array("roles") {
        let roles: Vec<&str> = roles.iter().filter_map(Value::as_str).collect();
        println!("  Roles: {}", roles.join(", ").cyan());
    }
    println!("  Last login: {}", field("lastLogin"));
}

async fn cmd_user(
    config: &ServerConfig,
    format: OutputFormat,
    action: UserAction,
) -> anyhow::Result<()> {
    let state = open(config)?;
    match action {
        UserAction::Add {
            username,
            first_name,
            last_name,
            email,
            password,
        } => {
            let (password, generated) = match password {
                Some(password) => {
                    state.users.check_strength(&password)?;
                    (password, false)
                }
                None => (state.users.generate_passphrase()?, true),
            };
            let input = Document::new()
                .with("username", username)
                .with("firstName", first_name)
                .with("lastName", last_name)
                .with("email", email)
                .with("password", password.as_str());
            let user = UserService::safe_view(&state.users.create_user(input).await?);
            match format {
                OutputFormat::Json => print_json(&user)?,
                OutputFormat::Text => {
                    println!("{} Created user", "✓".green().bold());
                    print_user(&user);
                    if generated {
                        println!("  Passphrase: {}", password.yellow());
                    }
                }
            }
        }
        UserAction::Show { username } => {
            let (_, doc) = find_user(&state, &username).await?;
            let view = UserService::safe_view(&doc);
            match format {
                OutputFormat::Json => print_json(&view)?,
                OutputFormat::Text => print_user(&view),
            }
        }
        UserAction::List => {
            let users: Vec<Document> = state
                .users
                .find_all()
                .await
                .iter()
                .map(UserService::safe_view)
                .collect();
            match format {
                OutputFormat::Json => print_json(&users)?,
                OutputFormat::Text if users.is_empty() => println!("No users."),
                OutputFormat::Text => users.iter().for_each(print_user),
            }
        }
        UserAction::Passwd {
            username,
            current,
            new,
        } => {
            let (id, _) = find_user(&state, &username).await?;
            let outcome = state.users.change_password(&id, &current, &new).await?;
            match outcome {
                PasswordChange::Changed(_) => {
                    println!("{} {}", "✓".green().bold(), outcome.message())
                }
                PasswordChange::WrongCurrentPassword | PasswordChange::RecentlyUsed => {
                    anyhow::bail!(outcome.message())
                }
            }
        }
        UserAction::Reset { username } => {
            let (id, _) = find_user(&state, &username).await?;
            let passphrase = state.users.reset_password(&id).await?;
            println!("{} Password reset for {}", "✓".green().bold(), username.bold());
            println!("  Passphrase: {}", passphrase.yellow());
        }
    }
    Ok(())
}

async fn cmd_time_off(
    config: &ServerConfig,
    format: OutputFormat,
    action: TimeOffAction,
) -> anyhow::Result<()> {
    if let TimeOffAction::Types = action {
        for reason in TimeManagementService::time_off_types() {
            println!("{reason}");
        }
        return Ok(());
    }

    let state = open(config)?;
    match action {
        TimeOffAction::Add {
            username,
            date,
            reason,
        } => {
            let (id, _) = find_user(&state, &username).await?;
            let outcome = state.time_off.add_time_off(&id, &date, &reason).await?;
            match outcome {
                AddTimeOff::AlreadyExists => {
                    println!("{} {}", "!".yellow().bold(), outcome.message())
                }
                _ => println!("{} {}", "✓".green().bold(), outcome.message()),
            }
        }
        TimeOffAction::Delete { username, date } => {
            let (id, _) = find_user(&state, &username).await?;
            let outcome = state.time_off.delete_time_off(&id, &date).await?;
            match outcome {
                DeleteTimeOff::Deleted => {
                    println!("{} {}", "✓".green().bold(), outcome.message())
                }
                DeleteTimeOff::NothingToDelete => {
                    println!("{} {}", "!".yellow().bold(), outcome.message())
                }
            }
        }
        TimeOffAction::List { username: Some(username) } => {
            let (id, _) = find_user(&state, &username).await?;
            let dates = state.time_off.time_off(&id).await;
            match format {
                OutputFormat::Json => print_json(&dates)?,
                OutputFormat::Text if dates.is_empty() => println!("No time off for {username}."),
                OutputFormat::Text => {
                    for entry in &dates {
                        println!("{}  {}", entry.date.bold(), entry.reason.cyan());
                    }
                }
            }
        }
        TimeOffAction::List { username: None } => {
            let records = state.time_off.all_time_off(&state.users).await;
            match format {
                OutputFormat::Json => print_json(&records)?,
                OutputFormat::Text if records.is_empty() => println!("No time off recorded."),
                OutputFormat::Text => {
                    for record in &records {
                        let name = record.display_name.as_deref().unwrap_or(&record.user_id);
                        println!("{}", name.bold());
                        for entry in &record.dates {
                            println!("  {}  {}", entry.date, entry.reason.cyan());
                        }
                    }
                }
            }
        }
        TimeOffAction::Today { date } => {
            let day = match date {
                Some(date) => parse_day(&date)?,
                None => Utc::now().date_naive(),
            };
            let off = state.time_off.time_off_on(&state.users, day).await;
            match format {
                OutputFormat::Json => print_json(&off)?,
                OutputFormat::Text if off.is_empty() => println!("Nobody is off on {day}."),
                OutputFormat::Text => {
                    for entry in &off {
                        let name = entry.display_name.as_deref().unwrap_or(&entry.user_id);
                        println!("{}  {}", name.bold(), entry.reason.cyan());
                    }
                }
            }
        }
        TimeOffAction::Types => {}
    }
    Ok(())
}

fn cmd_passphrase(
    config: &ServerConfig,
    format: OutputFormat,
    args: PassphraseArgs,
) -> anyhow::Result<()> {
    let state = AppState::in_memory(config.hasher, config.password_policy.clone())?;
    let phrases = (0..args.count)
        .map(|_| state.users.generate_passphrase())
        .collect::<Result<Vec<_>, _>>()?;
    match format {
        OutputFormat::Json => print_json(&phrases)?,
        OutputFormat::Text => phrases.iter().for_each(|p| println!("{p}")),
    }
    Ok(())
}
