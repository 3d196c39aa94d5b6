use chrono::NaiveDate;
use clap::{Args, Subcommand};
use pitchside_core::backend::ProfileBackend;
use pitchside_core::draft::DraftPhase;
use pitchside_core::profile::{Achievement, Experience, ProfilePatch};
use pitchside_core::render::ControlKind;
use pitchside_core::session::Session;
use serde_json::json;
use uuid::Uuid;

use super::{Context, emit_toasts, schema_or_exit};
use crate::backend::HttpBackend;
use crate::util::{
    confirm, exit_error, parse_values, print_json, prompt, report_backend_error,
    report_session_error,
};

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Create a new player, coach, academy, venue or community profile
    Create(CreateArgs),
    /// Show your user profile
    Show,
    /// Edit basic details of your user profile
    Update(UpdateArgs),
    /// Manage experience entries
    Experience {
        #[command(subcommand)]
        command: ExperienceCommands,
    },
    /// Manage achievements
    Achievement {
        #[command(subcommand)]
        command: AchievementCommands,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    /// Profile type to create
    pub profile_type: String,
    /// Field values as a JSON object
    #[arg(long)]
    pub values: Option<String>,
    /// Read field values from file (use '-' for stdin)
    #[arg(long, short = 'f', conflicts_with = "values")]
    pub values_file: Option<String>,
    /// Prompt for empty and invalid fields
    #[arg(long, short = 'i')]
    pub interactive: bool,
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    #[arg(long)]
    pub full_name: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// Comma-separated skills; replaces the current list
    #[arg(long, value_delimiter = ',')]
    pub skills: Option<Vec<String>>,
}

#[derive(Subcommand)]
pub enum ExperienceCommands {
    /// Add an experience entry
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        organization: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// End date (YYYY-MM-DD); omit while current
        #[arg(long)]
        end_date: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove an experience entry
    Remove {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Subcommand)]
pub enum AchievementCommands {
    /// Add an achievement
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Remove an achievement
    Remove {
        #[arg(long)]
        id: Uuid,
    },
}

pub async fn run(ctx: &Context, command: ProfileCommands) -> i32 {
    match command {
        ProfileCommands::Create(args) => create(ctx, args).await,
        ProfileCommands::Show => show(ctx).await,
        ProfileCommands::Update(args) => update(ctx, args).await,
        ProfileCommands::Experience { command } => {
            let patch = match command {
                ExperienceCommands::Add {
                    title,
                    organization,
                    start_date,
                    end_date,
                    description,
                } => {
                    if let (Some(start), Some(end)) = (start_date, end_date)
                        && end < start
                    {
                        exit_error(
                            "--end-date is before --start-date",
                            Some("Omit --end-date for a current role."),
                        );
                    }
                    ProfilePatch::AddExperience(Experience {
                        id: Uuid::now_v7(),
                        title,
                        organization,
                        start_date,
                        end_date,
                        description,
                    })
                }
                ExperienceCommands::Remove { id } => ProfilePatch::RemoveExperience(id),
            };
            apply_patches(ctx, vec![patch]).await
        }
        ProfileCommands::Achievement { command } => {
            let patch = match command {
                AchievementCommands::Add {
                    title,
                    description,
                    date,
                } => ProfilePatch::AddAchievement(Achievement {
                    id: Uuid::now_v7(),
                    title,
                    description,
                    date,
                }),
                AchievementCommands::Remove { id } => ProfilePatch::RemoveAchievement(id),
            };
            apply_patches(ctx, vec![patch]).await
        }
    }
}

async fn create(ctx: &Context, args: CreateArgs) -> i32 {
    let mut session = ctx.session();
    schema_or_exit(session.registry(), &args.profile_type);
    if let Err(e) = session.select_type(&args.profile_type) {
        return report_session_error(&e);
    }

    let values = parse_values(args.values.as_deref(), args.values_file.as_deref());
    for (name, value) in values {
        if let Err(e) = session.change_field(&name, value) {
            return report_session_error(&e);
        }
    }
    if args.interactive
        && let Err(e) = prompt_empty_fields(&mut session)
    {
        exit_error(&format!("Failed to read input: {e}"), None);
    }

    loop {
        let result = match session.submit_draft() {
            Ok(result) => result,
            Err(e) => return report_session_error(&e),
        };
        if result.is_valid {
            break;
        }
        if !args.interactive {
            emit_toasts(&mut session);
            eprintln!(
                "{}",
                json!({"error": "validation_failed", "errors": result.errors})
            );
            return 1;
        }
        for (name, message) in &result.errors {
            eprintln!("{message}");
            if let Err(e) = prompt_field(&mut session, name) {
                exit_error(&format!("Failed to read input: {e}"), None);
            }
        }
        session.toasts_mut().drain();
    }

    if !args.yes {
        let title = session
            .draft()
            .schema()
            .map(|s| s.title.clone())
            .unwrap_or_default();
        if !confirm(&format!("Create {title}?")) {
            if let Err(e) = session.cancel_confirm() {
                return report_session_error(&e);
            }
            return print_json(&json!({"status": "cancelled"}));
        }
    }

    let pending = match session.begin_submission() {
        Ok(pending) => pending,
        Err(e) => return report_session_error(&e),
    };
    let outcome = session.backend().create_profile(&pending.request).await;
    let failure_code = outcome.as_ref().err().map(report_backend_error);
    session.complete_submission(pending, outcome);
    emit_toasts(&mut session);

    match (session.draft().phase(), failure_code) {
        (DraftPhase::Succeeded, _) => match session.finish() {
            Ok(Some(profile)) => print_json(&profile),
            Ok(None) => print_json(&json!({"status": "created"})),
            Err(e) => report_session_error(&e),
        },
        (_, Some(code)) => code,
        (phase, None) => {
            eprintln!("{}", json!({"error": "cli_error", "message": format!("submission ended in {phase}")}));
            2
        }
    }
}

/// Ask for every field that has no value yet, in render order.
fn prompt_empty_fields(session: &mut Session<HttpBackend>) -> Result<(), std::io::Error> {
    let Some(view) = session.form_view() else {
        return Ok(());
    };
    let unset = view.controls.iter().filter(|c| match c.kind {
        ControlKind::Checkbox { checked } => !checked,
        _ => c.value.is_empty(),
    });
    for control in unset {
        prompt_field(session, &control.name)?;
    }
    Ok(())
}

fn prompt_field(session: &mut Session<HttpBackend>, name: &str) -> Result<(), std::io::Error> {
    let Some(control) = session.form_view().and_then(|v| v.control(name).cloned()) else {
        return Ok(());
    };
    let mut label = control.label.clone();
    if control.required {
        label.push_str(" *");
    }
    match &control.kind {
        ControlKind::Select { options } => {
            let choices: Vec<&str> = options
                .iter()
                .filter(|o| !o.value.is_empty())
                .map(|o| o.value.as_str())
                .collect();
            label.push_str(&format!(" ({})", choices.join("/")));
        }
        ControlKind::Checkbox { .. } => label.push_str(" (y/n)"),
        _ => {
            if let Some(placeholder) = &control.placeholder {
                label.push_str(&format!(" [{placeholder}]"));
            }
        }
    }

    let raw = prompt(&label)?;
    let raw = match control.kind {
        ControlKind::Checkbox { .. } if raw.trim().eq_ignore_ascii_case("y") => "yes".to_string(),
        _ => raw,
    };
    if raw.is_empty() {
        return Ok(());
    }
    if let Err(e) = session.change_field_raw(name, &raw) {
        tracing::warn!(field = name, error = %e, "could not apply prompted value");
    }
    Ok(())
}

async fn show(ctx: &Context) -> i32 {
    let mut session = ctx.session();
    let code = match session.load_user_profile().await {
        Ok(profile) => print_json(profile),
        Err(e) => report_session_error(&e),
    };
    emit_toasts(&mut session);
    code
}

async fn update(ctx: &Context, args: UpdateArgs) -> i32 {
    let mut patches = Vec::new();
    if let Some(name) = args.full_name {
        patches.push(ProfilePatch::SetFullName(Some(name).filter(|n| !n.is_empty())));
    }
    if let Some(bio) = args.bio {
        patches.push(ProfilePatch::SetBio(bio));
    }
    if let Some(location) = args.location {
        patches.push(ProfilePatch::SetLocation(Some(location).filter(|l| !l.is_empty())));
    }
    if let Some(skills) = args.skills {
        let skills = skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        patches.push(ProfilePatch::SetSkills(skills));
    }
    if patches.is_empty() {
        exit_error(
            "Nothing to update",
            Some("Pass at least one of --full-name, --bio, --location, --skills."),
        );
    }
    apply_patches(ctx, patches).await
}

/// Load the user profile, queue `patches` and push them in order.
async fn apply_patches(ctx: &Context, patches: Vec<ProfilePatch>) -> i32 {
    let mut session = ctx.session();
    if let Err(e) = session.load_user_profile().await {
        emit_toasts(&mut session);
        return report_session_error(&e);
    }
    for patch in patches {
        if let Err(e) = session.queue_profile_update(patch) {
            return report_session_error(&e);
        }
    }
    let code = match session.flush_profile_updates().await {
        Ok(_) => match session.user_profile() {
            Some(profile) => print_json(profile),
            None => 0,
        },
        Err(e) => report_session_error(&e),
    };
    emit_toasts(&mut session);
    code
}
