/// Task endpoints
///
/// Chores belong to the household of the admin who creates them. Any member
/// whose role allows it can mark a task done; completion is a conditional
/// update, so two members finishing the same task at once can't both succeed.
/// Each completion is logged to the task's history, and an admin can make a
/// task recurring so the list shows when it comes back.

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};
use axum_extra::extract::WithRejection;
use chrono::NaiveDate;
use maison_shared::{
    auth::authorization::{require_admin, require_capability, require_household, require_same_household, Capability},
    models::{
        member::Member,
        room::Room,
        task::{CreateTask, Task, TaskAssignee, TaskPriority, TaskStatus, MAX_TITLE_LENGTH},
        task_history::{CompletionNote, TaskFrequency, TaskHistoryEntry, TaskRecurrence},
    },
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use super::{
    form::{empty_as_none, parse_choice, required_text, room_in_household},
    views,
};
use crate::{
    app::AppState,
    error::{ApiError, OrRedirect, Rejected},
    extract::{CurrentMember, ValidForm, ValidPath},
    flash::{self, Flash, IncomingFlash, Page},
};

const VIEW: &str = views::TASKS;

#[derive(Debug, Serialize)]
pub struct TaskItem {
    #[serde(flatten)]
    pub task: Task,
    pub assignees: Vec<TaskAssignee>,
    pub recurrence: Option<RecurrenceView>,
}

#[derive(Debug, Serialize)]
pub struct RecurrenceView {
    pub frequency: TaskFrequency,
    pub last_run: Option<NaiveDate>,
    pub next_run: Option<NaiveDate>,
}

impl From<TaskRecurrence> for RecurrenceView {
    fn from(recurrence: TaskRecurrence) -> Self {
        Self {
            next_run: recurrence.next_run(),
            frequency: recurrence.frequency,
            last_run: recurrence.last_run,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TasksView {
    pub tasks: Vec<TaskItem>,
    /// Choices for the task and assignment forms
    pub rooms: Vec<Room>,
    pub members: Vec<Member>,
}

/// Tasks of the acting member's household, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    member: CurrentMember,
    flash: IncomingFlash,
) -> Result<Page<TasksView>, Rejected> {
    let Some(household_id) = member.household_id else {
        let empty = TasksView {
            tasks: Vec::new(),
            rooms: Vec::new(),
            members: Vec::new(),
        };
        return Ok(Page::new(flash, empty));
    };

    let tasks = Task::list_by_household(&state.db, household_id)
        .await
        .or_redirect(views::HOUSEHOLDS)?;
    let assignees = Task::assignees_by_household(&state.db, household_id)
        .await
        .or_redirect(views::HOUSEHOLDS)?;

    let recurrences = TaskRecurrence::list_by_household(&state.db, household_id)
        .await
        .or_redirect(views::HOUSEHOLDS)?;

    let mut by_task: HashMap<Uuid, Vec<TaskAssignee>> = HashMap::new();
    for assignee in assignees {
        by_task.entry(assignee.task_id).or_default().push(assignee);
    }
    let mut recurrence_of: HashMap<Uuid, TaskRecurrence> = recurrences
        .into_iter()
        .map(|recurrence| (recurrence.task_id, recurrence))
        .collect();

    let tasks = tasks
        .into_iter()
        .map(|task| TaskItem {
            assignees: by_task.remove(&task.id).unwrap_or_default(),
            recurrence: recurrence_of.remove(&task.id).map(RecurrenceView::from),
            task,
        })
        .collect();

    let rooms = Room::list_by_household(&state.db, household_id)
        .await
        .or_redirect(views::HOUSEHOLDS)?;
    let members = Member::list_by_household(&state.db, household_id)
        .await
        .or_redirect(views::HOUSEHOLDS)?;

    Ok(Page::new(flash, TasksView { tasks, rooms, members }))
}

#[derive(Debug, Deserialize)]
pub struct AddTaskForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub room_id: Option<Uuid>,
}

/// Parses an optional closed-choice field, blank meaning absent
fn optional_choice<T>(raw: Option<&str>) -> Result<Option<T>, Rejected>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_choice::<T>(value).map(Some).or_redirect(VIEW),
    }
}

pub async fn add_task(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Form(form), _): ValidForm<AddTaskForm, views::Tasks>,
) -> Result<Response, Rejected> {
    let household_id = require_admin(&member)
        .and_then(|_| require_household(&member))
        .or_redirect(VIEW)?;

    let title = required_text(&form.title, "Title", MAX_TITLE_LENGTH).or_redirect(VIEW)?;
    let priority = optional_choice::<TaskPriority>(form.priority.as_deref())?;
    let status = optional_choice::<TaskStatus>(form.status.as_deref())?.unwrap_or_default();
    let room_id = room_in_household(&state.db, form.room_id, household_id)
        .await
        .or_redirect(VIEW)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            household_id,
            room_id,
            title,
            description: form.description.trim().to_string(),
            due_date: form.due_date,
            priority,
            status,
            created_by: member.id,
        },
    )
    .await
    .or_redirect(VIEW)?;

    info!(task_id = %task.id, household_id = %household_id, created_by = %member.id, "Task created");

    Ok(flash::redirect(VIEW, Flash::success(format!("Task \"{}\" added", task.title))))
}

/// Loads a task of the acting member's household
async fn load_task(state: &AppState, member: &Member, task_id: Uuid) -> Result<Task, Rejected> {
    let task = Task::find_by_id(&state.db, task_id)
        .await
        .or_redirect(VIEW)?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()).at(VIEW))?;

    require_same_household(member, task.household_id).or_redirect(VIEW)?;

    Ok(task)
}

pub async fn delete_task(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Path(task_id), _): ValidPath<Uuid, views::Tasks>,
) -> Result<Response, Rejected> {
    require_admin(&member).or_redirect(VIEW)?;
    let task = load_task(&state, &member, task_id).await?;

    if !Task::delete(&state.db, task.id).await.or_redirect(VIEW)? {
        return Err(ApiError::NotFound("Task not found".to_string()).at(VIEW));
    }

    info!(task_id = %task.id, deleted_by = %member.id, "Task deleted");

    Ok(flash::redirect(VIEW, Flash::success(format!("Task \"{}\" deleted", task.title))))
}

fn already_closed(status: TaskStatus) -> ApiError {
    match status {
        TaskStatus::Cancelled => ApiError::Validation("This task was cancelled".to_string()),
        _ => ApiError::Validation("This task is already done".to_string()),
    }
}

/// Optional details logged with a completion
#[derive(Debug, Default, Deserialize)]
pub struct CompleteTaskForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub comment: String,
}

pub async fn complete_task(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Path(task_id), _): ValidPath<Uuid, views::Tasks>,
    WithRejection(Form(form), _): ValidForm<CompleteTaskForm, views::Tasks>,
) -> Result<Response, Rejected> {
    require_capability(&member, Capability::CompleteTasks).or_redirect(VIEW)?;
    let task = load_task(&state, &member, task_id).await?;

    if task.status.is_terminal() {
        return Err(already_closed(task.status).at(VIEW));
    }

    if form.duration_minutes.is_some_and(|minutes| minutes < 0) {
        return Err(ApiError::Validation("Duration cannot be negative".to_string()).at(VIEW));
    }
    let note = CompletionNote {
        duration_minutes: form.duration_minutes,
        comment: form.comment.trim().to_string(),
    };

    // Someone else may have finished it since it was loaded
    let completed = Task::complete(&state.db, task.id, member.id, &note)
        .await
        .or_redirect(VIEW)?
        .ok_or_else(|| already_closed(TaskStatus::Done).at(VIEW))?;

    info!(task_id = %completed.id, completed_by = %member.id, "Task completed");

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("Task \"{}\" completed", completed.title)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AssignTaskForm {
    pub member_id: Uuid,
}

pub async fn assign_task(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Path(task_id), _): ValidPath<Uuid, views::Tasks>,
    WithRejection(Form(form), _): ValidForm<AssignTaskForm, views::Tasks>,
) -> Result<Response, Rejected> {
    require_admin(&member).or_redirect(VIEW)?;
    let task = load_task(&state, &member, task_id).await?;

    let assignee = Member::find_by_id(&state.db, form.member_id)
        .await
        .or_redirect(VIEW)?
        .filter(|candidate| candidate.household_id == task.household_id)
        .ok_or_else(|| {
            ApiError::Validation("This member is not part of your household".to_string()).at(VIEW)
        })?;

    if !Task::assign(&state.db, task.id, assignee.id).await.or_redirect(VIEW)? {
        return Err(ApiError::Validation(format!(
            "{} is already assigned to this task",
            assignee.display_name
        ))
        .at(VIEW));
    }

    info!(task_id = %task.id, member_id = %assignee.id, assigned_by = %member.id, "Task assigned");

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("{} assigned to \"{}\"", assignee.display_name, task.title)),
    ))
}

#[derive(Debug, Serialize)]
pub struct TaskHistoryView {
    pub task: Task,
    pub history: Vec<TaskHistoryEntry>,
}

/// Who completed a task and when, most recent first
pub async fn task_history(
    State(state): State<AppState>,
    member: CurrentMember,
    flash: IncomingFlash,
    WithRejection(Path(task_id), _): ValidPath<Uuid, views::Tasks>,
) -> Result<Page<TaskHistoryView>, Rejected> {
    let task = load_task(&state, &member, task_id).await?;

    let history = TaskHistoryEntry::list_by_task(&state.db, task.id)
        .await
        .or_redirect(VIEW)?;

    Ok(Page::new(flash, TaskHistoryView { task, history }))
}

#[derive(Debug, Deserialize)]
pub struct RecurrenceForm {
    pub frequency: String,
}

/// Makes a task repeat daily, weekly or monthly
pub async fn set_recurrence(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Path(task_id), _): ValidPath<Uuid, views::Tasks>,
    WithRejection(Form(form), _): ValidForm<RecurrenceForm, views::Tasks>,
) -> Result<Response, Rejected> {
    require_admin(&member).or_redirect(VIEW)?;
    let task = load_task(&state, &member, task_id).await?;

    let frequency = parse_choice::<TaskFrequency>(&form.frequency).or_redirect(VIEW)?;

    let recurrence = TaskRecurrence::set(&state.db, task.id, frequency)
        .await
        .or_redirect(VIEW)?;

    info!(
        task_id = %task.id,
        frequency = recurrence.frequency.as_str(),
        set_by = %member.id,
        "Task recurrence set"
    );

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("\"{}\" now repeats {}", task.title, recurrence.frequency.as_str())),
    ))
}
