/// Member endpoints
///
/// Listing the household's members, changing roles and removing accounts.
/// Changes are limited to admins of the target member's household, and an
/// admin can neither demote nor remove themselves.

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};
use axum_extra::extract::WithRejection;
use maison_shared::{
    auth::authorization::{require_admin, require_same_household},
    models::member::{Member, Role},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{form::parse_choice, views};
use crate::{
    app::AppState,
    error::{ApiError, OrRedirect, Rejected},
    extract::{CurrentMember, ValidForm, ValidPath},
    flash::{self, Flash, IncomingFlash, Page},
};

const VIEW: &str = views::MEMBERS;

#[derive(Debug, Serialize)]
pub struct MembersView {
    pub me: Member,
    pub members: Vec<Member>,
    /// Choices for the role form
    pub roles: Vec<Role>,
}

pub async fn list_members(
    State(state): State<AppState>,
    CurrentMember { member: me, .. }: CurrentMember,
    flash: IncomingFlash,
) -> Result<Page<MembersView>, Rejected> {
    let members = match me.household_id {
        Some(household_id) => Member::list_by_household(&state.db, household_id)
            .await
            .or_redirect(views::TASKS)?,
        None => vec![me.clone()],
    };

    Ok(Page::new(
        flash,
        MembersView {
            me,
            members,
            roles: Role::ALL.to_vec(),
        },
    ))
}

/// Loads `member_id` and checks `acting` administers its household
async fn load_managed_member(
    state: &AppState,
    acting: &Member,
    member_id: Uuid,
) -> Result<Member, Rejected> {
    require_admin(acting).or_redirect(VIEW)?;

    let target = Member::find_by_id(&state.db, member_id)
        .await
        .or_redirect(VIEW)?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()).at(VIEW))?;

    require_same_household(acting, target.household_id).or_redirect(VIEW)?;

    Ok(target)
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleForm {
    pub role: String,
}

pub async fn change_role(
    State(state): State<AppState>,
    CurrentMember { member: acting, .. }: CurrentMember,
    WithRejection(Path(member_id), _): ValidPath<Uuid, views::Members>,
    WithRejection(Form(form), _): ValidForm<ChangeRoleForm, views::Members>,
) -> Result<Response, Rejected> {
    let role = parse_choice::<Role>(&form.role).or_redirect(VIEW)?;
    let target = load_managed_member(&state, &acting, member_id).await?;

    if target.id == acting.id && role != Role::Admin {
        return Err(ApiError::Validation("You cannot give up your own admin role".to_string()).at(VIEW));
    }

    let updated = Member::update_role(&state.db, target.id, role)
        .await
        .or_redirect(VIEW)?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()).at(VIEW))?;

    info!(
        member_id = %updated.id,
        from = %target.role,
        to = %updated.role,
        changed_by = %acting.id,
        "Role changed"
    );

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("{} is now {}", updated.display_name, updated.role)),
    ))
}

/// Deletes a member account
pub async fn remove_member(
    State(state): State<AppState>,
    CurrentMember { member: acting, .. }: CurrentMember,
    WithRejection(Path(member_id), _): ValidPath<Uuid, views::Members>,
) -> Result<Response, Rejected> {
    let target = load_managed_member(&state, &acting, member_id).await?;

    if target.id == acting.id {
        return Err(ApiError::Validation("You cannot remove yourself".to_string()).at(VIEW));
    }

    if !Member::delete(&state.db, target.id).await.or_redirect(VIEW)? {
        return Err(ApiError::NotFound("Member not found".to_string()).at(VIEW));
    }

    info!(member_id = %target.id, removed_by = %acting.id, "Member removed");

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("{} was removed", target.display_name)),
    ))
}
