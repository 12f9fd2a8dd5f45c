/// Invitation endpoints
///
/// - `POST /foyer/:id/inviter` (alias `POST /invitation/:id`): an admin of the
///   household issues a code, shown back in the flash message
/// - `GET /rejoindre?code=...`: join form, prefilled with the code
/// - `POST /rejoindre`: redeem the code, create the account and log it in
///
/// Both operations go through [`InvitationService`](maison_shared::invitation::InvitationService).

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::WithRejection;
use maison_shared::{
    auth::password::MIN_PASSWORD_LENGTH,
    invitation::RedeemRequest,
    models::{invitation::VALIDITY_DAYS, member::Role},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{form::parse_choice, views};
use crate::{
    app::AppState,
    error::{OrRedirect, Rejected},
    extract::{CurrentMember, ValidForm, ValidPath},
    flash::{self, Flash, IncomingFlash, Page},
};

#[derive(Debug, Default, Deserialize)]
pub struct InviteForm {
    /// Role to grant; `member` when blank
    #[serde(default)]
    pub role: Option<String>,
}

pub async fn issue(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Path(household_id), _): ValidPath<Uuid, views::Households>,
    WithRejection(Form(form), _): ValidForm<InviteForm, views::Households>,
) -> Result<Response, Rejected> {
    let role = match form.role.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_choice::<Role>(raw).or_redirect(views::HOUSEHOLDS)?),
    };

    let invitation = state
        .invitations
        .issue(&member, household_id, role)
        .await
        .or_redirect(views::HOUSEHOLDS)?;

    Ok(flash::redirect(
        &format!("/foyer/{}", household_id),
        Flash::success(format!(
            "Invitation code for a new {}: {} (valid until {}, link: {}?code={})",
            invitation.role,
            invitation.code,
            invitation.expires_at().format("%Y-%m-%d %H:%M UTC"),
            views::JOIN,
            invitation.code,
        )),
    ))
}

#[derive(Debug, Deserialize)]
pub struct JoinQuery {
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JoinView {
    pub code: Option<String>,
    pub min_password_length: usize,
    pub validity_days: i64,
}

pub async fn join_page(flash: IncomingFlash, Query(query): Query<JoinQuery>) -> Page<JoinView> {
    Page::new(
        flash,
        JoinView {
            code: query.code,
            min_password_length: MIN_PASSWORD_LENGTH,
            validity_days: VALIDITY_DAYS,
        },
    )
}

pub async fn redeem(
    State(state): State<AppState>,
    WithRejection(Form(request), _): ValidForm<RedeemRequest, views::Join>,
) -> Result<Response, Rejected> {
    let member = state
        .invitations
        .redeem(request)
        .await
        .or_redirect(views::JOIN)?;

    let session = super::auth::start_session(&state, member.id).or_redirect(views::JOIN)?;
    let response = flash::redirect(
        views::TASKS,
        Flash::success(format!("Welcome to your household, {}", member.display_name)),
    );

    Ok((session, response).into_response())
}
