/// Household endpoints
///
/// Households and what they contain: rooms, pets and connected devices.
/// Creation and deletion are admin-only; everything is scoped to the acting
/// member's household.

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use maison_shared::{
    auth::authorization::{
        require_admin, require_capability, require_household, require_household_admin,
        require_same_household, Capability,
    },
    models::{
        device::{CreateDevice, Device, DeviceKind},
        household::{CreateHousehold, Household, MAX_NAME_LENGTH},
        invitation::Invitation,
        member::Member,
        pet::{CreatePet, Pet},
        room::{CreateRoom, Room},
    },
};
use serde::{Deserialize, Serialize};
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

const VIEW: &str = views::HOUSEHOLDS;

#[derive(Debug, Serialize)]
pub struct HouseholdSummary {
    #[serde(flatten)]
    pub household: Household,
    pub rooms: Vec<Room>,
}

#[derive(Debug, Serialize)]
pub struct HouseholdsView {
    pub households: Vec<HouseholdSummary>,
}

/// The acting member's household, if any, with its rooms
pub async fn list_households(
    State(state): State<AppState>,
    member: CurrentMember,
    flash: IncomingFlash,
) -> Result<Page<HouseholdsView>, Rejected> {
    let mut households = Vec::new();

    if let Some(household_id) = member.household_id {
        if let Some(household) = Household::find_by_id(&state.db, household_id)
            .await
            .or_redirect(views::TASKS)?
        {
            let rooms = Room::list_by_household(&state.db, household_id)
                .await
                .or_redirect(views::TASKS)?;
            households.push(HouseholdSummary { household, rooms });
        }
    }

    Ok(Page::new(flash, HouseholdsView { households }))
}

#[derive(Debug, Serialize)]
pub struct HouseholdDetailView {
    pub household: Household,
    pub rooms: Vec<Room>,
    pub pets: Vec<Pet>,
    pub devices: Vec<Device>,
    pub members: Vec<Member>,

    /// Redeemable invitations; admins only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_invitations: Option<Vec<Invitation>>,
}

/// Full view of one household, for its members only
pub async fn household_detail(
    State(state): State<AppState>,
    member: CurrentMember,
    flash: IncomingFlash,
    WithRejection(Path(household_id), _): ValidPath<Uuid, views::Households>,
) -> Result<Page<HouseholdDetailView>, Rejected> {
    require_same_household(&member, Some(household_id)).or_redirect(VIEW)?;

    let household = Household::find_by_id(&state.db, household_id)
        .await
        .or_redirect(VIEW)?
        .ok_or_else(|| ApiError::NotFound("Household not found".to_string()).at(VIEW))?;

    let rooms = Room::list_by_household(&state.db, household_id).await.or_redirect(VIEW)?;
    let pets = Pet::list_by_household(&state.db, household_id).await.or_redirect(VIEW)?;
    let devices = Device::list_by_household(&state.db, household_id).await.or_redirect(VIEW)?;
    let members = Member::list_by_household(&state.db, household_id).await.or_redirect(VIEW)?;

    let pending_invitations = if member.administers(household_id) {
        let now = Utc::now();
        let invitations = Invitation::list_by_household(&state.db, household_id)
            .await
            .or_redirect(VIEW)?;
        Some(invitations.into_iter().filter(|i| i.is_valid_at(now)).collect())
    } else {
        None
    };

    Ok(Page::new(
        flash,
        HouseholdDetailView {
            household,
            rooms,
            pets,
            devices,
            members,
            pending_invitations,
        },
    ))
}

#[derive(Debug, Deserialize)]
pub struct CreateHouseholdForm {
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub room_count: Option<i32>,
}

/// Creates a household and moves the acting admin into it
pub async fn create_household(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Form(form), _): ValidForm<CreateHouseholdForm, views::Households>,
) -> Result<Response, Rejected> {
    require_admin(&member).or_redirect(VIEW)?;

    let name = required_text(&form.name, "Household name", MAX_NAME_LENGTH).or_redirect(VIEW)?;
    if form.room_count.is_some_and(|count| count < 0) {
        return Err(ApiError::Validation("Room count cannot be negative".to_string()).at(VIEW));
    }

    let mut tx = state.db.begin().await.or_redirect(VIEW)?;

    let household = Household::create_with(
        &mut *tx,
        CreateHousehold {
            name,
            room_count: form.room_count,
        },
    )
    .await
    .or_redirect(VIEW)?;

    Member::set_household(&mut *tx, member.id, Some(household.id))
        .await
        .or_redirect(VIEW)?;

    tx.commit().await.or_redirect(VIEW)?;

    info!(household_id = %household.id, admin_id = %member.id, "Household created");

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("Household {} created", household.name)),
    ))
}

/// Deletes a household
///
/// Rooms and invitations go with it; members, tasks and the rest are
/// detached.
pub async fn delete_household(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Path(household_id), _): ValidPath<Uuid, views::Households>,
) -> Result<Response, Rejected> {
    require_household_admin(&member, household_id).or_redirect(VIEW)?;

    if !Household::delete(&state.db, household_id).await.or_redirect(VIEW)? {
        return Err(ApiError::NotFound("Household not found".to_string()).at(VIEW));
    }

    info!(household_id = %household_id, admin_id = %member.id, "Household deleted");

    Ok(flash::redirect(VIEW, Flash::success("Household deleted")))
}

#[derive(Debug, Deserialize)]
pub struct AddRoomForm {
    pub name: String,
}

pub async fn add_room(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Form(form), _): ValidForm<AddRoomForm, views::Households>,
) -> Result<Response, Rejected> {
    let household_id = require_admin(&member)
        .and_then(|_| require_household(&member))
        .or_redirect(VIEW)?;

    let name = required_text(&form.name, "Room name", 100).or_redirect(VIEW)?;

    let room = Room::create(&state.db, CreateRoom { household_id, name })
        .await
        .or_redirect(VIEW)?;

    info!(room_id = %room.id, household_id = %household_id, "Room added");

    Ok(flash::redirect(VIEW, Flash::success(format!("Room {} added", room.name))))
}

#[derive(Debug, Deserialize)]
pub struct AddPetForm {
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub room_id: Option<Uuid>,
}

pub async fn add_pet(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Form(form), _): ValidForm<AddPetForm, views::Households>,
) -> Result<Response, Rejected> {
    let household_id = require_admin(&member)
        .and_then(|_| require_household(&member))
        .or_redirect(VIEW)?;

    let name = required_text(&form.name, "Pet name", 100).or_redirect(VIEW)?;
    let room_id = room_in_household(&state.db, form.room_id, household_id)
        .await
        .or_redirect(VIEW)?;

    let pet = Pet::create(
        &state.db,
        CreatePet {
            name,
            household_id,
            room_id,
        },
    )
    .await
    .or_redirect(VIEW)?;

    info!(pet_id = %pet.id, household_id = %household_id, "Pet added");

    Ok(flash::redirect(VIEW, Flash::success(format!("{} joined the household", pet.name))))
}

#[derive(Debug, Deserialize)]
pub struct AddDeviceForm {
    pub name: String,
    pub kind: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub room_id: Option<Uuid>,
}

pub async fn add_device(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Form(form), _): ValidForm<AddDeviceForm, views::Households>,
) -> Result<Response, Rejected> {
    let household_id = require_admin(&member)
        .and_then(|_| require_household(&member))
        .or_redirect(VIEW)?;

    let name = required_text(&form.name, "Device name", 100).or_redirect(VIEW)?;
    let kind = parse_choice::<DeviceKind>(&form.kind).or_redirect(VIEW)?;
    let room_id = room_in_household(&state.db, form.room_id, household_id)
        .await
        .or_redirect(VIEW)?;

    let device = Device::create(
        &state.db,
        CreateDevice {
            name,
            kind,
            household_id,
            room_id,
        },
    )
    .await
    .or_redirect(VIEW)?;

    info!(device_id = %device.id, kind = %device.kind, household_id = %household_id, "Device added");

    Ok(flash::redirect(VIEW, Flash::success(format!("Device {} added", device.name))))
}

/// Switches a device on or off
pub async fn toggle_device(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Path(device_id), _): ValidPath<Uuid, views::Households>,
) -> Result<Response, Rejected> {
    let household_id = require_capability(&member, Capability::OperateDevices).or_redirect(VIEW)?;

    let device = Device::toggle(&state.db, device_id, household_id)
        .await
        .or_redirect(VIEW)?
        .ok_or_else(|| ApiError::NotFound("Device not found in your household".to_string()).at(VIEW))?;

    info!(device_id = %device.id, is_on = device.is_on, member_id = %member.id, "Device toggled");

    let state_label = if device.is_on { "on" } else { "off" };
    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("{} is now {}", device.name, state_label)),
    ))
}
