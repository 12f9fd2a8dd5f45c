//! Inventory endpoints: what the household has in stock

use axum::{extract::State, response::Response, Form};
use axum_extra::extract::WithRejection;
use maison_shared::{
    auth::authorization::{require_capability, Capability},
    models::{
        inventory::{CreateInventoryItem, InventoryItem},
        room::Room,
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{
    form::{decimal_field, empty_as_none, required_text, room_in_household},
    views,
};
use crate::{
    app::AppState,
    error::{OrRedirect, Rejected},
    extract::{CurrentMember, ValidForm},
    flash::{self, Flash, IncomingFlash, Page},
};

const VIEW: &str = views::INVENTORY;

#[derive(Debug, Serialize)]
pub struct InventoryView {
    pub items: Vec<InventoryItem>,
    pub rooms: Vec<Room>,
    pub can_edit: bool,
}

pub async fn list_inventory(
    State(state): State<AppState>,
    member: CurrentMember,
    flash: IncomingFlash,
) -> Result<Page<InventoryView>, Rejected> {
    let (items, rooms) = match member.household_id {
        Some(household_id) => (
            InventoryItem::list_by_household(&state.db, household_id)
                .await
                .or_redirect(views::TASKS)?,
            Room::list_by_household(&state.db, household_id)
                .await
                .or_redirect(views::TASKS)?,
        ),
        None => (Vec::new(), Vec::new()),
    };

    Ok(Page::new(
        flash,
        InventoryView {
            items,
            rooms,
            can_edit: member.role.can_edit_inventory(),
        },
    ))
}

#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    pub name: String,
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub room_id: Option<Uuid>,
}

pub async fn add_item(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Form(form), _): ValidForm<AddItemForm, views::Inventory>,
) -> Result<Response, Rejected> {
    let household_id = require_capability(&member, Capability::EditInventory).or_redirect(VIEW)?;

    let name = required_text(&form.name, "Item name", 100).or_redirect(VIEW)?;
    let quantity = decimal_field(form.quantity, "Quantity", true).or_redirect(VIEW)?;
    let room_id = room_in_household(&state.db, form.room_id, household_id)
        .await
        .or_redirect(VIEW)?;

    let item = InventoryItem::create(
        &state.db,
        CreateInventoryItem {
            name,
            quantity,
            household_id,
            room_id,
        },
    )
    .await
    .or_redirect(VIEW)?;

    info!(item_id = %item.id, household_id = %household_id, added_by = %member.id, "Inventory item added");

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("{} × {} added", item.quantity, item.name)),
    ))
}
