//! Shopping list endpoints
//!
//! Editing lists takes the same capability as editing the inventory.

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};
use axum_extra::extract::WithRejection;
use maison_shared::{
    auth::authorization::{require_capability, Capability},
    models::shopping::{
        CreateShoppingItem, CreateShoppingList, ShoppingItem, ShoppingList, ShoppingStatus,
        MAX_UNIT_LENGTH,
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use super::{
    form::{decimal_field, empty_as_none, required_text},
    views,
};
use crate::{
    app::AppState,
    error::{ApiError, OrRedirect, Rejected},
    extract::{CurrentMember, ValidForm, ValidPath},
    flash::{self, Flash, IncomingFlash, Page},
};

const VIEW: &str = views::SHOPPING;

#[derive(Debug, Serialize)]
pub struct ShoppingListItem {
    #[serde(flatten)]
    pub list: ShoppingList,
    pub items: Vec<ShoppingItem>,
}

#[derive(Debug, Serialize)]
pub struct ShoppingView {
    pub lists: Vec<ShoppingListItem>,
    pub can_edit: bool,
}

pub async fn list_shopping(
    State(state): State<AppState>,
    member: CurrentMember,
    flash: IncomingFlash,
) -> Result<Page<ShoppingView>, Rejected> {
    let can_edit = member.role.can_edit_inventory();
    let Some(household_id) = member.household_id else {
        return Ok(Page::new(flash, ShoppingView { lists: Vec::new(), can_edit }));
    };

    let lists = ShoppingList::list_by_household(&state.db, household_id)
        .await
        .or_redirect(views::TASKS)?;
    let items = ShoppingItem::list_by_household(&state.db, household_id)
        .await
        .or_redirect(views::TASKS)?;

    let mut by_list: HashMap<Uuid, Vec<ShoppingItem>> = HashMap::new();
    for item in items {
        by_list.entry(item.list_id).or_default().push(item);
    }

    let lists = lists
        .into_iter()
        .map(|list| ShoppingListItem {
            items: by_list.remove(&list.id).unwrap_or_default(),
            list,
        })
        .collect();

    Ok(Page::new(flash, ShoppingView { lists, can_edit }))
}

#[derive(Debug, Deserialize)]
pub struct AddListForm {
    pub name: String,
}

pub async fn add_list(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Form(form), _): ValidForm<AddListForm, views::Shopping>,
) -> Result<Response, Rejected> {
    let household_id = require_capability(&member, Capability::EditInventory).or_redirect(VIEW)?;
    let name = required_text(&form.name, "List name", 100).or_redirect(VIEW)?;

    let list = ShoppingList::create(
        &state.db,
        CreateShoppingList {
            name,
            household_id,
            created_by: member.id,
        },
    )
    .await
    .or_redirect(VIEW)?;

    info!(list_id = %list.id, household_id = %household_id, created_by = %member.id, "Shopping list created");

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("List \"{}\" created", list.name)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AddListItemForm {
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit: String,
}

fn bought_list(list: &ShoppingList) -> ApiError {
    ApiError::Validation(format!("\"{}\" was already bought", list.name))
}

pub async fn add_list_item(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Path(list_id), _): ValidPath<Uuid, views::Shopping>,
    WithRejection(Form(form), _): ValidForm<AddListItemForm, views::Shopping>,
) -> Result<Response, Rejected> {
    let household_id = require_capability(&member, Capability::EditInventory).or_redirect(VIEW)?;

    let list = ShoppingList::find_in_household(&state.db, list_id, household_id)
        .await
        .or_redirect(VIEW)?
        .ok_or_else(|| ApiError::NotFound("Shopping list not found".to_string()).at(VIEW))?;
    if list.status == ShoppingStatus::Bought {
        return Err(bought_list(&list).at(VIEW));
    }

    let name = required_text(&form.name, "Item name", 100).or_redirect(VIEW)?;
    let quantity = form
        .quantity
        .map(|quantity| decimal_field(quantity, "Quantity", true))
        .transpose()
        .or_redirect(VIEW)?;
    let unit = match form.unit.trim() {
        "" => None,
        unit => Some(required_text(unit, "Unit", MAX_UNIT_LENGTH).or_redirect(VIEW)?),
    };

    // The list may have been bought since it was loaded
    let item = ShoppingItem::create(
        &state.db,
        CreateShoppingItem {
            list_id: list.id,
            name,
            quantity,
            unit,
        },
    )
    .await
    .or_redirect(VIEW)?
    .ok_or_else(|| bought_list(&list).at(VIEW))?;

    info!(item_id = %item.id, list_id = %list.id, added_by = %member.id, "Shopping item added");

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("{} added to \"{}\"", item.name, list.name)),
    ))
}

pub async fn mark_bought(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Path(list_id), _): ValidPath<Uuid, views::Shopping>,
) -> Result<Response, Rejected> {
    let household_id = require_capability(&member, Capability::EditInventory).or_redirect(VIEW)?;

    let list = ShoppingList::find_in_household(&state.db, list_id, household_id)
        .await
        .or_redirect(VIEW)?
        .ok_or_else(|| ApiError::NotFound("Shopping list not found".to_string()).at(VIEW))?;

    let bought = ShoppingList::mark_bought(&state.db, list.id, household_id)
        .await
        .or_redirect(VIEW)?
        .ok_or_else(|| bought_list(&list).at(VIEW))?;

    info!(list_id = %bought.id, bought_by = %member.id, "Shopping list bought");

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("\"{}\" marked as bought", bought.name)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_bought_list_message_names_the_list() {
        let list = ShoppingList {
            id: Uuid::new_v4(),
            name: "Samedi".to_string(),
            status: ShoppingStatus::Bought,
            household_id: Some(Uuid::new_v4()),
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(bought_list(&list).to_string(), "\"Samedi\" was already bought");
    }
}
