/// Database models for Maison
///
/// Each model owns its table and exposes typed CRUD as associated functions
/// taking a `&PgPool` (or any executor, for statements that must join a
/// caller's transaction).
///
/// # Models
///
/// - `household`: Households, the scope of every other record
/// - `room`: Rooms of a household
/// - `member`: Member accounts and the `Role` enumeration
/// - `invitation`: Single-use, time-limited invitation codes
/// - `task`: Household chores, their status and assignees
/// - `pet`, `device`: Pets and connected devices
/// - `inventory`: Inventory items with decimal quantities
/// - `budget`: Budgets per period and expenses
/// - `shopping`: Shopping lists and their items
/// - `task_history`: Task completion log and recurrence
/// - `revoked_session`: Sessions ended by logout
///
/// # Example
///
/// ```no_run
/// use maison_shared::models::household::{CreateHousehold, Household};
/// use maison_shared::models::room::{CreateRoom, Room};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let household = Household::create(&pool, CreateHousehold {
///     name: "Maison".to_string(),
///     room_count: None,
/// }).await?;
///
/// Room::create(&pool, CreateRoom {
///     household_id: household.id,
///     name: "Cuisine".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod budget;
pub mod device;
pub mod household;
pub mod inventory;
pub mod invitation;
pub mod member;
pub mod pet;
pub mod revoked_session;
pub mod room;
pub mod shopping;
pub mod task;
pub mod task_history;

use rust_decimal::Decimal;

/// Largest value a `NUMERIC(10, 2)` column holds
pub fn numeric_max() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_max() {
        assert_eq!(numeric_max().to_string(), "99999999.99");
    }
}
