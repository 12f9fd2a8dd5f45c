/// Connected devices (sensors, lamps, thermostats)
///
/// Devices carry a single on/off state. Toggling is a conditional update
/// scoped to the household so a member can never flip another household's
/// device by guessing its id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "device_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Sensor,
    Lamp,
    Thermostat,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Sensor => "sensor",
            DeviceKind::Lamp => "lamp",
            DeviceKind::Thermostat => "thermostat",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sensor" | "capteur" => Ok(DeviceKind::Sensor),
            "lamp" | "lampe" => Ok(DeviceKind::Lamp),
            "thermostat" => Ok(DeviceKind::Thermostat),
            other => Err(format!("Unknown device kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    pub kind: DeviceKind,
    pub is_on: bool,
    pub household_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDevice {
    pub name: String,
    pub kind: DeviceKind,
    pub household_id: Uuid,
    pub room_id: Option<Uuid>,
}

impl Device {
    /// New devices start switched off
    pub async fn create(pool: &PgPool, data: CreateDevice) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Device>(
            r#"
            INSERT INTO devices (name, kind, household_id, room_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, kind, is_on, household_id, room_id, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.kind)
        .bind(data.household_id)
        .bind(data.room_id)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Device>(
            r#"
            SELECT id, name, kind, is_on, household_id, room_id, created_at, updated_at
            FROM devices
            WHERE household_id = $1
            ORDER BY name
            "#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    /// Flips the on/off state
    ///
    /// # Returns
    ///
    /// The updated device, None if no device with this id belongs to the household
    pub async fn toggle(
        pool: &PgPool,
        id: Uuid,
        household_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Device>(
            r#"
            UPDATE devices
            SET is_on = NOT is_on,
                updated_at = NOW()
            WHERE id = $1 AND household_id = $2
            RETURNING id, name, kind, is_on, household_id, room_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(household_id)
        .fetch_optional(pool)
        .await
    }
}
