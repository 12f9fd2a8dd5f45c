/// Access gate
///
/// Every mutating operation runs through these checks before touching the
/// database:
///
/// 1. **Authenticated**: enforced by the HTTP layer, which only hands a
///    [`Member`] to handlers once the session cookie resolved to a live account
/// 2. **Role**: household administration requires [`Role::Admin`]; other
///    actions need a [`Capability`] the member's role grants
/// 3. **Household scope**: the target's household must equal the member's
///
/// The checks are pure functions of the loaded member, so they are unit
/// tested without a database.
///
/// # Example
///
/// ```
/// use maison_shared::auth::authorization::{require_capability, Capability};
/// # use maison_shared::models::member::Member;
///
/// # fn example(member: &Member) -> Result<(), Box<dyn std::error::Error>> {
/// let household_id = require_capability(member, Capability::EditInventory)?;
/// # Ok(())
/// # }
/// ```

use std::fmt;
use uuid::Uuid;

use crate::models::member::{Member, Role};

/// An action whose permission depends on the member's role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageHousehold,
    ManageBudget,
    EditInventory,
    CompleteTasks,
    OperateDevices,
}

impl Capability {
    pub fn allows(&self, role: Role) -> bool {
        match self {
            Capability::ManageHousehold => role.can_manage_household(),
            Capability::ManageBudget => role.can_manage_budget(),
            Capability::EditInventory => role.can_edit_inventory(),
            Capability::CompleteTasks => role.can_complete_tasks(),
            Capability::OperateDevices => role.can_operate_devices(),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::ManageHousehold => "manage the household",
            Capability::ManageBudget => "manage the budget",
            Capability::EditInventory => "edit the inventory",
            Capability::CompleteTasks => "complete tasks",
            Capability::OperateDevices => "operate devices",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// The role doesn't grant the capability
    #[error("The {role} role cannot {capability}")]
    InsufficientRole { role: Role, capability: Capability },

    /// The member isn't attached to any household
    #[error("You must belong to a household to do this")]
    NoHousehold,

    /// The target belongs to another household (or to none)
    #[error("This belongs to another household")]
    OtherHousehold,
}

/// Requires the member to be an admin
pub fn require_admin(member: &Member) -> Result<(), AuthzError> {
    if member.role.can_manage_household() {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            role: member.role,
            capability: Capability::ManageHousehold,
        })
    }
}

/// Requires the member to belong to a household
///
/// # Returns
///
/// The member's household id
pub fn require_household(member: &Member) -> Result<Uuid, AuthzError> {
    member.household_id.ok_or(AuthzError::NoHousehold)
}

/// Requires the target's household to be the member's household
///
/// A target without a household (detached after a household deletion) is
/// out of scope for everyone.
pub fn require_same_household(
    member: &Member,
    target_household: Option<Uuid>,
) -> Result<Uuid, AuthzError> {
    let household_id = require_household(member)?;

    match target_household {
        Some(target) if target == household_id => Ok(household_id),
        _ => Err(AuthzError::OtherHousehold),
    }
}

/// Requires an admin attached to `household_id`
pub fn require_household_admin(member: &Member, household_id: Uuid) -> Result<(), AuthzError> {
    require_admin(member)?;
    require_same_household(member, Some(household_id)).map(|_| ())
}

/// Requires a household and a role granting `capability`
///
/// # Returns
///
/// The member's household id
pub fn require_capability(member: &Member, capability: Capability) -> Result<Uuid, AuthzError> {
    if !capability.allows(member.role) {
        return Err(AuthzError::InsufficientRole {
            role: member.role,
            capability,
        });
    }

    require_household(member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::tests::member;

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&member(Role::Admin, None)).is_ok());

        let err = require_admin(&member(Role::Treasurer, None)).unwrap_err();
        assert_eq!(
            err,
            AuthzError::InsufficientRole {
                role: Role::Treasurer,
                capability: Capability::ManageHousehold,
            }
        );
        assert_eq!(err.to_string(), "The treasurer role cannot manage the household");
    }

    #[test]
    fn test_require_household() {
        let household = Uuid::new_v4();
        assert_eq!(require_household(&member(Role::Member, Some(household))), Ok(household));
        assert_eq!(
            require_household(&member(Role::Member, None)),
            Err(AuthzError::NoHousehold)
        );
    }

    #[test]
    fn test_require_same_household() {
        let household = Uuid::new_v4();
        let m = member(Role::Member, Some(household));

        assert_eq!(require_same_household(&m, Some(household)), Ok(household));
        assert_eq!(
            require_same_household(&m, Some(Uuid::new_v4())),
            Err(AuthzError::OtherHousehold)
        );
        assert_eq!(require_same_household(&m, None), Err(AuthzError::OtherHousehold));
    }

    #[test]
    fn test_require_household_admin() {
        let household = Uuid::new_v4();

        assert!(require_household_admin(&member(Role::Admin, Some(household)), household).is_ok());
        assert_eq!(
            require_household_admin(&member(Role::Admin, Some(Uuid::new_v4())), household),
            Err(AuthzError::OtherHousehold)
        );
        assert_eq!(
            require_household_admin(&member(Role::Admin, None), household),
            Err(AuthzError::NoHousehold)
        );
        assert!(matches!(
            require_household_admin(&member(Role::Junior, Some(household)), household),
            Err(AuthzError::InsufficientRole { .. })
        ));
    }

    #[test]
    fn test_require_capability() {
        let household = Uuid::new_v4();

        assert_eq!(
            require_capability(&member(Role::Treasurer, Some(household)), Capability::ManageBudget),
            Ok(household)
        );
        assert!(matches!(
            require_capability(&member(Role::Member, Some(household)), Capability::ManageBudget),
            Err(AuthzError::InsufficientRole { .. })
        ));
        assert!(matches!(
            require_capability(&member(Role::Observer, Some(household)), Capability::CompleteTasks),
            Err(AuthzError::InsufficientRole { .. })
        ));
        assert_eq!(
            require_capability(&member(Role::Member, None), Capability::CompleteTasks),
            Err(AuthzError::NoHousehold)
        );
    }
}
