/// Route handlers, one module per area
///
/// - `health`: Health check
/// - `auth`: Login, logout and signup
/// - `invitations`: Issuing and redeeming invitation codes
/// - `households`: Households, rooms, pets and devices
/// - `members`: Member list, role changes, removal
/// - `tasks`: Household chores
/// - `inventory`: Household inventory
/// - `budget`: Budgets and expenses
/// - `shopping`: Shopping lists
///
/// GET handlers return JSON view models wrapped in [`Page`](crate::flash::Page);
/// POST handlers answer with a redirect and a flash message.

pub mod auth;
pub mod budget;
pub mod health;
pub mod households;
pub mod inventory;
pub mod invitations;
pub mod members;
pub mod shopping;
pub mod tasks;

mod form;

/// Views a browser is sent back to after a form post
///
/// Each view is both a path constant and a marker type implementing
/// [`View`](views::View), for extractors that pick their fallback by type.
pub mod views {
    /// A page a rejected request falls back to
    pub trait View {
        const PATH: &'static str;
    }

    macro_rules! views {
        ($($path_const:ident, $marker:ident => $path:literal;)*) => {
            $(
                pub const $path_const: &str = $path;

                #[derive(Debug, Clone, Copy)]
                pub struct $marker;

                impl View for $marker {
                    const PATH: &'static str = $path_const;
                }
            )*
        };
    }

    views! {
        LOGIN, Login => "/accounts/login";
        SIGNUP, Signup => "/inscription";
        JOIN, Join => "/rejoindre";
        HOUSEHOLDS, Households => "/foyers";
        MEMBERS, Members => "/utilisateurs";
        TASKS, Tasks => "/taches";
        INVENTORY, Inventory => "/inventaire";
        BUDGET, Budget => "/budget";
        SHOPPING, Shopping => "/courses";
    }
}
