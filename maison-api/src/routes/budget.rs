/// Budget endpoints
///
/// One budget per period and household; recording an expense charges it to
/// every budget of the household. Amounts are rounded to cents and capped at
/// what a `NUMERIC(10, 2)` column holds. Changes need the budget capability (admins
/// and treasurers); any member of the household can look.

use axum::{extract::State, response::Response, Form};
use axum_extra::extract::WithRejection;
use chrono::{NaiveDate, Utc};
use maison_shared::{
    auth::authorization::{require_capability, Capability},
    models::budget::{Budget, BudgetPeriod, CreateExpense, Expense},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    form::{decimal_field, empty_as_none, parse_choice, required_text},
    views,
};
use crate::{
    app::AppState,
    error::{OrRedirect, Rejected},
    extract::{CurrentMember, ValidForm},
    flash::{self, Flash, IncomingFlash, Page},
};

const VIEW: &str = views::BUDGET;

/// Expenses shown under the budgets
const RECENT_EXPENSES: i64 = 20;

#[derive(Debug, Serialize)]
pub struct BudgetView {
    pub budgets: Vec<Budget>,
    pub recent_expenses: Vec<Expense>,
    pub can_manage: bool,
}

pub async fn show_budget(
    State(state): State<AppState>,
    member: CurrentMember,
    flash: IncomingFlash,
) -> Result<Page<BudgetView>, Rejected> {
    let (budgets, recent_expenses) = match member.household_id {
        Some(household_id) => (
            Budget::list_by_household(&state.db, household_id)
                .await
                .or_redirect(views::TASKS)?,
            Expense::list_recent(&state.db, household_id, RECENT_EXPENSES)
                .await
                .or_redirect(views::TASKS)?,
        ),
        None => (Vec::new(), Vec::new()),
    };

    Ok(Page::new(
        flash,
        BudgetView {
            budgets,
            recent_expenses,
            can_manage: member.role.can_manage_budget(),
        },
    ))
}

#[derive(Debug, Deserialize)]
pub struct SetBudgetForm {
    pub period: String,
    pub total_amount: Decimal,
}

/// Creates or replaces the budget of a period; the remaining amount restarts
/// from the new total
pub async fn set_budget(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Form(form), _): ValidForm<SetBudgetForm, views::Budget>,
) -> Result<Response, Rejected> {
    let household_id = require_capability(&member, Capability::ManageBudget).or_redirect(VIEW)?;

    let period = parse_choice::<BudgetPeriod>(&form.period).or_redirect(VIEW)?;
    let total_amount = decimal_field(form.total_amount, "Budget", true).or_redirect(VIEW)?;

    let budget = Budget::set(&state.db, household_id, period, total_amount)
        .await
        .or_redirect(VIEW)?;

    info!(
        budget_id = %budget.id,
        household_id = %household_id,
        period = budget.period.as_str(),
        set_by = %member.id,
        "Budget set"
    );

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("{} budget set to {}", budget.period.as_str(), budget.total_amount)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    pub description: String,
    pub amount: Decimal,
    /// Defaults to today
    #[serde(default, deserialize_with = "empty_as_none")]
    pub spent_on: Option<NaiveDate>,
}

pub async fn record_expense(
    State(state): State<AppState>,
    member: CurrentMember,
    WithRejection(Form(form), _): ValidForm<ExpenseForm, views::Budget>,
) -> Result<Response, Rejected> {
    let household_id = require_capability(&member, Capability::ManageBudget).or_redirect(VIEW)?;

    let description = required_text(&form.description, "Description", 255).or_redirect(VIEW)?;
    let amount = decimal_field(form.amount, "Amount", false).or_redirect(VIEW)?;

    let expense = Expense::record(
        &state.db,
        CreateExpense {
            description,
            amount,
            spent_on: form.spent_on.unwrap_or_else(|| Utc::now().date_naive()),
            household_id,
            member_id: member.id,
        },
    )
    .await
    .or_redirect(VIEW)?;

    info!(
        expense_id = %expense.id,
        household_id = %household_id,
        amount = %expense.amount,
        member_id = %member.id,
        "Expense recorded"
    );

    Ok(flash::redirect(
        VIEW,
        Flash::success(format!("Expense of {} recorded", expense.amount)),
    ))
}
