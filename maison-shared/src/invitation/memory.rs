/// In-memory invitation store
///
/// Mirrors the PostgreSQL store's semantics (unique codes, case-insensitive
/// unique emails, all-or-nothing redemption) behind a single async mutex.
/// Used by the service tests and by API tests that run without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::{InvitationStore, NewMember, Redemption};
use super::InvitationError;
use crate::models::invitation::{CreateInvitation, Invitation};
use crate::models::member::Member;

#[derive(Default)]
struct State {
    households: HashSet<Uuid>,
    invitations: Vec<Invitation>,
    members: Vec<Member>,
}

#[derive(Default)]
pub struct MemoryInvitationStore {
    state: Mutex<State>,
}

impl MemoryInvitationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_household(&self, household_id: Uuid) {
        self.state.lock().await.households.insert(household_id);
    }

    /// Registers an existing account, e.g. the issuing admin
    pub async fn add_member(&self, member: Member) {
        self.state.lock().await.members.push(member);
    }

    /// Rewrites an invitation's creation time
    pub async fn backdate(&self, code: &str, created_at: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        if let Some(invitation) = state.invitations.iter_mut().find(|i| i.code == code) {
            invitation.created_at = created_at;
        }
    }

    pub async fn invitation(&self, code: &str) -> Option<Invitation> {
        let state = self.state.lock().await;
        state.invitations.iter().find(|i| i.code == code).cloned()
    }

    pub async fn invitations(&self) -> Vec<Invitation> {
        self.state.lock().await.invitations.clone()
    }

    pub async fn members(&self) -> Vec<Member> {
        self.state.lock().await.members.clone()
    }
}

#[async_trait]
impl InvitationStore for MemoryInvitationStore {
    async fn household_exists(&self, household_id: Uuid) -> Result<bool, InvitationError> {
        Ok(self.state.lock().await.households.contains(&household_id))
    }

    async fn insert(&self, data: CreateInvitation) -> Result<Invitation, InvitationError> {
        let mut state = self.state.lock().await;

        if !state.households.contains(&data.household_id) {
            return Err(InvitationError::NotFound);
        }
        if state.invitations.iter().any(|i| i.code == data.code) {
            return Err(InvitationError::CodeCollision);
        }

        let invitation = Invitation {
            id: Uuid::new_v4(),
            code: data.code,
            household_id: data.household_id,
            role: data.role,
            created_by: Some(data.created_by),
            created_at: Utc::now(),
            used: false,
            used_at: None,
            used_by: None,
        };
        state.invitations.push(invitation.clone());

        Ok(invitation)
    }

    async fn find_redeemable(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Invitation, InvitationError> {
        let state = self.state.lock().await;

        let invitation = state
            .invitations
            .iter()
            .find(|i| i.code == code && !i.used)
            .ok_or(InvitationError::InvalidCode)?;

        if !invitation.is_valid_at(now) {
            return Err(InvitationError::ExpiredOrUsed);
        }

        Ok(invitation.clone())
    }

    async fn redeem(
        &self,
        code: &str,
        member: NewMember,
        now: DateTime<Utc>,
    ) -> Result<Redemption, InvitationError> {
        let mut state = self.state.lock().await;

        let index = state
            .invitations
            .iter()
            .position(|i| i.code == code && !i.used)
            .ok_or(InvitationError::InvalidCode)?;

        let invitation = state.invitations[index].clone();
        if !invitation.is_valid_at(now) {
            return Err(InvitationError::ExpiredOrUsed);
        }

        if state
            .members
            .iter()
            .any(|m| m.email.eq_ignore_ascii_case(&member.email))
        {
            return Err(InvitationError::EmailAlreadyInUse);
        }

        let created = Member {
            id: Uuid::new_v4(),
            username: member.email.clone(),
            email: member.email,
            display_name: member.display_name,
            password_hash: member.password_hash,
            role: invitation.role,
            household_id: Some(invitation.household_id),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        let stored = &mut state.invitations[index];
        stored.used = true;
        stored.used_at = Some(now);
        stored.used_by = Some(created.id);
        state.members.push(created.clone());

        Ok(Redemption {
            member: created,
            invitation,
        })
    }
}
