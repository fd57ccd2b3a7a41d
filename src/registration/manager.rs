/// Registration lifecycle manager
///
/// Create and evolve registrations for events, enforcing event-level
/// constraints and team-composition rules. The capacity check and the
/// insert share one transaction; the unique (event_id, leader_id) index is
/// the storage-level backstop for duplicate races.

use crate::{
    account::{Role, ValidatedSession},
    db::account::Account,
    error::{ApiError, ApiResult, FieldError},
    event::{Event, EventManager, EventStatus, FieldKind, RegistrationMode},
    registration::{
        AddMembersRequest, Answer, AnswerValue, CreateRegistrationRequest, InviteAction,
        InviteStatus, Member, MemberIdentity, MemberInvite, MemberRole, Registration,
        RegistrationFilter, RegistrationStatus,
    },
};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Registration manager service
pub struct RegistrationManager {
    db: SqlitePool,
}

impl RegistrationManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a registration for an event
    pub async fn create(
        &self,
        caller: &ValidatedSession,
        event_id: &str,
        req: CreateRegistrationRequest,
    ) -> ApiResult<Registration> {
        let event = self.fetch_event(event_id).await?;

        if !matches!(event.status, EventStatus::Published | EventStatus::Ongoing) {
            return Err(ApiError::InvalidState(
                "registration is not open for this event".to_string(),
            ));
        }
        if !event.registration_open {
            return Err(ApiError::InvalidState(
                "registration is closed for this event".to_string(),
            ));
        }
        let now = Utc::now();
        if now < event.registration_start_at {
            return Err(ApiError::InvalidState(
                "registration has not started yet".to_string(),
            ));
        }
        if now > event.registration_end_at {
            return Err(ApiError::InvalidState(
                "registration deadline has passed".to_string(),
            ));
        }

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM registration WHERE event_id = ?1 AND leader_id = ?2",
        )
        .bind(&event.id)
        .bind(&caller.account_id)
        .fetch_one(&self.db)
        .await
        .map_err(ApiError::Database)?;
        if existing > 0 {
            return Err(ApiError::Conflict(
                "already registered for this event".to_string(),
            ));
        }

        // The leader is always the first member, auto-added and immutable
        let leader = self.account(&caller.account_id).await?;
        let mut members = vec![Member {
            id: Uuid::new_v4().to_string(),
            identity: MemberIdentity::Resolved {
                account_id: leader.id.clone(),
                name: leader.name.clone(),
                email: leader.email.clone(),
            },
            role: MemberRole::Leader,
            invite_status: InviteStatus::AutoAdded,
            invited_at: now,
            responded_at: None,
        }];

        let team_name = match event.mode {
            RegistrationMode::Team => {
                let name = req.team_name.as_deref().map(str::trim).unwrap_or("");
                if name.is_empty() {
                    return Err(ApiError::Fields(vec![FieldError::new(
                        "team_name",
                        "team name is required for team events",
                    )]));
                }

                self.append_members(&mut members, &req.member_ids, &req.member_invites, now)
                    .await?;

                let (min, max) = event.team_bounds();
                if members.len() < min as usize {
                    return Err(ApiError::Validation(format!(
                        "team must have at least {} members",
                        min
                    )));
                }
                if members.len() > max as usize {
                    return Err(ApiError::Validation(format!(
                        "team cannot have more than {} members",
                        max
                    )));
                }

                Some(name.to_string())
            }
            // Individual registrations carry no team fields
            RegistrationMode::Individual => None,
        };

        let answers = Self::process_answers(&event, req.answers)?;

        let id = Uuid::new_v4().to_string();
        let mut tx = self.db.begin().await.map_err(ApiError::Database)?;

        if let Some(max_teams) = event.max_teams {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM registration
                 WHERE event_id = ?1 AND status IN ('pending', 'confirmed')",
            )
            .bind(&event.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(ApiError::Database)?;
            if count >= max_teams as i64 {
                return Err(ApiError::Capacity(
                    "event has reached its registration capacity".to_string(),
                ));
            }
        }

        sqlx::query(
            "INSERT INTO registration (id, event_id, leader_id, mode, team_name, status,
                 members, answers, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&id)
        .bind(&event.id)
        .bind(&caller.account_id)
        .bind(event.mode.as_str())
        .bind(&team_name)
        .bind(RegistrationStatus::Pending.as_str())
        .bind(Self::to_json(&members)?)
        .bind(Self::to_json(&answers)?)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return ApiError::Conflict("already registered for this event".to_string());
                }
            }
            ApiError::Database(e)
        })?;

        tx.commit().await.map_err(ApiError::Database)?;

        self.fetch(&id).await
    }

    /// Accept or decline an invitation
    pub async fn respond(
        &self,
        caller: &ValidatedSession,
        registration_id: &str,
        action: InviteAction,
    ) -> ApiResult<Registration> {
        let mut reg = self.fetch(registration_id).await?;

        if reg.status.is_terminal() {
            return Err(ApiError::InvalidState(format!(
                "registration is {}",
                reg.status.as_str()
            )));
        }

        let idx = reg
            .members
            .iter()
            .position(|m| m.identity.account_id() == Some(caller.account_id.as_str()))
            .ok_or_else(|| {
                ApiError::NotFound("No invitation found for this account".to_string())
            })?;

        if reg.members[idx].invite_status != InviteStatus::Invited {
            return Err(ApiError::Conflict(format!(
                "invitation is already {}",
                reg.members[idx].invite_status.as_str()
            )));
        }

        let now = Utc::now();
        reg.members[idx].invite_status = match action {
            InviteAction::Accept => InviteStatus::Accepted,
            InviteAction::Decline => InviteStatus::Declined,
        };
        reg.members[idx].responded_at = Some(now);

        // Promotion is one-way: pending -> confirmed when the accepted count
        // first enters the configured bounds
        if action == InviteAction::Accept && reg.status == RegistrationStatus::Pending {
            let event = self.fetch_event(&reg.event_id).await?;
            let (min, max) = event.team_bounds();
            let accepted = reg.accepted_count();
            if accepted >= min as usize && accepted <= max as usize {
                reg.status = RegistrationStatus::Confirmed;
            }
        }

        reg.updated_at = now;
        self.persist(&reg).await?;
        Ok(reg)
    }

    /// Add members to a team registration. Leader only; the whole operation
    /// is rejected if it would push the team past its maximum size.
    pub async fn add_members(
        &self,
        caller: &ValidatedSession,
        registration_id: &str,
        req: AddMembersRequest,
    ) -> ApiResult<(Registration, Vec<Member>)> {
        let mut reg = self.fetch(registration_id).await?;
        self.authorize_leader(caller, &reg)?;

        if reg.status.is_terminal() {
            return Err(ApiError::InvalidState(format!(
                "registration is {}",
                reg.status.as_str()
            )));
        }
        if reg.mode != RegistrationMode::Team {
            return Err(ApiError::InvalidState(
                "not a team registration".to_string(),
            ));
        }

        let event = self.fetch_event(&reg.event_id).await?;
        let now = Utc::now();
        let before = reg.members.len();

        self.append_members(&mut reg.members, &req.member_ids, &req.member_invites, now)
            .await?;

        let (_, max) = event.team_bounds();
        if reg.members.len() > max as usize {
            return Err(ApiError::Validation(format!(
                "team cannot have more than {} members",
                max
            )));
        }

        let added = reg.members[before..].to_vec();
        reg.updated_at = now;
        self.persist(&reg).await?;
        Ok((reg, added))
    }

    /// Remove a member from a team registration. The leader entry can never
    /// be removed; removing an accepted member must not drop the accepted
    /// count below the minimum.
    pub async fn remove_member(
        &self,
        caller: &ValidatedSession,
        registration_id: &str,
        member_id: &str,
    ) -> ApiResult<Registration> {
        let mut reg = self.fetch(registration_id).await?;
        self.authorize_leader(caller, &reg)?;

        if reg.status.is_terminal() {
            return Err(ApiError::InvalidState(format!(
                "registration is {}",
                reg.status.as_str()
            )));
        }

        let idx = reg
            .members
            .iter()
            .position(|m| m.id == member_id)
            .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

        if reg.members[idx].role == MemberRole::Leader {
            return Err(ApiError::Validation(
                "the team leader cannot be removed".to_string(),
            ));
        }

        if reg.members[idx].invite_status.is_accepted() {
            let event = self.fetch_event(&reg.event_id).await?;
            let (min, _) = event.team_bounds();
            if reg.accepted_count() <= min as usize {
                return Err(ApiError::Validation(format!(
                    "team must have at least {} accepted members",
                    min
                )));
            }
        }

        reg.members.remove(idx);
        reg.updated_at = Utc::now();
        self.persist(&reg).await?;
        Ok(reg)
    }

    /// Cancel a registration (soft delete). Allowed for the leader, any
    /// member, or an administrator.
    pub async fn cancel(
        &self,
        caller: &ValidatedSession,
        registration_id: &str,
    ) -> ApiResult<Registration> {
        let mut reg = self.fetch(registration_id).await?;

        let allowed = caller.role.can_act_as(Role::Admin)
            || reg.leader_id == caller.account_id
            || reg.member_for_account(&caller.account_id).is_some();
        if !allowed {
            return Err(ApiError::Forbidden(
                "Only the team, its leader, or an administrator can cancel this registration"
                    .to_string(),
            ));
        }

        if reg.status.is_terminal() {
            return Err(ApiError::InvalidState(format!(
                "registration is already {}",
                reg.status.as_str()
            )));
        }

        reg.status = RegistrationStatus::Cancelled;
        reg.updated_at = Utc::now();
        self.persist(&reg).await?;
        Ok(reg)
    }

    /// Get a registration; visible to the event organizer, the leader,
    /// accepted members, and administrators
    pub async fn get(
        &self,
        caller: &ValidatedSession,
        registration_id: &str,
    ) -> ApiResult<Registration> {
        let reg = self.fetch(registration_id).await?;
        if !self.can_view(caller, &reg).await? {
            return Err(ApiError::Forbidden(
                "Not allowed to view this registration".to_string(),
            ));
        }
        Ok(reg)
    }

    /// List registrations, filterable by event and status, narrowed to what
    /// the caller may see
    pub async fn list(
        &self,
        caller: &ValidatedSession,
        filter: &RegistrationFilter,
    ) -> ApiResult<Vec<Registration>> {
        let rows = if let Some(event_id) = &filter.event_id {
            sqlx::query(
                "SELECT r.*, e.organizer_id AS event_organizer_id
                 FROM registration r JOIN event e ON e.id = r.event_id
                 WHERE r.event_id = ?1 ORDER BY r.created_at",
            )
            .bind(event_id)
            .fetch_all(&self.db)
            .await
            .map_err(ApiError::Database)?
        } else {
            sqlx::query(
                "SELECT r.*, e.organizer_id AS event_organizer_id
                 FROM registration r JOIN event e ON e.id = r.event_id
                 ORDER BY r.created_at",
            )
            .fetch_all(&self.db)
            .await
            .map_err(ApiError::Database)?
        };

        let is_admin = caller.role.can_act_as(Role::Admin);
        let mut out = Vec::new();
        for row in &rows {
            let reg = Self::from_row(row)?;
            if let Some(status) = filter.status {
                if reg.status != status {
                    continue;
                }
            }

            let organizer_id: String = row.get("event_organizer_id");
            let visible = is_admin
                || organizer_id == caller.account_id
                || reg.leader_id == caller.account_id
                || reg.is_accepted_member(&caller.account_id);
            if visible {
                out.push(reg);
            }
        }

        Ok(out)
    }

    fn authorize_leader(&self, caller: &ValidatedSession, reg: &Registration) -> ApiResult<()> {
        if reg.leader_id != caller.account_id {
            return Err(ApiError::Forbidden(
                "Only the team leader can manage members".to_string(),
            ));
        }
        Ok(())
    }

    async fn can_view(&self, caller: &ValidatedSession, reg: &Registration) -> ApiResult<bool> {
        if caller.role.can_act_as(Role::Admin)
            || reg.leader_id == caller.account_id
            || reg.is_accepted_member(&caller.account_id)
        {
            return Ok(true);
        }

        let organizer_id: Option<String> =
            sqlx::query_scalar("SELECT organizer_id FROM event WHERE id = ?1")
                .bind(&reg.event_id)
                .fetch_optional(&self.db)
                .await
                .map_err(ApiError::Database)?;
        Ok(organizer_id.as_deref() == Some(caller.account_id.as_str()))
    }

    /// Resolve and append member specs: account ids must resolve; email
    /// invites resolve by email when possible and otherwise stay provisional.
    /// Entries already present (including the leader) are skipped.
    async fn append_members(
        &self,
        members: &mut Vec<Member>,
        member_ids: &[String],
        member_invites: &[MemberInvite],
        now: DateTime<Utc>,
    ) -> ApiResult<()> {
        for account_id in member_ids {
            if members
                .iter()
                .any(|m| m.identity.account_id() == Some(account_id.as_str()))
            {
                continue;
            }
            let account = self.account(account_id).await.map_err(|_| {
                ApiError::NotFound(format!("Member account {} not found", account_id))
            })?;
            members.push(Self::invited_member(account, now));
        }

        for invite in member_invites {
            let email = invite.email.trim().to_lowercase();
            if email.is_empty() || members.iter().any(|m| m.identity.email().eq_ignore_ascii_case(&email)) {
                continue;
            }
            match self.account_by_email(&email).await? {
                Some(account) => {
                    if members
                        .iter()
                        .any(|m| m.identity.account_id() == Some(account.id.as_str()))
                    {
                        continue;
                    }
                    members.push(Self::invited_member(account, now));
                }
                None => members.push(Member {
                    id: Uuid::new_v4().to_string(),
                    identity: MemberIdentity::Pending {
                        name: invite.name.clone(),
                        email,
                    },
                    role: MemberRole::Member,
                    invite_status: InviteStatus::PendingRegistration,
                    invited_at: now,
                    responded_at: None,
                }),
            }
        }

        Ok(())
    }

    fn invited_member(account: Account, now: DateTime<Utc>) -> Member {
        Member {
            id: Uuid::new_v4().to_string(),
            identity: MemberIdentity::Resolved {
                account_id: account.id,
                name: account.name,
                email: account.email,
            },
            role: MemberRole::Member,
            invite_status: InviteStatus::Invited,
            invited_at: now,
            responded_at: None,
        }
    }

    /// Match submitted answers against the event's form fields. Unknown
    /// field ids are dropped silently; matched values are coerced into the
    /// slot of the field's declared kind and keep a label snapshot.
    fn process_answers(
        event: &Event,
        submissions: Vec<crate::registration::AnswerSubmission>,
    ) -> ApiResult<Vec<Answer>> {
        let mut answers: Vec<Answer> = Vec::new();
        let mut errors: Vec<FieldError> = Vec::new();

        for submission in submissions {
            let Some(field) = event.field(&submission.field_id) else {
                continue;
            };
            if answers.iter().any(|a| a.field_id == field.id) {
                continue;
            }
            match Self::coerce_value(&field.kind, &submission.value) {
                Ok(value) => answers.push(Answer {
                    field_id: field.id.clone(),
                    label: field.label.clone(),
                    value,
                }),
                Err(message) => errors.push(FieldError::new(field.id.clone(), message)),
            }
        }

        for field in &event.form_fields {
            if field.required
                && !answers.iter().any(|a| a.field_id == field.id)
                && !errors.iter().any(|e| e.field == field.id)
            {
                errors.push(FieldError::new(
                    field.id.clone(),
                    format!("'{}' is required", field.label),
                ));
            }
        }

        if !errors.is_empty() {
            return Err(ApiError::Fields(errors));
        }
        Ok(answers)
    }

    fn coerce_value(kind: &FieldKind, value: &serde_json::Value) -> Result<AnswerValue, String> {
        match kind {
            FieldKind::Text => value
                .as_str()
                .map(|s| AnswerValue::Text(s.to_string()))
                .ok_or_else(|| "expected text".to_string()),
            FieldKind::Number => value
                .as_f64()
                .map(AnswerValue::Number)
                .ok_or_else(|| "expected a number".to_string()),
            FieldKind::Date => value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| AnswerValue::Date(dt.with_timezone(&Utc)))
                .ok_or_else(|| "expected an RFC 3339 date".to_string()),
            FieldKind::Select { options } => {
                let pick = value
                    .as_str()
                    .ok_or_else(|| "expected one of the listed options".to_string())?;
                if options.iter().any(|o| o == pick) {
                    Ok(AnswerValue::Text(pick.to_string()))
                } else {
                    Err(format!("'{}' is not a listed option", pick))
                }
            }
            FieldKind::Checkbox { options } => {
                let picks: Vec<String> = match value {
                    serde_json::Value::String(s) => vec![s.clone()],
                    serde_json::Value::Array(items) => items
                        .iter()
                        .map(|v| {
                            v.as_str()
                                .map(str::to_string)
                                .ok_or_else(|| "expected option names".to_string())
                        })
                        .collect::<Result<_, _>>()?,
                    _ => return Err("expected one or more of the listed options".to_string()),
                };
                for pick in &picks {
                    if !options.contains(pick) {
                        return Err(format!("'{}' is not a listed option", pick));
                    }
                }
                Ok(AnswerValue::Text(picks.join(", ")))
            }
        }
    }

    async fn fetch(&self, id: &str) -> ApiResult<Registration> {
        let row = sqlx::query("SELECT * FROM registration WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;

        Self::from_row(&row)
    }

    async fn fetch_event(&self, id: &str) -> ApiResult<Event> {
        let row = sqlx::query("SELECT * FROM event WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

        EventManager::from_row(&row)
    }

    async fn account(&self, id: &str) -> ApiResult<Account> {
        sqlx::query_as::<_, Account>(
            "SELECT id, name, email, password_hash, role, department, phone, created_at
             FROM account WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))
    }

    async fn account_by_email(&self, email: &str) -> ApiResult<Option<Account>> {
        sqlx::query_as::<_, Account>(
            "SELECT id, name, email, password_hash, role, department, phone, created_at
             FROM account WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)
    }

    async fn persist(&self, reg: &Registration) -> ApiResult<()> {
        sqlx::query(
            "UPDATE registration SET status = ?1, team_name = ?2, members = ?3, answers = ?4,
                 updated_at = ?5
             WHERE id = ?6",
        )
        .bind(reg.status.as_str())
        .bind(&reg.team_name)
        .bind(Self::to_json(&reg.members)?)
        .bind(Self::to_json(&reg.answers)?)
        .bind(reg.updated_at)
        .bind(&reg.id)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        Ok(())
    }

    fn to_json<T: serde::Serialize>(value: &T) -> ApiResult<String> {
        serde_json::to_string(value)
            .map_err(|e| ApiError::Internal(format!("Serialization failed: {}", e)))
    }

    fn from_row(row: &SqliteRow) -> ApiResult<Registration> {
        let mode: String = row.get("mode");
        let status: String = row.get("status");
        let members: String = row.get("members");
        let answers: String = row.get("answers");

        Ok(Registration {
            id: row.get("id"),
            event_id: row.get("event_id"),
            leader_id: row.get("leader_id"),
            mode: RegistrationMode::from_str(&mode)?,
            team_name: row.get("team_name"),
            status: RegistrationStatus::from_str(&status)?,
            members: serde_json::from_str(&members)
                .map_err(|e| ApiError::Internal(format!("Corrupt member list: {}", e)))?,
            answers: serde_json::from_str(&answers)
                .map_err(|e| ApiError::Internal(format!("Corrupt answer list: {}", e)))?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::event::{CreateEventRequest, FormFieldSpec, UpdateEventRequest};
    use chrono::Duration;

    struct Harness {
        pool: SqlitePool,
        events: EventManager,
        regs: RegistrationManager,
    }

    async fn harness() -> Harness {
        let pool = db::test_pool().await;
        Harness {
            events: EventManager::new(pool.clone()),
            regs: RegistrationManager::new(pool.clone()),
            pool,
        }
    }

    async fn seed_account(pool: &SqlitePool, name: &str, email: &str) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO account (id, name, email, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, 'x', 'student', ?4)",
        )
        .bind(&id)
        .bind(name)
        .bind(email)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
        id
    }

    fn session(account_id: &str) -> ValidatedSession {
        ValidatedSession {
            account_id: account_id.to_string(),
            session_id: "test-session".to_string(),
            role: Role::Student,
        }
    }

    fn organizer(account_id: &str) -> ValidatedSession {
        ValidatedSession {
            account_id: account_id.to_string(),
            session_id: "test-session".to_string(),
            role: Role::Organizer,
        }
    }

    fn event_request(mode: RegistrationMode) -> CreateEventRequest {
        let now = Utc::now();
        CreateEventRequest {
            title: "Robotics Derby".to_string(),
            description: "Annual robotics contest".to_string(),
            category: "technical".to_string(),
            venue: "Workshop block".to_string(),
            start_at: now + Duration::days(7),
            end_at: now + Duration::days(8),
            organization_id: None,
            registration_start_at: now - Duration::hours(1),
            registration_end_at: now + Duration::days(6),
            mode,
            min_team_size: None,
            max_team_size: None,
            max_teams: None,
            form_fields: vec![],
        }
    }

    async fn publish(h: &Harness, organizer_id: &str, req: CreateEventRequest) -> Event {
        let caller = organizer(organizer_id);
        let event = h.events.create(&caller, req).await.unwrap();
        h.events
            .transition(&caller, &event.id, EventStatus::Published)
            .await
            .unwrap()
    }

    async fn team_event(h: &Harness, organizer_id: &str, min: u32, max: u32) -> Event {
        let mut req = event_request(RegistrationMode::Team);
        req.min_team_size = Some(min);
        req.max_team_size = Some(max);
        publish(h, organizer_id, req).await
    }

    fn team_request(name: &str, member_ids: Vec<String>) -> CreateRegistrationRequest {
        CreateRegistrationRequest {
            team_name: Some(name.to_string()),
            member_ids,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_team_below_minimum_rejected() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let err = h
            .regs
            .create(&session(&leader), &event.id, team_request("Bitwise", vec![]))
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(msg) => assert!(msg.contains("at least 2")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_team_create_pending_with_invited_member() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![mate.clone()]),
            )
            .await
            .unwrap();

        assert_eq!(reg.status, RegistrationStatus::Pending);
        assert_eq!(reg.members.len(), 2);
        assert_eq!(reg.members[0].role, MemberRole::Leader);
        assert_eq!(reg.members[0].invite_status, InviteStatus::AutoAdded);
        assert_eq!(reg.members[0].identity.account_id(), Some(leader.as_str()));
        assert_eq!(reg.members[1].invite_status, InviteStatus::Invited);
        assert_eq!(reg.members[1].identity.account_id(), Some(mate.as_str()));
    }

    #[tokio::test]
    async fn test_acceptance_confirms_team() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![mate.clone()]),
            )
            .await
            .unwrap();

        let reg = h
            .regs
            .respond(&session(&mate), &reg.id, InviteAction::Accept)
            .await
            .unwrap();
        assert_eq!(reg.status, RegistrationStatus::Confirmed);
        assert_eq!(reg.accepted_count(), 2);

        let member = reg.member_for_account(&mate).unwrap();
        assert_eq!(member.invite_status, InviteStatus::Accepted);
        assert!(member.responded_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        h.regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![mate.clone()]),
            )
            .await
            .unwrap();

        let err = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise Again", vec![mate]),
            )
            .await
            .unwrap_err();
        match err {
            ApiError::Conflict(msg) => assert!(msg.contains("already registered")),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deadline_passed_rejected() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;

        let now = Utc::now();
        let mut req = event_request(RegistrationMode::Individual);
        req.registration_start_at = now - Duration::days(2);
        req.registration_end_at = now - Duration::hours(1);
        req.start_at = now + Duration::days(1);
        req.end_at = now + Duration::days(2);
        let event = publish(&h, &org, req).await;

        let err = h
            .regs
            .create(&session(&leader), &event.id, Default::default())
            .await
            .unwrap_err();
        match err {
            ApiError::InvalidState(msg) => assert!(msg.contains("deadline")),
            other => panic!("expected invalid state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_registration_not_started_rejected() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;

        let now = Utc::now();
        let mut req = event_request(RegistrationMode::Individual);
        req.registration_start_at = now + Duration::days(1);
        req.registration_end_at = now + Duration::days(2);
        req.start_at = now + Duration::days(3);
        req.end_at = now + Duration::days(4);
        let event = publish(&h, &org, req).await;

        let err = h
            .regs
            .create(&session(&leader), &event.id, Default::default())
            .await
            .unwrap_err();
        match err {
            ApiError::InvalidState(msg) => assert!(msg.contains("not started")),
            other => panic!("expected invalid state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_draft_event_rejects_registration() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;

        let event = h
            .events
            .create(&organizer(&org), event_request(RegistrationMode::Individual))
            .await
            .unwrap();

        let err = h
            .regs
            .create(&session(&leader), &event.id, Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_closed_flag_rejects_registration() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let event = publish(&h, &org, event_request(RegistrationMode::Individual)).await;

        h.events
            .update(
                &organizer(&org),
                &event.id,
                UpdateEventRequest {
                    registration_open: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = h
            .regs
            .create(&session(&leader), &event.id, Default::default())
            .await
            .unwrap_err();
        match err {
            ApiError::InvalidState(msg) => assert!(msg.contains("closed")),
            other => panic!("expected invalid state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_event_not_found() {
        let h = harness().await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;

        let err = h
            .regs
            .create(&session(&leader), "no-such-event", Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_capacity_cap_enforced() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let first = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let second = seed_account(&h.pool, "Marco", "marco@campus.edu").await;

        let mut req = event_request(RegistrationMode::Individual);
        req.max_teams = Some(1);
        let event = publish(&h, &org, req).await;

        h.regs
            .create(&session(&first), &event.id, Default::default())
            .await
            .unwrap();
        let err = h
            .regs
            .create(&session(&second), &event.id, Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Capacity(_)));

        // Cancelled registrations free capacity
        let reg = h
            .regs
            .list(
                &session(&first),
                &RegistrationFilter {
                    event_id: Some(event.id.clone()),
                    status: None,
                },
            )
            .await
            .unwrap()
            .remove(0);
        h.regs.cancel(&session(&first), &reg.id).await.unwrap();
        h.regs
            .create(&session(&second), &event.id, Default::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_second_response_conflicts() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![mate.clone()]),
            )
            .await
            .unwrap();

        h.regs
            .respond(&session(&mate), &reg.id, InviteAction::Accept)
            .await
            .unwrap();
        let err = h
            .regs
            .respond(&session(&mate), &reg.id, InviteAction::Accept)
            .await
            .unwrap_err();
        match err {
            ApiError::Conflict(msg) => assert!(msg.contains("already accepted")),
            other => panic!("expected conflict, got {:?}", other),
        }

        // The leader's auto-added entry cannot be responded to either
        let err = h
            .regs
            .respond(&session(&leader), &reg.id, InviteAction::Accept)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_decline_does_not_confirm() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![mate.clone()]),
            )
            .await
            .unwrap();

        let reg = h
            .regs
            .respond(&session(&mate), &reg.id, InviteAction::Decline)
            .await
            .unwrap();
        assert_eq!(reg.status, RegistrationStatus::Pending);
        assert_eq!(reg.accepted_count(), 1);
        assert_eq!(
            reg.member_for_account(&mate).unwrap().invite_status,
            InviteStatus::Declined
        );
    }

    #[tokio::test]
    async fn test_confirmed_never_reverts() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let a = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let b = seed_account(&h.pool, "Nadia", "nadia@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![a.clone(), b.clone()]),
            )
            .await
            .unwrap();

        let reg = h
            .regs
            .respond(&session(&a), &reg.id, InviteAction::Accept)
            .await
            .unwrap();
        assert_eq!(reg.status, RegistrationStatus::Confirmed);

        let reg = h
            .regs
            .respond(&session(&b), &reg.id, InviteAction::Accept)
            .await
            .unwrap();
        assert_eq!(reg.status, RegistrationStatus::Confirmed);

        // Removing an accepted member above the minimum keeps the status
        let member_id = reg.member_for_account(&b).unwrap().id.clone();
        let reg = h
            .regs
            .remove_member(&session(&leader), &reg.id, &member_id)
            .await
            .unwrap();
        assert_eq!(reg.status, RegistrationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_unknown_email_invite_stays_provisional() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let req = CreateRegistrationRequest {
            team_name: Some("Bitwise".to_string()),
            member_invites: vec![MemberInvite {
                email: "Ravi@Campus.edu".to_string(),
                name: "Ravi".to_string(),
            }],
            ..Default::default()
        };
        let reg = h.regs.create(&session(&leader), &event.id, req).await.unwrap();

        let member = &reg.members[1];
        assert_eq!(member.invite_status, InviteStatus::PendingRegistration);
        assert_eq!(member.identity.account_id(), None);
        assert_eq!(member.identity.email(), "ravi@campus.edu");
    }

    #[tokio::test]
    async fn test_email_invite_resolves_existing_account() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let req = CreateRegistrationRequest {
            team_name: Some("Bitwise".to_string()),
            member_invites: vec![MemberInvite {
                email: "marco@campus.edu".to_string(),
                name: "Marco".to_string(),
            }],
            ..Default::default()
        };
        let reg = h.regs.create(&session(&leader), &event.id, req).await.unwrap();

        assert_eq!(reg.members[1].invite_status, InviteStatus::Invited);
        assert_eq!(reg.members[1].identity.account_id(), Some(mate.as_str()));
    }

    #[tokio::test]
    async fn test_leader_id_in_member_list_skipped() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![leader.clone(), mate.clone(), mate.clone()]),
            )
            .await
            .unwrap();

        assert_eq!(reg.members.len(), 2);
        assert_eq!(reg.members[0].identity.account_id(), Some(leader.as_str()));
    }

    #[tokio::test]
    async fn test_team_name_required() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let req = CreateRegistrationRequest {
            team_name: Some("   ".to_string()),
            member_ids: vec![mate],
            ..Default::default()
        };
        let err = h.regs.create(&session(&leader), &event.id, req).await.unwrap_err();
        match err {
            ApiError::Fields(fields) => assert_eq!(fields[0].field, "team_name"),
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cannot_remove_last_accepted_member() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![mate.clone()]),
            )
            .await
            .unwrap();
        let reg = h
            .regs
            .respond(&session(&mate), &reg.id, InviteAction::Accept)
            .await
            .unwrap();

        let member_id = reg.member_for_account(&mate).unwrap().id.clone();
        let err = h
            .regs
            .remove_member(&session(&leader), &reg.id, &member_id)
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(msg) => assert!(msg.contains("at least 2 accepted")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remove_invited_member_allowed_at_minimum() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![mate.clone()]),
            )
            .await
            .unwrap();

        // Still invited, so removable even though the team drops below min
        let member_id = reg.member_for_account(&mate).unwrap().id.clone();
        let reg = h
            .regs
            .remove_member(&session(&leader), &reg.id, &member_id)
            .await
            .unwrap();
        assert_eq!(reg.members.len(), 1);
    }

    #[tokio::test]
    async fn test_leader_entry_cannot_be_removed() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![mate]),
            )
            .await
            .unwrap();

        let leader_entry = reg.member_for_account(&leader).unwrap().id.clone();
        let err = h
            .regs
            .remove_member(&session(&leader), &reg.id, &leader_entry)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_add_members_beyond_maximum_rejected() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let a = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let b = seed_account(&h.pool, "Nadia", "nadia@campus.edu").await;
        let c = seed_account(&h.pool, "Omar", "omar@campus.edu").await;
        let event = team_event(&h, &org, 2, 3).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![a, b]),
            )
            .await
            .unwrap();

        let err = h
            .regs
            .add_members(
                &session(&leader),
                &reg.id,
                AddMembersRequest {
                    member_ids: vec![c],
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // The whole operation is rejected; nothing was appended
        let reg = h.regs.get(&session(&leader), &reg.id).await.unwrap();
        assert_eq!(reg.members.len(), 3);
    }

    #[tokio::test]
    async fn test_add_members_skips_existing_and_is_leader_only() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let a = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let b = seed_account(&h.pool, "Nadia", "nadia@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![a.clone()]),
            )
            .await
            .unwrap();

        let err = h
            .regs
            .add_members(
                &session(&a),
                &reg.id,
                AddMembersRequest {
                    member_ids: vec![b.clone()],
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let (reg, added) = h
            .regs
            .add_members(
                &session(&leader),
                &reg.id,
                AddMembersRequest {
                    member_ids: vec![a.clone(), b.clone()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].identity.account_id(), Some(b.as_str()));
        assert_eq!(reg.members.len(), 3);
    }

    #[tokio::test]
    async fn test_cancel_is_terminal() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![mate.clone()]),
            )
            .await
            .unwrap();

        // A member, not just the leader, may cancel
        let reg = h.regs.cancel(&session(&mate), &reg.id).await.unwrap();
        assert_eq!(reg.status, RegistrationStatus::Cancelled);

        let err = h.regs.cancel(&session(&leader), &reg.id).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));

        let err = h
            .regs
            .respond(&session(&mate), &reg.id, InviteAction::Accept)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_individual_mode_ignores_team_fields() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let event = publish(&h, &org, event_request(RegistrationMode::Individual)).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Ignored", vec![mate]),
            )
            .await
            .unwrap();

        assert_eq!(reg.mode, RegistrationMode::Individual);
        assert_eq!(reg.team_name, None);
        assert_eq!(reg.members.len(), 1);
        assert_eq!(reg.members[0].invite_status, InviteStatus::AutoAdded);
    }

    fn answer(field_id: &str, value: serde_json::Value) -> crate::registration::AnswerSubmission {
        crate::registration::AnswerSubmission {
            field_id: field_id.to_string(),
            value,
        }
    }

    async fn event_with_fields(h: &Harness, organizer_id: &str) -> Event {
        let mut req = event_request(RegistrationMode::Individual);
        req.form_fields = vec![
            FormFieldSpec {
                id: None,
                label: "Roll number".to_string(),
                required: true,
                kind: FieldKind::Text,
            },
            FormFieldSpec {
                id: None,
                label: "Head count".to_string(),
                required: false,
                kind: FieldKind::Number,
            },
            FormFieldSpec {
                id: None,
                label: "Arrival".to_string(),
                required: false,
                kind: FieldKind::Date,
            },
            FormFieldSpec {
                id: None,
                label: "Meal".to_string(),
                required: false,
                kind: FieldKind::Select {
                    options: vec!["veg".to_string(), "non-veg".to_string()],
                },
            },
        ];
        publish(h, organizer_id, req).await
    }

    #[tokio::test]
    async fn test_answers_matched_coerced_and_snapshotted() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let event = event_with_fields(&h, &org).await;

        let ids: Vec<String> = event.form_fields.iter().map(|f| f.id.clone()).collect();
        let req = CreateRegistrationRequest {
            answers: vec![
                answer(&ids[0], serde_json::json!("22BCE1042")),
                answer(&ids[1], serde_json::json!(3)),
                answer(&ids[2], serde_json::json!("2026-09-01T10:00:00Z")),
                answer(&ids[3], serde_json::json!("veg")),
                answer("unknown-field", serde_json::json!("dropped")),
            ],
            ..Default::default()
        };
        let reg = h.regs.create(&session(&leader), &event.id, req).await.unwrap();

        assert_eq!(reg.answers.len(), 4);
        assert_eq!(reg.answers[0].label, "Roll number");
        assert_eq!(
            reg.answers[0].value,
            AnswerValue::Text("22BCE1042".to_string())
        );
        assert_eq!(reg.answers[1].value, AnswerValue::Number(3.0));
        assert!(matches!(reg.answers[2].value, AnswerValue::Date(_)));
        assert_eq!(reg.answers[3].value, AnswerValue::Text("veg".to_string()));
    }

    #[tokio::test]
    async fn test_required_answer_missing_rejected() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let event = event_with_fields(&h, &org).await;

        let err = h
            .regs
            .create(&session(&leader), &event.id, Default::default())
            .await
            .unwrap_err();
        match err {
            ApiError::Fields(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, event.form_fields[0].id);
                assert!(fields[0].message.contains("Roll number"));
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_answer_type_mismatch_rejected() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let event = event_with_fields(&h, &org).await;

        let ids: Vec<String> = event.form_fields.iter().map(|f| f.id.clone()).collect();
        let req = CreateRegistrationRequest {
            answers: vec![
                answer(&ids[0], serde_json::json!("22BCE1042")),
                answer(&ids[1], serde_json::json!("not a number")),
                answer(&ids[3], serde_json::json!("extra spicy")),
            ],
            ..Default::default()
        };
        let err = h.regs.create(&session(&leader), &event.id, req).await.unwrap_err();
        match err {
            ApiError::Fields(fields) => {
                assert_eq!(fields.len(), 2);
                assert!(fields.iter().any(|f| f.field == ids[1]));
                assert!(fields.iter().any(|f| f.field == ids[3]));
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_visibility_rules() {
        let h = harness().await;
        let org = seed_account(&h.pool, "Org", "org@campus.edu").await;
        let leader = seed_account(&h.pool, "Lena", "lena@campus.edu").await;
        let mate = seed_account(&h.pool, "Marco", "marco@campus.edu").await;
        let stranger = seed_account(&h.pool, "Sana", "sana@campus.edu").await;
        let event = team_event(&h, &org, 2, 4).await;

        let reg = h
            .regs
            .create(
                &session(&leader),
                &event.id,
                team_request("Bitwise", vec![mate.clone()]),
            )
            .await
            .unwrap();

        // Organizer and leader see it, a stranger does not
        h.regs.get(&organizer(&org), &reg.id).await.unwrap();
        h.regs.get(&session(&leader), &reg.id).await.unwrap();
        let err = h.regs.get(&session(&stranger), &reg.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        // An invited-but-unaccepted member cannot see it yet
        assert!(h.regs.get(&session(&mate), &reg.id).await.is_err());
        h.regs
            .respond(&session(&mate), &reg.id, InviteAction::Accept)
            .await
            .unwrap();
        h.regs.get(&session(&mate), &reg.id).await.unwrap();

        // Status filter narrows the listing
        let confirmed = h
            .regs
            .list(
                &organizer(&org),
                &RegistrationFilter {
                    event_id: Some(event.id.clone()),
                    status: Some(RegistrationStatus::Confirmed),
                },
            )
            .await
            .unwrap();
        assert_eq!(confirmed.len(), 1);

        let pending = h
            .regs
            .list(
                &organizer(&org),
                &RegistrationFilter {
                    event_id: Some(event.id.clone()),
                    status: Some(RegistrationStatus::Pending),
                },
            )
            .await
            .unwrap();
        assert!(pending.is_empty());

        let none = h
            .regs
            .list(
                &session(&stranger),
                &RegistrationFilter {
                    event_id: Some(event.id),
                    status: None,
                },
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
