/// Event catalog manager using runtime queries

use crate::{
    account::{Role, ValidatedSession},
    error::{ApiError, ApiResult, FieldError},
    event::{
        CreateEventRequest, Event, EventFilter, EventStatus, FormField, FormFieldSpec,
        RegistrationMode, UpdateEventRequest,
    },
};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Event manager service
pub struct EventManager {
    db: SqlitePool,
}

impl EventManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a new event in draft status
    pub async fn create(
        &self,
        caller: &ValidatedSession,
        req: CreateEventRequest,
    ) -> ApiResult<Event> {
        let mut errors = Vec::new();

        if req.title.trim().is_empty() {
            errors.push(FieldError::new("title", "title is required"));
        }

        Self::check_times(
            &mut errors,
            req.start_at,
            req.end_at,
            req.registration_start_at,
            req.registration_end_at,
        );

        if req.mode == RegistrationMode::Team {
            match (req.min_team_size, req.max_team_size) {
                (Some(min), Some(max)) => {
                    if min < 1 {
                        errors.push(FieldError::new(
                            "min_team_size",
                            "minimum team size must be at least 1",
                        ));
                    }
                    if max < min {
                        errors.push(FieldError::new(
                            "max_team_size",
                            "maximum team size must not be below the minimum",
                        ));
                    }
                }
                _ => errors.push(FieldError::new(
                    "min_team_size",
                    "team events require minimum and maximum team sizes",
                )),
            }
        }

        if !errors.is_empty() {
            return Err(ApiError::Fields(errors));
        }

        // Society cross-check: the caller must be the named society's head
        if let Some(org_id) = &req.organization_id {
            self.check_society_head(org_id, caller).await?;
        }

        let form_fields = Self::build_fields(req.form_fields, &[])?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO event (id, title, description, category, venue, start_at, end_at,
                 organization_id, organizer_id, status, registration_open,
                 registration_start_at, registration_end_at, mode,
                 min_team_size, max_team_size, max_teams, form_fields, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
        )
        .bind(&id)
        .bind(req.title.trim())
        .bind(&req.description)
        .bind(&req.category)
        .bind(&req.venue)
        .bind(req.start_at)
        .bind(req.end_at)
        .bind(&req.organization_id)
        .bind(&caller.account_id)
        .bind(EventStatus::Draft.as_str())
        .bind(true)
        .bind(req.registration_start_at)
        .bind(req.registration_end_at)
        .bind(req.mode.as_str())
        .bind(req.min_team_size.map(|v| v as i64))
        .bind(req.max_team_size.map(|v| v as i64))
        .bind(req.max_teams.map(|v| v as i64))
        .bind(serde_json::to_string(&form_fields).map_err(|e| {
            ApiError::Internal(format!("Form field serialization failed: {}", e))
        })?)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        self.get(&id).await
    }

    /// Update an event. Category and organizer are frozen once the event is
    /// published or ongoing; cancel is the only deletion path.
    pub async fn update(
        &self,
        caller: &ValidatedSession,
        event_id: &str,
        req: UpdateEventRequest,
    ) -> ApiResult<Event> {
        let event = self.get(event_id).await?;
        self.authorize_owner(caller, &event)?;

        if event.status == EventStatus::Cancelled || event.status == EventStatus::Completed {
            return Err(ApiError::InvalidState(format!(
                "event is {} and can no longer be edited",
                event.status.as_str()
            )));
        }

        let frozen = matches!(event.status, EventStatus::Published | EventStatus::Ongoing);
        if frozen {
            if req
                .category
                .as_ref()
                .is_some_and(|c| c != &event.category)
            {
                return Err(ApiError::InvalidState(
                    "category cannot change after publication".to_string(),
                ));
            }
            if req
                .organizer_id
                .as_ref()
                .is_some_and(|o| o != &event.organizer_id)
            {
                return Err(ApiError::InvalidState(
                    "organizer cannot change after publication".to_string(),
                ));
            }
        }

        let start_at = req.start_at.unwrap_or(event.start_at);
        let end_at = req.end_at.unwrap_or(event.end_at);
        let registration_start_at = req
            .registration_start_at
            .unwrap_or(event.registration_start_at);
        let registration_end_at = req.registration_end_at.unwrap_or(event.registration_end_at);

        let mut errors = Vec::new();
        Self::check_times(
            &mut errors,
            start_at,
            end_at,
            registration_start_at,
            registration_end_at,
        );
        if !errors.is_empty() {
            return Err(ApiError::Fields(errors));
        }

        let form_fields = match req.form_fields {
            Some(specs) => Self::build_fields(specs, &event.form_fields)?,
            None => event.form_fields.clone(),
        };

        let now = Utc::now();
        sqlx::query(
            "UPDATE event SET title = ?1, description = ?2, category = ?3, venue = ?4,
                 organizer_id = ?5, start_at = ?6, end_at = ?7, registration_open = ?8,
                 registration_start_at = ?9, registration_end_at = ?10, max_teams = ?11,
                 form_fields = ?12, updated_at = ?13
             WHERE id = ?14",
        )
        .bind(req.title.as_deref().unwrap_or(&event.title))
        .bind(req.description.as_deref().unwrap_or(&event.description))
        .bind(req.category.as_deref().unwrap_or(&event.category))
        .bind(req.venue.as_deref().unwrap_or(&event.venue))
        .bind(req.organizer_id.as_deref().unwrap_or(&event.organizer_id))
        .bind(start_at)
        .bind(end_at)
        .bind(req.registration_open.unwrap_or(event.registration_open))
        .bind(registration_start_at)
        .bind(registration_end_at)
        .bind(req.max_teams.or(event.max_teams).map(|v| v as i64))
        .bind(
            serde_json::to_string(&form_fields)
                .map_err(|e| ApiError::Internal(format!("Form field serialization failed: {}", e)))?,
        )
        .bind(now)
        .bind(event_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        self.get(event_id).await
    }

    /// Move an event along its lifecycle
    pub async fn transition(
        &self,
        caller: &ValidatedSession,
        event_id: &str,
        next: EventStatus,
    ) -> ApiResult<Event> {
        let event = self.get(event_id).await?;
        self.authorize_owner(caller, &event)?;

        if !event.status.can_transition_to(next) {
            return Err(ApiError::InvalidState(format!(
                "event cannot move from {} to {}",
                event.status.as_str(),
                next.as_str()
            )));
        }

        sqlx::query("UPDATE event SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(next.as_str())
            .bind(Utc::now())
            .bind(event_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::Database)?;

        self.get(event_id).await
    }

    /// Soft-delete: cancel from any non-terminal state
    pub async fn cancel(&self, caller: &ValidatedSession, event_id: &str) -> ApiResult<Event> {
        self.transition(caller, event_id, EventStatus::Cancelled).await
    }

    /// Get event by id
    pub async fn get(&self, id: &str) -> ApiResult<Event> {
        let row = sqlx::query("SELECT * FROM event WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

        Self::from_row(&row)
    }

    /// List events. The public listing only exposes published, ongoing and
    /// completed events; `mine` returns the caller's own events in any
    /// status, and admins see everything.
    pub async fn list(
        &self,
        caller: Option<&ValidatedSession>,
        filter: &EventFilter,
    ) -> ApiResult<Vec<Event>> {
        let rows = if filter.mine {
            let caller = caller.ok_or_else(|| {
                ApiError::Authentication("Authentication required to list your events".to_string())
            })?;
            sqlx::query("SELECT * FROM event WHERE organizer_id = ?1 ORDER BY start_at")
                .bind(&caller.account_id)
                .fetch_all(&self.db)
                .await
                .map_err(ApiError::Database)?
        } else if caller.is_some_and(|c| c.role.can_act_as(Role::Admin)) {
            sqlx::query("SELECT * FROM event ORDER BY start_at")
                .fetch_all(&self.db)
                .await
                .map_err(ApiError::Database)?
        } else {
            sqlx::query(
                "SELECT * FROM event WHERE status IN ('published', 'ongoing', 'completed')
                 ORDER BY start_at",
            )
            .fetch_all(&self.db)
            .await
            .map_err(ApiError::Database)?
        };

        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            events.push(Self::from_row(row)?);
        }

        if let Some(status) = filter.status {
            events.retain(|e| e.status == status);
        }
        if let Some(category) = &filter.category {
            events.retain(|e| e.category.eq_ignore_ascii_case(category));
        }
        if let Some(org_id) = &filter.organization_id {
            events.retain(|e| e.organization_id.as_deref() == Some(org_id.as_str()));
        }

        Ok(events)
    }

    fn authorize_owner(&self, caller: &ValidatedSession, event: &Event) -> ApiResult<()> {
        if caller.account_id != event.organizer_id && !caller.role.can_act_as(Role::Admin) {
            return Err(ApiError::Forbidden(
                "Only the event organizer can modify this event".to_string(),
            ));
        }
        Ok(())
    }

    async fn check_society_head(&self, org_id: &str, caller: &ValidatedSession) -> ApiResult<()> {
        let row = sqlx::query("SELECT head_account_id, active FROM organization WHERE id = ?1")
            .bind(org_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

        let head: String = row.get("head_account_id");
        let active: bool = row.get("active");

        if !active {
            return Err(ApiError::InvalidState(
                "organization is not active".to_string(),
            ));
        }
        if head != caller.account_id && !caller.role.can_act_as(Role::Admin) {
            return Err(ApiError::Forbidden(
                "Only the society head can create events for this organization".to_string(),
            ));
        }
        Ok(())
    }

    fn check_times(
        errors: &mut Vec<FieldError>,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        registration_start_at: DateTime<Utc>,
        registration_end_at: DateTime<Utc>,
    ) {
        if end_at <= start_at {
            errors.push(FieldError::new("end_at", "event must end after it starts"));
        }
        if registration_end_at >= start_at {
            errors.push(FieldError::new(
                "registration_end_at",
                "registration must close before the event starts",
            ));
        }
        if registration_start_at >= registration_end_at {
            errors.push(FieldError::new(
                "registration_start_at",
                "registration window must open before it closes",
            ));
        }
    }

    /// Materialize field definitions, preserving ids of retained fields and
    /// generating fresh ids for new ones
    fn build_fields(specs: Vec<FormFieldSpec>, existing: &[FormField]) -> ApiResult<Vec<FormField>> {
        let mut fields = Vec::with_capacity(specs.len());
        let mut seen = std::collections::HashSet::new();

        for spec in specs {
            if spec.label.trim().is_empty() {
                return Err(ApiError::Validation(
                    "form field labels cannot be empty".to_string(),
                ));
            }
            if spec.kind.is_choice() && spec.kind.options().is_some_and(|o| o.is_empty()) {
                return Err(ApiError::Validation(format!(
                    "choice field '{}' needs at least one option",
                    spec.label
                )));
            }

            let id = match spec.id {
                Some(id) => {
                    if existing.iter().all(|f| f.id != id) {
                        return Err(ApiError::Validation(format!(
                            "unknown form field id: {}",
                            id
                        )));
                    }
                    id
                }
                None => Uuid::new_v4().to_string(),
            };
            if !seen.insert(id.clone()) {
                return Err(ApiError::Validation(format!(
                    "duplicate form field id: {}",
                    id
                )));
            }

            fields.push(FormField {
                id,
                label: spec.label,
                required: spec.required,
                kind: spec.kind,
            });
        }

        Ok(fields)
    }

    /// Parse an event row; shared with the bookmark listing
    pub(crate) fn from_row(row: &SqliteRow) -> ApiResult<Event> {
        let status: String = row.get("status");
        let mode: String = row.get("mode");
        let form_fields: String = row.get("form_fields");

        Ok(Event {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            category: row.get("category"),
            venue: row.get("venue"),
            start_at: row.get("start_at"),
            end_at: row.get("end_at"),
            organization_id: row.get("organization_id"),
            organizer_id: row.get("organizer_id"),
            status: EventStatus::from_str(&status)?,
            registration_open: row.get("registration_open"),
            registration_start_at: row.get("registration_start_at"),
            registration_end_at: row.get("registration_end_at"),
            mode: RegistrationMode::from_str(&mode)?,
            min_team_size: row.get::<Option<i64>, _>("min_team_size").map(|v| v as u32),
            max_team_size: row.get::<Option<i64>, _>("max_team_size").map(|v| v as u32),
            max_teams: row.get::<Option<i64>, _>("max_teams").map(|v| v as u32),
            form_fields: serde_json::from_str(&form_fields)
                .map_err(|e| ApiError::Internal(format!("Corrupt form fields: {}", e)))?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
