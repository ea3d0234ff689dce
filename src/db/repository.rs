//! Database repository for CRUD operations.
//!
//! Multi-table mutations (campaign switch, campaign delete, user delete) run
//! inside a single transaction each.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{now, ts};
use crate::errors::AppError;
use crate::models::{
    check_window, validation, ActiveCampaign, AppSettings, Campaign, CampaignDetail,
    CampaignStatus, CampaignWithParticipants, Contact, ContactWithDetails, CreateCampaignRequest,
    CreateContactRequest, FinishedCampaign, Participant, Participation, Role, UpdateCampaignRequest,
    UpdateContactRequest, UpdateProfileRequest, UpdateSettingsRequest, User, UserWithCounts,
};

const USER_COLUMNS: &str = "u.id AS id, u.email AS email, u.username AS username, \
     u.full_name AS full_name, u.role AS role, u.created_at AS created_at";

const CAMPAIGN_COLUMNS: &str = "c.id AS id, c.name AS name, c.location AS location, \
     c.start_date AS start_date, c.end_date AS end_date, c.status AS status, \
     c.created_by AS created_by, c.created_at AS created_at";

const CONTACT_COLUMNS: &str = "k.id AS id, k.campaign_id AS campaign_id, \
     k.collector_id AS collector_id, k.neighborhood AS neighborhood, \
     k.first_name AS first_name, k.phone AS phone, k.demand AS demand, \
     k.created_at AS created_at, k.updated_at AS updated_at, \
     cam.name AS campaign_name, cam.location AS campaign_location, \
     cu.username AS collector_username";

const CONTACT_JOINS: &str = "FROM contacts k \
     LEFT JOIN campaigns cam ON cam.id = k.campaign_id \
     LEFT JOIN users cu ON cu.id = k.collector_id";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ==================== USER OPERATIONS ====================

    /// Create a user with an already hashed password.
    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = now();

        sqlx::query(
            "INSERT INTO users (id, email, username, full_name, role, password_hash, created_at) VALUES (?, ?, ?, NULL, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(username)
        .bind(role.as_str())
        .bind(password_hash)
        .bind(ts(created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_as(e, "Email ou nome de usuário já cadastrado"))?;

        Ok(User {
            id,
            email: email.to_string(),
            username: username.to_string(),
            full_name: None,
            role,
            created_at,
        })
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    /// Look up a user and their password hash by email.
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, AppError> {
        let sql = format!(
            "SELECT {}, u.password_hash AS password_hash FROM users u WHERE u.email = ?",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some((user_from_row(&row)?, row.try_get("password_hash")?))),
            None => Ok(None),
        }
    }

    /// True when no user holds `username`.
    pub async fn username_available(&self, username: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_none())
    }

    /// List all users, newest first, with their contact and participation counts.
    pub async fn list_users_with_counts(&self) -> Result<Vec<UserWithCounts>, AppError> {
        let sql = format!(
            r#"SELECT {},
                      (SELECT COUNT(*) FROM contacts k WHERE k.collector_id = u.id) AS contact_count,
                      (SELECT COUNT(*) FROM campaign_participants p WHERE p.user_id = u.id) AS campaign_count
               FROM users u ORDER BY u.created_at DESC, u.rowid DESC"#,
            USER_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let users = rows
            .iter()
            .map(|row| {
                Ok(UserWithCounts {
                    user: user_from_row(row)?,
                    contact_count: row.try_get("contact_count")?,
                    campaign_count: row.try_get("campaign_count")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(users)
    }

    /// Update the caller's own username and full name.
    pub async fn update_profile(
        &self,
        id: &str,
        request: &UpdateProfileRequest,
    ) -> Result<User, AppError> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;

        let username = request
            .username
            .as_deref()
            .map(str::trim)
            .unwrap_or(existing.username.as_str())
            .to_string();
        // An empty full name clears it
        let full_name = match &request.full_name {
            Some(name) if name.trim().is_empty() => None,
            Some(name) => Some(name.trim().to_string()),
            None => existing.full_name.clone(),
        };

        sqlx::query("UPDATE users SET username = ?, full_name = ? WHERE id = ?")
            .bind(&username)
            .bind(&full_name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_as(e, "Este nome de usuário já está em uso. Tente outro."))?;

        Ok(User {
            username,
            full_name,
            ..existing
        })
    }

    /// Replace a user's password hash.
    pub async fn update_password(&self, id: &str, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Usuário não encontrado".to_string()));
        }
        Ok(())
    }

    /// Change a user's role.
    pub async fn update_role(&self, id: &str, role: Role) -> Result<User, AppError> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Usuário não encontrado".to_string()));
        }

        self.get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))
    }

    /// Delete a user together with their sessions, participations and contacts.
    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for sql in [
            "DELETE FROM sessions WHERE user_id = ?",
            "DELETE FROM campaign_participants WHERE user_id = ?",
            "DELETE FROM contacts WHERE collector_id = ?",
        ] {
            sqlx::query(sql).bind(id).execute(&mut *tx).await?;
        }

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Usuário não encontrado".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    // ==================== SESSION OPERATIONS ====================

    /// Store a new session token.
    pub async fn create_session(
        &self,
        token: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token)
        .bind(user_id)
        .bind(ts(now()))
        .bind(ts(expires_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Resolve an unexpired session token to its user.
    pub async fn session_user(&self, token: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token = ? AND s.expires_at > ?",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(token)
            .bind(ts(now()))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    /// Delete a session token.
    pub async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove every expired session, returning how many were removed.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(ts(now()))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ==================== SETTINGS OPERATIONS ====================

    /// Read the settings singleton.
    pub async fn get_settings(&self) -> Result<AppSettings, AppError> {
        let row = sqlx::query(
            "SELECT registration_open, default_campaign_end_time FROM app_settings WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        let registration_open: i32 = row.try_get("registration_open")?;
        Ok(AppSettings {
            registration_open: registration_open != 0,
            default_campaign_end_time: row.try_get("default_campaign_end_time")?,
        })
    }

    /// Overwrite the settings singleton.
    pub async fn update_settings(
        &self,
        request: &UpdateSettingsRequest,
    ) -> Result<AppSettings, AppError> {
        sqlx::query(
            "UPDATE app_settings SET registration_open = ?, default_campaign_end_time = ? WHERE id = 1",
        )
        .bind(request.registration_open as i32)
        .bind(&request.default_campaign_end_time)
        .execute(&self.pool)
        .await?;

        self.get_settings().await
    }

    // ==================== CAMPAIGN OPERATIONS ====================

    /// List campaigns, newest first, with participants and contact counts.
    pub async fn list_campaigns(
        &self,
        status: Option<CampaignStatus>,
    ) -> Result<Vec<CampaignWithParticipants>, AppError> {
        let mut sql = format!(
            "SELECT {}, (SELECT COUNT(*) FROM contacts k WHERE k.campaign_id = c.id) AS contact_count FROM campaigns c",
            CAMPAIGN_COLUMNS
        );
        if status.is_some() {
            sql.push_str(" WHERE c.status = ?");
        }
        sql.push_str(" ORDER BY c.created_at DESC, c.rowid DESC");

        let mut query = sqlx::query(&sql);
        if let Some(status) = status {
            query = query.bind(status.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut participants = self.participants_by_campaign().await?;

        let campaigns = rows
            .iter()
            .map(|row| {
                let campaign = campaign_from_row(row)?;
                Ok(CampaignWithParticipants {
                    participants: participants.remove(&campaign.id).unwrap_or_default(),
                    contact_count: row.try_get("contact_count")?,
                    campaign,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(campaigns)
    }

    /// Get a campaign by ID.
    pub async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>, AppError> {
        let sql = format!("SELECT {} FROM campaigns c WHERE c.id = ?", CAMPAIGN_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(campaign_from_row).transpose()?)
    }

    /// Campaign with named participants and its collected contacts.
    pub async fn get_campaign_detail(&self, id: &str) -> Result<Option<CampaignDetail>, AppError> {
        let Some(campaign) = self.get_campaign(id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r#"SELECT p.id AS id, p.campaign_id AS campaign_id, p.user_id AS user_id,
                      p.joined_at AS joined_at, u.username AS username
               FROM campaign_participants p LEFT JOIN users u ON u.id = p.user_id
               WHERE p.campaign_id = ? ORDER BY p.joined_at, p.rowid"#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let participants = rows
            .iter()
            .map(|row| {
                Ok(Participant {
                    participation: participation_from_row(row)?,
                    username: row.try_get("username")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let contacts = self.list_contacts(Some(id), None).await?;

        Ok(Some(CampaignDetail {
            campaign,
            participants,
            contacts,
        }))
    }

    /// Create a campaign. `end_date` is already resolved by the caller.
    pub async fn create_campaign(
        &self,
        request: &CreateCampaignRequest,
        end_date: DateTime<Utc>,
        created_by: &str,
    ) -> Result<Campaign, AppError> {
        check_window(request.start_date, end_date)?;

        let campaign = Campaign {
            id: Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            location: request.location.trim().to_string(),
            start_date: request.start_date,
            end_date,
            status: CampaignStatus::Active,
            created_by: created_by.to_string(),
            created_at: now(),
        };

        sqlx::query(
            "INSERT INTO campaigns (id, name, location, start_date, end_date, status, created_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&campaign.id)
        .bind(&campaign.name)
        .bind(&campaign.location)
        .bind(ts(campaign.start_date))
        .bind(ts(campaign.end_date))
        .bind(campaign.status.as_str())
        .bind(&campaign.created_by)
        .bind(ts(campaign.created_at))
        .execute(&self.pool)
        .await?;

        Ok(campaign)
    }

    /// Partially update a campaign.
    pub async fn update_campaign(
        &self,
        id: &str,
        request: &UpdateCampaignRequest,
    ) -> Result<Campaign, AppError> {
        let existing = self
            .get_campaign(id)
            .await?
            .ok_or_else(|| campaign_not_found(id))?;

        let updated = Campaign {
            name: request
                .name
                .as_deref()
                .map_or(existing.name.clone(), |n| n.trim().to_string()),
            location: request
                .location
                .as_deref()
                .map_or(existing.location.clone(), |l| l.trim().to_string()),
            start_date: request.start_date.unwrap_or(existing.start_date),
            end_date: request.end_date.unwrap_or(existing.end_date),
            status: request.status.unwrap_or(existing.status),
            ..existing
        };
        check_window(updated.start_date, updated.end_date)?;

        sqlx::query(
            "UPDATE campaigns SET name = ?, location = ?, start_date = ?, end_date = ?, status = ? WHERE id = ?",
        )
        .bind(&updated.name)
        .bind(&updated.location)
        .bind(ts(updated.start_date))
        .bind(ts(updated.end_date))
        .bind(updated.status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Set the status flag (finish or reopen).
    pub async fn set_campaign_status(
        &self,
        id: &str,
        status: CampaignStatus,
    ) -> Result<Campaign, AppError> {
        let result = sqlx::query("UPDATE campaigns SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(campaign_not_found(id));
        }

        self.get_campaign(id)
            .await?
            .ok_or_else(|| campaign_not_found(id))
    }

    /// Hard-delete a campaign along with its contacts and participations.
    pub async fn delete_campaign(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let contacts = sqlx::query("DELETE FROM contacts WHERE campaign_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let participants = sqlx::query("DELETE FROM campaign_participants WHERE campaign_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM campaigns WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(campaign_not_found(id));
        }

        tx.commit().await?;

        tracing::info!(
            campaign_id = id,
            contacts = contacts.rows_affected(),
            participants = participants.rows_affected(),
            "Deleted campaign"
        );
        Ok(())
    }

    /// Finish every active campaign whose end date is not after `at`.
    pub async fn finish_expired_campaigns(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Vec<FinishedCampaign>, AppError> {
        let rows = sqlx::query(
            "UPDATE campaigns SET status = 'finished' WHERE status = 'active' AND end_date <= ? RETURNING id, name",
        )
        .bind(ts(at))
        .fetch_all(&self.pool)
        .await?;

        let finished = rows
            .iter()
            .map(|row| {
                Ok(FinishedCampaign {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(finished)
    }

    // ==================== PARTICIPATION OPERATIONS ====================

    /// The latest-joined participation whose campaign is still active.
    pub async fn active_campaign(&self, user_id: &str) -> Result<Option<ActiveCampaign>, AppError> {
        let sql = format!(
            r#"SELECT {} FROM campaign_participants p
               JOIN campaigns c ON c.id = p.campaign_id
               WHERE p.user_id = ? AND c.status = 'active'
               ORDER BY p.joined_at DESC, p.rowid DESC LIMIT 1"#,
            CAMPAIGN_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let campaign = campaign_from_row(&row)?;
        let participants = self.participants_of(&campaign.id).await?;

        Ok(Some(ActiveCampaign {
            campaign,
            participants,
        }))
    }

    /// Participation rows of one campaign, in join order.
    pub async fn participants_of(&self, campaign_id: &str) -> Result<Vec<Participation>, AppError> {
        let rows = sqlx::query(
            "SELECT id, campaign_id, user_id, joined_at FROM campaign_participants WHERE campaign_id = ? ORDER BY joined_at, rowid",
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(participation_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Insert a participation. Only active campaigns can be joined.
    pub async fn join_campaign(
        &self,
        campaign_id: &str,
        user_id: &str,
    ) -> Result<Participation, AppError> {
        self.joinable_campaign(campaign_id).await?;

        let participation = Participation {
            id: Uuid::new_v4().to_string(),
            campaign_id: campaign_id.to_string(),
            user_id: user_id.to_string(),
            joined_at: now(),
        };
        insert_participation(&self.pool, &participation).await?;

        Ok(participation)
    }

    /// Remove every participation of the user in the campaign.
    pub async fn leave_campaign(&self, campaign_id: &str, user_id: &str) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM campaign_participants WHERE campaign_id = ? AND user_id = ?")
                .bind(campaign_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Leave the current active campaign, then join `campaign_id`, atomically.
    pub async fn switch_campaign(
        &self,
        user_id: &str,
        campaign_id: &str,
    ) -> Result<ActiveCampaign, AppError> {
        self.joinable_campaign(campaign_id).await?;
        let current = self.active_campaign(user_id).await?;

        let mut tx = self.pool.begin().await?;

        if let Some(current) = &current {
            sqlx::query("DELETE FROM campaign_participants WHERE campaign_id = ? AND user_id = ?")
                .bind(&current.campaign.id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let participation = Participation {
            id: Uuid::new_v4().to_string(),
            campaign_id: campaign_id.to_string(),
            user_id: user_id.to_string(),
            joined_at: now(),
        };
        insert_participation(&mut *tx, &participation).await?;

        tx.commit().await?;

        tracing::debug!(
            user_id,
            from = current.as_ref().map(|c| c.campaign.id.as_str()),
            to = campaign_id,
            "Switched active campaign"
        );

        self.active_campaign(user_id).await?.ok_or_else(|| {
            AppError::Internal("Campanha ativa não encontrada após a troca".to_string())
        })
    }

    /// Leave the current active campaign, returning its id when there was one.
    pub async fn leave_active_campaign(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let Some(current) = self.active_campaign(user_id).await? else {
            return Ok(None);
        };
        self.leave_campaign(&current.campaign.id, user_id).await?;
        Ok(Some(current.campaign.id))
    }

    async fn joinable_campaign(&self, campaign_id: &str) -> Result<Campaign, AppError> {
        let campaign = self
            .get_campaign(campaign_id)
            .await?
            .ok_or_else(|| campaign_not_found(campaign_id))?;

        if campaign.status != CampaignStatus::Active {
            return Err(AppError::invalid_field(
                "campaign_id",
                "Esta campanha já foi finalizada",
            ));
        }
        Ok(campaign)
    }

    async fn participants_by_campaign(
        &self,
    ) -> Result<HashMap<String, Vec<Participation>>, AppError> {
        let rows = sqlx::query(
            "SELECT id, campaign_id, user_id, joined_at FROM campaign_participants ORDER BY joined_at, rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<Participation>> = HashMap::new();
        for row in &rows {
            let participation = participation_from_row(row)?;
            grouped
                .entry(participation.campaign_id.clone())
                .or_default()
                .push(participation);
        }
        Ok(grouped)
    }

    // ==================== CONTACT OPERATIONS ====================

    /// List contacts, newest first, optionally filtered by campaign and collector.
    pub async fn list_contacts(
        &self,
        campaign_id: Option<&str>,
        collector_id: Option<&str>,
    ) -> Result<Vec<ContactWithDetails>, AppError> {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();
        if let Some(campaign_id) = campaign_id {
            clauses.push("k.campaign_id = ?");
            binds.push(campaign_id);
        }
        if let Some(collector_id) = collector_id {
            clauses.push("k.collector_id = ?");
            binds.push(collector_id);
        }

        let mut sql = format!("SELECT {} {}", CONTACT_COLUMNS, CONTACT_JOINS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY k.created_at DESC, k.rowid DESC");

        let mut query = sqlx::query(&sql);
        for value in binds {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(contact_with_details_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Get a contact by ID.
    pub async fn get_contact(&self, id: &str) -> Result<Option<ContactWithDetails>, AppError> {
        let sql = format!("SELECT {} {} WHERE k.id = ?", CONTACT_COLUMNS, CONTACT_JOINS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(contact_with_details_from_row).transpose()?)
    }

    /// Create a contact for a campaign on behalf of a collector.
    pub async fn create_contact(
        &self,
        campaign_id: &str,
        collector_id: &str,
        request: &CreateContactRequest,
    ) -> Result<Contact, AppError> {
        let created_at = now();
        let contact = Contact {
            id: Uuid::new_v4().to_string(),
            campaign_id: campaign_id.to_string(),
            collector_id: collector_id.to_string(),
            neighborhood: request.neighborhood.trim().to_string(),
            first_name: request.first_name.trim().to_string(),
            phone: validation::unformat_phone(&request.phone),
            demand: crate::models::normalize_demand(request.demand.as_deref()),
            created_at,
            updated_at: created_at,
        };

        sqlx::query(
            "INSERT INTO contacts (id, campaign_id, collector_id, neighborhood, first_name, phone, demand, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&contact.id)
        .bind(&contact.campaign_id)
        .bind(&contact.collector_id)
        .bind(&contact.neighborhood)
        .bind(&contact.first_name)
        .bind(&contact.phone)
        .bind(&contact.demand)
        .bind(ts(contact.created_at))
        .bind(ts(contact.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(contact)
    }

    /// Partially update a contact's content fields.
    pub async fn update_contact(
        &self,
        id: &str,
        request: &UpdateContactRequest,
    ) -> Result<Contact, AppError> {
        let existing = self
            .get_contact(id)
            .await?
            .ok_or_else(|| contact_not_found(id))?
            .contact;

        let updated = Contact {
            neighborhood: request
                .neighborhood
                .as_deref()
                .map_or(existing.neighborhood.clone(), |n| n.trim().to_string()),
            first_name: request
                .first_name
                .as_deref()
                .map_or(existing.first_name.clone(), |n| n.trim().to_string()),
            phone: request
                .phone
                .as_deref()
                .map_or(existing.phone.clone(), validation::unformat_phone),
            demand: match &request.demand {
                Some(demand) => crate::models::normalize_demand(Some(demand.as_str())),
                None => existing.demand.clone(),
            },
            updated_at: now(),
            ..existing
        };

        sqlx::query(
            "UPDATE contacts SET neighborhood = ?, first_name = ?, phone = ?, demand = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&updated.neighborhood)
        .bind(&updated.first_name)
        .bind(&updated.phone)
        .bind(&updated.demand)
        .bind(ts(updated.updated_at))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Delete a contact.
    pub async fn delete_contact(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(contact_not_found(id));
        }
        Ok(())
    }

    /// Distinct neighborhoods already recorded, optionally filtered by a substring.
    pub async fn neighborhoods(&self, query: Option<&str>) -> Result<Vec<String>, AppError> {
        let needle = query.map(str::trim).unwrap_or_default();
        let rows = sqlx::query(
            r#"SELECT DISTINCT neighborhood FROM contacts
               WHERE ? = '' OR instr(lower(neighborhood), lower(?)) > 0
               ORDER BY neighborhood COLLATE NOCASE LIMIT 20"#,
        )
        .bind(needle)
        .bind(needle)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| row.try_get("neighborhood"))
            .collect::<Result<Vec<String>, _>>()?)
    }
}

async fn insert_participation<'e, E>(executor: E, participation: &Participation) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "INSERT INTO campaign_participants (id, campaign_id, user_id, joined_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&participation.id)
    .bind(&participation.campaign_id)
    .bind(&participation.user_id)
    .bind(ts(participation.joined_at))
    .execute(executor)
    .await?;
    Ok(())
}

fn campaign_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Campanha {} não encontrada", id))
}

fn contact_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Contato {} não encontrado", id))
}

/// Replace the generic duplicate message with one naming the clashing field.
fn conflict_as(err: sqlx::Error, message: &str) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict(message.to_string()),
        other => other,
    }
}

// Helper functions for row conversion

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        full_name: row.try_get("full_name")?,
        role: Role::parse(&role).ok_or_else(|| decode_error("role", &role))?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn campaign_from_row(row: &SqliteRow) -> Result<Campaign, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Campaign {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        location: row.try_get("location")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        status: CampaignStatus::parse(&status).ok_or_else(|| decode_error("status", &status))?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn participation_from_row(row: &SqliteRow) -> Result<Participation, sqlx::Error> {
    Ok(Participation {
        id: row.try_get("id")?,
        campaign_id: row.try_get("campaign_id")?,
        user_id: row.try_get("user_id")?,
        joined_at: row.try_get("joined_at")?,
    })
}

fn contact_with_details_from_row(row: &SqliteRow) -> Result<ContactWithDetails, sqlx::Error> {
    Ok(ContactWithDetails {
        contact: Contact {
            id: row.try_get("id")?,
            campaign_id: row.try_get("campaign_id")?,
            collector_id: row.try_get("collector_id")?,
            neighborhood: row.try_get("neighborhood")?,
            first_name: row.try_get("first_name")?,
            phone: row.try_get("phone")?,
            demand: row.try_get("demand")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        },
        campaign_name: row.try_get("campaign_name")?,
        campaign_location: row.try_get("campaign_location")?,
        collector_username: row.try_get("collector_username")?,
    })
}

fn decode_error(column: &str, value: &str) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("unexpected value {:?}", value).into(),
    }
}
