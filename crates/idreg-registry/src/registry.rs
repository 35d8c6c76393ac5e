//! # Registry Facade
//!
//! Composes the record store, ownership index, uniqueness indexes, admin
//! set, and token URI store into authorization-checked operations.
//!
//! ## Call Discipline
//!
//! Every mutating operation:
//!
//! 1. authorizes the caller against the admin set,
//! 2. checks every precondition against the stores,
//! 3. prepares its audit event, digest included,
//! 4. writes (whole records only, never field patches),
//! 5. appends the prepared event.
//!
//! All checks and the event digest complete before the first write, and the
//! writes themselves cannot fail, so a returned `Err` means no store was touched. Mutations
//! take `&mut self`; nothing can observe a half-applied call. Hosts that
//! share a registry across threads use [`crate::SharedRegistry`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use idreg_core::{Address, BlockHeight, Email, ExternalId, TokenId};
use idreg_state::{NewStudent, StudentRecord, StudentStatus};

use crate::admin::AdminSet;
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::events::{fields, AuditEvent, EventLog, EventName};
use crate::ownership::OwnershipIndex;
use crate::store::OrderedStore;
use crate::uniqueness::UniqueIndex;

/// Host-supplied context of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Authenticated caller. Opaque to the registry.
    pub caller: Address,
    /// Current logical height.
    pub height: BlockHeight,
}

impl CallContext {
    pub fn new(caller: Address, height: BlockHeight) -> Self {
        Self { caller, height }
    }
}

/// The student identity registry.
///
/// Owns all six collections and the audit log. Serializable as a whole so
/// the host can persist and restore it; [`Registry::check_integrity`]
/// re-establishes trust in restored state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    config: RegistryConfig,
    records: OrderedStore<TokenId, StudentRecord>,
    ownership: OwnershipIndex,
    emails: UniqueIndex<Email>,
    external_ids: UniqueIndex<ExternalId>,
    admins: AdminSet,
    token_uris: OrderedStore<TokenId, String>,
    events: EventLog,
}

impl Registry {
    /// Create an empty registry with the given initial admins.
    ///
    /// # Errors
    ///
    /// `EmptyAdminSet` if `initial_admins` is empty.
    pub fn new(
        config: RegistryConfig,
        initial_admins: impl IntoIterator<Item = Address>,
    ) -> Result<Self, RegistryError> {
        let admins = AdminSet::seeded(initial_admins)?;
        tracing::debug!(admins = admins.len(), final_year = config.final_year, "registry created");
        Ok(Self {
            config,
            records: OrderedStore::new(),
            ownership: OwnershipIndex::new(),
            emails: UniqueIndex::new(),
            external_ids: UniqueIndex::new(),
            admins,
            token_uris: OrderedStore::new(),
            events: EventLog::new(),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn admins(&self) -> &AdminSet {
        &self.admins
    }

    pub fn ownership(&self) -> &OwnershipIndex {
        &self.ownership
    }

    pub fn email_index(&self) -> &UniqueIndex<Email> {
        &self.emails
    }

    pub fn external_id_index(&self) -> &UniqueIndex<ExternalId> {
        &self.external_ids
    }

    /// The audit trail.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub(crate) fn token_uris(&self) -> &OrderedStore<TokenId, String> {
        &self.token_uris
    }

    // ── Admin set ────────────────────────────────────────────────────

    /// Whether `addr` may mutate the registry.
    pub fn is_admin(&self, addr: &Address) -> bool {
        self.admins.is_admin(addr)
    }

    /// Number of admins. Never zero.
    pub fn admin_count(&self) -> usize {
        self.admins.len()
    }

    /// Add an admin. Emits `admin_added`.
    pub fn add_admin(&mut self, ctx: &CallContext, new_admin: &Address) -> Result<(), RegistryError> {
        let event = self.prepare_event(
            "add_admin",
            ctx,
            EventName::AdminAdded,
            fields([
                ("caller", ctx.caller.to_string()),
                ("admin", new_admin.to_string()),
            ]),
        )?;
        self.admins
            .add(&ctx.caller, new_admin, ctx.height)
            .map_err(|e| reject("add_admin", ctx, e))?;
        self.events.append(event);
        Ok(())
    }

    /// Remove an admin. Emits `admin_removed`.
    ///
    /// Checks run in order: authorization, membership, last-admin
    /// protection, self-removal. A sole admin removing itself therefore
    /// gets `LastAdminProtected`, not `SelfRemoval`.
    pub fn remove_admin(&mut self, ctx: &CallContext, target: &Address) -> Result<(), RegistryError> {
        let event = self.prepare_event(
            "remove_admin",
            ctx,
            EventName::AdminRemoved,
            fields([
                ("caller", ctx.caller.to_string()),
                ("admin", target.to_string()),
            ]),
        )?;
        self.admins
            .remove(&ctx.caller, target)
            .map_err(|e| reject("remove_admin", ctx, e))?;
        self.events.append(event);
        Ok(())
    }

    // ── Issuance ─────────────────────────────────────────────────────

    /// Issue a record for `student` to `holder`. Emits a mint-style
    /// `transfer` event with an empty `from`.
    pub fn issue(
        &mut self,
        ctx: &CallContext,
        holder: &Address,
        student: NewStudent,
    ) -> Result<TokenId, RegistryError> {
        self.check_issue(ctx, &student)
            .map_err(|e| reject("issue", ctx, e))?;

        let token = TokenId::from_external_id(&student.external_id);
        let record = StudentRecord::enroll(
            student,
            self.config.default_image_url.clone(),
            self.config.final_year,
        )
        .map_err(|e| reject("issue", ctx, e.into()))?;
        let event = self.prepare_event(
            "issue",
            ctx,
            EventName::Transfer,
            fields([
                ("from", String::new()),
                ("to", holder.to_string()),
                ("token_id", token.to_string()),
                ("caller", ctx.caller.to_string()),
            ]),
        )?;

        self.emails.reserve(record.email.clone(), token.clone());
        self.external_ids
            .reserve(record.external_id.clone(), token.clone());
        self.ownership.assign(token.clone(), holder.clone());
        self.token_uris
            .insert(token.clone(), record.image_url.clone());
        self.records.insert(token.clone(), record);
        self.events.append(event);
        Ok(token)
    }

    fn check_issue(&self, ctx: &CallContext, student: &NewStudent) -> Result<(), RegistryError> {
        self.admins.authorize(&ctx.caller)?;
        if !student.email.has_domain_suffix(&self.config.email_domain) {
            return Err(RegistryError::InvalidEmail {
                email: student.email.clone(),
                required_suffix: self.config.email_domain.clone(),
            });
        }
        if self.emails.contains(&student.email) {
            return Err(RegistryError::EmailExists(student.email.clone()));
        }
        if self.external_ids.contains(&student.external_id) {
            return Err(RegistryError::ExternalIdExists(student.external_id.clone()));
        }
        Ok(())
    }

    // ── Lifecycle transitions ────────────────────────────────────────

    /// Set the year of study. Emits `student_year_updated`.
    pub fn update_year(
        &mut self,
        ctx: &CallContext,
        external_id: &ExternalId,
        year: u8,
    ) -> Result<(), RegistryError> {
        let final_year = self.config.final_year;
        let token = TokenId::from_external_id(external_id);
        let payload = fields([
            ("caller", ctx.caller.to_string()),
            ("token_id", token.to_string()),
            ("year", year.to_string()),
        ]);
        self.replace_record(
            "update_year",
            ctx,
            external_id,
            (EventName::StudentYearUpdated, payload),
            |rec| rec.with_year(year, final_year),
        )
    }

    /// Set status to `Active` or `Probation`. Emits `student_status_updated`.
    pub fn set_status(
        &mut self,
        ctx: &CallContext,
        external_id: &ExternalId,
        status: StudentStatus,
        reason: &str,
    ) -> Result<(), RegistryError> {
        let token = TokenId::from_external_id(external_id);
        let logged_reason = match status {
            StudentStatus::Probation => reason.to_string(),
            _ => String::new(),
        };
        let payload = fields([
            ("caller", ctx.caller.to_string()),
            ("token_id", token.to_string()),
            ("status", status.to_string()),
            ("reason", logged_reason),
        ]);
        self.replace_record(
            "set_status",
            ctx,
            external_id,
            (EventName::StudentStatusUpdated, payload),
            |rec| rec.with_status(status, reason),
        )
    }

    /// Move a student to another department.
    /// Emits `student_department_transferred`.
    pub fn transfer_department(
        &mut self,
        ctx: &CallContext,
        external_id: &ExternalId,
        department: &str,
    ) -> Result<(), RegistryError> {
        let token = TokenId::from_external_id(external_id);
        let payload = fields([
            ("caller", ctx.caller.to_string()),
            ("token_id", token.to_string()),
            ("department", department.to_string()),
        ]);
        self.replace_record(
            "transfer_department",
            ctx,
            external_id,
            (EventName::StudentDepartmentTransferred, payload),
            |rec| rec.with_department(department),
        )
    }

    /// Graduate a final-year student at the call's height. Ownership is
    /// unchanged. Emits `student_graduated`.
    pub fn graduate(&mut self, ctx: &CallContext, external_id: &ExternalId) -> Result<(), RegistryError> {
        let final_year = self.config.final_year;
        let height = ctx.height;
        let token = TokenId::from_external_id(external_id);
        let payload = fields([
            ("caller", ctx.caller.to_string()),
            ("token_id", token.to_string()),
            ("graduated_at", height.to_string()),
        ]);
        self.replace_record(
            "graduate",
            ctx,
            external_id,
            (EventName::StudentGraduated, payload),
            |rec| rec.graduated(final_year, height),
        )
    }

    /// Authorize, fetch, transform a copy, prepare the event, then write the
    /// copy back whole and append the event.
    fn replace_record<F>(
        &mut self,
        op: &'static str,
        ctx: &CallContext,
        external_id: &ExternalId,
        (name, payload): (EventName, BTreeMap<String, String>),
        transition: F,
    ) -> Result<(), RegistryError>
    where
        F: FnOnce(&StudentRecord) -> Result<StudentRecord, idreg_state::LifecycleError>,
    {
        let (token, next) = self
            .prepare_transition(ctx, external_id, transition)
            .map_err(|e| reject(op, ctx, e))?;
        let event = self.prepare_event(op, ctx, name, payload)?;
        self.records.insert(token, next);
        self.events.append(event);
        Ok(())
    }

    fn prepare_transition<F>(
        &self,
        ctx: &CallContext,
        external_id: &ExternalId,
        transition: F,
    ) -> Result<(TokenId, StudentRecord), RegistryError>
    where
        F: FnOnce(&StudentRecord) -> Result<StudentRecord, idreg_state::LifecycleError>,
    {
        self.admins.authorize(&ctx.caller)?;
        let token = TokenId::from_external_id(external_id);
        let current = self
            .records
            .get(&token)
            .ok_or_else(|| RegistryError::InvalidStudent(external_id.clone()))?;
        let next = transition(current)?;
        Ok((token, next))
    }

    /// Build the call's audit event ahead of any write.
    fn prepare_event(
        &self,
        op: &'static str,
        ctx: &CallContext,
        name: EventName,
        payload: BTreeMap<String, String>,
    ) -> Result<AuditEvent, RegistryError> {
        self.events
            .prepare(name, payload, ctx.height)
            .map_err(|e| reject(op, ctx, RegistryError::AuditEncoding(e.to_string())))
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The record for `external_id`.
    pub fn get_record(&self, external_id: &ExternalId) -> Result<StudentRecord, RegistryError> {
        self.records
            .get(&TokenId::from_external_id(external_id))
            .cloned()
            .ok_or_else(|| RegistryError::InvalidStudent(external_id.clone()))
    }

    /// Whether `addr` holds at least one token.
    pub fn is_enrolled(&self, addr: &Address) -> bool {
        self.ownership.balance_of(addr) > 0
    }

    /// Tokens held by `holder`. Linear scan.
    pub fn tokens_of(&self, holder: &Address) -> Vec<TokenId> {
        self.ownership.tokens_of(holder)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been issued.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in token order.
    pub fn records(&self) -> impl Iterator<Item = (&TokenId, &StudentRecord)> {
        self.records.iter()
    }

    /// All records ordered by `enrolled_at`. Stable: equal keys keep token
    /// order.
    pub fn records_by_enrollment(&self) -> Vec<&StudentRecord> {
        let mut out: Vec<&StudentRecord> = self.records.iter().map(|(_, r)| r).collect();
        out.sort_by(|a, b| a.enrolled_at.cmp(&b.enrolled_at));
        out
    }

    // ── Integrity ────────────────────────────────────────────────────

    /// Verify cross-collection invariants on (typically restored) state:
    /// every record is indexed under its token, email, and external id, has
    /// an owner and URI, and satisfies its lifecycle invariants; no index
    /// points at a missing record; the admin set is non-empty; the audit
    /// chain verifies.
    pub fn check_integrity(&self) -> Result<(), RegistryError> {
        let fail = |msg: String| Err(RegistryError::Integrity(msg));

        if let Err(e) = self.config.validate() {
            return fail(format!("config: {e}"));
        }
        if self.admins.is_empty() {
            return fail("admin set is empty".to_string());
        }
        for (token, record) in self.records.iter() {
            if *token != TokenId::from_external_id(&record.external_id) {
                return fail(format!("token {token} does not derive from its external id"));
            }
            if !record.is_consistent() {
                return fail(format!("record {token} violates lifecycle invariants"));
            }
            if self.emails.lookup(&record.email) != Some(token) {
                return fail(format!("email index missing {token}"));
            }
            if self.external_ids.lookup(&record.external_id) != Some(token) {
                return fail(format!("external id index missing {token}"));
            }
            if !self.ownership.contains(token) {
                return fail(format!("token {token} has no owner"));
            }
            if !self.token_uris.contains(token) {
                return fail(format!("token {token} has no URI"));
            }
        }
        let counts = [
            ("ownership", self.ownership.len()),
            ("email index", self.emails.len()),
            ("external id index", self.external_ids.len()),
            ("token URIs", self.token_uris.len()),
        ];
        for (name, len) in counts {
            if len != self.records.len() {
                return fail(format!(
                    "{name} has {len} entries for {} records",
                    self.records.len()
                ));
            }
        }
        if let Err(e) = self.events.verify_chain() {
            return fail(format!("audit log: {e}"));
        }
        Ok(())
    }
}

/// Log a rejected call and pass the error through.
fn reject(op: &'static str, ctx: &CallContext, err: RegistryError) -> RegistryError {
    tracing::debug!(
        op,
        caller = %ctx.caller,
        height = %ctx.height,
        kind = %err.kind(),
        error = %err,
        "registry call rejected"
    );
    err
}
