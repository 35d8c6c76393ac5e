//! # Commands
//!
//! One subcommand per registry operation. Mutating commands load the state
//! file, run the operation at the next height as the `--as` caller, and
//! save only if the registry accepted the call. Queries never write.
//!
//! Every handler returns the JSON document `main` prints.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::{json, Value};

use idreg_core::{Address, Email, ExternalId, TokenId};
use idreg_registry::{CallContext, Registry, RegistryConfig, RegistryError};
use idreg_state::{NewStudent, StudentStatus};

use crate::state::StateFile;

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Globals {
    /// Path of the JSON state file.
    pub state: PathBuf,
    /// Registry configuration file, consulted only by `init`.
    pub config: Option<PathBuf>,
    /// Caller identity for mutating commands.
    pub caller: Option<Address>,
}

/// Registry subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a new state file with the given initial admins.
    Init {
        /// Initial admin address. Repeat for several.
        #[arg(long = "admin", required = true)]
        admins: Vec<Address>,
    },

    /// Issue a student identity token.
    Issue(IssueArgs),

    /// Add an admin.
    AddAdmin {
        #[arg(long)]
        admin: Address,
    },

    /// Remove an admin. The last admin cannot be removed.
    RemoveAdmin {
        #[arg(long)]
        admin: Address,
    },

    /// Set a student's year of study.
    UpdateYear {
        #[arg(long)]
        external_id: ExternalId,
        #[arg(long)]
        year: u8,
    },

    /// Set a student's status to ACTIVE or PROBATION.
    SetStatus {
        #[arg(long)]
        external_id: ExternalId,
        /// ACTIVE or PROBATION.
        #[arg(long)]
        status: StudentStatus,
        /// Probation reason. Ignored for ACTIVE.
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Graduate a final-year student.
    Graduate {
        #[arg(long)]
        external_id: ExternalId,
    },

    /// Move a student to another department.
    TransferDepartment {
        #[arg(long)]
        external_id: ExternalId,
        #[arg(long)]
        department: String,
    },

    /// Show a student record.
    Show {
        #[arg(long)]
        external_id: ExternalId,
    },

    /// Whether an address holds a student token.
    Enrolled {
        #[arg(long)]
        address: Address,
    },

    /// Holder of a token.
    OwnerOf {
        #[arg(long)]
        token: TokenId,
    },

    /// Number of tokens held by an address.
    BalanceOf {
        #[arg(long)]
        address: Address,
    },

    /// List all records.
    List {
        /// Order by enrollment date instead of token id.
        #[arg(long)]
        by_enrollment: bool,
    },

    /// Print the audit log.
    Events {
        /// Recompute the hash chain before printing.
        #[arg(long)]
        verify: bool,
        /// Only the last N events of the log. Applied before `--token`.
        #[arg(long)]
        last: Option<usize>,
        /// Only events for this token.
        #[arg(long)]
        token: Option<TokenId>,
    },
}

/// Fields of a new student record.
#[derive(Args, Debug, Clone)]
pub struct IssueArgs {
    /// Address the token is issued to.
    #[arg(long)]
    pub holder: Address,
    #[arg(long)]
    pub full_name: String,
    #[arg(long)]
    pub date_of_birth: String,
    /// Institutional email; must end with the configured domain.
    #[arg(long)]
    pub email: Email,
    /// Student number, e.g. `2021/0001`. Also the token id.
    #[arg(long)]
    pub external_id: ExternalId,
    #[arg(long)]
    pub department: String,
    #[arg(long)]
    pub year: u8,
    /// Enrollment date, e.g. `2021-10-01`.
    #[arg(long)]
    pub enrolled_at: String,
}

impl From<IssueArgs> for NewStudent {
    fn from(a: IssueArgs) -> Self {
        NewStudent {
            full_name: a.full_name,
            date_of_birth: a.date_of_birth,
            email: a.email,
            external_id: a.external_id,
            department: a.department,
            year: a.year,
            enrolled_at: a.enrolled_at,
        }
    }
}

impl Command {
    /// Whether the command changes registry state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Issue(_)
                | Self::AddAdmin { .. }
                | Self::RemoveAdmin { .. }
                | Self::UpdateYear { .. }
                | Self::SetStatus { .. }
                | Self::Graduate { .. }
                | Self::TransferDepartment { .. }
        )
    }
}

/// Execute a command against the state file named in `globals`.
pub fn run(globals: &Globals, command: Command) -> Result<Value> {
    if globals.config.is_some() && !matches!(command, Command::Init { .. }) {
        tracing::warn!("--config is only read by `init`; the state file carries its own config");
    }
    match command {
        Command::Init { admins } => cmd_init(globals, admins),

        Command::Issue(args) => mutate(globals, |reg, ctx| {
            let holder = args.holder.clone();
            let token = reg.issue(ctx, &holder, args.into())?;
            Ok(json!({ "token_id": token }))
        }),
        Command::AddAdmin { admin } => mutate(globals, |reg, ctx| {
            reg.add_admin(ctx, &admin)?;
            Ok(json!({ "admin": admin }))
        }),
        Command::RemoveAdmin { admin } => mutate(globals, |reg, ctx| {
            reg.remove_admin(ctx, &admin)?;
            Ok(json!({ "admin": admin }))
        }),
        Command::UpdateYear { external_id, year } => mutate(globals, |reg, ctx| {
            reg.update_year(ctx, &external_id, year)?;
            Ok(json!({ "external_id": external_id, "year": year }))
        }),
        Command::SetStatus {
            external_id,
            status,
            reason,
        } => mutate(globals, |reg, ctx| {
            reg.set_status(ctx, &external_id, status, &reason)?;
            Ok(json!({ "external_id": external_id, "status": status }))
        }),
        Command::Graduate { external_id } => mutate(globals, |reg, ctx| {
            reg.graduate(ctx, &external_id)?;
            Ok(json!({ "external_id": external_id, "graduated_at": ctx.height }))
        }),
        Command::TransferDepartment {
            external_id,
            department,
        } => mutate(globals, |reg, ctx| {
            reg.transfer_department(ctx, &external_id, &department)?;
            Ok(json!({ "external_id": external_id, "department": department }))
        }),

        Command::Show { external_id } => query(globals, |reg| {
            let record = reg.get_record(&external_id)?;
            let token = TokenId::from_external_id(&external_id);
            let owner = reg.owner_of(&token)?;
            Ok(json!({ "token_id": token, "owner": owner, "record": record }))
        }),
        Command::Enrolled { address } => query(globals, |reg| {
            Ok(json!({
                "address": address,
                "enrolled": reg.is_enrolled(&address),
                "tokens": reg.tokens_of(&address),
            }))
        }),
        Command::OwnerOf { token } => query(globals, |reg| {
            let owner = reg.owner_of(&token)?;
            Ok(json!({ "token_id": token, "owner": owner }))
        }),
        Command::BalanceOf { address } => query(globals, |reg| {
            Ok(json!({ "address": address, "balance": reg.balance_of(&address) }))
        }),
        Command::List { by_enrollment } => query(globals, |reg| {
            let records: Vec<_> = if by_enrollment {
                reg.records_by_enrollment().into_iter().cloned().collect()
            } else {
                reg.records().map(|(_, r)| r.clone()).collect()
            };
            Ok(json!({
                "name": reg.name(),
                "symbol": reg.symbol(),
                "total_supply": reg.total_supply(),
                "records": records,
            }))
        }),
        Command::Events {
            verify,
            last,
            token,
        } => cmd_events(&globals.state, verify, last, token),
    }
}

fn cmd_init(globals: &Globals, admins: Vec<Address>) -> Result<Value> {
    if globals.state.exists() {
        bail!("state file already exists: {}", globals.state.display());
    }
    let config = match &globals.config {
        Some(path) => RegistryConfig::from_yaml_file(path)?,
        None => RegistryConfig::from_env()?,
    };
    let state = StateFile::new(config, admins)?;
    state.save(&globals.state)?;
    tracing::info!(path = %globals.state.display(), "registry initialized");

    let admins: Vec<&Address> = state.registry.admins().addresses().collect();
    Ok(json!({
        "state": globals.state.display().to_string(),
        "admins": admins,
        "config": state.registry.config(),
    }))
}

/// Run one mutating call at the next height and persist on success.
fn mutate<F>(globals: &Globals, op: F) -> Result<Value>
where
    F: FnOnce(&mut Registry, &CallContext) -> Result<Value, RegistryError>,
{
    let Some(caller) = globals.caller.clone() else {
        bail!("mutating commands require --as ADDRESS");
    };
    let mut state = StateFile::load(&globals.state)?;
    let ctx = state.next_call(caller);

    let mut output = op(&mut state.registry, &ctx)?;

    state.commit(&ctx);
    state.save(&globals.state)?;

    if let Value::Object(map) = &mut output {
        map.insert("height".to_string(), json!(ctx.height));
        if let Some(event) = state.registry.events().last() {
            map.insert("event".to_string(), serde_json::to_value(event)?);
        }
    }
    Ok(output)
}

fn query<F>(globals: &Globals, op: F) -> Result<Value>
where
    F: FnOnce(&Registry) -> Result<Value, RegistryError>,
{
    let state = StateFile::load(&globals.state)?;
    Ok(op(&state.registry)?)
}

/// The audit log is read without the integrity check so that `--verify`
/// can report where a damaged chain breaks.
fn cmd_events(
    path: &Path,
    verify: bool,
    last: Option<usize>,
    token: Option<TokenId>,
) -> Result<Value> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let state: StateFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let log = state.registry.events();

    if verify {
        log.verify_chain().context("audit chain verification failed")?;
    }

    let window = match last {
        Some(n) => log.last_n(n),
        None => log.events(),
    };
    let events: Vec<_> = window
        .iter()
        .filter(|e| token.as_ref().map_or(true, |t| e.field("token_id") == Some(t.as_str())))
        .collect();

    Ok(json!({
        "total": log.len(),
        "verified": verify,
        "head": log.last().map(|e| e.digest),
        "events": events,
    }))
}
