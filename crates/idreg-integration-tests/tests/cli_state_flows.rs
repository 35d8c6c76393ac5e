//! # CLI State Flows
//!
//! Drives the command layer against a real state file in a temp directory:
//! heights advance per committed mutation, rejected calls leave the file
//! byte-identical, and a damaged file is refused on load.

use std::path::Path;

use idreg_cli::commands::{run, Command, Globals, IssueArgs};
use idreg_cli::state::StateFile;
use idreg_cli::{exit_code, rejection};
use idreg_core::{Address, BlockHeight, Email, ExternalId};
use idreg_registry::{ErrorKind, RegistryError};
use idreg_state::StudentStatus;

fn addr(s: &str) -> Address {
    Address::new(s).unwrap()
}

fn ext(s: &str) -> ExternalId {
    ExternalId::new(s).unwrap()
}

fn globals(dir: &Path, caller: Option<&str>) -> Globals {
    Globals {
        state: dir.join("registry.json"),
        config: None,
        caller: caller.map(addr),
    }
}

fn issue(id: &str, email: &str, holder: &str, year: u8) -> Command {
    Command::Issue(IssueArgs {
        holder: addr(holder),
        full_name: "Jane Roe".to_string(),
        date_of_birth: "2001-07-30".to_string(),
        email: Email::new(email).unwrap(),
        external_id: ext(id),
        department: "Electrical Engineering".to_string(),
        year,
        enrolled_at: "2020-10-01".to_string(),
    })
}

fn registry_error(err: &anyhow::Error) -> &RegistryError {
    err.downcast_ref::<RegistryError>()
        .expect("expected a registry rejection")
}

#[test]
fn full_student_lifecycle_through_cli() {
    let dir = tempfile::tempdir().unwrap();
    let admin = globals(dir.path(), Some("g1registrar"));

    run(
        &globals(dir.path(), None),
        Command::Init {
            admins: vec![addr("g1registrar")],
        },
    )
    .unwrap();

    run(&admin, issue("2020/0042", "jane@raf.rs", "g1jane", 3)).unwrap();
    run(
        &admin,
        Command::SetStatus {
            external_id: ext("2020/0042"),
            status: StudentStatus::Probation,
            reason: "missing lab reports".to_string(),
        },
    )
    .unwrap();
    run(
        &admin,
        Command::UpdateYear {
            external_id: ext("2020/0042"),
            year: 4,
        },
    )
    .unwrap();
    let out = run(
        &admin,
        Command::Graduate {
            external_id: ext("2020/0042"),
        },
    )
    .unwrap();
    assert_eq!(out["graduated_at"], 4);

    let state = StateFile::load(&admin.state).unwrap();
    assert_eq!(state.height, BlockHeight::new(4));
    let rec = state.registry.get_record(&ext("2020/0042")).unwrap();
    assert_eq!(rec.status, StudentStatus::Graduated);
    assert_eq!(rec.graduated_at, Some(BlockHeight::new(4)));

    let err = run(
        &admin,
        Command::TransferDepartment {
            external_id: ext("2020/0042"),
            department: "Physics".to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(registry_error(&err).kind(), ErrorKind::TerminalState);
    assert_eq!(StateFile::load(&admin.state).unwrap().height, BlockHeight::new(4));
}

#[test]
fn rejected_mutation_does_not_touch_file() {
    let dir = tempfile::tempdir().unwrap();
    let admin = globals(dir.path(), Some("g1registrar"));
    run(
        &admin,
        Command::Init {
            admins: vec![addr("g1registrar")],
        },
    )
    .unwrap();
    run(&admin, issue("2020/0001", "a@raf.rs", "g1a", 1)).unwrap();
    let before = std::fs::read(&admin.state).unwrap();

    let err = run(&admin, issue("2020/0002", "a@raf.rs", "g1b", 1)).unwrap_err();
    assert!(matches!(registry_error(&err), RegistryError::EmailExists(_)));
    assert_eq!(exit_code(&err), 1);

    let err = run(
        &admin,
        Command::RemoveAdmin {
            admin: addr("g1registrar"),
        },
    )
    .unwrap_err();
    assert!(matches!(
        registry_error(&err),
        RegistryError::LastAdminProtected(_)
    ));

    assert_eq!(std::fs::read(&admin.state).unwrap(), before);
}

#[test]
fn admin_handover_through_cli() {
    let dir = tempfile::tempdir().unwrap();
    let old = globals(dir.path(), Some("g1old"));
    let new = globals(dir.path(), Some("g1new"));
    run(
        &old,
        Command::Init {
            admins: vec![addr("g1old")],
        },
    )
    .unwrap();

    run(&old, Command::AddAdmin { admin: addr("g1new") }).unwrap();
    run(&new, Command::RemoveAdmin { admin: addr("g1old") }).unwrap();

    let err = run(&old, issue("2020/0001", "a@raf.rs", "g1a", 1)).unwrap_err();
    assert!(matches!(
        registry_error(&err),
        RegistryError::Unauthorized { .. }
    ));
    run(&new, issue("2020/0001", "a@raf.rs", "g1a", 1)).unwrap();
}

#[test]
fn init_reads_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("registry.yaml");
    std::fs::write(&config, "email_domain: \"@uni.example\"\nfinal_year: 3\n").unwrap();

    let mut g = globals(dir.path(), None);
    g.config = Some(config);
    let out = run(
        &g,
        Command::Init {
            admins: vec![addr("g1registrar")],
        },
    )
    .unwrap();
    assert_eq!(out["config"]["final_year"], 3);

    let admin = globals(dir.path(), Some("g1registrar"));
    assert!(run(&admin, issue("2020/0001", "a@raf.rs", "g1a", 1)).is_err());
    run(&admin, issue("2020/0001", "a@uni.example", "g1a", 3)).unwrap();
    run(
        &admin,
        Command::Graduate {
            external_id: ext("2020/0001"),
        },
    )
    .unwrap();
}

#[test]
fn tampered_state_is_refused_but_events_verify_pinpoints_it() {
    let dir = tempfile::tempdir().unwrap();
    let admin = globals(dir.path(), Some("g1registrar"));
    run(
        &admin,
        Command::Init {
            admins: vec![addr("g1registrar")],
        },
    )
    .unwrap();
    run(&admin, issue("2020/0001", "a@raf.rs", "g1a", 1)).unwrap();
    run(
        &admin,
        Command::TransferDepartment {
            external_id: ext("2020/0001"),
            department: "Mathematics".to_string(),
        },
    )
    .unwrap();

    let raw = std::fs::read_to_string(&admin.state).unwrap();
    let mut doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    doc["registry"]["events"][1]["fields"]["department"] = "Physics".into();
    std::fs::write(&admin.state, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

    let err = run(
        &admin,
        Command::Show {
            external_id: ext("2020/0001"),
        },
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("integrity"));
    assert!(rejection(&err).is_none());
    assert_eq!(exit_code(&err), 2);

    let err = run(
        &admin,
        Command::Events {
            verify: true,
            last: None,
            token: None,
        },
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("event 1 digest"));
    assert_eq!(exit_code(&err), 2);
}
