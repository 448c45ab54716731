// Windows-only integration tests: ACL round-trips through real filesystem
// objects, cross-checked against icacls where account names do not matter.
#![cfg(windows)]
#![allow(clippy::expect_used, reason = "Expect is not an issue in tests")]
#![allow(clippy::unwrap_used, reason = "Unwrap is not an issue in tests")]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use win_access_control::fs::{
    create_directory_with_security, create_file_with_security, directory_access_control,
    file_access_control, set_file_access_control, stream_access_control, SecurityOpError,
};
use win_access_control::{
    AccessControlSections, AccessDecision, CreateFileOptions, FileMode, FileShare,
    FileSystemRights, SecurityDescriptor, Trustee,
};

/// Per-test scratch location under the system temp directory.
fn scratch(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("win-access-control-{}-{name}", std::process::id()));
    path
}

fn remove_best_effort(path: &Path) {
    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_dir_all(path);
}

/// Asserts through icacls that the object carries an entry for the SID,
/// avoiding localized account names.
fn icacls_finds_sid(path: &Path, sid: &str) -> bool {
    let output = Command::new("icacls")
        .arg(path)
        .arg("/findsid")
        .arg(format!("*{sid}"))
        .output()
        .expect("failed to launch icacls");
    assert!(
        output.status.success(),
        "icacls failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).contains(path.file_name().unwrap().to_str().unwrap())
}

#[test]
fn create_file_applies_initial_security() {
    let dir = scratch("create-file");
    std::fs::create_dir_all(&dir).unwrap();
    let target = dir.join("file.txt");

    let descriptor = SecurityDescriptor::new()
        .allow(Trustee::builtin_users(), FileSystemRights::FULL_CONTROL);
    let options = CreateFileOptions::new(FileMode::Create, FileSystemRights::WRITE_DATA)
        .share(FileShare::READ)
        .buffer_size(4096);

    let mut file =
        create_file_with_security(&target, &options, &descriptor).expect("creation failed");
    file.write_all(b"secured").unwrap();
    drop(file);
    assert!(target.exists(), "file must exist after creation");

    let applied = file_access_control(&target, AccessControlSections::ACCESS).unwrap();
    assert!(
        applied.explicit_rules().any(|rule| {
            rule.decision == AccessDecision::Allow
                && rule.trustee == Trustee::builtin_users()
                && rule.rights.contains(FileSystemRights::FULL_CONTROL)
        }),
        "read-back descriptor lacks the allow/full-control rule: {applied:?}"
    );
    assert!(
        applied.contains_explicit_rules(&descriptor),
        "read-back rules are not a superset of the applied ones"
    );
    assert!(
        icacls_finds_sid(&target, "S-1-5-32-545"),
        "icacls does not see the Users entry"
    );

    remove_best_effort(&target);
    remove_best_effort(&dir);
}

#[test]
fn existing_directory_keeps_its_original_security() {
    let dir = scratch("createMe");

    let first = create_directory_with_security(&dir, &SecurityDescriptor::new())
        .expect("first creation failed");
    assert!(dir.is_dir(), "directory must exist after creation");
    assert!(
        first.explicit_rules().next().is_none(),
        "empty descriptor must yield no explicit rules: {first:?}"
    );

    // Second creation with a different descriptor: the original (empty)
    // descriptor must win and the deny rule must not appear.
    let second_descriptor = SecurityDescriptor::new()
        .deny(Trustee::builtin_guests(), FileSystemRights::EXECUTE_FILE);
    let second = create_directory_with_security(&dir, &second_descriptor)
        .expect("second creation failed");

    assert!(
        !second.explicit_rules().any(|rule| {
            rule.decision == AccessDecision::Deny && rule.trustee == Trustee::builtin_guests()
        }),
        "pre-existing security was overwritten: {second:?}"
    );

    remove_best_effort(&dir);
}

#[test]
fn set_then_get_round_trips_on_a_file() {
    let dir = scratch("round-trip");
    std::fs::create_dir_all(&dir).unwrap();
    let target = dir.join("plain.txt");
    std::fs::write(&target, b"plain").unwrap();

    let descriptor = SecurityDescriptor::new()
        .allow(Trustee::builtin_administrators(), FileSystemRights::FULL_CONTROL)
        .allow(Trustee::builtin_users(), FileSystemRights::READ);
    set_file_access_control(&target, &descriptor).expect("set failed");

    let read_back = file_access_control(&target, AccessControlSections::ACCESS).unwrap();
    assert!(
        read_back.contains_explicit_rules(&descriptor),
        "read-back rules are not a superset of the applied ones: {read_back:?}"
    );

    remove_best_effort(&target);
    remove_best_effort(&dir);
}

#[test]
fn stream_access_matches_path_access() {
    let dir = scratch("stream");
    std::fs::create_dir_all(&dir).unwrap();
    let target = dir.join("stream.txt");
    std::fs::write(&target, b"stream").unwrap();

    let from_path = file_access_control(&target, AccessControlSections::ACCESS).unwrap();
    let stream = std::fs::File::open(&target).unwrap();
    let from_handle = stream_access_control(&stream, AccessControlSections::ACCESS).unwrap();

    assert!(from_path.contains_explicit_rules(&from_handle), "path view misses handle rules");
    assert!(from_handle.contains_explicit_rules(&from_path), "handle view misses path rules");

    remove_best_effort(&target);
    remove_best_effort(&dir);
}

#[test]
fn directory_read_reports_owner_when_asked() {
    let dir = scratch("owner");
    create_directory_with_security(&dir, &SecurityDescriptor::new()).unwrap();

    let with_owner = directory_access_control(
        &dir,
        AccessControlSections::ACCESS | AccessControlSections::OWNER,
    )
    .unwrap();
    assert!(with_owner.owner().is_some(), "owner section missing");

    let without_owner = directory_access_control(&dir, AccessControlSections::ACCESS).unwrap();
    assert!(without_owner.owner().is_none(), "owner returned unasked");

    remove_best_effort(&dir);
}

#[test]
fn missing_parent_is_parent_not_found_for_files() {
    let missing = scratch("no-such-parent").join("sub").join("file.txt");
    let options = CreateFileOptions::new(FileMode::Create, FileSystemRights::WRITE_DATA);
    let error = create_file_with_security(&missing, &options, &SecurityDescriptor::new())
        .expect_err("creation under a missing parent must fail");
    assert!(
        matches!(error, SecurityOpError::ParentNotFound { .. }),
        "unexpected error: {error:?}"
    );
}

#[test]
fn missing_parent_is_access_denied_for_directories() {
    let missing = scratch("no-such-parent-dir").join("sub").join("leaf");
    let error = create_directory_with_security(&missing, &SecurityDescriptor::new())
        .expect_err("creation under a missing parent must fail");
    assert!(
        matches!(error, SecurityOpError::AccessDenied { .. }),
        "unexpected error: {error:?}"
    );
}

#[test]
fn create_new_refuses_an_existing_file() {
    let dir = scratch("create-new");
    std::fs::create_dir_all(&dir).unwrap();
    let target = dir.join("existing.txt");
    std::fs::write(&target, b"existing").unwrap();

    let options = CreateFileOptions::new(FileMode::CreateNew, FileSystemRights::WRITE_DATA);
    let error = create_file_with_security(&target, &options, &SecurityDescriptor::new())
        .expect_err("CreateNew over an existing file must fail");
    assert!(
        matches!(error, SecurityOpError::Platform { .. }),
        "unexpected error: {error:?}"
    );

    remove_best_effort(&target);
    remove_best_effort(&dir);
}
