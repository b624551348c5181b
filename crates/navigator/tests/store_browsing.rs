use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;
use workdesk_navigator::{Navigator, NavigatorError, Removed, StoreLayout, UpTarget};
use workdesk_protocol::Role;
use workdesk_session::{ShortTokenRegistry, TokenTarget};

fn store() -> (TempDir, Navigator) {
    let dir = TempDir::new().expect("tempdir");
    let layout = StoreLayout::new(dir.path());
    layout.ensure_directories().expect("layout");
    (dir, Navigator::new(layout))
}

fn names(entries: &[workdesk_navigator::Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

#[test]
fn first_run_creates_role_and_shared_roots() {
    let (dir, _nav) = store();
    for role in Role::ALL {
        assert!(dir.path().join(role.as_str()).is_dir(), "{role} missing");
    }
    assert!(dir.path().join("Shared/Personal").is_dir());
    assert!(dir.path().join(".workdesk").is_dir());
}

#[test]
fn listing_is_sorted_partitioned_and_tokenized() {
    let (dir, nav) = store();
    let driver = dir.path().join("Driver");
    fs::create_dir_all(driver.join("reports")).unwrap();
    fs::create_dir_all(driver.join("archive")).unwrap();
    fs::write(driver.join("b.txt"), b"b").unwrap();
    fs::write(driver.join("a.txt"), b"a").unwrap();

    let mut tokens = ShortTokenRegistry::new();
    let listing = nav.list("Driver", "Driver", &mut tokens).unwrap();

    assert_eq!(names(&listing.folders), vec!["archive", "reports"]);
    assert_eq!(names(&listing.files), vec!["a.txt", "b.txt"]);
    assert_eq!(listing.up, UpTarget::ExitToMenu);
    assert_eq!(
        tokens.resolve(&listing.folders[1].token).unwrap(),
        TokenTarget::Path("Driver/reports".to_string())
    );

    let nested = nav.list("Driver", "Driver/reports", &mut tokens).unwrap();
    assert_eq!(nested.up, UpTarget::Parent("Driver".to_string()));
    assert!(nested.is_empty());
    // The previous render's tokens are gone.
    assert!(tokens.resolve(&listing.folders[0].token).is_err());
}

#[test]
fn store_root_listing_hides_internal_folder() {
    let (_dir, nav) = store();
    let mut tokens = ShortTokenRegistry::new();
    let listing = nav.list("", "", &mut tokens).unwrap();
    assert!(!names(&listing.folders).contains(&".workdesk"));
    assert!(names(&listing.folders).contains(&"Shared"));
}

#[test]
fn listing_never_escapes_root() {
    let (_dir, nav) = store();
    let mut tokens = ShortTokenRegistry::new();
    for escape in ["Director", "", "Driver/../Director", "Shared"] {
        let err = nav.list("Driver", escape, &mut tokens).unwrap_err();
        assert!(
            matches!(
                err,
                NavigatorError::OutsideRoot(_) | NavigatorError::InvalidPath(_)
            ),
            "{escape}: {err}"
        );
    }
}

#[cfg(unix)]
#[test]
fn symlink_out_of_root_is_rejected() {
    let (dir, nav) = store();
    std::os::unix::fs::symlink(dir.path().join("Director"), dir.path().join("Driver/escape"))
        .unwrap();
    let mut tokens = ShortTokenRegistry::new();
    assert!(matches!(
        nav.list("Driver", "Driver/escape", &mut tokens),
        Err(NavigatorError::OutsideRoot(_))
    ));
}

#[test]
fn second_delete_reports_not_found() {
    let (dir, nav) = store();
    fs::create_dir_all(dir.path().join("Driver/old/deeper")).unwrap();
    fs::write(dir.path().join("Driver/old/deeper/x.txt"), b"x").unwrap();

    assert_eq!(nav.delete("", "Driver/old").unwrap(), Removed::Folder);
    assert!(matches!(
        nav.delete("", "Driver/old"),
        Err(NavigatorError::NotFound(_))
    ));
    assert!(!dir.path().join("Driver/old").exists());
}

#[test]
fn root_itself_cannot_be_deleted() {
    let (_dir, nav) = store();
    assert!(matches!(
        nav.delete("Driver", "Driver"),
        Err(NavigatorError::InvalidPath(_))
    ));
}

#[test]
fn receive_creates_folder_and_detects_role() {
    let (dir, nav) = store();
    let received = nav
        .receive("", "Driver/reports", "report_march.pdf", b"%PDF")
        .unwrap();
    assert_eq!(received.rel, "Driver/reports/report_march.pdf");
    assert_eq!(received.role, Some(Role::Driver));
    assert_eq!(
        fs::read(dir.path().join("Driver/reports/report_march.pdf")).unwrap(),
        b"%PDF"
    );

    let shared = nav.receive("", "Shared", "memo.txt", b"hi").unwrap();
    assert_eq!(shared.role, None);

    assert!(nav.receive("", "Shared", "..", b"x").is_err());
    assert!(nav.file("", "Driver/reports/report_march.pdf").is_ok());
    assert!(matches!(
        nav.file("", "Driver/reports"),
        Err(NavigatorError::NotAFile(_))
    ));
}
