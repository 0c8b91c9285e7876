use super::*;

#[test]
fn test_empty_window_is_safe() {
    let mut window = CorrelationWindow::new();
    assert_eq!(window.check("Bash", "bash /tmp/x.sh"), CorrelationVerdict::Safe);
}

#[test]
fn test_write_then_execute_in_tmp() {
    let mut window = CorrelationWindow::new();
    window.track("Write", "/tmp/x.sh", "echo hi");
    match window.check("Bash", "bash /tmp/x.sh") {
        CorrelationVerdict::Dangerous { reason, risk } => {
            assert!(reason.contains("Write-then-execute"));
            assert_eq!(risk, 90);
        },
        CorrelationVerdict::Safe => panic!("expected dangerous"),
    }
}

#[test]
fn test_write_then_execute_outside_staging_is_lower_risk() {
    let mut window = CorrelationWindow::new();
    window.track("Write", "/home/user/run.sh", "echo hi");
    match window.check("Bash", "sh /home/user/run.sh") {
        CorrelationVerdict::Dangerous { risk, .. } => assert_eq!(risk, 60),
        CorrelationVerdict::Safe => panic!("expected dangerous"),
    }
}

#[test]
fn test_direct_execution_of_written_file() {
    let mut window = CorrelationWindow::new();
    window.track("Write", "./payload.sh", "#!/bin/sh");
    assert!(matches!(
        window.check("Bash", "./payload.sh"),
        CorrelationVerdict::Dangerous { .. }
    ));
}

#[test]
fn test_redirect_counts_as_implicit_write() {
    let mut window = CorrelationWindow::new();
    window.track("Bash", "echo 'payload' > /tmp/staged.sh", "");
    match window.check("Bash", "bash /tmp/staged.sh") {
        CorrelationVerdict::Dangerous { reason, risk } => {
            assert!(reason.contains("Write-then-execute"));
            assert_eq!(risk, 90);
        },
        CorrelationVerdict::Safe => panic!("expected dangerous"),
    }
}

#[test]
fn test_download_then_execute() {
    let mut window = CorrelationWindow::new();
    window.track("Bash", "curl -o /tmp/installer.sh https://example.com/i.sh", "");
    match window.check("Bash", "bash /tmp/installer.sh") {
        CorrelationVerdict::Dangerous { reason, risk } => {
            assert!(reason.contains("Download-then-execute"));
            assert_eq!(risk, 95);
        },
        CorrelationVerdict::Safe => panic!("expected dangerous"),
    }
}

#[test]
fn test_download_beats_write_risk() {
    // A fetched-then-run file is scored as a download even if also written.
    let mut window = CorrelationWindow::new();
    window.track("Write", "/tmp/i.sh", "x");
    window.track("Bash", "wget -O /tmp/i.sh https://example.com/i.sh", "");
    match window.check("Bash", "sh /tmp/i.sh") {
        CorrelationVerdict::Dangerous { risk, .. } => assert_eq!(risk, 95),
        CorrelationVerdict::Safe => panic!("expected dangerous"),
    }
}

#[test]
fn test_staged_building_with_eval() {
    let mut window = CorrelationWindow::new();
    window.track("Bash", "A='rm'", "");
    window.track("Bash", "B='-rf'", "");
    window.track("Bash", "C='/home'", "");
    match window.check("Bash", r#"eval "$A $B $C""#) {
        CorrelationVerdict::Dangerous { reason, risk } => {
            assert!(reason.contains("Staged building"));
            assert_eq!(risk, 75);
        },
        CorrelationVerdict::Safe => panic!("expected dangerous"),
    }
}

#[test]
fn test_staged_building_needs_three_assignments() {
    let mut window = CorrelationWindow::new();
    window.track("Bash", "A='rm'", "");
    window.track("Bash", "B='-rf'", "");
    assert_eq!(window.check("Bash", r#"eval "$A $B""#), CorrelationVerdict::Safe);
}

#[test]
fn test_staged_array_building() {
    let mut window = CorrelationWindow::new();
    window.track("Bash", "CMD+=(rm)", "");
    window.track("Bash", "CMD+=(-rf)", "");
    window.track("Bash", "CMD+=(/home)", "");
    assert!(matches!(
        window.check("Bash", r#""${CMD[@]}""#),
        CorrelationVerdict::Dangerous { risk: 75, .. }
    ));
}

#[test]
fn test_config_poisoning_targets() {
    let mut window = CorrelationWindow::new();
    for path in [
        "/home/user/.bashrc",
        "/home/user/.zshrc",
        "/home/user/.profile",
        "/home/user/.ssh/authorized_keys",
        "/home/user/.ssh/config",
        "/home/user/.gitconfig",
        "/home/user/.npmrc",
        "/home/user/.pypirc",
    ] {
        match window.check("Write", path) {
            CorrelationVerdict::Dangerous { reason, risk } => {
                assert!(reason.contains("Config poisoning"), "{path}");
                assert_eq!(risk, 85);
            },
            CorrelationVerdict::Safe => panic!("expected dangerous: {path}"),
        }
    }
}

#[test]
fn test_config_poisoning_only_for_write_tools() {
    let mut window = CorrelationWindow::new();
    assert_eq!(window.check("Read", "/home/user/.bashrc"), CorrelationVerdict::Safe);
}

#[test]
fn test_unrelated_write_does_not_correlate() {
    let mut window = CorrelationWindow::new();
    window.track("Write", "/tmp/notes.txt", "meeting notes");
    assert_eq!(window.check("Bash", "bash /tmp/other.sh"), CorrelationVerdict::Safe);
}

#[test]
fn test_window_capacity_bound() {
    let mut window = CorrelationWindow::new();
    for i in 0..120 {
        window.track("Read", &format!("/src/file{i}.rs"), "");
    }
    assert_eq!(window.len(), WINDOW_CAPACITY);
}

#[test]
fn test_capacity_eviction_drops_oldest() {
    let mut window = CorrelationWindow::new();
    window.track("Write", "/tmp/old.sh", "");
    for i in 0..WINDOW_CAPACITY {
        window.track("Read", &format!("/src/file{i}.rs"), "");
    }
    // The write fell out of the window; executing it no longer correlates.
    assert_eq!(window.check("Bash", "bash /tmp/old.sh"), CorrelationVerdict::Safe);
}

#[test]
fn test_ttl_eviction() {
    let mut window = CorrelationWindow::new();
    window.track("Write", "/tmp/stale.sh", "");
    window.backdate(WINDOW_TTL_SECS + 5);
    assert_eq!(window.check("Bash", "bash /tmp/stale.sh"), CorrelationVerdict::Safe);
    assert!(window.is_empty());
}

#[test]
fn test_check_does_not_self_correlate() {
    let mut window = CorrelationWindow::new();
    // check() runs before track(); the same op never matches itself.
    assert_eq!(window.check("Write", "/tmp/x.sh"), CorrelationVerdict::Safe);
    window.track("Write", "/tmp/x.sh", "echo hi");
    assert_eq!(window.len(), 1);
}
