use crate::{
    CoreError,
    helper::{HelperConfig, HelperSupervisor, curated_env},
    socket::SocketServer,
};

use std::{path::PathBuf, process, sync::Arc, time::Duration};

#[allow(clippy::unwrap_used)]
fn unique_temp_path(label: &str, extension: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "voicelink-test-{label}-{}-{nanos}.{extension}",
        process::id()
    ))
}

/// A stand-in helper that idles until terminated.
#[allow(clippy::unwrap_used)]
fn write_fake_helper(label: &str) -> PathBuf {
    let path = unique_temp_path(label, "sh");
    std::fs::write(&path, "#!/bin/sh\nsleep 30\n").unwrap();
    path
}

fn test_supervisor(label: &str, binary: PathBuf) -> HelperSupervisor {
    let (server, _events) = SocketServer::new(unique_temp_path(label, "sock"));
    HelperSupervisor::new(
        HelperConfig {
            binary_override: Some(binary),
            grace_period: Duration::from_secs(2),
        },
        Arc::new(server),
    )
}

/// WHAT: Calling start twice spawns exactly one child
/// WHY: start must be idempotent while a helper is live
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_running_helper_when_start_called_again_then_single_process() {
    let binary = write_fake_helper("idempotent-start");
    let supervisor = test_supervisor("idempotent-start", binary.clone());

    supervisor.start().await.unwrap();
    let first_pid = supervisor.pid().await.unwrap();

    supervisor.start().await.unwrap();
    let second_pid = supervisor.pid().await.unwrap();

    assert_eq!(first_pid, second_pid);

    supervisor.stop().await;
    let _ = std::fs::remove_file(binary);
}

/// WHAT: stop terminates the helper and clears the handle
/// WHY: A stopped helper must be observably not-running so it can restart
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_running_helper_when_stopped_then_handle_cleared() {
    let binary = write_fake_helper("stop");
    let supervisor = test_supervisor("stop", binary.clone());

    supervisor.start().await.unwrap();
    assert!(supervisor.is_running().await);

    supervisor.stop().await;

    assert!(!supervisor.is_running().await);
    assert!(supervisor.pid().await.is_none());

    let _ = std::fs::remove_file(binary);
}

/// WHAT: stop on a never-started supervisor returns immediately
/// WHY: Teardown must be idempotent after partial initialization
#[tokio::test]
async fn given_stopped_supervisor_when_stop_called_then_noop() {
    let binary = write_fake_helper("noop-stop");
    let supervisor = test_supervisor("noop-stop", binary.clone());

    supervisor.stop().await;
    supervisor.stop().await;

    assert!(!supervisor.is_running().await);
    let _ = std::fs::remove_file(binary);
}

/// WHAT: A missing binary fails fast with a descriptive error
/// WHY: Helper absence is fatal to voice features; the caller needs the
/// probed path to report it
#[tokio::test]
async fn given_missing_binary_when_starting_then_descriptive_error() {
    let missing = unique_temp_path("missing-binary", "bin");
    let supervisor = test_supervisor("missing-binary", missing.clone());

    let result = supervisor.start().await;

    match result {
        Err(CoreError::HelperBinaryMissing { searched, .. }) => {
            assert!(searched.contains(&missing.display().to_string()));
        }
        other => assert!(other.is_err(), "expected HelperBinaryMissing, got Ok"),
    }
    assert!(!supervisor.is_running().await);
}

/// WHAT: restart replaces the child with a fresh process
/// WHY: restart is stop-then-start with no overlap between the phases
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_running_helper_when_restarted_then_new_process() {
    let binary = write_fake_helper("restart");
    let supervisor = test_supervisor("restart", binary.clone());

    supervisor.start().await.unwrap();
    let first_pid = supervisor.pid().await.unwrap();

    supervisor.restart().await.unwrap();
    let second_pid = supervisor.pid().await.unwrap();

    assert_ne!(first_pid, second_pid);
    assert!(supervisor.is_running().await);

    supervisor.stop().await;
    let _ = std::fs::remove_file(binary);
}

/// WHAT: A helper ignoring the termination signal is forcefully killed
/// WHY: stop bounds its grace period and escalates rather than hanging
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_signal_ignoring_helper_when_stopped_then_forcefully_killed() {
    let binary = unique_temp_path("stubborn", "sh");
    std::fs::write(&binary, "#!/bin/sh\ntrap '' TERM\nsleep 30\n").unwrap();

    let (server, _events) = SocketServer::new(unique_temp_path("stubborn", "sock"));
    let supervisor = HelperSupervisor::new(
        HelperConfig {
            binary_override: Some(binary.clone()),
            grace_period: Duration::from_millis(300),
        },
        Arc::new(server),
    );

    supervisor.start().await.unwrap();
    assert!(supervisor.is_running().await);

    supervisor.stop().await;

    assert!(!supervisor.is_running().await);
    let _ = std::fs::remove_file(binary);
}

/// WHAT: Config pushes with no connected helper deliver to nobody
/// WHY: sync_config rides the socket broadcast; an absent client is not an error
#[tokio::test]
async fn given_no_clients_when_syncing_config_then_zero_delivered() {
    let binary = write_fake_helper("sync");
    let supervisor = test_supervisor("sync", binary.clone());

    let delivered = supervisor
        .sync_config(serde_json::json!({ "auth_token": null }))
        .await;

    assert_eq!(delivered, 0);
    let _ = std::fs::remove_file(binary);
}

/// WHAT: The curated environment carries only the allow-list and host flags
/// WHY: Nothing else from the host environment may leak to the child
#[test]
fn given_curated_env_when_built_then_allow_list_only() {
    let env = curated_env();
    let keys: Vec<&str> = env.iter().map(|(k, _)| k.as_str()).collect();

    for key in &keys {
        assert!(
            matches!(
                *key,
                "PATH"
                    | "HOME"
                    | "USER"
                    | "TMPDIR"
                    | "LANG"
                    | "VOICELINK_HOST_TEXT_INSERTION"
                    | "VOICELINK_LAUNCHED_BY_HOST"
            ),
            "unexpected env key {key}"
        );
    }

    assert!(keys.contains(&"LANG"));
    assert!(keys.contains(&"VOICELINK_HOST_TEXT_INSERTION"));
    assert!(keys.contains(&"VOICELINK_LAUNCHED_BY_HOST"));
}
