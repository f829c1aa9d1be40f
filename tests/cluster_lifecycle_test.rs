// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Opening, reusing and closing clusters

mod common;

use std::time::Duration;

use common::{eventually, Harness, MockTransport, RecordingControl, StaticLookup, UnavailableLookup};
use cssh::cluster::{ClusterController, Dispatch, Target};
use cssh::control::Command;
use cssh::error::{ClusterError, ResolutionError};

async fn hosts(controller: &ClusterController) -> Vec<String> {
    controller
        .sessions()
        .await
        .into_iter()
        .map(|session| session.endpoint.host)
        .collect()
}

fn list(hosts: &[&str]) -> Target {
    Target::List(hosts.iter().map(|h| h.to_string()).collect())
}

#[tokio::test]
async fn test_cluster_name_opens_one_session_per_address() {
    let lookup = StaticLookup::default().with("cluster.example", &["10.0.0.1", "10.0.0.2"]);
    let h = Harness::new(lookup, MockTransport::new());
    let control = RecordingControl::new("cssh alice@cluster.example");

    let controller = h
        .manager
        .open(Target::Cluster("alice@cluster.example".to_string()), control.clone())
        .await
        .unwrap();

    assert_eq!(hosts(&controller).await, vec!["10.0.0.1", "10.0.0.2"]);
    assert_eq!(
        h.presenter.displayed_titles(),
        vec!["alice@10.0.0.1", "alice@10.0.0.2"]
    );
    assert_eq!(
        control.prints(),
        vec!["Sessions (2):\n  [1] alice@10.0.0.1\n  [2] alice@10.0.0.2"]
    );
    assert_eq!(control.prompt_count(), 1);
    assert_eq!(control.last_prompt().as_deref(), Some("[●●] cssh> "));
    assert_eq!(h.history.snapshot(), vec!["alice@cluster.example"]);
}

#[tokio::test]
async fn test_failed_spawn_is_reported_once_and_left_out() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new().failing_spawn("h2"));
    let control = RecordingControl::new("cssh");

    let controller = h
        .manager
        .open(list(&["h1", "h2", "h3"]), control.clone())
        .await
        .unwrap();

    assert_eq!(hosts(&controller).await, vec!["h1", "h3"]);
    let failures: Vec<String> = control
        .prints()
        .into_iter()
        .filter(|text| text.starts_with("Failed to open"))
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with("Failed to open 1 session(s):"));
    assert!(failures[0].contains("alice@h2: connection refused"));

    let dispatch = controller.handle_line(",bufs").await;
    assert_eq!(dispatch, Dispatch::Command(Command::Bufs));
    assert_eq!(
        control.prints().last().map(String::as_str),
        Some("Sessions (2):\n  [1] alice@h1\n  [2] alice@h3")
    );
}

#[tokio::test]
async fn test_every_spawn_failing_still_yields_a_controller() {
    let transport = MockTransport::new().failing_spawn("h1").failing_spawn("h2");
    let h = Harness::new(StaticLookup::default(), transport);
    let control = RecordingControl::new("cssh");

    let controller = h.manager.open(list(&["h1", "h2"]), control.clone()).await.unwrap();

    assert_eq!(controller.session_count().await, 0);
    assert!(control
        .prints()
        .iter()
        .any(|text| text.starts_with("Failed to open 2 session(s):")));
    assert_eq!(control.last_prompt().as_deref(), Some("[-] cssh> "));
}

#[tokio::test]
async fn test_resolution_failure_leaves_nothing_behind() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let control = RecordingControl::new("cssh");

    let target = Target::Cluster("alice@-oProxyCommand=evil".to_string());
    let err = h.manager.open(target.clone(), control.clone()).await.unwrap_err();

    assert!(matches!(
        err,
        ClusterError::Resolution(ResolutionError::InvalidDestination { .. })
    ));
    assert!(h.log.opened().is_empty());
    assert!(h.manager.find(&target).is_none());
    assert_eq!(control.prompt_count(), 0);
}

#[tokio::test]
async fn test_unavailable_lookup_aborts_open() {
    let h = Harness::new(UnavailableLookup, MockTransport::new());
    let err = h
        .manager
        .open(
            Target::Cluster("cluster.example".to_string()),
            RecordingControl::new("cssh"),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClusterError::Resolution(ResolutionError::Unavailable { .. })
    ));
    assert!(h.log.opened().is_empty());
}

#[tokio::test]
async fn test_reopen_returns_the_live_controller() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let target = list(&["h1", "h2"]);

    let first = h
        .manager
        .open(target.clone(), RecordingControl::new("cssh"))
        .await
        .unwrap();
    let second_control = RecordingControl::new("cssh");
    let second = h
        .manager
        .open(target.clone(), second_control.clone())
        .await
        .unwrap();

    assert_eq!(first.id(), second.id());
    assert_eq!(h.log.opened(), vec!["h1", "h2"]);
    assert_eq!(second_control.prompt_count(), 0);
    assert_eq!(h.history.len(), 2);
}

#[tokio::test]
async fn test_reopen_after_close_starts_fresh() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let target = list(&["h1"]);

    let first = h
        .manager
        .open(target.clone(), RecordingControl::new("cssh"))
        .await
        .unwrap();
    h.manager.close(&first).await;
    assert!(h.manager.find(&target).is_none());

    let second = h
        .manager
        .open(target.clone(), RecordingControl::new("cssh"))
        .await
        .unwrap();

    assert_ne!(first.id(), second.id());
    assert!(!second.is_closed());
    assert_eq!(h.log.opened(), vec!["h1", "h1"]);
}

#[tokio::test]
async fn test_concurrent_opens_share_one_controller() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new().yielding());
    let target = list(&["h1", "h2"]);
    let (first, second) = (RecordingControl::new("cssh"), RecordingControl::new("cssh"));

    let (a, b) = tokio::join!(
        h.manager.open(target.clone(), first.clone()),
        h.manager.open(target.clone(), second.clone()),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.id(), b.id());
    assert!(!a.is_closed());
    assert_eq!(a.session_count().await, 2);

    // Both opens spawned; the loser's sessions were terminated quietly
    assert_eq!(h.log.opened().len(), 4);
    let mut terminated = h.log.terminated();
    terminated.sort();
    assert_eq!(terminated, vec!["h1", "h2"]);
    assert_eq!(h.presenter.close_all_count(), 0);
    assert_eq!(h.presenter.displayed_titles(), vec!["alice@h1", "alice@h2"]);
    assert_eq!(first.close_count(), 0);
    assert_eq!(second.close_count(), 0);
}

#[tokio::test]
async fn test_quit_terminates_live_and_dead_sessions() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let control = RecordingControl::new("cssh");
    let controller = h
        .manager
        .open(list(&["h1", "h2", "h3"]), control.clone())
        .await
        .unwrap();

    h.log.mark_dead("h2");
    let dispatch = controller.handle_line(",quit").await;

    assert_eq!(dispatch, Dispatch::Command(Command::Quit));
    assert_eq!(h.log.terminated(), vec!["h1", "h2", "h3"]);
    assert_eq!(controller.session_count().await, 0);
    assert!(controller.is_closed());
    assert_eq!(control.close_count(), 1);
    assert_eq!(h.presenter.close_all_count(), 1);
}

#[tokio::test]
async fn test_quit_is_idempotent() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let control = RecordingControl::new("cssh");
    let controller = h.manager.open(list(&["h1", "h2"]), control.clone()).await.unwrap();

    let first = controller.close().await;
    controller.handle_line(",quit").await;
    let third = h.manager.close(&controller).await;

    assert_eq!(first.attempted, 2);
    assert!(!first.already_closed);
    assert!(third.already_closed);
    assert_eq!(h.log.terminated(), vec!["h1", "h2"]);
    assert_eq!(control.close_count(), 1);
    assert_eq!(h.presenter.close_all_count(), 1);
}

#[tokio::test]
async fn test_closed_resolves_after_quit() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let controller = h
        .manager
        .open(list(&["h1"]), RecordingControl::new("cssh"))
        .await
        .unwrap();

    controller.handle_line(",quit").await;
    tokio::time::timeout(Duration::from_secs(1), controller.closed())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_output_reaches_the_session_surface() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let _controller = h
        .manager
        .open(list(&["h1", "h2"]), RecordingControl::new("cssh"))
        .await
        .unwrap();

    h.log.output("h2", "load average: 0.00\r\n");
    let presenter = &h.presenter;
    assert!(eventually(|| async move { !presenter.outputs.lock().unwrap().is_empty() }).await);
    assert_eq!(
        presenter.outputs.lock().unwrap().as_slice(),
        &[("alice@h2".to_string(), "load average: 0.00\r\n".to_string())]
    );
}

#[tokio::test]
async fn test_exited_session_is_removed() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let controller = h
        .manager
        .open(list(&["h1", "h2", "h3"]), RecordingControl::new("cssh"))
        .await
        .unwrap();

    h.log.exit("h2", 0);
    let c = &controller;
    assert!(eventually(|| async move { c.session_count().await == 2 }).await);
    assert_eq!(hosts(&controller).await, vec!["h1", "h3"]);
    assert!(!controller.is_closed());
}

#[tokio::test]
async fn test_last_exit_closes_the_cluster() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let control = RecordingControl::new("cssh");
    let controller = h.manager.open(list(&["h1", "h2"]), control.clone()).await.unwrap();

    h.log.exit("h1", 0);
    h.log.exit("h2", 1);

    tokio::time::timeout(Duration::from_secs(1), controller.closed())
        .await
        .unwrap();
    assert!(controller.is_closed());
    assert!(control.prints().iter().any(|text| text == "All sessions exited"));
    assert_eq!(control.close_count(), 1);
    let presenter = &h.presenter;
    assert!(eventually(|| async move { presenter.close_all_count() == 1 }).await);
    assert!(h.log.terminated().is_empty());
}
