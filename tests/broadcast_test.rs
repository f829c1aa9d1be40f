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

//! Data lines fan out to every live session

mod common;

use common::{Harness, MockTransport, RecordingControl, StaticLookup};
use cssh::cluster::{BroadcastReport, ClusterController, Dispatch, Target};
use cssh::session::SessionId;

async fn open(h: &Harness, hosts: &[&str]) -> ClusterController {
    h.manager
        .open(
            Target::List(hosts.iter().map(|h| h.to_string()).collect()),
            RecordingControl::new("cssh"),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_line_reaches_every_session_in_order() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let controller = open(&h, &["h1", "h2", "h3"]).await;

    let dispatch = controller.handle_line("uptime").await;

    assert_eq!(
        dispatch,
        Dispatch::Broadcast(BroadcastReport {
            attempted: 3,
            delivered: 3,
            skipped: 0,
            failed: vec![],
        })
    );
    assert_eq!(h.log.send_order(), vec!["h1", "h2", "h3"]);
    for host in ["h1", "h2", "h3"] {
        assert_eq!(h.log.sent_to(host), vec!["uptime\n"]);
    }
}

#[tokio::test]
async fn test_failing_session_does_not_stop_delivery() {
    let transport = MockTransport::new().failing_send("h2");
    let h = Harness::new(StaticLookup::default(), transport);
    let controller = open(&h, &["h1", "h2", "h3"]).await;

    let Dispatch::Broadcast(report) = controller.handle_line("df -h").await else {
        panic!("data line was not broadcast");
    };

    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, vec![SessionId(2)]);
    assert_eq!(h.log.sent_to("h1"), vec!["df -h\n"]);
    assert_eq!(h.log.sent_to("h3"), vec!["df -h\n"]);
    // The failing session stays registered
    assert_eq!(controller.session_count().await, 3);
}

#[tokio::test]
async fn test_dead_sessions_are_skipped() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let controller = open(&h, &["h1", "h2", "h3"]).await;

    h.log.mark_dead("h1");
    let Dispatch::Broadcast(report) = controller.handle_line("whoami").await else {
        panic!("data line was not broadcast");
    };

    assert_eq!(report.skipped, 1);
    assert_eq!(report.delivered, 2);
    assert!(h.log.sent_to("h1").is_empty());
    assert_eq!(h.log.send_order(), vec!["h2", "h3"]);
}

#[tokio::test]
async fn test_lines_are_forwarded_verbatim() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let controller = open(&h, &["h1"]).await;

    for line in ["  ,quit", "echo 'a,b' | tr , ' '", "", "\tindented"] {
        assert!(matches!(
            controller.handle_line(line).await,
            Dispatch::Broadcast(_)
        ));
    }

    assert_eq!(
        h.log.sent_to("h1"),
        vec!["  ,quit\n", "echo 'a,b' | tr , ' '\n", "\n", "\tindented\n"]
    );
    assert!(!controller.is_closed());
}

#[tokio::test]
async fn test_line_terminator_from_editor_is_not_doubled() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let controller = open(&h, &["h1"]).await;

    controller.handle_line("hostname\n").await;
    controller.handle_line("hostname\r\n").await;

    assert_eq!(h.log.sent_to("h1"), vec!["hostname\n", "hostname\n"]);
}

#[tokio::test]
async fn test_broadcast_after_quit_sends_nothing() {
    let h = Harness::new(StaticLookup::default(), MockTransport::new());
    let controller = open(&h, &["h1", "h2"]).await;

    controller.handle_line(",quit").await;
    let dispatch = controller.handle_line("ls").await;

    assert_eq!(dispatch, Dispatch::Broadcast(BroadcastReport::default()));
    assert_eq!(h.log.sent_count(), 0);
}
