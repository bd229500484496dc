// Property-based tests for the progress indicator.
//
// The indicator must finish for any event sequence once a terminal event
// arrives or the channel closes, and its tally must match the events seen.

#[cfg(test)]
mod tests {
    use crate::indicator::{JobEnd, show_indicator};
    use dcrm_rs::{ErrorKind, JobSummary, ProgressEvent};
    use proptest::prelude::*;
    use std::time::Duration;

    fn arb_channel_event() -> impl Strategy<Value = ProgressEvent> {
        prop_oneof![
            (0u64..200).prop_map(|count| ProgressEvent::ChannelResult {
                name: "general".to_string(),
                count,
            }),
            Just(ProgressEvent::ChannelSkipped {
                name: "rules".to_string(),
                reason: "lacks manage messages".to_string(),
            }),
            Just(ProgressEvent::ChannelError {
                name: "logs".to_string(),
                kind: ErrorKind::Transport,
                message: "connection reset".to_string(),
            }),
            (1usize..10).prop_map(|index| ProgressEvent::ChannelStarted {
                index,
                total: 10,
                name: "general".to_string(),
            }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_indicator_tallies_channel_events(
            events in prop::collection::vec(arb_channel_event(), 0..50),
            show_result in proptest::bool::ANY,
            dry_run in proptest::bool::ANY,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let expected_deleted: u64 = events
                .iter()
                .map(|event| match event {
                    ProgressEvent::ChannelResult { count, .. } => *count,
                    _ => 0,
                })
                .sum();
            let expected_skipped = events
                .iter()
                .filter(|event| matches!(event, ProgressEvent::ChannelSkipped { .. }))
                .count() as u64;
            let expected_errors = events
                .iter()
                .filter(|event| matches!(event, ProgressEvent::ChannelError { .. }))
                .count() as u64;

            let summary = rt.block_on(async {
                let (sender, receiver) = async_channel::unbounded();
                for event in events {
                    sender.send(event).await.unwrap();
                }
                drop(sender);

                let handle = show_indicator(receiver, false, show_result, dry_run);
                tokio::time::timeout(Duration::from_secs(5), handle)
                    .await
                    .expect("indicator should complete")
                    .expect("indicator task should not panic")
            });

            prop_assert_eq!(summary.end, JobEnd::Disconnected);
            prop_assert_eq!(summary.total_delete_count, expected_deleted);
            prop_assert_eq!(summary.total_skip_count, expected_skipped);
            prop_assert_eq!(summary.total_error_count, expected_errors);
        }

        #[test]
        fn prop_indicator_stops_at_first_terminal_event(
            before in prop::collection::vec(arb_channel_event(), 0..20),
            after in prop::collection::vec(arb_channel_event(), 0..20),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let summary = rt.block_on(async {
                let (sender, receiver) = async_channel::unbounded();
                for event in before {
                    sender.send(event).await.unwrap();
                }
                sender
                    .send(ProgressEvent::JobCompleted { summary: JobSummary::new(false) })
                    .await
                    .unwrap();
                for event in after {
                    sender.send(event).await.unwrap();
                }

                let handle = show_indicator(receiver, false, false, false);
                let summary = tokio::time::timeout(Duration::from_secs(5), handle)
                    .await
                    .expect("indicator should complete")
                    .expect("indicator task should not panic");
                drop(sender);
                summary
            });

            prop_assert_eq!(summary.end, JobEnd::Completed(JobSummary::new(false)));
            prop_assert_eq!(summary.total_delete_count, 0);
        }
    }
}
