//! Property-based tests for ordering and framing.
//!
//! The expected output is modelled independently of the stage code: each
//! line gets a trailing space, `++` is replaced left to right with
//! `str::replace`, and the result is cut into 80-byte lines.

use line_processor::{
    RECORD_WIDTH, execute_pipeline, execute_serial_text, run_pipeline_with_capacity,
};
use proptest::prelude::*;
use std::io::Cursor;

/// Lines of lowercase text, spaces and plenty of `+`.
fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[a-z ]{0,60}", "[a-z+]{0,60}", "[+]{0,9}", "[a-c+ ]{0,120}"]
}

fn lines_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(line_strategy(), 0..60)
}

fn model_output(lines: &[String]) -> String {
    let joined: String = lines
        .iter()
        .map(|line| format!("{line} ").replace("++", "^"))
        .collect();
    let complete = joined.len() / RECORD_WIDTH * RECORD_WIDTH;
    joined.as_bytes()[..complete]
        .chunks(RECORD_WIDTH)
        .map(|chunk| format!("{}\n", String::from_utf8_lossy(chunk)))
        .collect()
}

fn stop_input(lines: &[String]) -> String {
    let mut input: String = lines.iter().map(|l| format!("{l}\n")).collect();
    input.push_str("STOP\n");
    input
}

proptest! {
    #[test]
    fn test_output_matches_model(lines in lines_strategy()) {
        let (output, report) = execute_pipeline(&stop_input(&lines)).unwrap();
        prop_assert_eq!(&output, &model_output(&lines));
        prop_assert_eq!(report.lines_read, lines.len());
    }

    #[test]
    fn test_every_record_is_full_width(lines in lines_strategy()) {
        let (output, report) = execute_pipeline(&stop_input(&lines)).unwrap();
        prop_assert_eq!(output.lines().count(), report.records_written);
        for record in output.lines() {
            prop_assert_eq!(record.len(), RECORD_WIDTH);
        }
        prop_assert!(report.bytes_discarded < RECORD_WIDTH);
    }

    #[test]
    fn test_threaded_matches_serial(lines in lines_strategy(), capacity in 1usize..8) {
        let input = stop_input(&lines);
        let mut threaded = Vec::new();
        let threaded_report = run_pipeline_with_capacity(
            Cursor::new(input.clone().into_bytes()),
            &mut threaded,
            capacity,
        )
        .unwrap();
        let (serial, serial_report) = execute_serial_text(&input).unwrap();

        prop_assert_eq!(String::from_utf8(threaded).unwrap(), serial);
        prop_assert_eq!(threaded_report, serial_report);
    }
}
