//! Algebraic properties of the series container, the segmenter and the merger.

use dil_kinetics::data::{Series, Table, merge_segments, segments_by_temperature_range, split_segments};
use dil_kinetics::domain::Interval;
use proptest::prelude::*;

fn series(cols: Vec<(&str, Vec<f64>)>, l0: Option<f64>) -> Series {
    let (names, columns): (Vec<String>, Vec<Vec<f64>>) = cols.into_iter().map(|(n, c)| (n.to_string(), c)).unzip();
    Series::new(Table::new(names, columns).unwrap(), l0)
}

/// Nominal temperature drawn from a few plateaus so that holds and ramps mix.
fn nominal_temperatures() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0u8..4, 1..60).prop_map(|v| v.into_iter().map(|k| 100.0 * f64::from(k)).collect())
}

fn with_index(tnom: Vec<f64>) -> Series {
    let n = tnom.len();
    let index: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let temperature: Vec<f64> = tnom.iter().enumerate().map(|(i, t)| t + 0.01 * i as f64).collect();
    series(
        vec![
            ("index", index),
            ("temperature", temperature),
            ("nominal temperature", tnom),
        ],
        Some(10.0),
    )
}

proptest! {
    #[test]
    fn length_change_survives_relative_round_trip(
        dl in prop::collection::vec(-1.0f64..1.0, 1..50),
        l0 in 0.1f64..100.0,
    ) {
        let forward = series(vec![("change in length", dl.clone())], Some(l0));
        let pct: Vec<f64> = forward.relative_length_change().iter().map(|r| r * 100.0).collect();
        let back = series(vec![("rel. change in length", pct)], Some(l0));

        prop_assert_eq!(back.length_change().len(), dl.len());
        for (a, b) in dl.iter().zip(back.length_change()) {
            prop_assert!((a - b).abs() <= 1e-12 * (1.0 + a.abs()));
        }
    }

    #[test]
    fn split_segments_partitions_rows(tnom in nominal_temperatures()) {
        let s = with_index(tnom.clone());
        let segments = split_segments(&s).unwrap();

        let flags: Vec<bool> = tnom.windows(2).map(|w| w[0] == w[1]).collect();
        let changes = flags.windows(2).filter(|w| w[0] != w[1]).count();
        prop_assert_eq!(segments.len(), changes + 1);

        let joined = Table::concat(segments.iter().map(Series::table));
        prop_assert_eq!(&joined, s.table());
        prop_assert!(segments.iter().all(|seg| seg.reference_length() == Some(10.0)));
    }

    #[test]
    fn merge_is_associative(tnom in nominal_temperatures()) {
        let s = with_index(tnom);
        let segments = split_segments(&s).unwrap();
        prop_assume!(segments.len() >= 3);
        let (a, b, c) = (&segments[0], &segments[1], &segments[2]);

        let left = merge_segments(&[merge_segments(&[a.clone(), b.clone()], None).unwrap(), c.clone()], None).unwrap();
        let right = merge_segments(&[a.clone(), merge_segments(&[b.clone(), c.clone()], None).unwrap()], None).unwrap();
        prop_assert_eq!(left.table(), right.table());
        prop_assert_eq!(left.index(), right.index());
    }

    #[test]
    fn covering_range_gives_single_segment(tnom in nominal_temperatures()) {
        let s = with_index(tnom);
        let all = Interval::new(f64::NEG_INFINITY, f64::INFINITY).unwrap();
        let segments = segments_by_temperature_range(&s, all).unwrap();
        prop_assert_eq!(segments.len(), 1);
        prop_assert_eq!(&segments[0], &s);
    }
}

#[test]
fn literal_plateaus_follow_flag_changes() {
    let tnom = vec![100.0, 100.0, 100.0, 200.0, 200.0, 300.0, 300.0, 300.0, 300.0, 300.0];
    let s = with_index(tnom);
    let lengths: Vec<usize> = split_segments(&s).unwrap().iter().map(Series::len).collect();
    assert_eq!(lengths, vec![2, 1, 1, 1, 5]);
}

#[test]
fn range_outside_data_is_empty() {
    let s = with_index(vec![100.0, 100.0, 200.0]);
    let segments = segments_by_temperature_range(&s, Interval::new(1000.0, 2000.0).unwrap()).unwrap();
    assert!(segments.is_empty());
}
