//! Sliding windows over the stacked station frames, the input layout of a
//! sequence-to-sequence model.

use crate::frames::augmented::AugmentedStationFrame;
use crate::frames::error::FrameError;
use std::ops::Range;

/// One training example: `window` consecutive steps and the `horizon` steps after them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<'a, T> {
    pub inputs: &'a [T],
    pub targets: &'a [T],
}

/// Every window of `window` steps followed by `horizon` target steps.
///
/// Yields `len - window - horizon + 1` windows, none when the data is too short.
///
/// ```
/// use ehyd::windows::create_windows;
///
/// let data = [1, 2, 3, 4, 5];
/// let windows = create_windows(&data, 2, 1);
/// assert_eq!(windows.len(), 3);
/// assert_eq!(windows[0].inputs, &[1, 2]);
/// assert_eq!(windows[0].targets, &[3]);
/// ```
pub fn create_windows<T>(data: &[T], window: usize, horizon: usize) -> Vec<Window<'_, T>> {
    let span = window + horizon;
    if span == 0 || data.len() < span {
        return Vec::new();
    }
    (0..=data.len() - span)
        .map(|start| Window {
            inputs: &data[start..start + window],
            targets: &data[start + window..start + span],
        })
        .collect()
}

/// Stacks frames into `[time][station][feature]`, stations in the order given.
///
/// All frames must share one calendar and one column layout.
pub fn stack_frames(frames: &[AugmentedStationFrame]) -> Result<Vec<Vec<Vec<f64>>>, FrameError> {
    let Some(first) = frames.first() else {
        return Ok(Vec::new());
    };
    let names: Vec<&str> = first.column_names().collect();
    for frame in frames {
        if frame.calendar() != first.calendar() || !frame.column_names().eq(names.iter().copied()) {
            return Err(FrameError::SchemaMismatch {
                station: frame.station(),
            });
        }
    }

    Ok((0..first.len())
        .map(|t| {
            frames
                .iter()
                .map(|frame| frame.columns().iter().map(|(_, values)| values[t]).collect())
                .collect()
        })
        .collect())
}

/// Chronological split of `n` samples: the last `ceil(n * test_fraction)` are the test set.
///
/// ```
/// use ehyd::windows::train_test_split;
///
/// assert_eq!(train_test_split(10, 0.25), (0..7, 7..10));
/// ```
pub fn train_test_split(n: usize, test_fraction: f64) -> (Range<usize>, Range<usize>) {
    let fraction = if test_fraction.is_finite() {
        test_fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let test = ((n as f64 * fraction).ceil() as usize).min(n);
    let split = n - test;
    (0..split, split..n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::month::{Calendar, Month};

    #[test]
    fn window_count() {
        let data: Vec<usize> = (0..30).collect();
        assert_eq!(create_windows(&data, 6, 24).len(), 1);
        assert_eq!(create_windows(&data, 6, 12).len(), 13);
        assert!(create_windows(&data, 6, 25).is_empty());
        assert!(create_windows(&data, 0, 0).is_empty());

        let last = create_windows(&data, 6, 12).pop().unwrap();
        assert_eq!(last.inputs, &data[12..18]);
        assert_eq!(last.targets, &data[18..30]);
    }

    #[test]
    fn stacks_time_station_feature() {
        let calendar = Calendar::new(Month::new(1, 2000), Month::new(3, 2000));
        let frame = |station, offset: f64| {
            AugmentedStationFrame::from_columns(
                station,
                calendar,
                Some((0, 2)),
                vec![
                    ("gw_level".to_string(), vec![offset, offset + 1.0, offset + 2.0]),
                    ("rain_1".to_string(), vec![-offset; 3]),
                ],
            )
        };
        let stacked = stack_frames(&[frame(1, 10.0), frame(2, 20.0)]).unwrap();
        assert_eq!(stacked.len(), 3);
        assert_eq!(stacked[1], vec![vec![11.0, -10.0], vec![21.0, -20.0]]);

        let windows = create_windows(&stacked, 2, 1);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].targets[0][1], vec![22.0, -20.0]);
    }

    #[test]
    fn split_is_chronological() {
        assert_eq!(train_test_split(100, 0.2), (0..80, 80..100));
        assert_eq!(train_test_split(3, 0.5), (0..1, 1..3));
        assert_eq!(train_test_split(0, 0.2), (0..0, 0..0));
        assert_eq!(train_test_split(5, 2.0), (0..0, 0..5));
    }
}
