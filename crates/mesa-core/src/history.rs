//! Restart/backup scrubbing for history tables
//!
//! When MESA backs up or is restarted from a photo, it rewinds to an
//! earlier model and writes those model numbers again. The rows written
//! before the rewind are stale: a row is kept only if its model number is
//! smaller than every model number that follows it.

/// Indices (ascending) of rows superseded by a later restart.
///
/// Row `i` is superseded when `model_numbers[i] >= min(model_numbers[i+1..])`.
/// The last row is never superseded.
pub fn superseded_rows(model_numbers: &[f64]) -> Vec<usize> {
    let mut to_remove = Vec::new();
    let mut smallest_after = f64::INFINITY;
    for (i, &value) in model_numbers.iter().enumerate().rev() {
        if value >= smallest_after {
            to_remove.push(i);
        }
        smallest_after = smallest_after.min(value);
    }
    to_remove.reverse();
    to_remove
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survivors(model_numbers: &[f64]) -> Vec<f64> {
        let removed = superseded_rows(model_numbers);
        model_numbers
            .iter()
            .enumerate()
            .filter(|(i, _)| !removed.contains(i))
            .map(|(_, &v)| v)
            .collect()
    }

    #[test]
    fn test_restart_scenario() {
        let models = [1.0, 2.0, 3.0, 2.0, 3.0, 4.0];
        assert_eq!(superseded_rows(&models), vec![1, 2]);
        assert_eq!(survivors(&models), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_clean_history_untouched() {
        assert!(superseded_rows(&[1.0, 2.0, 5.0, 9.0]).is_empty());
        assert!(superseded_rows(&[7.0]).is_empty());
        assert!(superseded_rows(&[]).is_empty());
    }

    #[test]
    fn test_repeated_model_number() {
        // equal values count as superseded
        assert_eq!(superseded_rows(&[1.0, 1.0, 2.0]), vec![0]);
    }

    #[test]
    fn test_multiple_restarts() {
        let models = [1.0, 2.0, 3.0, 4.0, 5.0, 3.0, 4.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(survivors(&models), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_idempotent() {
        let models = [5.0, 1.0, 2.0, 9.0, 3.0, 4.0, 3.0, 10.0];
        let once = survivors(&models);
        assert!(superseded_rows(&once).is_empty());
    }
}
