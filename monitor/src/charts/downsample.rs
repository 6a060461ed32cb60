/// Step between kept records so that roughly `target` of `len` survive.
pub fn stride(len: usize, target: usize) -> usize {
    (len / target.max(1)).max(1)
}

/// Keeps every `stride`-th record by position, starting with the first.
///
/// This is a pure stride sample: dropped records do not contribute to the
/// kept ones. With `len <= target` every record is kept.
pub fn downsample<T>(records: Vec<T>, target: usize) -> Vec<T> {
    let step = stride(records.len(), target);
    records.into_iter().step_by(step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_len(n: usize, target: usize) -> usize {
        n.div_ceil(stride(n, target))
    }

    #[test]
    fn short_inputs_are_kept_whole() {
        for n in [0, 1, 57, 100] {
            let kept = downsample((0..n).collect::<Vec<_>>(), 100);
            assert_eq!(kept.len(), n);
        }
    }

    #[test]
    fn output_length_is_ceil_of_len_over_stride() {
        for n in [101, 199, 200, 250, 1_234, 9_999, 10_000] {
            let kept = downsample((0..n).collect::<Vec<_>>(), 100);
            assert_eq!(kept.len(), expected_len(n, 100), "n = {n}");
        }
        assert_eq!(downsample((0..199).collect::<Vec<_>>(), 100).len(), 199);
        assert_eq!(downsample((0..250).collect::<Vec<_>>(), 100).len(), 125);
        assert_eq!(downsample((0..10_000).collect::<Vec<_>>(), 100).len(), 100);
    }

    #[test]
    fn keeps_positions_on_the_stride() {
        let kept = downsample((0..1_050).collect::<Vec<_>>(), 100);
        assert_eq!(stride(1_050, 100), 10);
        assert_eq!(kept.first(), Some(&0));
        assert_eq!(kept[1], 10);
        assert_eq!(kept.last(), Some(&1_040));
        assert!(kept.iter().all(|v| v % 10 == 0));
    }
}
