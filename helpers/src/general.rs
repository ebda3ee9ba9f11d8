use std::cmp::Ordering;
use std::error::Error;
use std::fmt;

/// InputValueError is used if some simulation option or parameter does not fulfill the posed
/// requirements, e.g., a non-positive real-time factor.
#[derive(Debug, Clone)]
pub struct InputValueError;

impl fmt::Display for InputValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid input value")
    }
}

impl Error for InputValueError {}

/// argsort_by returns the indices that would sort the array x according to the comparator. The
/// sort is stable, i.e. indices of equal elements keep their original order, which makes the
/// result a total order even if the comparator reports ties.
pub fn argsort_by<T, F>(x: &[T], mut compare: F) -> Vec<usize>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut indices: Vec<usize> = (0..x.len()).collect();
    indices.sort_by(|&a, &b| compare(&x[a], &x[b]));
    indices
}

/// wrap_to_length maps x into [0.0, length[ (floating point modulo with non-negative result).
pub fn wrap_to_length(x: f64, length: f64) -> f64 {
    let mut wrapped = x % length;
    if wrapped < 0.0 {
        wrapped += length;
    }
    // -0.0 % length and tiny negative values may round up to length
    if wrapped >= length {
        wrapped = 0.0;
    }
    wrapped
}

/// lin_interp returns the linearly interpolated value at x for given discrete data points xp, fp.
/// xp must be increasing. Inspired by numpy.interp.
pub fn lin_interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    if xp.len() != fp.len() {
        panic!("Number of items in xp and fp must be equal!")
    }

    if x <= xp[0] {
        return fp[0];
    }

    // binary search for the first support point not smaller than x
    let i = xp.partition_point(|&v| v < x);

    if i >= xp.len() {
        return *fp.last().unwrap();
    }

    if xp[i] == xp[i - 1] {
        return fp[i];
    }

    fp[i - 1] + (x - xp[i - 1]) * (fp[i] - fp[i - 1]) / (xp[i] - xp[i - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argsort_by_is_stable_for_ties() {
        let x = [3, 1, 3, 2, 1];
        let idxs = argsort_by(&x, |a, b| b.cmp(a));
        assert_eq!(idxs, vec![0, 2, 3, 1, 4]);
    }

    #[test]
    fn wrap_to_length_stays_in_range() {
        assert_eq!(wrap_to_length(5.0, 10.0), 5.0);
        assert_eq!(wrap_to_length(12.5, 10.0), 2.5);
        assert_eq!(wrap_to_length(-2.5, 10.0), 7.5);
        assert_eq!(wrap_to_length(10.0, 10.0), 0.0);

        let w = wrap_to_length(-1e-18, 10.0);
        assert!((0.0..10.0).contains(&w));
    }

    #[test]
    fn lin_interp_between_and_outside_support_points() {
        let xp = [0.0, 10.0, 20.0];
        let fp = [0.0, 100.0, 50.0];
        assert_eq!(lin_interp(-1.0, &xp, &fp), 0.0);
        assert_eq!(lin_interp(5.0, &xp, &fp), 50.0);
        assert_eq!(lin_interp(15.0, &xp, &fp), 75.0);
        assert_eq!(lin_interp(25.0, &xp, &fp), 50.0);
    }
}
