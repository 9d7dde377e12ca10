//! Classification metrics computed from (predicted score, true label) pairs.

use std::fmt;

use crate::error::ArborError;

/// Confusion matrix over the distinct label values observed in a test run.
///
/// Entry `(actual, predicted)` counts rows with true label `actual` that were
/// predicted as `predicted`. Labels are the sorted union of true and
/// predicted values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    labels: Vec<i64>,
    counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        let mut labels: Vec<i64> = pairs
            .iter()
            .flat_map(|&(score, label)| [score as i64, label as i64])
            .collect();
        labels.sort_unstable();
        labels.dedup();

        let n = labels.len();
        let mut counts = vec![vec![0u64; n]; n];
        for &(score, label) in pairs {
            // both values are in `labels` by construction
            if let (Ok(a), Ok(p)) = (
                labels.binary_search(&(label as i64)),
                labels.binary_search(&(score as i64)),
            ) {
                counts[a][p] += 1;
            }
        }
        Self { labels, counts }
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Count of rows with true label `actual` predicted as `predicted`.
    /// Unobserved label values count as zero.
    pub fn count(&self, actual: i64, predicted: i64) -> u64 {
        match (
            self.labels.binary_search(&actual),
            self.labels.binary_search(&predicted),
        ) {
            (Ok(a), Ok(p)) => self.counts[a][p],
            _ => 0,
        }
    }

    fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    fn diagonal(&self) -> u64 {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }

    /// Rows with true label at index `i`.
    fn support(&self, i: usize) -> u64 {
        self.counts[i].iter().sum()
    }

    /// Rows predicted as the label at index `i`.
    fn predicted(&self, i: usize) -> u64 {
        self.counts.iter().map(|row| row[i]).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:>12}", "actual\\pred")?;
        for l in &self.labels {
            write!(f, " {:>8}", l)?;
        }
        writeln!(f)?;
        for (i, l) in self.labels.iter().enumerate() {
            write!(f, "{:>12}", l)?;
            for c in &self.counts[i] {
                write!(f, " {:>8}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Test metrics for a classification model.
///
/// Binary metrics (two classes) are computed with label `1.0` as the positive
/// class; multiclass metrics are support-weighted averages over classes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f_measure: f64,
    pub confusion_matrix: ConfusionMatrix,
}

fn ratio(num: u64, denom: u64) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

fn f_measure(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Binary metrics with `1.0` as the positive class.
pub fn binary_metrics(pairs: &[(f64, f64)]) -> ClassificationMetrics {
    let cm = ConfusionMatrix::from_pairs(pairs);
    let tp = pairs.iter().filter(|&&(s, l)| s == 1.0 && l == 1.0).count() as u64;
    let fp = pairs.iter().filter(|&&(s, l)| s == 1.0 && l != 1.0).count() as u64;
    let fn_ = pairs.iter().filter(|&&(s, l)| s != 1.0 && l == 1.0).count() as u64;
    let correct = pairs.iter().filter(|&&(s, l)| s == l).count() as u64;

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    ClassificationMetrics {
        accuracy: ratio(correct, pairs.len() as u64),
        precision,
        recall,
        f_measure: f_measure(precision, recall),
        confusion_matrix: cm,
    }
}

/// Support-weighted multiclass metrics.
pub fn multiclass_metrics(pairs: &[(f64, f64)]) -> ClassificationMetrics {
    let cm = ConfusionMatrix::from_pairs(pairs);
    let total = cm.total();

    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f = 0.0;
    for i in 0..cm.labels.len() {
        let tp = cm.counts[i][i];
        let class_precision = ratio(tp, cm.predicted(i));
        let class_recall = ratio(tp, cm.support(i));
        let weight = ratio(cm.support(i), total);
        precision += weight * class_precision;
        recall += weight * class_recall;
        f += weight * f_measure(class_precision, class_recall);
    }

    ClassificationMetrics {
        accuracy: ratio(cm.diagonal(), total),
        precision,
        recall,
        f_measure: f,
        confusion_matrix: cm,
    }
}

/// Dispatch on class count; errors when scores and labels disagree in length.
pub fn classification_metrics(
    scores: &[f64],
    labels: &[f64],
    num_classes: u32,
) -> Result<ClassificationMetrics, ArborError> {
    if scores.len() != labels.len() {
        return Err(ArborError::Inference(format!(
            "{} scores for {} labels",
            scores.len(),
            labels.len()
        )));
    }
    let pairs: Vec<(f64, f64)> = scores.iter().copied().zip(labels.iter().copied()).collect();
    if num_classes == 2 {
        Ok(binary_metrics(&pairs))
    } else {
        Ok(multiclass_metrics(&pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_binary_predictions() {
        let pairs = vec![(1.0, 1.0), (0.0, 0.0), (1.0, 1.0), (0.0, 0.0)];
        let m = binary_metrics(&pairs);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f_measure, 1.0);
        assert_eq!(m.confusion_matrix.count(1, 1), 2);
        assert_eq!(m.confusion_matrix.count(1, 0), 0);
    }

    #[test]
    fn binary_false_positive_hits_precision() {
        // one FP, no FN
        let pairs = vec![(1.0, 1.0), (1.0, 0.0), (0.0, 0.0), (0.0, 0.0)];
        let m = binary_metrics(&pairs);
        assert_eq!(m.precision, 0.5);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.accuracy, 0.75);
    }

    #[test]
    fn multiclass_weighted_metrics() {
        let pairs = vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (2.0, 1.0)];
        let m = multiclass_metrics(&pairs);
        assert_eq!(m.accuracy, 0.75);
        assert_eq!(m.confusion_matrix.labels(), &[0, 1, 2]);
        assert_eq!(m.confusion_matrix.count(1, 2), 1);
        // supports 1/2/1; recalls 1, 1/2, 1 → weighted (1 + 1 + 1) / 4
        assert!((m.recall - 0.75).abs() < 1e-12);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(classification_metrics(&[1.0], &[1.0, 0.0], 2).is_err());
    }

    #[test]
    fn no_positive_predictions_gives_zero_precision() {
        let pairs = vec![(0.0, 1.0), (0.0, 0.0)];
        let m = binary_metrics(&pairs);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f_measure, 0.0);
    }
}
