//! Held-out evaluation: accuracy, per-class precision / recall / F1 and the
//! confusion matrix, rendered the way scikit-learn's `classification_report`
//! prints them.

use std::fmt;

use crate::classifier::ClassifierError;

/// Counts of (true label, predicted label) pairs.
///
/// Rows are true labels and columns are predicted labels, both in the order
/// of [`labels`](Self::labels).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    labels: Vec<usize>,
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Result<Self, ClassifierError> {
        if y_true.len() != y_pred.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Got {} true labels but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }

        let mut labels: Vec<usize> = y_true.iter().chain(y_pred).copied().collect();
        labels.sort_unstable();
        labels.dedup();

        let position = |label: usize| labels.binary_search(&label).unwrap_or_default();
        let mut counts = vec![vec![0; labels.len()]; labels.len()];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            counts[position(t)][position(p)] += 1;
        }

        Ok(Self { labels, counts })
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of samples with true label `actual` predicted as `predicted`.
    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        match (self.labels.binary_search(&actual), self.labels.binary_search(&predicted)) {
            (Ok(row), Ok(col)) => self.counts[row][col],
            _ => 0,
        }
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }
}

/// Precision, recall, F1 and support for one label or one average.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub per_class: Vec<ClassMetrics>,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    /// Computes the report. `names` maps a label to its display name; labels
    /// without a name are shown as numbers. Ratios with a zero denominator
    /// are reported as 0.
    pub fn compute<F>(y_true: &[usize], y_pred: &[usize], names: F) -> Result<Self, ClassifierError>
    where
        F: Fn(usize) -> Option<String>,
    {
        if y_true.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Cannot evaluate on zero samples".into(),
            ));
        }
        let confusion = ConfusionMatrix::compute(y_true, y_pred)?;
        let n = confusion.labels.len();

        let per_class: Vec<ClassMetrics> = (0..n)
            .map(|i| {
                let label = confusion.labels[i];
                let tp = confusion.counts[i][i] as f64;
                let predicted: usize = (0..n).map(|r| confusion.counts[r][i]).sum();
                let support: usize = confusion.counts[i].iter().sum();
                let precision = ratio(tp, predicted as f64);
                let recall = ratio(tp, support as f64);
                ClassMetrics {
                    name: names(label).unwrap_or_else(|| label.to_string()),
                    precision,
                    recall,
                    f1: ratio(2.0 * precision * recall, precision + recall),
                    support,
                }
            })
            .collect();

        let total = confusion.total();
        let macro_avg = average("macro avg", &per_class, |_| 1.0 / n as f64, total);
        let weighted_avg = average(
            "weighted avg",
            &per_class,
            |m| m.support as f64 / total as f64,
            total,
        );

        Ok(Self {
            accuracy: confusion.correct() as f64 / total as f64,
            per_class,
            macro_avg,
            weighted_avg,
            confusion,
        })
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn average<W>(name: &str, per_class: &[ClassMetrics], weight: W, support: usize) -> ClassMetrics
where
    W: Fn(&ClassMetrics) -> f64,
{
    let mut avg = ClassMetrics {
        name: name.to_string(),
        precision: 0.0,
        recall: 0.0,
        f1: 0.0,
        support,
    };
    for m in per_class {
        let w = weight(m);
        avg.precision += w * m.precision;
        avg.recall += w * m.recall;
        avg.f1 += w * m.f1;
    }
    avg
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .per_class
            .iter()
            .map(|m| m.name.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or_default();

        writeln!(f, "{:>width$} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for m in &self.per_class {
            write_row(f, m, width)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.macro_avg.support
        )?;
        write_row(f, &self.macro_avg, width)?;
        write_row(f, &self.weighted_avg, width)?;

        writeln!(f)?;
        writeln!(f, "Confusion matrix (rows: true labels, columns: predicted labels)")?;
        let names: Vec<&str> = self.per_class.iter().map(|m| m.name.as_str()).collect();
        write!(f, "{:>width$}", "")?;
        for name in &names {
            write!(f, " {:>9}", name.to_lowercase())?;
        }
        writeln!(f)?;
        for (name, row) in names.iter().zip(self.confusion.rows()) {
            write!(f, "{:>width$}", name.to_lowercase())?;
            for count in row {
                write!(f, " {:>9}", count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, m: &ClassMetrics, width: usize) -> fmt::Result {
    writeln!(
        f,
        "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        m.name, m.precision, m.recall, m.f1, m.support
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_names(_: usize) -> Option<String> {
        None
    }

    #[test]
    fn test_confusion_matrix() -> Result<(), ClassifierError> {
        let cm = ConfusionMatrix::compute(&[0, 0, 1, 1, 1], &[0, 1, 1, 1, 0])?;
        assert_eq!(cm.labels(), &[0, 1]);
        assert_eq!(cm.get(0, 0), 1);
        assert_eq!(cm.get(0, 1), 1);
        assert_eq!(cm.get(1, 0), 1);
        assert_eq!(cm.get(1, 1), 2);
        assert_eq!(cm.get(7, 1), 0);
        assert_eq!(cm.total(), 5);
        assert_eq!(cm.correct(), 3);
        Ok(())
    }

    #[test]
    fn test_report_values() -> Result<(), ClassifierError> {
        let report = ClassificationReport::compute(&[0, 0, 1, 1, 1], &[0, 1, 1, 1, 0], no_names)?;
        assert!((report.accuracy - 0.6).abs() < 1e-9);

        let negative = &report.per_class[0];
        assert!((negative.precision - 0.5).abs() < 1e-9);
        assert!((negative.recall - 0.5).abs() < 1e-9);
        assert_eq!(negative.support, 2);

        let positive = &report.per_class[1];
        assert!((positive.precision - 2.0 / 3.0).abs() < 1e-9);
        assert!((positive.recall - 2.0 / 3.0).abs() < 1e-9);

        let expected_macro = (0.5 + 2.0 / 3.0) / 2.0;
        assert!((report.macro_avg.precision - expected_macro).abs() < 1e-9);
        let expected_weighted = 0.4 * 0.5 + 0.6 * (2.0 / 3.0);
        assert!((report.weighted_avg.recall - expected_weighted).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_zero_division_is_zero() -> Result<(), ClassifierError> {
        // label 1 is never predicted
        let report = ClassificationReport::compute(&[0, 1], &[0, 0], no_names)?;
        assert_eq!(report.per_class[1].precision, 0.0);
        assert_eq!(report.per_class[1].f1, 0.0);
        Ok(())
    }

    #[test]
    fn test_length_mismatch() {
        assert!(ClassificationReport::compute(&[0, 1], &[0], no_names).is_err());
        assert!(ClassificationReport::compute(&[], &[], no_names).is_err());
    }

    #[test]
    fn test_display_uses_names() -> Result<(), ClassifierError> {
        let names = |label: usize| Some(if label == 0 { "Negative" } else { "Positive" }.to_string());
        let report = ClassificationReport::compute(&[0, 1, 1], &[0, 1, 0], names)?;
        let text = report.to_string();
        assert!(text.contains("Negative"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("positive"));
        Ok(())
    }
}
