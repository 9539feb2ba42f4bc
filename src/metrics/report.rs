//! Text and TSV rendering of a [`MetricsReport`].

use super::MetricsReport;
use crate::error::Result;
use log::info;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const RULE_WIDTH: usize = 51;

fn truncate(name: &str, max: usize) -> String {
    name.chars().take(max).collect()
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.num_classes();
        let banner = "=".repeat(40);

        writeln!(f, "{}", banner)?;
        writeln!(f, "       CLASSIFICATION METRICS REPORT")?;
        writeln!(f, "{}", banner)?;
        writeln!(f, "Dataset: {}", self.dataset_type.name())?;
        writeln!(f, "Overall Accuracy: {:.4}%", self.accuracy * 100.0)?;
        if self.excluded > 0 {
            writeln!(
                f,
                "Excluded from confusion matrix: {} (label out of range)",
                self.excluded
            )?;
        }

        writeln!(f)?;
        writeln!(f, "=== CONFUSION MATRIX ===")?;
        write!(f, "{:>12}", "True\\Pred")?;
        for j in 0..n {
            write!(f, "{:>8}", truncate(&self.class_name(j), 7))?;
        }
        writeln!(f)?;
        for (i, row) in self.confusion_matrix.iter().enumerate() {
            write!(f, "{:>12}", truncate(&self.class_name(i), 11))?;
            for count in row {
                write!(f, "{:>8}", count)?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        writeln!(f, "=== PER-CLASS METRICS ===")?;
        writeln!(
            f,
            "{:>15}{:>12}{:>12}{:>12}",
            "Class", "Precision", "Recall", "F1-Score"
        )?;
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
        for i in 0..n {
            writeln!(
                f,
                "{:>15}{:>12.4}{:>12.4}{:>12.4}",
                truncate(&self.class_name(i), 14),
                self.precision[i],
                self.recall[i],
                self.f1[i]
            )?;
        }
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(
            f,
            "{:>15}{:>12.4}{:>12.4}{:>12.4}",
            "AVERAGE", self.average_precision, self.average_recall, self.average_f1
        )?;
        write!(f, "{}", banner)
    }
}

impl MetricsReport {
    /// Writes the report as tab-separated text.
    ///
    /// Layout: a title line, the accuracy, the raw confusion matrix (one row
    /// per line), then a `Class\tPrecision\tRecall\tF1-Score` table.
    pub fn write_tsv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "Classification Report - {}", self.dataset_type.name())?;
        writeln!(writer, "Overall Accuracy: {}%", self.accuracy * 100.0)?;
        writeln!(writer)?;

        writeln!(writer, "Confusion Matrix:")?;
        for row in &self.confusion_matrix {
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            writeln!(writer, "{}", cells.join("\t"))?;
        }

        writeln!(writer)?;
        writeln!(writer, "Per-class metrics:")?;
        writeln!(writer, "Class\tPrecision\tRecall\tF1-Score")?;
        for i in 0..self.num_classes() {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                self.class_name(i),
                self.precision[i],
                self.recall[i],
                self.f1[i]
            )?;
        }
        writer.flush()
    }

    /// Saves the TSV rendering to a file.
    pub fn save_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_tsv(BufWriter::new(file))?;
        info!("Report saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::dataset::DatasetType;
    use crate::metrics::{ClassificationResult, Metrics};

    fn report() -> crate::metrics::MetricsReport {
        let results = vec![
            ClassificationResult::new(Some(1), 1, 0.1),
            ClassificationResult::new(Some(0), 1, 0.2),
        ];
        Metrics::evaluate_classification(&results, DatasetType::FashionMnist, 2)
    }

    #[test]
    fn test_display() {
        let text = report().to_string();
        assert!(text.contains("Dataset: Fashion-MNIST"));
        assert!(text.contains("Overall Accuracy: 50.0000%"));
        assert!(text.contains("True\\Pred"));
        assert!(text.contains("T-shirt"));
        assert!(text.contains("AVERAGE"));
        assert!(!text.contains("Excluded"));
    }

    #[test]
    fn test_tsv() {
        let mut buf = Vec::new();
        report().write_tsv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Classification Report - Fashion-MNIST");
        assert_eq!(lines[1], "Overall Accuracy: 50%");
        assert_eq!(lines[3], "Confusion Matrix:");
        assert_eq!(lines[4], "0\t0");
        assert_eq!(lines[5], "1\t1");
        assert_eq!(lines[8], "Class\tPrecision\tRecall\tF1-Score");
        assert_eq!(lines[9], "T-shirt/top\t0\t0\t0");
        assert!(lines[10].starts_with("Trouser\t1\t0.5\t0.666"));
    }
}
