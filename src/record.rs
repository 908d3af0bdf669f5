use serde::{Deserialize, Serialize};

use crate::table::EXAM_COUNT;

/// How the store turns an exam total into the average it persists.
///
/// The per-record [`StudentRecord::average`] is always `total / 3`; this
/// scale only drives the persisted average and final-marks columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageScale {
    /// `total / 3`
    ThirdOfTotal,
    /// `total / 5`
    FifthOfTotal,
    /// `total / 50`
    #[default]
    OutOfFifty,
    /// `(total / 50) * 10`
    OutOfFiftyTimesTen,
}

impl AverageScale {
    pub fn apply(self, total: f64) -> f64 {
        match self {
            AverageScale::ThirdOfTotal => total / 3.0,
            AverageScale::FifthOfTotal => total / 5.0,
            AverageScale::OutOfFifty => total / 50.0,
            AverageScale::OutOfFiftyTimesTen => (total / 50.0) * 10.0,
        }
    }
}

/// New marks for one student, as entered by the editor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marks {
    pub exams: [f64; EXAM_COUNT],
    /// Supplementary score; `None` keeps whatever the row already holds
    pub aat: Option<f64>,
}

impl Marks {
    pub fn new(exam1: f64, exam2: f64, exam3: f64) -> Self {
        Self {
            exams: [exam1, exam2, exam3],
            aat: None,
        }
    }

    pub fn with_aat(mut self, aat: f64) -> Self {
        self.aat = Some(aat);
        self
    }

    pub fn total(&self) -> f64 {
        self.exams.iter().sum()
    }
}

/// One student's identity and marks.
///
/// Derived values are computed on demand from the exam scores and never
/// stored alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    name: String,
    usn: String,
    exams: [f64; EXAM_COUNT],
    aat: f64,
}

impl StudentRecord {
    pub fn new(name: impl Into<String>, usn: impl Into<String>, exams: [f64; EXAM_COUNT]) -> Self {
        Self {
            name: name.into(),
            usn: usn.into(),
            exams,
            aat: 0.0,
        }
    }

    /// Record with no marks yet
    pub fn blank(name: impl Into<String>, usn: impl Into<String>) -> Self {
        Self::new(name, usn, [0.0; EXAM_COUNT])
    }

    pub fn with_aat(mut self, aat: f64) -> Self {
        self.aat = aat;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usn(&self) -> &str {
        &self.usn
    }

    pub fn exams(&self) -> [f64; EXAM_COUNT] {
        self.exams
    }

    pub fn exam(&self, index: usize) -> Option<f64> {
        self.exams.get(index).copied()
    }

    /// Returns false when `index` is not an exam slot
    pub fn set_exam(&mut self, index: usize, value: f64) -> bool {
        match self.exams.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn set_exams(&mut self, exams: [f64; EXAM_COUNT]) {
        self.exams = exams;
    }

    pub fn aat(&self) -> f64 {
        self.aat
    }

    pub fn set_aat(&mut self, aat: f64) {
        self.aat = aat;
    }

    pub fn total(&self) -> f64 {
        self.exams.iter().sum()
    }

    pub fn average(&self) -> f64 {
        self.total() / EXAM_COUNT as f64
    }

    pub fn scaled_average(&self, scale: AverageScale) -> f64 {
        scale.apply(self.total())
    }

    pub fn final_marks(&self, scale: AverageScale) -> f64 {
        self.scaled_average(scale) + self.aat
    }
}

impl std::fmt::Display for StudentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {} / {} / {}",
            self.name, self.usn, self.exams[0], self.exams[1], self.exams[2]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_values() {
        let record = StudentRecord::new("Alice", "USN001", [40.0, 35.0, 45.0]);
        assert_eq!(record.total(), 120.0);
        assert_eq!(record.average(), 40.0);
        assert_eq!(record.scaled_average(AverageScale::OutOfFifty), 2.4);
        assert_eq!(record.final_marks(AverageScale::OutOfFifty), 2.4);
    }

    #[test]
    fn test_total_is_exact_float_sum() {
        let record = StudentRecord::new("Bob", "USN002", [0.1, 0.2, 0.3]);
        assert_eq!(record.total(), 0.1 + 0.2 + 0.3);
    }

    #[test]
    fn test_derived_values_follow_mutation() {
        let mut record = StudentRecord::blank("Carol", "USN003");
        assert_eq!(record.total(), 0.0);

        record.set_exams([10.0, 20.0, 30.0]);
        assert_eq!(record.total(), 60.0);
        assert!(record.set_exam(0, 50.0));
        assert!(!record.set_exam(3, 1.0));
        assert_eq!(record.total(), 100.0);

        record.set_aat(8.0);
        assert_eq!(
            record.final_marks(AverageScale::OutOfFiftyTimesTen),
            (100.0 / 50.0) * 10.0 + 8.0
        );
    }

    #[test]
    fn test_average_scales() {
        assert_eq!(AverageScale::ThirdOfTotal.apply(90.0), 30.0);
        assert_eq!(AverageScale::FifthOfTotal.apply(90.0), 18.0);
        assert_eq!(AverageScale::OutOfFifty.apply(100.0), 2.0);
        assert_eq!(AverageScale::OutOfFiftyTimesTen.apply(100.0), 20.0);
    }

    #[test]
    fn test_marks_builder() {
        let marks = Marks::new(10.0, 20.0, 30.0).with_aat(5.0);
        assert_eq!(marks.total(), 60.0);
        assert_eq!(marks.aat, Some(5.0));
    }
}
