// src/services/grading.rs

//! Percentage to grade mapping.
//!
//! Two separate rules live here and must stay separate: `grade_of` gives the
//! single letter shown next to a result, `grade_band_of` picks the bucket used
//! by the results distribution table (where C and F share one bucket).

use serde::Serialize;

/// Letter grade, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    F,
    C,
    B,
    #[serde(rename = "B+")]
    BPlus,
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::F => "F",
        }
    }

    /// Display class used by clients to color a grade.
    pub fn severity(&self) -> &'static str {
        match self {
            Grade::APlus | Grade::A => "success",
            Grade::BPlus | Grade::B => "info",
            Grade::C => "warning",
            Grade::F => "danger",
        }
    }
}

/// Bucket of the five-way grade distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradeBand {
    APlus,
    A,
    BPlus,
    B,
    CF,
}

impl GradeBand {
    pub const ALL: [GradeBand; 5] = [
        GradeBand::APlus,
        GradeBand::A,
        GradeBand::BPlus,
        GradeBand::B,
        GradeBand::CF,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GradeBand::APlus => "A+",
            GradeBand::A => "A",
            GradeBand::BPlus => "B+",
            GradeBand::B => "B",
            GradeBand::CF => "C/F",
        }
    }
}

fn clamp_percentage(percentage: i64) -> i64 {
    percentage.clamp(0, 100)
}

/// Letter grade with inclusive lower bounds 90/80/70/60/50.
pub fn grade_of(percentage: i64) -> Grade {
    match clamp_percentage(percentage) {
        90.. => Grade::APlus,
        80..=89 => Grade::A,
        70..=79 => Grade::BPlus,
        60..=69 => Grade::B,
        50..=59 => Grade::C,
        _ => Grade::F,
    }
}

/// Distribution bucket: A+ [90,100], A [80,89], B+ [70,79], B [60,69], C/F [0,59].
pub fn grade_band_of(percentage: i64) -> GradeBand {
    match clamp_percentage(percentage) {
        90..=100 => GradeBand::APlus,
        80..=89 => GradeBand::A,
        70..=79 => GradeBand::BPlus,
        60..=69 => GradeBand::B,
        _ => GradeBand::CF,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(grade_of(100), Grade::APlus);
        assert_eq!(grade_of(90), Grade::APlus);
        assert_eq!(grade_of(89), Grade::A);
        assert_eq!(grade_of(80), Grade::A);
        assert_eq!(grade_of(79), Grade::BPlus);
        assert_eq!(grade_of(70), Grade::BPlus);
        assert_eq!(grade_of(69), Grade::B);
        assert_eq!(grade_of(60), Grade::B);
        assert_eq!(grade_of(59), Grade::C);
        assert_eq!(grade_of(50), Grade::C);
        assert_eq!(grade_of(49), Grade::F);
        assert_eq!(grade_of(0), Grade::F);
    }

    #[test]
    fn test_grade_clamps_out_of_range() {
        assert_eq!(grade_of(-20), Grade::F);
        assert_eq!(grade_of(150), Grade::APlus);
        assert_eq!(grade_band_of(-1), GradeBand::CF);
        assert_eq!(grade_band_of(101), GradeBand::APlus);
    }

    #[test]
    fn test_grade_is_monotonic() {
        let mut previous = grade_of(0);
        for p in 1..=100 {
            let current = grade_of(p);
            assert!(current >= previous, "grade dropped at {}", p);
            previous = current;
        }
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(grade_band_of(90), GradeBand::APlus);
        assert_eq!(grade_band_of(89), GradeBand::A);
        assert_eq!(grade_band_of(80), GradeBand::A);
        assert_eq!(grade_band_of(79), GradeBand::BPlus);
        assert_eq!(grade_band_of(60), GradeBand::B);
        assert_eq!(grade_band_of(59), GradeBand::CF);
        assert_eq!(grade_band_of(50), GradeBand::CF);
        assert_eq!(grade_band_of(0), GradeBand::CF);
    }

    #[test]
    fn test_grade_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Grade::BPlus).unwrap(), "\"B+\"");
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
        assert_eq!(Grade::C.severity(), "warning");
    }
}
