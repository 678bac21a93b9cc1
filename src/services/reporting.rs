// src/services/reporting.rs

use serde::Serialize;

use crate::{
    models::attempt::Attempt,
    services::grading::{GradeBand, grade_band_of},
};

/// "My results" header figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub papers_completed: i64,
    pub average_percentage: i64,
    pub best_percentage: i64,
}

/// Count of graded attempts per distribution bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradeDistribution {
    #[serde(rename = "A+")]
    pub a_plus: i64,
    #[serde(rename = "A")]
    pub a: i64,
    #[serde(rename = "B+")]
    pub b_plus: i64,
    #[serde(rename = "B")]
    pub b: i64,
    #[serde(rename = "C/F")]
    pub c_f: i64,
}

impl GradeDistribution {
    fn record(&mut self, band: GradeBand) {
        match band {
            GradeBand::APlus => self.a_plus += 1,
            GradeBand::A => self.a += 1,
            GradeBand::BPlus => self.b_plus += 1,
            GradeBand::B => self.b += 1,
            GradeBand::CF => self.c_f += 1,
        }
    }

    pub fn get(&self, band: GradeBand) -> i64 {
        match band {
            GradeBand::APlus => self.a_plus,
            GradeBand::A => self.a,
            GradeBand::BPlus => self.b_plus,
            GradeBand::B => self.b,
            GradeBand::CF => self.c_f,
        }
    }
}

/// Teacher-facing statistics for one paper. Scores are percentages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaperSummary {
    pub total_submissions: i64,
    pub average_score: i64,
    pub highest_score: i64,
    pub lowest_score: i64,
    pub grade_distribution: GradeDistribution,
    /// Essay attempts with no teacher review file yet.
    pub pending_review: i64,
}

/// Rounded (half up) mean of non-negative values. Zero for an empty slice.
fn rounded_mean(values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    let n = values.len() as i64;
    let sum: i64 = values.iter().sum();
    (sum * 2 + n) / (n * 2)
}

fn graded_percentages<'a>(attempts: impl IntoIterator<Item = &'a Attempt>) -> Vec<i64> {
    attempts
        .into_iter()
        .filter_map(|a| a.percentage.map(i64::from))
        .collect()
}

pub fn summarize_for_student(attempts: &[Attempt]) -> StudentSummary {
    let percentages = graded_percentages(attempts);

    StudentSummary {
        papers_completed: attempts.len() as i64,
        average_percentage: rounded_mean(&percentages),
        best_percentage: percentages.iter().copied().max().unwrap_or(0),
    }
}

pub fn summarize_for_paper(attempts: &[Attempt]) -> PaperSummary {
    let percentages = graded_percentages(attempts);

    let mut grade_distribution = GradeDistribution::default();
    for p in &percentages {
        grade_distribution.record(grade_band_of(*p));
    }

    let pending_review = attempts
        .iter()
        .filter(|a| !a.is_graded() && !a.is_reviewed())
        .count() as i64;

    PaperSummary {
        total_submissions: attempts.len() as i64,
        average_score: rounded_mean(&percentages),
        highest_score: percentages.iter().copied().max().unwrap_or(0),
        lowest_score: percentages.iter().copied().min().unwrap_or(0),
        grade_distribution,
        pending_review,
    }
}

/// Mean percentage of every graded attempt on a paper.
pub fn paper_average_percentage(attempts: &[Attempt]) -> i64 {
    rounded_mean(&graded_percentages(attempts))
}
