//! Domain value types shared by the services and repositories

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::DomainError;
use crate::models::Role;

/// Authenticated caller, verified upstream and trusted as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins, HR and instructors may look at other learners' records
    pub fn can_view_reports(&self) -> bool {
        matches!(self.role, Role::Admin | Role::HrPersonnel | Role::Instructor)
    }

    pub fn require_admin(&self) -> Result<(), DomainError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(DomainError::Forbidden)
        }
    }

    pub fn require_reports(&self) -> Result<(), DomainError> {
        if self.can_view_reports() {
            Ok(())
        } else {
            Err(DomainError::Forbidden)
        }
    }
}

/// What a coin transaction refers to, e.g. `("course", id)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CoinReference {
    pub kind: String,
    pub id: Uuid,
}

impl CoinReference {
    pub fn course(id: Uuid) -> Self {
        Self {
            kind: "course".to_string(),
            id,
        }
    }

    pub fn quiz(id: Uuid) -> Self {
        Self {
            kind: "quiz".to_string(),
            id,
        }
    }
}

/// Learner statistics that badge criteria are evaluated against
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStats {
    /// Sum of positive `earned` and `admin_adjustment` ledger rows
    pub coins_earned: i64,
    pub learning_hours: f64,
    pub courses_completed: u64,
    /// Mean final score over completed enrollments
    pub average_final_score: Option<f64>,
    /// Submitted quiz attempts scoring 100%
    pub perfect_quizzes: u64,
    pub streak_days: i32,
}

/// Award rule of a badge, stored as JSON in `badges.criteria`.
///
/// ```json
/// {"type": "courses_completed", "value": 20, "avg_score": 90}
/// {"type": "learning_streak", "days": 30}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BadgeCriteria {
    CoursesCompleted {
        value: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avg_score: Option<u32>,
    },
    LearningHours {
        hours: f64,
    },
    PerfectQuizzes {
        value: u32,
    },
    #[serde(rename = "learning_streak", alias = "streak_days")]
    StreakDays {
        days: u32,
    },
    CoinsEarned {
        value: i64,
    },
}

impl BadgeCriteria {
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> String {
        // Serializing a plain enum of numbers cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn is_met(&self, stats: &UserStats) -> bool {
        match self {
            BadgeCriteria::CoursesCompleted { value, avg_score } => {
                stats.courses_completed >= u64::from(*value)
                    && avg_score.is_none_or(|min| {
                        stats
                            .average_final_score
                            .is_some_and(|avg| avg >= f64::from(min))
                    })
            }
            BadgeCriteria::LearningHours { hours } => stats.learning_hours >= *hours,
            BadgeCriteria::PerfectQuizzes { value } => stats.perfect_quizzes >= u64::from(*value),
            BadgeCriteria::StreakDays { days } => i64::from(stats.streak_days) >= i64::from(*days),
            BadgeCriteria::CoinsEarned { value } => stats.coins_earned >= *value,
        }
    }

    /// Progress towards the badge in percent, 100 only when the criteria are met
    pub fn progress(&self, stats: &UserStats) -> i32 {
        if self.is_met(stats) {
            return 100;
        }
        let pct = match self {
            BadgeCriteria::CoursesCompleted { value, .. } => {
                percent_of(stats.courses_completed as f64, f64::from(*value))
            }
            BadgeCriteria::LearningHours { hours } => percent_of(stats.learning_hours, *hours),
            BadgeCriteria::PerfectQuizzes { value } => {
                percent_of(stats.perfect_quizzes as f64, f64::from(*value))
            }
            BadgeCriteria::StreakDays { days } => {
                percent_of(f64::from(stats.streak_days), f64::from(*days))
            }
            BadgeCriteria::CoinsEarned { value } => {
                percent_of(stats.coins_earned as f64, *value as f64)
            }
        };
        pct.min(99)
    }
}

fn percent_of(actual: f64, target: f64) -> i32 {
    if target <= 0.0 {
        return 100;
    }
    ((actual.max(0.0) * 100.0 / target).floor() as i32).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> UserStats {
        UserStats {
            coins_earned: 250,
            learning_hours: 3.5,
            courses_completed: 4,
            average_final_score: Some(88.0),
            perfect_quizzes: 2,
            streak_days: 12,
        }
    }

    #[test]
    fn decodes_stored_criteria() {
        let c = BadgeCriteria::parse(r#"{"type":"courses_completed","value":20,"avg_score":90}"#)
            .unwrap();
        assert_eq!(
            c,
            BadgeCriteria::CoursesCompleted {
                value: 20,
                avg_score: Some(90)
            }
        );

        let c = BadgeCriteria::parse(r#"{"type":"learning_streak","days":30}"#).unwrap();
        assert_eq!(c, BadgeCriteria::StreakDays { days: 30 });
        let c = BadgeCriteria::parse(r#"{"type":"streak_days","days":7}"#).unwrap();
        assert_eq!(c, BadgeCriteria::StreakDays { days: 7 });

        assert!(BadgeCriteria::parse(r#"{"type":"moon_phase","value":1}"#).is_err());
        assert!(BadgeCriteria::parse("not json").is_err());
    }

    #[test]
    fn encodes_back_to_the_same_shape() {
        let c = BadgeCriteria::CoursesCompleted {
            value: 1,
            avg_score: None,
        };
        assert_eq!(c.to_json(), r#"{"type":"courses_completed","value":1}"#);
    }

    #[test]
    fn evaluates_each_kind() {
        let s = stats();
        assert!(BadgeCriteria::CoursesCompleted { value: 4, avg_score: None }.is_met(&s));
        assert!(!BadgeCriteria::CoursesCompleted { value: 4, avg_score: Some(90) }.is_met(&s));
        assert!(BadgeCriteria::LearningHours { hours: 3.0 }.is_met(&s));
        assert!(!BadgeCriteria::PerfectQuizzes { value: 5 }.is_met(&s));
        assert!(BadgeCriteria::StreakDays { days: 12 }.is_met(&s));
        assert!(!BadgeCriteria::CoinsEarned { value: 500 }.is_met(&s));
    }

    #[test]
    fn progress_is_capped_until_met() {
        let s = stats();
        assert_eq!(BadgeCriteria::CoursesCompleted { value: 5, avg_score: None }.progress(&s), 80);
        assert_eq!(BadgeCriteria::PerfectQuizzes { value: 5 }.progress(&s), 40);
        assert_eq!(BadgeCriteria::CoinsEarned { value: 250 }.progress(&s), 100);
        // count reached, average score not
        assert_eq!(
            BadgeCriteria::CoursesCompleted { value: 4, avg_score: Some(90) }.progress(&s),
            99
        );
    }

    #[test]
    fn principal_roles() {
        let learner = Principal::new(Uuid::new_v4(), Role::Learner);
        let hr = Principal::new(Uuid::new_v4(), Role::HrPersonnel);
        assert!(matches!(learner.require_admin(), Err(DomainError::Forbidden)));
        assert!(learner.require_reports().is_err());
        assert!(hr.require_reports().is_ok());
        assert!(hr.require_admin().is_err());
    }
}
