//! Enrollment Service - enrollment lifecycle, capacity and completion

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{GamificationService, ProgressService, gamification_service::earned_entry};
use crate::domain::{
    CertificateRepository, CoinReference, CompletionPlan, CompletionRecord, CourseRepository,
    DomainError, EnrollmentRepository, EnrollmentWithCourse, NewCertificate, Principal,
};
use crate::models::{EnrollmentStatus, badge, certificate, enrollment};

/// Highest progress a not-yet-completed enrollment may store
const MAX_OPEN_PROGRESS: i32 = 99;

/// `CERT-` followed by 16 upper-case hex digits of a SHA-256 over the
/// user, course, issuance time and a random nonce.
pub fn certificate_number(
    user_id: Uuid,
    course_id: Uuid,
    issued_at: DateTime<Utc>,
    nonce: Uuid,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(course_id.as_bytes());
    hasher.update(
        issued_at
            .timestamp_nanos_opt()
            .unwrap_or_else(|| issued_at.timestamp())
            .to_be_bytes(),
    );
    hasher.update(nonce.as_bytes());
    let digest = hasher.finalize();

    format!("CERT-{}", hex::encode_upper(&digest[..8]))
}

/// Completion outcome together with the badges it unlocked
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseCompletion {
    #[serde(flatten)]
    pub completion: CompletionRecord,
    #[schema(value_type = Vec<Object>)]
    pub new_badges: Vec<badge::Model>,
}

pub struct EnrollmentService {
    enrollments: Arc<dyn EnrollmentRepository>,
    courses: Arc<dyn CourseRepository>,
    certificates: Arc<dyn CertificateRepository>,
    progress: Arc<ProgressService>,
    gamification: Arc<GamificationService>,
}

impl EnrollmentService {
    pub fn new(
        enrollments: Arc<dyn EnrollmentRepository>,
        courses: Arc<dyn CourseRepository>,
        certificates: Arc<dyn CertificateRepository>,
        progress: Arc<ProgressService>,
        gamification: Arc<GamificationService>,
    ) -> Self {
        Self {
            enrollments,
            courses,
            certificates,
            progress,
            gamification,
        }
    }

    pub async fn enroll_user(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<enrollment::Model, DomainError> {
        let course = self
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or(DomainError::NotFound("course"))?;

        if self.enrollments.find(user_id, course_id).await?.is_some() {
            return Err(DomainError::AlreadyEnrolled);
        }
        if course.is_full() {
            return Err(DomainError::CourseFull);
        }

        let enrollment = self
            .enrollments
            .enroll(user_id, course_id, Utc::now())
            .await?;
        tracing::info!("User {} enrolled in course '{}'", user_id, course.title);
        Ok(enrollment)
    }

    pub async fn mark_started(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<enrollment::Model, DomainError> {
        self.enrollments
            .mark_started(user_id, course_id, Utc::now())
            .await
    }

    /// Record a learner's completion on their behalf; reporting roles only.
    pub async fn record_completion(
        &self,
        principal: &Principal,
        user_id: Uuid,
        course_id: Uuid,
        final_score: i32,
    ) -> Result<CourseCompletion, DomainError> {
        principal.require_reports()?;
        tracing::info!(
            "User {} records completion of course {} for user {}",
            principal.user_id,
            course_id,
            user_id
        );
        self.complete_course(user_id, course_id, final_score).await
    }

    /// Complete the course with `final_score`.
    ///
    /// A pass awards the course's coins and issues a certificate together
    /// with the status change. Completing twice changes nothing.
    pub async fn complete_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        final_score: i32,
    ) -> Result<CourseCompletion, DomainError> {
        if !(0..=100).contains(&final_score) {
            return Err(DomainError::InvalidRange(
                "final score must be between 0 and 100".to_string(),
            ));
        }

        let course = self
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or(DomainError::NotFound("course"))?;
        let existing = self
            .enrollments
            .find(user_id, course_id)
            .await?
            .ok_or(DomainError::NotFound("enrollment"))?;

        if existing.is_completed() {
            return Ok(CourseCompletion {
                completion: CompletionRecord {
                    enrollment: existing,
                    newly_completed: false,
                    transaction: None,
                    certificate: None,
                },
                new_badges: Vec::new(),
            });
        }

        let now = Utc::now();
        let is_passed = final_score >= course.passing_score;

        let reward = if is_passed && course.coins_reward > 0 {
            Some(earned_entry(
                user_id,
                course.coins_reward,
                format!("Course Completion: {}", course.title),
                Some(CoinReference::course(course_id)),
            )?)
        } else {
            None
        };

        let certificate = is_passed.then(|| NewCertificate {
            certificate_number: certificate_number(user_id, course_id, now, Uuid::new_v4()),
            score: final_score,
            issued_at: now,
        });

        let completion = self
            .enrollments
            .complete(CompletionPlan {
                user_id,
                course_id,
                final_score,
                is_passed,
                completed_at: now,
                reward,
                certificate,
            })
            .await?;

        if !completion.newly_completed {
            return Ok(CourseCompletion {
                completion,
                new_badges: Vec::new(),
            });
        }

        tracing::info!(
            "User {} completed course '{}' with score {} (passed: {})",
            user_id,
            course.title,
            final_score,
            is_passed
        );

        self.gamification
            .record_activity(user_id, now.date_naive())
            .await?;
        let new_badges = self.gamification.check_and_award_badges(user_id).await?;

        Ok(CourseCompletion {
            completion,
            new_badges,
        })
    }

    /// Store course progress. Completed enrollments keep their 100; open
    /// ones are held below it, since only completion yields 100.
    pub async fn update_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        progress: i32,
    ) -> Result<enrollment::Model, DomainError> {
        if !(0..=100).contains(&progress) {
            return Err(DomainError::InvalidRange(
                "progress must be between 0 and 100".to_string(),
            ));
        }

        self.enrollments
            .set_progress(
                user_id,
                course_id,
                progress.min(MAX_OPEN_PROGRESS),
                Utc::now(),
            )
            .await
    }

    /// Recompute the enrollment progress from the lesson rows
    pub async fn sync_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<enrollment::Model, DomainError> {
        let progress = self
            .progress
            .calculate_course_progress(user_id, course_id)
            .await?;
        self.update_progress(user_id, course_id, progress).await
    }

    pub async fn get_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<enrollment::Model, DomainError> {
        self.enrollments
            .find(user_id, course_id)
            .await?
            .ok_or(DomainError::NotFound("enrollment"))
    }

    pub async fn list_enrollments(
        &self,
        user_id: Uuid,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<EnrollmentWithCourse>, DomainError> {
        self.enrollments.list_for_user(user_id, status).await
    }

    pub async fn list_mandatory(
        &self,
        user_id: Uuid,
        incomplete_only: bool,
    ) -> Result<Vec<EnrollmentWithCourse>, DomainError> {
        self.enrollments
            .list_mandatory(user_id, incomplete_only)
            .await
    }

    /// Overdue mandatory enrollments of every user
    pub async fn list_overdue(
        &self,
        principal: &Principal,
    ) -> Result<Vec<EnrollmentWithCourse>, DomainError> {
        principal.require_reports()?;
        self.enrollments.list_overdue(Utc::now()).await
    }

    pub async fn list_certificates(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<certificate::Model>, DomainError> {
        self.certificates.list_for_user(user_id).await
    }

    pub async fn verify_certificate(&self, number: &str) -> Result<certificate::Model, DomainError> {
        self.certificates
            .find_by_number(number)
            .await?
            .ok_or(DomainError::NotFound("certificate"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_numbers_have_fixed_shape() {
        let number = certificate_number(Uuid::new_v4(), Uuid::new_v4(), Utc::now(), Uuid::new_v4());
        assert_eq!(number.len(), 5 + 16);
        assert!(number.starts_with("CERT-"));
        assert!(
            number[5..]
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }

    #[test]
    fn certificate_numbers_depend_on_nonce() {
        let user = Uuid::new_v4();
        let course = Uuid::new_v4();
        let at = Utc::now();
        let nonce = Uuid::new_v4();

        assert_eq!(
            certificate_number(user, course, at, nonce),
            certificate_number(user, course, at, nonce)
        );
        assert_ne!(
            certificate_number(user, course, at, nonce),
            certificate_number(user, course, at, Uuid::new_v4())
        );
    }
}
