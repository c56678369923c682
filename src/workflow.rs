//! Application workflow engine.
//!
//! Every status change on an [`Application`](crate::models::application::Application)
//! goes through [`plan`]: one transition table keyed by (current status,
//! actor, requested action). The planner is pure; it returns the new
//! status, the derived category, the field changes to persist, and the
//! notifications to dispatch after the row has been written. The three
//! actor-facing route sets all consume it identically, so no route can
//! invent a transition the table does not allow.

use crate::models::application::{
    AcceptanceDocument, ApplicationCategory, ApplicationStatus, DocumentType, FileRef,
    InterviewDetails, OfferDetails, OfferLetter,
};

/// Caller role as resolved by the auth middleware. Employer is the
/// candidate side of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Employer,
    College,
    Admin,
}

/// A requested transition together with the payload it needs. Payloads are
/// carried on the variant itself, so a transition that requires an uploaded
/// file or interview details cannot be planned without them.
#[derive(Debug, Clone)]
pub enum Action {
    /// Admin releases a pending application to the college.
    Approve,
    /// Admin rejects the application outright, from any state.
    Reject,
    /// College marks an incoming application as seen.
    MarkViewed,
    /// College shortlists an applied/viewed application.
    Shortlist,
    /// College schedules an interview for a shortlisted candidate.
    ScheduleInterview(InterviewDetails),
    /// Admin confirms the interview and forwards it to the candidate.
    ConfirmInterview,
    /// College extends an offer; the letter must already be uploaded.
    ExtendOffer {
        letter: FileRef,
        details: Option<OfferDetails>,
    },
    /// Admin counter-signs and forwards the offer to the candidate.
    ForwardOffer { agreement: FileRef },
    /// Candidate accepts the offer and submits verification documents.
    SubmitAcceptance {
        terms_accepted: bool,
        documents: Vec<AcceptanceDocument>,
    },
    /// Candidate declines an extended offer.
    DeclineOffer,
    /// Admin verifies the submitted documents.
    VerifyDocuments { approved: bool },
    /// College finalizes the hire (or not) after document approval.
    FinalizeHiring { hired: bool },
}

/// Field changes the service layer must persist alongside the new status.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    None,
    SetInterview(InterviewDetails),
    ConfirmInterview,
    SetOffer {
        letter: OfferLetter,
        details: Option<OfferDetails>,
    },
    ForwardOffer { agreement: FileRef },
    SetAcceptance { documents: Vec<AcceptanceDocument> },
}

/// Who a post-commit notice goes to. Resolved to a concrete user id by the
/// dispatcher, which knows the application's candidate and the job's poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Candidate,
    JobPoster,
}

/// Post-commit notification, decoupled from the transition itself so the
/// engine stays testable without a live notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ApplicationApproved,
    ApplicationRejectedByAdmin,
    InterviewForwarded,
    OfferForwarded,
    DocumentsApproved,
    DocumentsRejected,
    HiringConfirmed,
    NotProceeding,
}

impl Notice {
    pub fn recipient(&self) -> Recipient {
        match self {
            Notice::ApplicationApproved
            | Notice::ApplicationRejectedByAdmin
            | Notice::DocumentsApproved => Recipient::JobPoster,
            Notice::InterviewForwarded
            | Notice::OfferForwarded
            | Notice::DocumentsRejected
            | Notice::HiringConfirmed
            | Notice::NotProceeding => Recipient::Candidate,
        }
    }

    /// User-facing message and link path for this notice.
    pub fn render(&self, job_title: &str) -> (String, &'static str) {
        match self {
            Notice::ApplicationApproved => (
                format!(
                    "A new application for your job posting '{}' has been approved and is ready for review.",
                    job_title
                ),
                "/college/applications",
            ),
            Notice::ApplicationRejectedByAdmin => (
                format!(
                    "An application for '{}' was reviewed by the admin and did not proceed.",
                    job_title
                ),
                "/college/applications",
            ),
            Notice::InterviewForwarded => (
                format!(
                    "An interview has been scheduled for the {} position. Please check your applications for details.",
                    job_title
                ),
                "/my-jobs?category=interviews",
            ),
            Notice::OfferForwarded => (
                format!(
                    "Congratulations! You have received an offer for the {} position.",
                    job_title
                ),
                "/my-jobs?category=offers",
            ),
            Notice::DocumentsApproved => (
                format!(
                    "Documents for your application to '{}' have been approved and forwarded to the college.",
                    job_title
                ),
                "/college/applications/offers",
            ),
            Notice::DocumentsRejected => (
                format!(
                    "There was an issue with the documents for your application to '{}'. Please review and contact support.",
                    job_title
                ),
                "/my-jobs",
            ),
            Notice::HiringConfirmed => (
                format!(
                    "Congratulations! The college has confirmed your hiring for the {} position. Welcome aboard!",
                    job_title
                ),
                "/my-jobs",
            ),
            Notice::NotProceeding => (
                format!(
                    "Regarding your application for {}, the college has decided not to proceed at this time. We wish you the best in your job search.",
                    job_title
                ),
                "/my-jobs",
            ),
        }
    }
}

/// Planned outcome of a transition, to be committed atomically with a
/// prior-status re-check by the service layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub status: ApplicationStatus,
    pub category: ApplicationCategory,
    pub change: Change,
    pub notices: Vec<Notice>,
}

impl Transition {
    fn to(status: ApplicationStatus) -> Self {
        Self {
            status,
            category: ApplicationCategory::for_status(status),
            change: Change::None,
            notices: Vec::new(),
        }
    }

    fn with_change(mut self, change: Change) -> Self {
        self.change = change;
        self
    }

    fn notify(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// Required prior state does not hold, with a message the caller is
    /// allowed to see.
    #[error("{0}")]
    Guard(String),

    /// Required input is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The (status, actor, action) triple is not in the table. Surfaced to
    /// callers as not-found so an unauthorized caller cannot tell "wrong
    /// state" from "not yours".
    #[error("Transition not permitted")]
    NotAllowed,
}

impl From<WorkflowError> for crate::error::Error {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Guard(msg) | WorkflowError::Validation(msg) => {
                crate::error::Error::BadRequest(msg)
            }
            WorkflowError::NotAllowed => {
                crate::error::Error::NotFound("Application not found.".to_string())
            }
        }
    }
}

/// Plan a transition. Pure: no I/O, no clock, no database.
pub fn plan(
    current: ApplicationStatus,
    actor: Actor,
    action: &Action,
) -> Result<Transition, WorkflowError> {
    use ApplicationStatus as S;

    match (actor, action) {
        (Actor::Admin, Action::Approve) => match current {
            S::PendingAdminApproval => {
                Ok(Transition::to(S::Applied).notify(Notice::ApplicationApproved))
            }
            _ => Err(WorkflowError::NotAllowed),
        },

        (Actor::Admin, Action::Reject) => {
            Ok(Transition::to(S::Rejected).notify(Notice::ApplicationRejectedByAdmin))
        }

        (Actor::College, Action::MarkViewed) => match current {
            S::Applied => Ok(Transition::to(S::Viewed)),
            _ => Err(WorkflowError::NotAllowed),
        },

        (Actor::College, Action::Shortlist) => match current {
            S::Applied | S::Viewed => Ok(Transition::to(S::Shortlisted)),
            _ => Err(WorkflowError::NotAllowed),
        },

        (Actor::College, Action::ScheduleInterview(details)) => match current {
            S::Shortlisted => {
                let details = InterviewDetails {
                    confirmed_by_admin: false,
                    ..details.clone()
                };
                Ok(Transition::to(S::InterviewScheduled)
                    .with_change(Change::SetInterview(details)))
            }
            _ => Err(WorkflowError::NotAllowed),
        },

        (Actor::Admin, Action::ConfirmInterview) => match current {
            S::InterviewScheduled => Ok(Transition::to(S::InterviewScheduled)
                .with_change(Change::ConfirmInterview)
                .notify(Notice::InterviewForwarded)),
            _ => Err(WorkflowError::NotAllowed),
        },

        (Actor::College, Action::ExtendOffer { letter, details }) => match current {
            S::InterviewScheduled => Ok(Transition::to(S::OfferExtended).with_change(
                Change::SetOffer {
                    letter: OfferLetter {
                        public_id: letter.public_id.clone(),
                        url: letter.url.clone(),
                        forwarded_by_admin: false,
                    },
                    details: details.clone(),
                },
            )),
            _ => Err(WorkflowError::NotAllowed),
        },

        (Actor::Admin, Action::ForwardOffer { agreement }) => match current {
            S::OfferExtended => Ok(Transition::to(S::OfferExtended)
                .with_change(Change::ForwardOffer {
                    agreement: agreement.clone(),
                })
                .notify(Notice::OfferForwarded)),
            _ => Err(WorkflowError::NotAllowed),
        },

        (
            Actor::Employer,
            Action::SubmitAcceptance {
                terms_accepted,
                documents,
            },
        ) => match current {
            S::OfferExtended => {
                if !terms_accepted {
                    return Err(WorkflowError::Validation(
                        "You must accept the terms and conditions.".to_string(),
                    ));
                }
                let has_signed_agreement = documents
                    .iter()
                    .any(|d| d.document_type == DocumentType::SignedAgreement);
                if !has_signed_agreement {
                    return Err(WorkflowError::Validation(
                        "Signed agreement is mandatory.".to_string(),
                    ));
                }
                Ok(Transition::to(S::PendingDocumentApproval).with_change(
                    Change::SetAcceptance {
                        documents: documents.clone(),
                    },
                ))
            }
            _ => Err(WorkflowError::NotAllowed),
        },

        (Actor::Employer, Action::DeclineOffer) => match current {
            S::OfferExtended => Ok(Transition::to(S::Rejected)),
            _ => Err(WorkflowError::NotAllowed),
        },

        (Actor::Admin, Action::VerifyDocuments { approved }) => match current {
            S::PendingDocumentApproval => {
                if *approved {
                    Ok(Transition::to(S::DocumentsApproved).notify(Notice::DocumentsApproved))
                } else {
                    // "documents_rejected" input is normalized to the
                    // canonical rejected status.
                    Ok(Transition::to(S::Rejected).notify(Notice::DocumentsRejected))
                }
            }
            _ => Err(WorkflowError::NotAllowed),
        },

        (Actor::College, Action::FinalizeHiring { hired }) => match current {
            S::DocumentsApproved => {
                if *hired {
                    Ok(Transition::to(S::Hired).notify(Notice::HiringConfirmed))
                } else {
                    Ok(Transition::to(S::Rejected).notify(Notice::NotProceeding))
                }
            }
            _ => Err(WorkflowError::Guard(
                "Cannot finalize hiring until documents are approved by admin.".to_string(),
            )),
        },

        _ => Err(WorkflowError::NotAllowed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ApplicationStatus as S;

    fn interview() -> InterviewDetails {
        InterviewDetails {
            scheduled_on: Utc::now(),
            interview_type: crate::models::application::InterviewType::Online,
            notes: Some("Bring a demo lesson".to_string()),
            meeting_link: Some("https://meet.example.com/abc".to_string()),
            confirmed_by_admin: true, // must be reset by the planner
        }
    }

    fn file_ref(id: &str) -> FileRef {
        FileRef {
            public_id: id.to_string(),
            url: format!("/uploads/{}", id),
        }
    }

    fn signed_agreement() -> AcceptanceDocument {
        AcceptanceDocument {
            name: "agreement.pdf".to_string(),
            document_type: DocumentType::SignedAgreement,
            public_id: "doc-1".to_string(),
            url: "/uploads/doc-1".to_string(),
        }
    }

    #[test]
    fn admin_approve_releases_pending_application_to_college() {
        let t = plan(S::PendingAdminApproval, Actor::Admin, &Action::Approve).unwrap();
        assert_eq!(t.status, S::Applied);
        assert_eq!(t.category, ApplicationCategory::Applied);
        assert_eq!(t.notices, vec![Notice::ApplicationApproved]);
        assert_eq!(t.notices[0].recipient(), Recipient::JobPoster);
    }

    #[test]
    fn admin_approve_rejected_from_any_other_state() {
        for s in [S::Saved, S::Applied, S::Shortlisted, S::Hired, S::Rejected] {
            assert_eq!(
                plan(s, Actor::Admin, &Action::Approve),
                Err(WorkflowError::NotAllowed),
                "approve should not be allowed from {:?}",
                s
            );
        }
    }

    #[test]
    fn admin_reject_allowed_from_any_state_and_archives() {
        for s in [
            S::PendingAdminApproval,
            S::Applied,
            S::Shortlisted,
            S::InterviewScheduled,
            S::OfferExtended,
        ] {
            let t = plan(s, Actor::Admin, &Action::Reject).unwrap();
            assert_eq!(t.status, S::Rejected);
            assert_eq!(t.category, ApplicationCategory::Archived);
            assert_eq!(t.notices, vec![Notice::ApplicationRejectedByAdmin]);
        }
    }

    #[test]
    fn college_shortlists_from_applied_or_viewed_only() {
        assert_eq!(
            plan(S::Applied, Actor::College, &Action::Shortlist)
                .unwrap()
                .status,
            S::Shortlisted
        );
        assert_eq!(
            plan(S::Viewed, Actor::College, &Action::Shortlist)
                .unwrap()
                .status,
            S::Shortlisted
        );
        assert_eq!(
            plan(S::PendingAdminApproval, Actor::College, &Action::Shortlist),
            Err(WorkflowError::NotAllowed)
        );
    }

    #[test]
    fn scheduling_an_interview_always_starts_unconfirmed() {
        let t = plan(
            S::Shortlisted,
            Actor::College,
            &Action::ScheduleInterview(interview()),
        )
        .unwrap();
        assert_eq!(t.status, S::InterviewScheduled);
        assert_eq!(t.category, ApplicationCategory::Interviews);
        match t.change {
            Change::SetInterview(d) => assert!(!d.confirmed_by_admin),
            other => panic!("unexpected change: {:?}", other),
        }
    }

    #[test]
    fn admin_confirming_interview_keeps_status_and_notifies_candidate() {
        let t = plan(S::InterviewScheduled, Actor::Admin, &Action::ConfirmInterview).unwrap();
        assert_eq!(t.status, S::InterviewScheduled);
        assert_eq!(t.change, Change::ConfirmInterview);
        assert_eq!(t.notices, vec![Notice::InterviewForwarded]);
        assert_eq!(t.notices[0].recipient(), Recipient::Candidate);
    }

    #[test]
    fn extending_an_offer_stores_an_unforwarded_letter() {
        let t = plan(
            S::InterviewScheduled,
            Actor::College,
            &Action::ExtendOffer {
                letter: file_ref("offer-1"),
                details: None,
            },
        )
        .unwrap();
        assert_eq!(t.status, S::OfferExtended);
        assert_eq!(t.category, ApplicationCategory::Offers);
        match t.change {
            Change::SetOffer { letter, .. } => {
                assert_eq!(letter.public_id, "offer-1");
                assert!(!letter.forwarded_by_admin);
            }
            other => panic!("unexpected change: {:?}", other),
        }
        assert!(t.notices.is_empty());
    }

    #[test]
    fn forwarding_the_offer_requires_offer_extended() {
        let t = plan(
            S::OfferExtended,
            Actor::Admin,
            &Action::ForwardOffer {
                agreement: file_ref("agr-1"),
            },
        )
        .unwrap();
        assert_eq!(t.status, S::OfferExtended);
        assert_eq!(t.notices, vec![Notice::OfferForwarded]);

        assert_eq!(
            plan(
                S::InterviewScheduled,
                Actor::Admin,
                &Action::ForwardOffer {
                    agreement: file_ref("agr-1")
                }
            ),
            Err(WorkflowError::NotAllowed)
        );
    }

    #[test]
    fn acceptance_requires_terms_and_status_is_unchanged_on_failure() {
        let err = plan(
            S::OfferExtended,
            Actor::Employer,
            &Action::SubmitAcceptance {
                terms_accepted: false,
                documents: vec![signed_agreement()],
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Validation("You must accept the terms and conditions.".to_string())
        );
    }

    #[test]
    fn acceptance_requires_a_signed_agreement_document() {
        let err = plan(
            S::OfferExtended,
            Actor::Employer,
            &Action::SubmitAcceptance {
                terms_accepted: true,
                documents: vec![AcceptanceDocument {
                    name: "aadhar.pdf".to_string(),
                    document_type: DocumentType::Aadhar,
                    public_id: "doc-2".to_string(),
                    url: "/uploads/doc-2".to_string(),
                }],
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Validation("Signed agreement is mandatory.".to_string())
        );
    }

    #[test]
    fn acceptance_moves_to_pending_document_approval_with_provisional_hired_category() {
        let t = plan(
            S::OfferExtended,
            Actor::Employer,
            &Action::SubmitAcceptance {
                terms_accepted: true,
                documents: vec![signed_agreement()],
            },
        )
        .unwrap();
        assert_eq!(t.status, S::PendingDocumentApproval);
        assert_eq!(t.category, ApplicationCategory::Hired);
    }

    #[test]
    fn declining_an_offer_archives_the_application() {
        let t = plan(S::OfferExtended, Actor::Employer, &Action::DeclineOffer).unwrap();
        assert_eq!(t.status, S::Rejected);
        assert_eq!(t.category, ApplicationCategory::Archived);
    }

    #[test]
    fn document_rejection_normalizes_to_rejected_and_notifies_candidate() {
        let t = plan(
            S::PendingDocumentApproval,
            Actor::Admin,
            &Action::VerifyDocuments { approved: false },
        )
        .unwrap();
        assert_eq!(t.status, S::Rejected);
        assert_eq!(t.category, ApplicationCategory::Archived);
        assert_eq!(t.notices, vec![Notice::DocumentsRejected]);
        assert_eq!(t.notices[0].recipient(), Recipient::Candidate);
    }

    #[test]
    fn document_approval_notifies_the_college() {
        let t = plan(
            S::PendingDocumentApproval,
            Actor::Admin,
            &Action::VerifyDocuments { approved: true },
        )
        .unwrap();
        assert_eq!(t.status, S::DocumentsApproved);
        assert_eq!(t.category, ApplicationCategory::Hired);
        assert_eq!(t.notices, vec![Notice::DocumentsApproved]);
        assert_eq!(t.notices[0].recipient(), Recipient::JobPoster);
    }

    #[test]
    fn finalize_hiring_requires_documents_approved() {
        let t = plan(
            S::DocumentsApproved,
            Actor::College,
            &Action::FinalizeHiring { hired: true },
        )
        .unwrap();
        assert_eq!(t.status, S::Hired);
        assert_eq!(t.category, ApplicationCategory::Hired);
        assert_eq!(t.notices, vec![Notice::HiringConfirmed]);

        for s in [S::OfferExtended, S::PendingDocumentApproval, S::Shortlisted] {
            let err = plan(s, Actor::College, &Action::FinalizeHiring { hired: true }).unwrap_err();
            assert_eq!(
                err,
                WorkflowError::Guard(
                    "Cannot finalize hiring until documents are approved by admin.".to_string()
                )
            );
        }
    }

    #[test]
    fn finalize_rejection_archives_and_notifies_candidate() {
        let t = plan(
            S::DocumentsApproved,
            Actor::College,
            &Action::FinalizeHiring { hired: false },
        )
        .unwrap();
        assert_eq!(t.status, S::Rejected);
        assert_eq!(t.category, ApplicationCategory::Archived);
        assert_eq!(t.notices, vec![Notice::NotProceeding]);
    }

    #[test]
    fn actors_cannot_use_each_others_transitions() {
        assert_eq!(
            plan(S::PendingAdminApproval, Actor::College, &Action::Approve),
            Err(WorkflowError::NotAllowed)
        );
        assert_eq!(
            plan(S::Applied, Actor::Employer, &Action::Shortlist),
            Err(WorkflowError::NotAllowed)
        );
        assert_eq!(
            plan(
                S::DocumentsApproved,
                Actor::Admin,
                &Action::FinalizeHiring { hired: true }
            ),
            Err(WorkflowError::NotAllowed)
        );
    }

    #[test]
    fn notice_messages_carry_the_job_title() {
        let (msg, link) = Notice::ApplicationApproved.render("Physics Teacher");
        assert!(msg.contains("'Physics Teacher'"));
        assert_eq!(link, "/college/applications");

        let (msg, link) = Notice::HiringConfirmed.render("Physics Teacher");
        assert!(msg.contains("Physics Teacher"));
        assert_eq!(link, "/my-jobs");
    }

    #[test]
    fn category_derivation_matches_the_bucket_table() {
        use ApplicationCategory as C;
        let cases = [
            (S::Saved, C::Saved),
            (S::PendingAdminApproval, C::Applied),
            (S::Applied, C::Applied),
            (S::Viewed, C::Applied),
            (S::Shortlisted, C::Applied),
            (S::InterviewScheduled, C::Interviews),
            (S::OfferExtended, C::Offers),
            (S::PendingDocumentApproval, C::Hired),
            (S::DocumentsApproved, C::Hired),
            (S::Hired, C::Hired),
            (S::Rejected, C::Archived),
        ];
        for (status, category) in cases {
            assert_eq!(ApplicationCategory::for_status(status), category);
        }
    }
}
