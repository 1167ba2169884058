use covee_core::{
    DomainEvent, Project, ProjectAction, ProjectError, ProjectState, ReviewAnalyzer,
    ReviewTopicId, RoleId, SkipManagerReview, UserId,
};

struct Team {
    project: Project,
    creator: UserId,
    users: [UserId; 3],
    roles: [RoleId; 3],
    topic: ReviewTopicId,
}

/// A three-person project with one topic and one milestone, ready to start.
fn formed_team(skip: SkipManagerReview) -> Team {
    let creator = UserId::new();
    let mut project = Project::new(creator, "covee pilot", skip);
    let users = [UserId::new(), UserId::new(), UserId::new()];
    let roles = [
        project.add_role(creator, "backend").expect("add role"),
        project.add_role(creator, "frontend").expect("add role"),
        project.add_role(creator, "design").expect("add role"),
    ];
    for (role, user) in roles.iter().zip(users.iter()) {
        project.assign_role(creator, *role, *user).expect("assign role");
    }
    let topic = project
        .add_review_topic(creator, "overall contribution")
        .expect("add topic");
    project.add_milestone(creator, "sprint 1").expect("add milestone");
    Team {
        project,
        creator,
        users,
        roles,
        topic,
    }
}

/// Each member splits their score over the other two with the given shares.
fn submit_all_reviews(team: &mut Team, first_share: f64) {
    let second_share = 1.0 - first_share;
    for (index, (&role, &user)) in team.roles.iter().zip(team.users.iter()).enumerate() {
        let others: Vec<RoleId> = team
            .roles
            .iter()
            .enumerate()
            .filter(|(other_index, _)| *other_index != index)
            .map(|(_, &other)| other)
            .collect();
        team.project
            .submit_peer_review(user, role, others[0], team.topic, first_share)
            .expect("submit review");
        team.project
            .submit_peer_review(user, role, others[1], team.topic, second_share)
            .expect("submit review");
    }
}

#[test]
fn happy_path_through_manager_review() {
    let mut team = formed_team(SkipManagerReview::No);
    team.project.start_peer_review().expect("start peer review");
    assert_eq!(team.project.state(), ProjectState::PeerReview);

    submit_all_reviews(&mut team, 0.5);
    team.project
        .complete_peer_reviews(&ReviewAnalyzer::default())
        .expect("complete peer reviews");
    assert_eq!(team.project.state(), ProjectState::ManagerReview);

    let milestone_id = {
        let milestone = team.project.active_milestone().expect("milestone exists");
        assert_eq!(milestone.contributions.len(), 3);
        let total: f64 = milestone.contributions.iter().map(|c| c.amount).sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert_eq!(milestone.consensualities.len(), 1);
        assert_eq!(milestone.cliquisms.len(), 1);
        milestone.id
    };

    team.project
        .submit_manager_review(team.creator)
        .expect("manager review");
    assert_eq!(team.project.state(), ProjectState::Finished);

    team.project.archive().expect("archive");
    assert_eq!(team.project.state(), ProjectState::Archived);

    let project_id = team.project.id();
    assert_eq!(
        team.project.drain_events(),
        vec![
            DomainEvent::ProjectFormationFinished { project_id },
            DomainEvent::ProjectPeerReviewFinished {
                project_id,
                milestone_id,
            },
            DomainEvent::ProjectManagerReviewFinished { project_id },
            DomainEvent::ProjectFinished { project_id },
            DomainEvent::ProjectArchived { project_id },
        ]
    );
    assert!(team.project.domain_events().is_empty());
    assert!(team.project.drain_events().is_empty());
}

#[test]
fn if_consensual_policy_skips_manager_review_on_agreement() {
    let mut team = formed_team(SkipManagerReview::IfConsensual);
    team.project.start_peer_review().expect("start peer review");
    // Perfectly uniform scores: consensuality 1.0 >= 0.8.
    submit_all_reviews(&mut team, 0.5);
    team.project
        .complete_peer_reviews(&ReviewAnalyzer::default())
        .expect("complete peer reviews");

    assert_eq!(team.project.state(), ProjectState::Finished);
    let events = team.project.drain_events();
    let project_id = team.project.id();
    assert!(matches!(
        events[1],
        DomainEvent::ProjectPeerReviewFinished { .. }
    ));
    assert_eq!(events[2], DomainEvent::ProjectFinished { project_id });
}

#[test]
fn if_consensual_policy_keeps_manager_review_on_disagreement() {
    let mut team = formed_team(SkipManagerReview::IfConsensual);
    team.project.start_peer_review().expect("start peer review");
    // Everyone dumps the whole score on one side: consensuality near 0.
    submit_all_reviews(&mut team, 1.0);
    team.project
        .complete_peer_reviews(&ReviewAnalyzer::default())
        .expect("complete peer reviews");

    assert_eq!(team.project.state(), ProjectState::ManagerReview);
    let events = team.project.drain_events();
    assert!(!events
        .iter()
        .any(|event| matches!(event, DomainEvent::ProjectFinished { .. })));
}

#[test]
fn complete_peer_reviews_requires_every_review() {
    let mut team = formed_team(SkipManagerReview::No);
    team.project.start_peer_review().expect("start peer review");
    // Only the first member reviews.
    team.project
        .submit_peer_review(team.users[0], team.roles[0], team.roles[1], team.topic, 0.5)
        .expect("submit review");
    team.project
        .submit_peer_review(team.users[0], team.roles[0], team.roles[2], team.topic, 0.5)
        .expect("submit review");

    let err = team
        .project
        .complete_peer_reviews(&ReviewAnalyzer::default())
        .expect_err("incomplete reviews must be rejected");
    assert!(matches!(err, ProjectError::PeerReviewsIncomplete { .. }));
    assert_eq!(team.project.state(), ProjectState::PeerReview);
    let milestone = team.project.active_milestone().expect("milestone exists");
    assert!(milestone.contributions.is_empty());
}

#[test]
fn duplicate_peer_review_is_rejected() {
    let mut team = formed_team(SkipManagerReview::No);
    team.project.start_peer_review().expect("start peer review");
    team.project
        .submit_peer_review(team.users[0], team.roles[0], team.roles[1], team.topic, 0.5)
        .expect("first submission");
    let err = team
        .project
        .submit_peer_review(team.users[0], team.roles[0], team.roles[1], team.topic, 0.4)
        .expect_err("resubmission must fail");
    assert!(matches!(err, ProjectError::DuplicatePeerReview { .. }));
}

#[test]
fn cancel_succeeds_from_every_non_terminal_state_only() {
    // Formation.
    let mut team = formed_team(SkipManagerReview::No);
    team.project.cancel(team.creator).expect("cancel from formation");
    assert_eq!(team.project.state(), ProjectState::Cancelled);
    let err = team
        .project
        .cancel(team.creator)
        .expect_err("cancel from cancelled must fail");
    assert!(matches!(err, ProjectError::InvalidStateTransition { .. }));

    // PeerReview.
    let mut team = formed_team(SkipManagerReview::No);
    team.project.start_peer_review().expect("start");
    team.project.cancel(team.creator).expect("cancel from peer review");

    // ManagerReview.
    let mut team = formed_team(SkipManagerReview::No);
    team.project.start_peer_review().expect("start");
    submit_all_reviews(&mut team, 0.5);
    team.project
        .complete_peer_reviews(&ReviewAnalyzer::default())
        .expect("complete");
    team.project.cancel(team.creator).expect("cancel from manager review");

    // Finished and Archived.
    let mut team = formed_team(SkipManagerReview::Yes);
    team.project.start_peer_review().expect("start");
    submit_all_reviews(&mut team, 0.5);
    team.project
        .complete_peer_reviews(&ReviewAnalyzer::default())
        .expect("complete");
    assert_eq!(team.project.state(), ProjectState::Finished);
    let err = team
        .project
        .cancel(team.creator)
        .expect_err("cancel from finished must fail");
    assert_eq!(
        err,
        ProjectError::InvalidStateTransition {
            current: ProjectState::Finished,
            action: ProjectAction::Cancel,
        }
    );
    team.project.archive().expect("archive");
    assert!(team.project.cancel(team.creator).is_err());
}

#[test]
fn rejected_transitions_leave_state_untouched() {
    let mut team = formed_team(SkipManagerReview::No);
    let before = team.project.clone();

    let err = team
        .project
        .submit_manager_review(team.creator)
        .expect_err("manager review from formation must fail");
    assert_eq!(
        err,
        ProjectError::InvalidStateTransition {
            current: ProjectState::Formation,
            action: ProjectAction::SubmitManagerReview,
        }
    );
    let err = team
        .project
        .archive()
        .expect_err("archive from formation must fail");
    assert!(matches!(err, ProjectError::InvalidStateTransition { .. }));
    assert_eq!(team.project, before);

    // Non-creator cancellation is refused and changes nothing either.
    let stranger = UserId::new();
    let err = team
        .project
        .cancel(stranger)
        .expect_err("stranger cancel must fail");
    assert!(matches!(err, ProjectError::NotCreator { .. }));
    assert_eq!(team.project, before);
}

#[test]
fn aggregate_serializes_with_snake_case_state() {
    let team = formed_team(SkipManagerReview::IfConsensual);
    let json = serde_json::to_value(&team.project).expect("project should serialize");
    assert_eq!(json["state"], "formation");
    assert_eq!(json["skip_manager_review"], "if_consensual");
    let decoded: Project = serde_json::from_value(json).expect("project should deserialize");
    assert_eq!(decoded, team.project);
}
