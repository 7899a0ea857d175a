//! Integration tests for the simulation lifecycle against a scripted engine.

mod common;

use common::{simulation_body, Call, Reply, ScriptedTransport};
use policysim_core::{
    PolicyDraft, PolicyKind, PolicySimError, SimulationFlow, SimulationState, SubmitError,
    TransportError,
};

fn draft(name: &str) -> PolicyDraft {
    PolicyDraft::new(name, PolicyKind::EqualPay, 75.0, 3, 2_000_000.0)
}

#[tokio::test]
async fn test_flow_runs_to_success() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(simulation_body("Equal Pay 2025", 15.0))).await;
    let flow = SimulationFlow::new(transport.clone());

    let result = flow.run(&draft("Equal Pay 2025")).await.unwrap();

    assert_eq!(result.timeline().years(), vec![0, 1, 2, 3]);
    assert_eq!(result.final_metrics().pay_gap_reduction_percent, 8.0);
    assert!(matches!(flow.state(), SimulationState::Succeeded(_)));
    assert_eq!(
        transport.calls().await,
        vec![Call::Simulate("Equal Pay 2025".to_string())]
    );
}

#[tokio::test]
async fn test_invalid_draft_sends_nothing() {
    let transport = ScriptedTransport::new();
    let flow = SimulationFlow::new(transport.clone());

    let mut bad = draft("Too short");
    bad.duration_years = 0;
    let err = flow.run(&bad).await.unwrap_err();

    assert!(matches!(err, PolicySimError::Submit(SubmitError::Invalid(_))));
    assert_eq!(flow.state(), SimulationState::Idle);
    assert!(transport.calls().await.is_empty());
}

#[tokio::test]
async fn test_second_submit_while_in_flight_is_refused() {
    let transport = ScriptedTransport::new();
    let (reply, gate) = Reply::ok(simulation_body("First", 15.0)).held();
    transport.push(reply).await;
    transport.push(Reply::ok(simulation_body("Second", 10.0))).await;
    let flow = SimulationFlow::new(transport.clone());

    let first = tokio::spawn({
        let flow = flow.clone();
        async move { flow.run(&draft("First")).await }
    });
    transport.wait_for_calls(1).await;

    let err = flow.run(&draft("Second")).await.unwrap_err();
    assert!(matches!(err, PolicySimError::Submit(SubmitError::Busy { .. })));

    gate.notify_one();
    let result = first.await.unwrap().unwrap();
    assert_eq!(result.policy().name(), "First");

    // Exactly one accepted submission reached the engine
    assert_eq!(transport.calls().await, vec![Call::Simulate("First".to_string())]);
}

#[tokio::test]
async fn test_reset_discards_in_flight_response() {
    let transport = ScriptedTransport::new();
    let (reply, gate) = Reply::ok(simulation_body("Abandoned", 15.0)).held();
    transport.push(reply).await;
    let flow = SimulationFlow::new(transport.clone());

    let pending = tokio::spawn({
        let flow = flow.clone();
        async move { flow.run(&draft("Abandoned")).await }
    });
    transport.wait_for_calls(1).await;

    flow.reset();
    assert_eq!(flow.state(), SimulationState::Idle);

    gate.notify_one();
    let err = pending.await.unwrap().unwrap_err();
    assert!(err.is_stale());
    assert_eq!(err.user_message(), None);
    assert_eq!(flow.state(), SimulationState::Idle);
}

#[tokio::test]
async fn test_stale_response_does_not_overwrite_newer_request() {
    let transport = ScriptedTransport::new();
    let (old_reply, old_gate) = Reply::ok(simulation_body("Old", 20.0)).held();
    let (new_reply, new_gate) = Reply::ok(simulation_body("New", 12.0)).held();
    transport.push(old_reply).await;
    transport.push(new_reply).await;
    let flow = SimulationFlow::new(transport.clone());

    let old = tokio::spawn({
        let flow = flow.clone();
        async move { flow.run(&draft("Old")).await }
    });
    transport.wait_for_calls(1).await;
    flow.reset();

    let new = tokio::spawn({
        let flow = flow.clone();
        async move { flow.run(&draft("New")).await }
    });
    transport.wait_for_calls(2).await;

    old_gate.notify_one();
    assert!(old.await.unwrap().unwrap_err().is_stale());
    assert!(matches!(flow.state(), SimulationState::Submitting { .. }));

    new_gate.notify_one();
    let result = new.await.unwrap().unwrap();
    assert_eq!(result.policy().name(), "New");
    match flow.state() {
        SimulationState::Succeeded(result) => assert_eq!(result.policy().name(), "New"),
        other => panic!("unexpected state {other:?}"),
    }
}

#[tokio::test]
async fn test_transport_failure_keeps_previous_result() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(simulation_body("Baseline", 15.0))).await;
    transport
        .push(Reply::err(TransportError::Server {
            status: Some(400),
            message: "Percentage must be between 50 and 100".to_string(),
        }))
        .await;
    let flow = SimulationFlow::new(transport.clone());

    flow.run(&draft("Baseline")).await.unwrap();
    let err = flow.run(&draft("Retry")).await.unwrap_err();
    assert_eq!(
        err.user_message().as_deref(),
        Some("Percentage must be between 50 and 100")
    );

    assert_eq!(
        flow.state(),
        SimulationState::Failed {
            message: "Percentage must be between 50 and 100".to_string()
        }
    );
    let controller = flow.controller().lock();
    assert_eq!(
        controller.last_result().map(|r| r.policy().name().to_string()),
        Some("Baseline".to_string())
    );
}

#[tokio::test]
async fn test_explain_passes_through() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(simulation_body("Explained", 15.0))).await;
    transport
        .push(Reply::ok(serde_json::json!({"success": true, "explanation": "Strong progress."})))
        .await;
    let flow = SimulationFlow::new(transport.clone());

    let result = flow.run(&draft("Explained")).await.unwrap();
    let text = flow.transport().explain(&result).await.unwrap();
    assert_eq!(text, "Strong progress.");

    let calls = transport.calls().await;
    assert_eq!(calls[1], Call::Explain("Explained".to_string()));
}
